//! Small cross-cutting utilities.

use std::io::{BufRead, Write};

/// Block until the operator presses Enter.
///
/// The tool is typically launched by double-click; without this the console
/// window closes before anything can be read. Both the happy path and the
/// fatal path run through here.
pub fn wait_for_enter() {
    print!("press Enter to close");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
