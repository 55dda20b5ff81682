//! In-place terminal level meter
//!
//! Rendered on stderr so piped stdout stays clean. Each update redraws the
//! same line with a carriage return; `clear` blanks it before any final
//! message is printed.

use std::io::{self, Write};

const BAR_WIDTH: usize = 30;

/// Redraw the level bar for a 0-100 percent reading.
pub fn draw(percent: u8) {
    let filled = BAR_WIDTH * usize::from(percent.min(100)) / 100;
    let mut err = io::stderr();
    let _ = write!(
        err,
        "\r[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    );
    let _ = err.flush();
}

/// Blank the meter line.
pub fn clear() {
    let mut err = io::stderr();
    let _ = write!(err, "\r{}\r", " ".repeat(BAR_WIDTH + 8));
    let _ = err.flush();
}
