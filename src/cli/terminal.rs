//! Terminal capability detection and utilities

use equatle::TileState;
use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Render one guessed symbol as a tile.
///
/// Without color support the state is shown with brackets instead:
/// `[1]` correct, `(1)` present, ` 1 ` absent.
pub fn tile(symbol: char, state: TileState) -> String {
    if !supports_color() {
        return match state {
            TileState::Correct => format!("[{symbol}]"),
            TileState::Present => format!("({symbol})"),
            TileState::Absent => format!(" {symbol} "),
        };
    }

    let text = format!(" {symbol} ");
    match state {
        TileState::Correct => text.black().bg::<css::Green>().to_string(),
        TileState::Present => text.black().bg::<css::Orange>().to_string(),
        TileState::Absent => text.white().bg::<css::DimGray>().to_string(),
    }
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
