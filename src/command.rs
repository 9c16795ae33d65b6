//! Commands and small shared types.
//!
//! [`Command`] is what arrives over the single-instance socket;
//! [`Direction`] drives directional nudges of a plugin on the grid.

use std::fmt;

/// Direction for a one-cell nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// `(d_row, d_col)` for one step in this direction.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Up => "Up",
            Direction::Down => "Down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Messages accepted on the single-instance socket.
///
/// On the wire a command is its lowercase name, optionally followed by a
/// newline: `toggle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip the visibility of the control surface.
    Toggle,
}

impl Command {
    /// Parse one wire message.  Returns `None` for anything unrecognised.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "toggle" => Some(Command::Toggle),
            _ => None,
        }
    }

    /// The wire encoding of this command.
    pub fn as_wire(self) -> &'static str {
        match self {
            Command::Toggle => "toggle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Left.to_string(), "left");
        assert_eq!(Direction::Right.to_string(), "right");
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn direction_deltas() {
        assert_eq!(Direction::Left.delta(), (0, -1));
        assert_eq!(Direction::Right.delta(), (0, 1));
        assert_eq!(Direction::Up.delta(), (-1, 0));
        assert_eq!(Direction::Down.delta(), (1, 0));
    }

    #[test]
    fn parse_toggle() {
        assert_eq!(Command::parse("toggle"), Some(Command::Toggle));
        assert_eq!(Command::parse("Toggle\n"), Some(Command::Toggle));
        assert_eq!(Command::parse("explode"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn wire_round_trip() {
        assert_eq!(Command::parse(Command::Toggle.as_wire()), Some(Command::Toggle));
    }
}
