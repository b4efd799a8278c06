/// The error type for parsing a [`Command`](crate::Command) from its wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    Empty,
    Unrecognized(String),
    IndexOutOfRange { index: usize, max: usize },
}

impl std::error::Error for CommandParseError {}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandParseError::Empty => write!(f, "No command given"),
            CommandParseError::Unrecognized(command) => {
                write!(f, "Unrecognized command: {}", command)
            }
            CommandParseError::IndexOutOfRange { index, max } => write!(
                f,
                "Tile number {} is out of range, it must be at most {}",
                index, max
            ),
        }
    }
}
