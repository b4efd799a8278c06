use ra::CommandParseError;

/// A problem with a local intent that is caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingGameId,
    MissingPlayerName,
    UsernameTooShort,
    PasswordTooShort,
    InvalidGameId(String),
    InvalidSwapTarget { index: usize, num_tiles: usize },
    InvalidCommand(CommandParseError),
    NoPlayers,
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::InvalidCommand(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingGameId => write!(f, "Not in a game. Load or join a game first."),
            ValidationError::MissingPlayerName => write!(f, "No player name. Log in first."),
            ValidationError::UsernameTooShort => {
                write!(f, "Username too short. Must be at least 3 characters.")
            }
            ValidationError::PasswordTooShort => {
                write!(f, "Password too short. Must be at least 4 characters.")
            }
            ValidationError::InvalidGameId(_) => write!(f, "Invalid game id."),
            ValidationError::InvalidSwapTarget { index, num_tiles } => write!(
                f,
                "Cannot swap with tile {}, there are {} tiles up for auction",
                index + 1,
                num_tiles
            ),
            ValidationError::InvalidCommand(err) => write!(f, "{}", err),
            ValidationError::NoPlayers => write!(f, "A game needs at least one human player"),
        }
    }
}

impl From<CommandParseError> for ValidationError {
    fn from(err: CommandParseError) -> Self {
        ValidationError::InvalidCommand(err)
    }
}

/// The error type for sending an intent.
#[derive(Debug)]
pub enum DispatchError {
    /// The intent was rejected locally, nothing was sent.
    Invalid(ValidationError),
    /// The channel failed to send the message.
    Channel(anyhow::Error),
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Invalid(err) => Some(err),
            DispatchError::Channel(err) => Some(&**err),
        }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Invalid(err) => write!(f, "{}", err),
            DispatchError::Channel(err) => write!(f, "Failed to send: {}", err),
        }
    }
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        DispatchError::Invalid(err)
    }
}

impl From<CommandParseError> for DispatchError {
    fn from(err: CommandParseError) -> Self {
        DispatchError::Invalid(err.into())
    }
}
