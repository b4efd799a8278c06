use std::fmt;
use std::str::FromStr;

use ra::{AiLevel, StartRequest, Visibility};

/// Something the user wants to do.
///
/// Tile and sun indices are 0-based. The text form numbers them from 1, as
/// they are shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Draw,
    Auction,
    /// Bid a sun, or pass on `None`.
    Bid(Option<usize>),
    SelectGridTile(usize),
    SelectOwnTile(usize),
    Discard(String),
    Load(String),
    Join(String),
    Leave,
    Start(StartRequest),
    Delete(String),
    AddPlayer(String),
    ListGames,
    Login { username: String, password: String },
    Register { username: String, password: String },
    Logout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentParseError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument { argument: &'static str, value: String },
}

impl std::error::Error for IntentParseError {}

impl fmt::Display for IntentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentParseError::Empty => write!(f, "Nothing to do"),
            IntentParseError::UnknownCommand(command) => write!(f, "Unknown command '{}'", command),
            IntentParseError::MissingArgument(argument) => write!(f, "Missing {}", argument),
            IntentParseError::InvalidArgument { argument, value } => {
                write!(f, "Invalid {} '{}'", argument, value)
            }
        }
    }
}

/// Parses a 1-based number into a 0-based index.
fn parse_position(argument: &'static str, value: Option<&str>) -> Result<usize, IntentParseError> {
    let value = value.ok_or(IntentParseError::MissingArgument(argument))?;
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(IntentParseError::InvalidArgument {
            argument,
            value: String::from(value),
        }),
    }
}

fn parse_number<T: FromStr>(argument: &'static str, value: Option<&str>) -> Result<T, IntentParseError> {
    let value = value.ok_or(IntentParseError::MissingArgument(argument))?;
    value.parse().map_err(|_| IntentParseError::InvalidArgument {
        argument,
        value: String::from(value),
    })
}

fn required(argument: &'static str, value: Option<&str>) -> Result<String, IntentParseError> {
    value
        .map(String::from)
        .ok_or(IntentParseError::MissingArgument(argument))
}

/// Parses `start N [public|private] [ai N [easy|medium|hard]]`.
fn parse_start<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<StartRequest, IntentParseError> {
    let num_players = parse_number("number of players", words.next())?;
    let mut request = StartRequest {
        num_players,
        visibility: Visibility::Public,
        num_ai_players: None,
        ai_level: None,
    };
    while let Some(word) = words.next() {
        match word.to_lowercase().as_str() {
            "public" => request.visibility = Visibility::Public,
            "private" => request.visibility = Visibility::Private,
            "ai" => request.num_ai_players = Some(parse_number("number of AI players", words.next())?),
            "easy" => request.ai_level = Some(AiLevel::Easy),
            "medium" => request.ai_level = Some(AiLevel::Medium),
            "hard" => request.ai_level = Some(AiLevel::Hard),
            _ => {
                return Err(IntentParseError::InvalidArgument {
                    argument: "game option",
                    value: String::from(word),
                })
            }
        }
    }
    Ok(request)
}

impl FromStr for Intent {
    type Err = IntentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().ok_or(IntentParseError::Empty)?;
        let intent = match command.to_lowercase().as_str() {
            "draw" => Intent::Draw,
            "auction" => Intent::Auction,
            "bid" => match words.next() {
                Some(word) if word.eq_ignore_ascii_case("pass") => Intent::Bid(None),
                other => Intent::Bid(Some(parse_position("sun number", other)?)),
            },
            "pass" => Intent::Bid(None),
            "grid" => Intent::SelectGridTile(parse_position("tile number", words.next())?),
            "own" => Intent::SelectOwnTile(parse_position("tile number", words.next())?),
            "discard" => {
                let name = words.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(IntentParseError::MissingArgument("tile name"));
                }
                Intent::Discard(name)
            }
            "load" => Intent::Load(required("game id", words.next())?),
            "join" => Intent::Join(required("game id", words.next())?),
            "leave" => Intent::Leave,
            "start" => Intent::Start(parse_start(words)?),
            "delete" => Intent::Delete(required("game id", words.next())?),
            "add" => Intent::AddPlayer(required("game id", words.next())?),
            "games" => Intent::ListGames,
            "login" => Intent::Login {
                username: required("username", words.next())?,
                password: required("password", words.next())?,
            },
            "register" => Intent::Register {
                username: required("username", words.next())?,
                password: required("password", words.next())?,
            },
            "logout" => Intent::Logout,
            _ => return Err(IntentParseError::UnknownCommand(String::from(command))),
        };
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        assert_eq!("grid 4".parse(), Ok(Intent::SelectGridTile(3)));
        assert_eq!("OWN 1".parse(), Ok(Intent::SelectOwnTile(0)));
        assert_eq!("bid 2".parse(), Ok(Intent::Bid(Some(1))));
        assert_eq!("bid pass".parse(), Ok(Intent::Bid(None)));
        assert_eq!(
            "grid 0".parse::<Intent>(),
            Err(IntentParseError::InvalidArgument {
                argument: "tile number",
                value: String::from("0"),
            })
        );
    }

    #[test]
    fn start_options() {
        assert_eq!(
            "start 2 private ai 1 hard".parse(),
            Ok(Intent::Start(StartRequest {
                num_players: 2,
                visibility: Visibility::Private,
                num_ai_players: Some(1),
                ai_level: Some(AiLevel::Hard),
            }))
        );
        assert!(matches!(
            "start 2 sideways".parse::<Intent>(),
            Err(IntentParseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn arguments_are_required() {
        assert_eq!(
            "login alice".parse::<Intent>(),
            Err(IntentParseError::MissingArgument("password"))
        );
        assert_eq!("   ".parse::<Intent>(), Err(IntentParseError::Empty));
        assert_eq!(
            "fly".parse::<Intent>(),
            Err(IntentParseError::UnknownCommand(String::from("fly")))
        );
        assert_eq!(
            "discard step pyramid".parse(),
            Ok(Intent::Discard(String::from("step pyramid")))
        );
    }
}
