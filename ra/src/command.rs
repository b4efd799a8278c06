use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CommandParseError;

/// The highest number of tiles that can be up for auction at once.
pub const MAX_AUCTION_TILES: usize = 8;

/// The highest number of sun tiles a player can hold.
pub const MAX_SUN_TILES: usize = 4;

/// A game action, as carried by the `command` field of an `act` request.
///
/// The wire form is a short string, e.g. `DRAW`, `B2` or `G1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Command {
    /// Draw a tile from the bag.
    Draw,
    /// Start an auction.
    Auction,
    /// Ask the server to push the current state of the game.
    Load,
    /// Bid the n-th lowest usable sun, counting from 1. Zero passes.
    Bid(u8),
    /// Use a golden god to take the n-th auction tile, counting from 1.
    Swap(u8),
    /// Discard a monument or civilization tile, named in upper case.
    Discard(String),
}

impl Command {
    /// The bid command for a 0-based sun index, or a pass for `None`.
    pub fn bid(sun_idx: Option<usize>) -> Result<Self, CommandParseError> {
        match sun_idx {
            None => Ok(Command::Bid(0)),
            Some(idx) if idx < MAX_SUN_TILES => Ok(Command::Bid(idx as u8 + 1)),
            Some(idx) => Err(CommandParseError::IndexOutOfRange {
                index: idx + 1,
                max: MAX_SUN_TILES,
            }),
        }
    }

    /// The golden god command for a 0-based auction tile index.
    pub fn swap(tile_idx: usize) -> Result<Self, CommandParseError> {
        if tile_idx < MAX_AUCTION_TILES {
            Ok(Command::Swap(tile_idx as u8 + 1))
        } else {
            Err(CommandParseError::IndexOutOfRange {
                index: tile_idx + 1,
                max: MAX_AUCTION_TILES,
            })
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Draw => write!(f, "DRAW"),
            Command::Auction => write!(f, "AUCTION"),
            Command::Load => write!(f, "LOAD"),
            Command::Bid(n) => write!(f, "B{}", n),
            Command::Swap(n) => write!(f, "G{}", n),
            Command::Discard(name) => write!(f, "DISCARD {}", name),
        }
    }
}

fn parse_index(command: &str, digits: &str, min: usize, max: usize) -> Result<u8, CommandParseError> {
    let index: usize = digits
        .parse()
        .map_err(|_| CommandParseError::Unrecognized(command.to_string()))?;
    if index < min || index > max {
        return Err(CommandParseError::IndexOutOfRange { index, max });
    }
    Ok(index as u8)
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "" => return Err(CommandParseError::Empty),
            "DRAW" => return Ok(Command::Draw),
            "AUCTION" => return Ok(Command::Auction),
            "LOAD" => return Ok(Command::Load),
            _ => {}
        }
        if let Some(name) = upper.strip_prefix("DISCARD ") {
            let name = name.trim();
            if name.is_empty() {
                return Err(CommandParseError::Unrecognized(upper));
            }
            return Ok(Command::Discard(name.to_string()));
        }
        if let Some(digits) = upper.strip_prefix('B') {
            return parse_index(&upper, digits, 0, MAX_SUN_TILES).map(Command::Bid);
        }
        if let Some(digits) = upper.strip_prefix('G') {
            return parse_index(&upper, digits, 1, MAX_AUCTION_TILES).map(Command::Swap);
        }
        Err(CommandParseError::Unrecognized(upper))
    }
}

impl From<Command> for String {
    fn from(command: Command) -> String {
        command.to_string()
    }
}

impl TryFrom<String> for Command {
    type Error = CommandParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
