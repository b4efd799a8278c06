use ra::{
    is_game_id, ActRequest, ClientMessage, Command, Credentials, GameRef, LoginRequest,
    StartRequest,
};
use tracing::debug;

use crate::channel::Channel;
use crate::error::{DispatchError, ValidationError};

/// Turns intents into outbound messages.
///
/// Nothing here waits for a reply. Whatever the server does in response
/// arrives later as an event. Intents that fail validation send nothing.
pub struct Dispatcher<'a, C: ?Sized> {
    channel: &'a mut C,
    game_id: Option<&'a str>,
    num_auction_tiles: Option<usize>,
}

impl<'a, C: Channel + ?Sized> Dispatcher<'a, C> {
    /// A dispatcher for the game with id `game_id`, if any.
    pub fn new(channel: &'a mut C, game_id: Option<&'a str>) -> Self {
        Self {
            channel,
            game_id: game_id.filter(|id| !id.is_empty()),
            num_auction_tiles: None,
        }
    }

    /// Makes [`Dispatcher::swap`] check its index against the auction grid.
    pub fn with_auction_tiles(mut self, num_tiles: usize) -> Self {
        self.num_auction_tiles = Some(num_tiles);
        self
    }

    fn send(&mut self, msg: ClientMessage) -> Result<(), DispatchError> {
        debug!(?msg, "Dispatching");
        self.channel.send(&msg).map_err(DispatchError::Channel)
    }

    fn held_game_id(&self) -> Result<&'a str, ValidationError> {
        self.game_id.ok_or(ValidationError::MissingGameId)
    }

    /// Sends a game action for the held game.
    pub fn act(&mut self, command: Command) -> Result<(), DispatchError> {
        let game_id = String::from(self.held_game_id()?);
        self.send(ClientMessage::Act(ActRequest { game_id, command }))
    }

    pub fn draw(&mut self) -> Result<(), DispatchError> {
        self.act(Command::Draw)
    }

    pub fn auction(&mut self) -> Result<(), DispatchError> {
        self.act(Command::Auction)
    }

    /// Bids the sun with the given 0-based index among the usable ones, or
    /// passes on `None`.
    pub fn bid(&mut self, sun_idx: Option<usize>) -> Result<(), DispatchError> {
        self.held_game_id()?;
        let command = Command::bid(sun_idx)?;
        self.act(command)
    }

    /// Takes the auction tile with the given 0-based index with a golden god.
    pub fn swap(&mut self, tile_idx: usize) -> Result<(), DispatchError> {
        self.held_game_id()?;
        if let Some(num_tiles) = self.num_auction_tiles {
            if tile_idx >= num_tiles {
                return Err(ValidationError::InvalidSwapTarget {
                    index: tile_idx,
                    num_tiles,
                }
                .into());
            }
        }
        let command = Command::swap(tile_idx)?;
        self.act(command)
    }

    /// Discards the named monument or civilization tile.
    pub fn discard(&mut self, name: &str) -> Result<(), DispatchError> {
        self.act(Command::Discard(name.trim().to_uppercase()))
    }

    /// Asks for the current state of a game.
    pub fn load(&mut self, game_id: &str) -> Result<(), DispatchError> {
        let game_id = normalize_game_id(game_id)?;
        self.send(ClientMessage::Act(ActRequest {
            game_id,
            command: Command::Load,
        }))
    }

    pub fn start(&mut self, request: StartRequest) -> Result<(), DispatchError> {
        if request.num_players == 0 {
            return Err(ValidationError::NoPlayers.into());
        }
        self.send(ClientMessage::StartGame(request))
    }

    pub fn delete(&mut self, game_id: &str) -> Result<(), DispatchError> {
        let game_id = normalize_game_id(game_id)?;
        self.send(ClientMessage::Delete(GameRef { game_id }))
    }

    pub fn join(&mut self, game_id: &str) -> Result<(), DispatchError> {
        let game_id = normalize_game_id(game_id)?;
        self.send(ClientMessage::Join(GameRef { game_id }))
    }

    /// Leaves the held game.
    pub fn leave(&mut self) -> Result<(), DispatchError> {
        let game_id = String::from(self.held_game_id()?);
        self.send(ClientMessage::Leave(GameRef { game_id }))
    }

    pub fn add_player(&mut self, game_id: &str) -> Result<(), DispatchError> {
        let game_id = normalize_game_id(game_id)?;
        self.send(ClientMessage::AddPlayer(GameRef { game_id }))
    }

    pub fn list_games(&mut self) -> Result<(), DispatchError> {
        self.send(ClientMessage::ListGames)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), DispatchError> {
        let credentials = checked_credentials(username, password)?;
        self.send(ClientMessage::Login(LoginRequest::Password(credentials)))
    }

    /// Logs in again with the token of an earlier login.
    pub fn login_with_token(&mut self, token: &str) -> Result<(), DispatchError> {
        self.send(ClientMessage::Login(LoginRequest::Token {
            token: String::from(token),
        }))
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<(), DispatchError> {
        let credentials = checked_credentials(username, password)?;
        self.send(ClientMessage::Register(credentials))
    }

    pub fn logout(&mut self) -> Result<(), DispatchError> {
        self.send(ClientMessage::Logout)
    }
}

/// Strips whitespace from a user-supplied game id and checks that it looks
/// like one. The server only parses ids without whitespace.
pub fn normalize_game_id(game_id: &str) -> Result<String, ValidationError> {
    let stripped: String = game_id.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() {
        Err(ValidationError::MissingGameId)
    } else if is_game_id(&stripped) {
        Ok(stripped)
    } else {
        Err(ValidationError::InvalidGameId(String::from(game_id.trim())))
    }
}

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 4;

fn checked_credentials(username: &str, password: &str) -> Result<Credentials, ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::MissingPlayerName);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(Credentials {
        username: String::from(username),
        password: String::from(password),
    })
}
