use serde::{Deserialize, Serialize};

use crate::{Command, GameSnapshot};

/// Severity of a server message.
///
/// The client reuses it for its own notices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

/// Whether a game shows up in everyone's game list or only for its members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Private,
}

/// Strength of the AI players the server adds to a new game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AiLevel {
    Easy,
    Medium,
    Hard,
}

/// Message sent from the client to the server.
///
/// On the wire every message is a single JSON object of the form
/// `{"event": "<name>", "data": <payload>}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to the updates of a game's room.
    Join(GameRef),
    /// Unsubscribe from a game's room.
    Leave(GameRef),
    /// Perform a game action.
    Act(ActRequest),
    StartGame(StartRequest),
    Delete(GameRef),
    /// Take a free seat in a game that has not started yet.
    AddPlayer(GameRef),
    ListGames,
    Login(LoginRequest),
    Register(Credentials),
    Logout,
}

/// Payloads that only name a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRef {
    pub game_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActRequest {
    pub game_id: String,
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Number of human seats, including the requesting player.
    #[serde(rename = "numPlayers")]
    pub num_players: u8,
    pub visibility: Visibility,
    #[serde(rename = "numAIPlayers", default, skip_serializing_if = "Option::is_none")]
    pub num_ai_players: Option<u8>,
    #[serde(rename = "AILevel", default, skip_serializing_if = "Option::is_none")]
    pub ai_level: Option<AiLevel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Logging in either with a password or with the token of an earlier login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginRequest {
    Password(Credentials),
    Token { token: String },
}

/// Event pushed by the server.
///
/// Connecting and disconnecting are reported by the transport and are not
/// part of this enum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Update(UpdatePayload),
    /// The server ended this client's login.
    Logout(MessageResponse),
    /// Response to a [`ClientMessage::Join`].
    Spectate(SpectateResponse),
    ListGames(ListGamesResponse),
    Delete(MessageResponse),
    Login(LoginResponse),
    StartGame(MessageResponse),
    /// Sent right before the server closes the connection on purpose.
    Disconnect { reason: String },
}

/// One inbound update.
///
/// Every field is optional: an envelope carrying only `level` and `message`
/// is a server-reported error and never replaces the snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameSnapshot>,
    /// Description of the action that produced this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// The player (possibly an AI) that performed the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Authoritative game id, sent when the update also (re)establishes the game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

impl UpdateEnvelope {
    /// Whether this envelope only reports a problem.
    pub fn is_message_only(&self) -> bool {
        self.game_state.is_none() && (self.level.is_some() || self.message.is_some())
    }
}

/// The payload of an `update` event: one envelope, or a batch of envelopes in
/// the order the server resolved them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    Batch(Vec<UpdateEnvelope>),
    Single(Box<UpdateEnvelope>),
}

impl UpdatePayload {
    pub fn into_envelopes(self) -> Vec<UpdateEnvelope> {
        match self {
            UpdatePayload::Batch(envelopes) => envelopes,
            UpdatePayload::Single(envelope) => vec![*envelope],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionSuccess {
    pub game_id: String,
    pub player_name: String,
    /// Absent when the player joined as a spectator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_idx: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpectateResponse {
    Joined(JoinSessionSuccess),
    Rejected(MessageResponse),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A single row of the game list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub id: String,
    /// Names of the players that have joined so far.
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Total number of seats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_players: Option<usize>,
    /// Set when this row announces the deletion of the game.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListGamesResponse {
    /// When true, `games` updates the client's list instead of replacing it.
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub games: Vec<GameInfo>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_messages_use_event_and_data() {
        let msg = ClientMessage::Act(ActRequest {
            game_id: String::from("g1"),
            command: Command::Bid(2),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "act", "data": {"gameId": "g1", "command": "B2"}})
        );
        assert_eq!(
            serde_json::to_value(&ClientMessage::ListGames).unwrap(),
            json!({"event": "list_games"})
        );
    }

    #[test]
    fn start_request_keeps_server_field_names() {
        let msg = ClientMessage::StartGame(StartRequest {
            num_players: 2,
            visibility: Visibility::Private,
            num_ai_players: Some(1),
            ai_level: Some(AiLevel::Hard),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "start_game", "data": {
                "numPlayers": 2,
                "visibility": "PRIVATE",
                "numAIPlayers": 1,
                "AILevel": "HARD",
            }})
        );
    }

    #[test]
    fn login_with_password_or_token() {
        let token = ClientMessage::Login(LoginRequest::Token {
            token: String::from("t0k3n"),
        });
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            json!({"event": "login", "data": {"token": "t0k3n"}})
        );
        let password: ClientMessage = serde_json::from_value(
            json!({"event": "login", "data": {"username": "alice", "password": "secret"}}),
        )
        .unwrap();
        assert!(matches!(
            password,
            ClientMessage::Login(LoginRequest::Password(_))
        ));
    }

    #[test]
    fn update_accepts_single_envelope_and_batch() {
        let single: ServerEvent = serde_json::from_value(json!({
            "event": "update",
            "data": {"action": "Draw a Tile", "username": "Alice", "gameState": {}}
        }))
        .unwrap();
        let ServerEvent::Update(payload) = single else {
            panic!("expected an update");
        };
        let envelopes = payload.into_envelopes();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].username.as_deref(), Some("Alice"));
        assert!(envelopes[0].game_state.is_some());

        let batch: ServerEvent = serde_json::from_value(json!({
            "event": "update",
            "data": [
                {"action": "Draw a Tile", "username": "AI 1", "gameState": {}},
                {"action": "Start an Auction", "username": "AI 2", "gameState": {}},
            ]
        }))
        .unwrap();
        let ServerEvent::Update(payload) = batch else {
            panic!("expected an update");
        };
        let names: Vec<_> = payload
            .into_envelopes()
            .into_iter()
            .map(|e| e.username.unwrap())
            .collect();
        assert_eq!(names, ["AI 1", "AI 2"]);
    }

    #[test]
    fn error_envelope_is_message_only() {
        let envelope: UpdateEnvelope =
            serde_json::from_value(json!({"level": "warning", "message": "Unrecognized action."}))
                .unwrap();
        assert!(envelope.is_message_only());
        assert_eq!(envelope.level, Some(Level::Warning));
    }

    #[test]
    fn spectate_distinguishes_success_and_rejection() {
        let joined: SpectateResponse =
            serde_json::from_value(json!({"gameId": "g1", "playerName": "Bob", "playerIdx": 1}))
                .unwrap();
        assert_eq!(
            joined,
            SpectateResponse::Joined(JoinSessionSuccess {
                game_id: String::from("g1"),
                player_name: String::from("Bob"),
                player_idx: Some(1),
            })
        );
        let rejected: SpectateResponse = serde_json::from_value(
            json!({"level": "warning", "message": "Cannot join non-existant game: g1."}),
        )
        .unwrap();
        assert!(matches!(rejected, SpectateResponse::Rejected(_)));
    }

    #[test]
    fn deleted_game_rows() {
        let list: ListGamesResponse =
            serde_json::from_value(json!({"partial": true, "games": [{"id": "g1", "deleted": true}]}))
                .unwrap();
        assert!(list.partial);
        assert!(list.games[0].deleted);
        assert!(list.games[0].players.is_empty());
    }
}
