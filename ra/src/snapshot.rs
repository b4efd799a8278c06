use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full state of a game as pushed by the server.
///
/// Every field has a default so that partial payloads still deserialize. The
/// client never merges snapshots, each one replaces the previous.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSnapshot {
    /// The players in play order.
    pub player_names: Vec<String>,
    /// Log entries, kept as the server sent them.
    pub game_log: Vec<serde_json::Value>,
    pub game_state: GameState,
    /// Mapping from player names to unrealized points.
    pub unrealized_points: BTreeMap<String, i32>,
    pub auction_tile_values: BTreeMap<String, i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub total_rounds: u32,
    pub num_ras_per_round: u32,
    pub num_players: usize,
    pub max_auction_tiles: usize,
    pub current_round: u32,
    /// If `active_players[i]` is true, player i is still in this round.
    pub active_players: Vec<bool>,
    pub num_ras_this_round: u32,
    /// Value of the sun tile in the center.
    pub center_sun: u32,
    /// Tiles currently up for auction. This is the shared grid.
    pub auction_tiles: Vec<Tile>,
    /// The sun each player has bid in the running auction, if any.
    pub auction_suns: Vec<Option<u32>>,
    pub auction_started: bool,
    pub auction_start_player: Option<usize>,
    pub current_player: usize,
    pub auction_winning_player: Option<usize>,
    pub player_states: Vec<PlayerSnapshot>,
    pub game_ended: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSnapshot {
    pub collection: Vec<Tile>,
    pub points: i32,
    pub player_name: String,
    /// Sun the player can still bid.
    pub usable_sun: Vec<u32>,
    /// Sun already bid this round.
    pub unusable_sun: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TileType {
    Collectible,
    Disaster,
    Ra,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tile {
    /// Full name, e.g. `Monument -- Pyramid`.
    pub name: String,
    pub tile_type: TileType,
    /// How many of these start in the bag.
    pub starting_num: u32,
    pub to_keep: bool,
}

/// What selecting a tile from one's own collection does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileAction {
    /// Golden god: take a tile from the auction grid.
    Swap,
    /// Discard the named monument or civilization.
    Discard(String),
}

impl Tile {
    /// The last segment of the name, e.g. `Pyramid` for `Monument -- Pyramid`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit(" -- ").next().unwrap_or(&self.name)
    }

    pub fn action(&self) -> Option<TileAction> {
        let upper = self.name.to_uppercase();
        if upper.contains("MONUMENT") || upper.contains("CIVILIZATION") {
            Some(TileAction::Discard(self.short_name().to_uppercase()))
        } else if upper.contains("GOLDEN GOD") {
            Some(TileAction::Swap)
        } else {
            None
        }
    }
}

impl GameSnapshot {
    /// The state of the named player, if they are in this game.
    pub fn player(&self, name: &str) -> Option<&PlayerSnapshot> {
        self.game_state
            .player_states
            .iter()
            .find(|player| player.player_name == name)
    }

    /// Name of the player whose turn it is.
    pub fn current_player_name(&self) -> Option<&str> {
        self.player_names
            .get(self.game_state.current_player)
            .map(String::as_str)
    }
}
