use std::collections::HashMap;

use ra::{GameInfo, ListGamesResponse, Visibility};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Entry {
    Live(GameInfo),
    /// The game was deleted. Later partial lists must not bring it back.
    Deleted,
}

/// The client's copy of the game list.
///
/// Games keep the order in which they were first seen.
#[derive(Clone, Debug, Default)]
pub struct GameList {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
}

impl GameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a `list_games` event. A full list replaces everything, a
    /// partial one updates and adds rows.
    pub fn apply(&mut self, response: ListGamesResponse) {
        if !response.partial {
            self.order.clear();
            self.entries.clear();
        }
        let num_games = response.games.len();
        for game in response.games {
            self.upsert(game);
        }
        debug!(
            partial = response.partial,
            num_games,
            num_live = self.len(),
            "Updated game list"
        );
    }

    fn upsert(&mut self, game: GameInfo) {
        let new_entry = |game: GameInfo| {
            if game.deleted {
                Entry::Deleted
            } else {
                Entry::Live(game)
            }
        };
        match self.entries.get_mut(&game.id) {
            Some(Entry::Deleted) => {}
            Some(entry) => *entry = new_entry(game),
            None => {
                self.order.push(game.id.clone());
                self.entries.insert(game.id.clone(), new_entry(game));
            }
        }
    }

    pub fn get(&self, game_id: &str) -> Option<&GameInfo> {
        match self.entries.get(game_id)? {
            Entry::Live(game) => Some(game),
            Entry::Deleted => None,
        }
    }

    pub fn is_deleted(&self, game_id: &str) -> bool {
        self.entries.get(game_id) == Some(&Entry::Deleted)
    }

    /// The games that were not deleted, in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &GameInfo> {
        self.order
            .iter()
            .filter_map(|id| self.get(id))
    }

    pub fn public(&self) -> impl Iterator<Item = &GameInfo> {
        self.iter()
            .filter(|game| game.visibility != Some(Visibility::Private))
    }

    pub fn private(&self) -> impl Iterator<Item = &GameInfo> {
        self.iter()
            .filter(|game| game.visibility == Some(Visibility::Private))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: &str, players: &[&str]) -> GameInfo {
        GameInfo {
            id: String::from(id),
            players: players.iter().map(|p| String::from(*p)).collect(),
            visibility: Some(Visibility::Public),
            num_players: Some(3),
            deleted: false,
        }
    }

    fn deleted(id: &str) -> GameInfo {
        GameInfo {
            deleted: true,
            ..game(id, &[])
        }
    }

    fn ids(list: &GameList) -> Vec<&str> {
        list.iter().map(|game| game.id.as_str()).collect()
    }

    #[test]
    fn full_list_replaces() {
        let mut list = GameList::new();
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("a", &[]), game("b", &[])],
        });
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("c", &[])],
        });
        assert_eq!(ids(&list), ["c"]);
    }

    #[test]
    fn partial_list_upserts_in_place() {
        let mut list = GameList::new();
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("a", &[]), game("b", &[])],
        });
        list.apply(ListGamesResponse {
            partial: true,
            games: vec![game("c", &[]), game("a", &["Alice"])],
        });
        assert_eq!(ids(&list), ["a", "b", "c"]);
        assert_eq!(list.get("a").unwrap().players, ["Alice"]);
    }

    #[test]
    fn deleted_games_stay_deleted() {
        let mut list = GameList::new();
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("a", &[]), game("b", &[])],
        });
        list.apply(ListGamesResponse {
            partial: true,
            games: vec![deleted("a")],
        });
        list.apply(ListGamesResponse {
            partial: true,
            games: vec![game("a", &["Bob"])],
        });
        assert_eq!(ids(&list), ["b"]);
        assert!(list.is_deleted("a"));
        assert!(list.get("a").is_none());

        // A full list starts over.
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("a", &[])],
        });
        assert_eq!(ids(&list), ["a"]);
    }

    #[test]
    fn split_by_visibility() {
        let mut list = GameList::new();
        let private = GameInfo {
            visibility: Some(Visibility::Private),
            ..game("p", &[])
        };
        list.apply(ListGamesResponse {
            partial: false,
            games: vec![game("a", &[]), private],
        });
        assert_eq!(list.public().count(), 1);
        assert_eq!(list.private().next().unwrap().id, "p");
        assert_eq!(list.len(), 2);
    }
}
