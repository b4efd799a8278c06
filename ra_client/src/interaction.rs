use ra::{Tile, TileAction};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A tile of the auction grid was picked as the source of a swap.
    AwaitingTarget { source: usize },
}

/// The result of a selection. At most one command comes out of each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The grid tile was picked as the source, a second pick is expected.
    SourcePicked { source: usize },
    /// The source was picked again, nothing happens.
    Cancelled,
    /// Swap the golden god for the grid tile with this index.
    Swap { source: usize },
    /// Discard the named tile.
    Discard(String),
    /// The golden god was selected without a grid tile. `armed` tells whether
    /// the next grid pick now swaps right away.
    NeedsSource { armed: bool },
    /// The tile has no action.
    Ignored,
}

/// Turns tile selections into at most one command each.
///
/// Grid picks go through [`InteractionState`]: the first pick selects a
/// source, picking it again cancels, picking another tile completes the swap
/// with the first one. Selecting the golden god from one's own collection
/// completes a pending swap, or else arms the machine so that the next grid
/// pick swaps immediately.
#[derive(Clone, Debug, Default)]
pub struct InteractionMachine {
    state: InteractionState,
    source_required: bool,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Whether the golden god was selected and waits for a grid tile.
    pub fn source_required(&self) -> bool {
        self.source_required
    }

    pub fn select_grid_tile(&mut self, index: usize) -> Selection {
        let selection = match self.state {
            InteractionState::Idle if self.source_required => {
                self.source_required = false;
                Selection::Swap { source: index }
            }
            InteractionState::Idle => {
                self.state = InteractionState::AwaitingTarget { source: index };
                Selection::SourcePicked { source: index }
            }
            InteractionState::AwaitingTarget { source } if source == index => {
                self.state = InteractionState::Idle;
                Selection::Cancelled
            }
            InteractionState::AwaitingTarget { source } => {
                self.state = InteractionState::Idle;
                Selection::Swap { source }
            }
        };
        debug!(index, ?selection, state = ?self.state, "Grid tile selected");
        selection
    }

    pub fn select_own_tile(&mut self, tile: &Tile) -> Selection {
        let selection = match tile.action() {
            Some(TileAction::Swap) => match self.state {
                InteractionState::AwaitingTarget { source } => {
                    self.state = InteractionState::Idle;
                    self.source_required = false;
                    Selection::Swap { source }
                }
                InteractionState::Idle => {
                    self.source_required = !self.source_required;
                    Selection::NeedsSource {
                        armed: self.source_required,
                    }
                }
            },
            Some(TileAction::Discard(name)) => Selection::Discard(name),
            None => Selection::Ignored,
        };
        debug!(tile = %tile.name, ?selection, state = ?self.state, "Own tile selected");
        selection
    }

    /// Back to idle, e.g. after an authoritative update.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.source_required = false;
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    fn tile(name: &str) -> Tile {
        Tile {
            name: String::from(name),
            ..Tile::default()
        }
    }

    #[test]
    fn picking_the_source_twice_cancels() {
        let mut machine = InteractionMachine::new();
        assert_eq!(
            machine.select_grid_tile(3),
            Selection::SourcePicked { source: 3 }
        );
        assert_eq!(
            machine.state(),
            InteractionState::AwaitingTarget { source: 3 }
        );
        assert_eq!(machine.select_grid_tile(3), Selection::Cancelled);
        assert_eq!(machine.state(), InteractionState::Idle);
    }

    #[test]
    fn second_grid_tile_swaps_with_the_first() {
        let mut machine = InteractionMachine::new();
        machine.select_grid_tile(3);
        assert_eq!(machine.select_grid_tile(5), Selection::Swap { source: 3 });
        assert_eq!(machine.state(), InteractionState::Idle);
    }

    #[test]
    fn golden_god_completes_a_pending_swap() {
        let mut machine = InteractionMachine::new();
        machine.select_grid_tile(1);
        assert_eq!(
            machine.select_own_tile(&tile("Golden God")),
            Selection::Swap { source: 1 }
        );
        assert_eq!(machine.state(), InteractionState::Idle);
    }

    #[test]
    fn golden_god_first_arms_the_grid() {
        let mut machine = InteractionMachine::new();
        let god = tile("Golden God");
        assert_eq!(
            machine.select_own_tile(&god),
            Selection::NeedsSource { armed: true }
        );
        assert!(machine.source_required());
        assert_eq!(machine.select_grid_tile(6), Selection::Swap { source: 6 });
        assert!(!machine.source_required());

        machine.select_own_tile(&god);
        assert_eq!(
            machine.select_own_tile(&god),
            Selection::NeedsSource { armed: false }
        );
        assert_eq!(
            machine.select_grid_tile(0),
            Selection::SourcePicked { source: 0 }
        );
    }

    #[test]
    fn monuments_discard_and_others_are_ignored() {
        let mut machine = InteractionMachine::new();
        machine.select_grid_tile(2);
        assert_eq!(
            machine.select_own_tile(&tile("Monument -- Fortress")),
            Selection::Discard(String::from("FORTRESS"))
        );
        assert_eq!(machine.select_own_tile(&tile("Pharaoh")), Selection::Ignored);
        assert_eq!(
            machine.state(),
            InteractionState::AwaitingTarget { source: 2 }
        );
        machine.reset();
        assert_eq!(machine.state(), InteractionState::Idle);
    }

    quickcheck! {
        fn every_swap_follows_one_grid_pick(picks: Vec<(bool, u8)>) -> bool {
            let mut machine = InteractionMachine::new();
            let god = tile("Golden God");
            let mut grid_picks_since_swap = 0;
            for (own, index) in picks {
                let selection = if own {
                    machine.select_own_tile(&god)
                } else {
                    grid_picks_since_swap += 1;
                    machine.select_grid_tile((index % 8) as usize)
                };
                match selection {
                    Selection::Swap { .. } => {
                        if grid_picks_since_swap == 0 {
                            return false;
                        }
                        grid_picks_since_swap = 0;
                    }
                    Selection::Cancelled => grid_picks_since_swap = 0,
                    _ => {}
                }
            }
            true
        }
    }
}
