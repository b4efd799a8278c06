use ra::{GameSnapshot, Level, UpdateEnvelope};
use tracing::debug;

/// What applying an envelope did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The snapshot was replaced.
    Applied {
        action: Option<String>,
        actor: Option<String>,
    },
    /// The server reported a problem; the snapshot is untouched.
    Rejected { level: Level, message: String },
    /// Nothing to apply.
    Empty,
}

/// Holds the canonical copy of the game state.
///
/// A snapshot is always replaced as a whole, never merged.
#[derive(Debug, Default)]
pub struct StateReconciler {
    current: Option<GameSnapshot>,
    revision: u64,
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&GameSnapshot> {
        self.current.as_ref()
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn apply(&mut self, snapshot: GameSnapshot) {
        self.current = Some(snapshot);
        self.revision += 1;
        debug!(revision = self.revision, "Applied snapshot");
    }

    pub fn apply_envelope(&mut self, envelope: UpdateEnvelope) -> Reconciled {
        let UpdateEnvelope {
            level,
            message,
            game_state,
            action,
            username,
            ..
        } = envelope;
        match game_state {
            Some(snapshot) => {
                self.apply(snapshot);
                Reconciled::Applied {
                    action,
                    actor: username,
                }
            }
            None if level.is_some() || message.is_some() => Reconciled::Rejected {
                level: level.unwrap_or(Level::Error),
                message: message.unwrap_or_default(),
            },
            None => Reconciled::Empty,
        }
    }

    /// Drops the snapshot, e.g. after leaving the game.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
