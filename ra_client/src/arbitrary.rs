use quickcheck::{Arbitrary, Gen};
use ra::{GameSnapshot, GameState, Level, Tile, UpdateEnvelope};

/// A snapshot that can be told apart from others by its round counter.
pub fn snapshot_with_round(round: u32) -> GameSnapshot {
    GameSnapshot {
        player_names: vec![String::from("Alice"), String::from("Bob")],
        game_state: GameState {
            current_round: round,
            auction_tiles: vec![Tile::default(); (round % 9) as usize],
            ..GameState::default()
        },
        ..GameSnapshot::default()
    }
}

/// One inbound update: either a new snapshot, or an error the server
/// reported instead.
#[derive(Clone, Debug)]
pub struct EnvelopeInput(pub UpdateEnvelope);

impl Arbitrary for EnvelopeInput {
    fn arbitrary(g: &mut Gen) -> Self {
        let envelope = if u8::arbitrary(g) % 4 == 0 {
            let level = *g
                .choose(&[Level::Info, Level::Warning, Level::Error])
                .unwrap_or(&Level::Error);
            UpdateEnvelope {
                level: Some(level),
                message: Some(String::from("Only legal actions are: ...")),
                ..UpdateEnvelope::default()
            }
        } else {
            let actor = g.choose(&["Alice", "Bob", "AI 1"]).copied().unwrap_or("Alice");
            UpdateEnvelope {
                game_state: Some(snapshot_with_round(u32::arbitrary(g) % 100)),
                action: Some(String::from("Draw a Tile")),
                username: Some(String::from(actor)),
                ..UpdateEnvelope::default()
            }
        };
        EnvelopeInput(envelope)
    }
}

/// A sequence of updates as they arrive, each with the time in milliseconds
/// since the previous one.
#[derive(Clone, Debug)]
pub struct UpdateSequence {
    pub updates: Vec<(u16, UpdateEnvelope)>,
}

impl UpdateSequence {
    /// The snapshot of the last update that carries one.
    pub fn last_snapshot(&self) -> Option<&GameSnapshot> {
        self.updates
            .iter()
            .rev()
            .find_map(|(_, envelope)| envelope.game_state.as_ref())
    }
}

impl Arbitrary for UpdateSequence {
    fn arbitrary(g: &mut Gen) -> Self {
        let updates = Vec::<(u16, EnvelopeInput)>::arbitrary(g)
            .into_iter()
            .map(|(gap_ms, EnvelopeInput(envelope))| (gap_ms % 4_000, envelope))
            .collect();
        UpdateSequence { updates }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let updates = self.updates.clone();
        Box::new((0..updates.len()).map(move |skip| UpdateSequence {
            updates: updates
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != skip)
                .map(|(_, update)| update.clone())
                .collect(),
        }))
    }
}
