use crate::GameSnapshot;

/// A short text rendering of a snapshot: the round, whose turn it is, the
/// auction grid with 1-based tile numbers, and every player's sun and points.
pub fn visualize_snapshot(snapshot: &GameSnapshot) -> String {
    let state = &snapshot.game_state;
    let mut result = format!(
        "Round {}/{}, Ra {}/{}, center sun {}",
        state.current_round,
        state.total_rounds,
        state.num_ras_this_round,
        state.num_ras_per_round,
        state.center_sun
    );
    if state.game_ended {
        result += ", game over";
    } else if let Some(name) = snapshot.current_player_name() {
        result += &format!(", {} to play", name);
    }
    if state.auction_started {
        result += " (auction running)";
    }

    // Draw the auction grid
    let cells: Vec<String> = state
        .auction_tiles
        .iter()
        .enumerate()
        .map(|(idx, tile)| format!("{}:{}", idx + 1, tile.short_name()))
        .collect();
    let width = cells.iter().map(|c| c.chars().count() + 1).sum::<usize>().max(1);
    result += "\n╭";
    result += &"─".repeat(width);
    result += "╮\n│";
    for cell in &cells {
        result += &format!("{} ", cell);
    }
    if cells.is_empty() {
        result += " ";
    }
    result += "│\n╰";
    result += &"─".repeat(width);
    result += "╯";

    for player in &state.player_states {
        result += &format!(
            "\n{:>12} {:>4} pts  sun {:?}  used {:?}  tiles {}",
            player.player_name,
            player.points,
            player.usable_sun,
            player.unusable_sun,
            player.collection.len()
        );
    }
    result
}
