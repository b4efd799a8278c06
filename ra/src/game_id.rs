/// Number of hex digits in a game id, which is a UUID.
pub const GAME_ID_HEX_DIGITS: usize = 32;

/// Returns true if `input` looks like a game id.
///
/// Hyphens and whitespace are ignored, so both the hyphenated and the plain
/// hex form of a UUID are accepted.
pub fn is_game_id(input: &str) -> bool {
    let mut num_digits = 0;
    for c in input.chars() {
        if c == '-' || c.is_whitespace() {
            continue;
        }
        if !c.is_ascii_hexdigit() {
            return false;
        }
        num_digits += 1;
    }
    num_digits == GAME_ID_HEX_DIGITS
}

/// Returns true if both ids name the same game, whether or not they are
/// hyphenated.
pub fn same_game_id(a: &str, b: &str) -> bool {
    let digits = |id: &str| {
        id.chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    digits(a) == digits(b)
}
