//! The nine key combinations an actor can hold during one tick.
//!
//! Moves are named after the keys involved: `W` up/jump, `A` left, `S` down,
//! `D` right, and `N` for no key at all. The run modifier is carried
//! separately as a `bool` next to the move.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::GameMode;
use crate::MoveParseError;

/// Horizontal/vertical key combination for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// No movement keys.
    N,
    /// Left.
    A,
    /// Right.
    D,
    /// Up / jump.
    W,
    /// Up + left.
    WA,
    /// Up + right.
    WD,
    /// Down.
    S,
    /// Down + left.
    SA,
    /// Down + right.
    SD,
}

impl Move {
    /// Every move, in canonical order.
    pub const ALL: [Move; 9] = [
        Move::N,
        Move::A,
        Move::D,
        Move::W,
        Move::WA,
        Move::WD,
        Move::S,
        Move::SA,
        Move::SD,
    ];

    /// Moves that change anything in platformer mode.
    pub const PLATFORMER: [Move; 6] = [Move::N, Move::A, Move::D, Move::W, Move::WA, Move::WD];

    /// Default branching set for a game mode.
    pub fn defaults_for(mode: GameMode) -> &'static [Move] {
        match mode {
            GameMode::Platformer => &Self::PLATFORMER,
            GameMode::Scroller => &Self::ALL,
        }
    }

    /// Horizontal key component: -1 left, 0 none, +1 right.
    pub fn horizontal(self) -> i8 {
        match self {
            Move::A | Move::WA | Move::SA => -1,
            Move::D | Move::WD | Move::SD => 1,
            Move::N | Move::W | Move::S => 0,
        }
    }

    /// Vertical key component: +1 up, 0 none, -1 down.
    pub fn vertical(self) -> i8 {
        match self {
            Move::W | Move::WA | Move::WD => 1,
            Move::S | Move::SA | Move::SD => -1,
            Move::N | Move::A | Move::D => 0,
        }
    }

    /// Build a move from key components. Opposite keys cancel.
    pub fn from_axes(horizontal: i8, vertical: i8) -> Move {
        match (horizontal.signum(), vertical.signum()) {
            (0, 0) => Move::N,
            (-1, 0) => Move::A,
            (1, 0) => Move::D,
            (0, 1) => Move::W,
            (-1, 1) => Move::WA,
            (1, 1) => Move::WD,
            (0, -1) => Move::S,
            (-1, -1) => Move::SA,
            _ => Move::SD,
        }
    }

    /// The run modifier only scales horizontal speed, so running is pointless
    /// without a horizontal key.
    pub fn benefits_from_run(self) -> bool {
        self.horizontal() != 0
    }

    /// Canonical token (`"N"`, `"WA"`, ...).
    pub fn token(self) -> &'static str {
        match self {
            Move::N => "N",
            Move::A => "A",
            Move::D => "D",
            Move::W => "W",
            Move::WA => "WA",
            Move::WD => "WD",
            Move::S => "S",
            Move::SA => "SA",
            Move::SD => "SD",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    /// Accepts key letters in any order and case (`"aw"` is `WA`), plus
    /// `"N"`, `"NONE"` and `"_"` for the empty combination. Opposite keys
    /// cancel each other; repeated or unknown letters are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let upper = token.to_ascii_uppercase();
        if matches!(upper.as_str(), "N" | "NONE" | "_") {
            return Ok(Move::N);
        }
        if upper.is_empty() {
            return Err(MoveParseError::Unrecognized(token.to_owned()));
        }

        let (mut h, mut v) = (0i8, 0i8);
        let mut seen = [false; 4];
        for c in upper.chars() {
            let slot = match c {
                'W' => 0,
                'A' => 1,
                'S' => 2,
                'D' => 3,
                _ => return Err(MoveParseError::Unrecognized(token.to_owned())),
            };
            if seen[slot] {
                return Err(MoveParseError::Unrecognized(token.to_owned()));
            }
            seen[slot] = true;
            match c {
                'W' => v += 1,
                'S' => v -= 1,
                'A' => h -= 1,
                _ => h += 1,
            }
        }
        Ok(Move::from_axes(h, v))
    }
}

// ---------------------------------------------------------------------------
// Token lists
// ---------------------------------------------------------------------------

fn tokens(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}

/// Parse a whitespace/comma separated move list.
///
/// `"all"` (any case) or an empty string yields `None`, meaning "use the
/// mode's default set". Malformed tokens are logged and skipped; duplicates
/// are dropped while preserving first-seen order.
pub fn parse_move_list(input: &str) -> Option<Vec<Move>> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return None;
    }

    let mut moves = Vec::new();
    for token in tokens(trimmed) {
        match token.parse::<Move>() {
            Ok(m) if !moves.contains(&m) => moves.push(m),
            Ok(_) => {}
            Err(e) => tracing::warn!(token, error = %e, "skipping move token"),
        }
    }
    Some(moves)
}

/// A single recorded input: one move and whether run was held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroStep {
    /// Keys held.
    pub mv: Move,
    /// Run modifier held.
    pub run: bool,
}

/// Parse a recorded key macro: move tokens with an optional trailing `*` for
/// "run", e.g. `"D* D* WD* N"`. Malformed tokens are logged and skipped.
pub fn parse_macro(input: &str) -> Vec<MacroStep> {
    let mut steps = Vec::new();
    for token in tokens(input) {
        let (body, run) = match token.strip_suffix('*') {
            Some(body) => (body, true),
            None => (token, false),
        };
        match body.parse::<Move>() {
            Ok(mv) => steps.push(MacroStep { mv, run }),
            Err(e) => tracing::warn!(token, error = %e, "skipping macro token"),
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_display() {
        for m in Move::ALL {
            assert_eq!(m.to_string().parse::<Move>().unwrap(), m);
        }
    }

    #[test]
    fn letter_order_and_case_do_not_matter() {
        assert_eq!("aw".parse::<Move>().unwrap(), Move::WA);
        assert_eq!("DS".parse::<Move>().unwrap(), Move::SD);
        assert_eq!("none".parse::<Move>().unwrap(), Move::N);
    }

    #[test]
    fn opposite_keys_cancel() {
        assert_eq!("AD".parse::<Move>().unwrap(), Move::N);
        assert_eq!("WAD".parse::<Move>().unwrap(), Move::W);
    }

    #[test]
    fn bad_tokens_are_errors() {
        assert!("X".parse::<Move>().is_err());
        assert!("WW".parse::<Move>().is_err());
        assert!("".parse::<Move>().is_err());
    }

    #[test]
    fn move_list_skips_garbage() {
        assert_eq!(parse_move_list("all"), None);
        assert_eq!(parse_move_list("  "), None);
        assert_eq!(
            parse_move_list("D, WD q D A"),
            Some(vec![Move::D, Move::WD, Move::A])
        );
    }

    #[test]
    fn macro_run_suffix() {
        let steps = parse_macro("D* WD ?? N*");
        assert_eq!(
            steps,
            vec![
                MacroStep { mv: Move::D, run: true },
                MacroStep { mv: Move::WD, run: false },
                MacroStep { mv: Move::N, run: true },
            ]
        );
    }

    #[test]
    fn only_horizontal_moves_benefit_from_run() {
        assert!(!Move::W.benefits_from_run());
        assert!(!Move::N.benefits_from_run());
        assert!(Move::SA.benefits_from_run());
    }
}
