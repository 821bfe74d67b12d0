//! Per-tick input as delivered by the input/network layer.

use std::collections::BTreeSet;
use std::str::FromStr;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use strider_core::moves::{MacroStep, Move};

/// A movement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Key {
    type Err = String;

    /// Accepts key names (`"up"`) and the usual letters (`"w"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Ok(Key::Up),
            "down" | "s" => Ok(Key::Down),
            "left" | "a" => Ok(Key::Left),
            "right" | "d" => Ok(Key::Right),
            other => Err(other.to_owned()),
        }
    }
}

/// Everything the simulation receives for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInput {
    /// Movement keys held this tick.
    pub keys: BTreeSet<Key>,
    /// Run modifier held.
    pub run: bool,
    /// Seed for stochastic game logic outside the physics core.
    pub random_seed: u64,
    /// Authoritative input that must not cancel queued playback.
    pub force_keys: bool,
}

impl TickInput {
    /// No keys held.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn pressing(keys: &[Key]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Parse key names, logging and skipping the ones that are not keys.
    pub fn from_key_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keys = BTreeSet::new();
        for name in names {
            match name.parse::<Key>() {
                Ok(key) => {
                    keys.insert(key);
                }
                Err(token) => tracing::warn!(token = %token, "skipping unknown key"),
            }
        }
        Self {
            keys,
            ..Self::default()
        }
    }

    /// The keys that produce `mv`.
    pub fn from_move(mv: Move, run: bool) -> Self {
        let mut keys = BTreeSet::new();
        match mv.horizontal() {
            h if h < 0 => {
                keys.insert(Key::Left);
            }
            h if h > 0 => {
                keys.insert(Key::Right);
            }
            _ => {}
        }
        match mv.vertical() {
            v if v > 0 => {
                keys.insert(Key::Up);
            }
            v if v < 0 => {
                keys.insert(Key::Down);
            }
            _ => {}
        }
        Self {
            keys,
            run,
            ..Self::default()
        }
    }

    /// An authoritative input replaying `step`.
    pub fn forced(step: MacroStep) -> Self {
        Self {
            force_keys: true,
            ..Self::from_move(step.mv, step.run)
        }
    }

    pub fn with_run(mut self, run: bool) -> Self {
        self.run = run;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// No movement key held.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key combination as a [`Move`]. Opposite keys cancel.
    pub fn to_move(&self) -> Move {
        let axis = |pos: Key, neg: Key| {
            i8::from(self.keys.contains(&pos)) - i8::from(self.keys.contains(&neg))
        };
        Move::from_axes(axis(Key::Right, Key::Left), axis(Key::Up, Key::Down))
    }

    pub fn to_macro(&self) -> MacroStep {
        MacroStep {
            mv: self.to_move(),
            run: self.run,
        }
    }

    /// Deterministic generator for this tick's game logic.
    pub fn rng(&self) -> Pcg64 {
        Pcg64::seed_from_u64(self.random_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn keys_map_to_moves() {
        assert_eq!(TickInput::idle().to_move(), Move::N);
        assert_eq!(
            TickInput::pressing(&[Key::Up, Key::Left]).to_move(),
            Move::WA
        );
        assert_eq!(
            TickInput::pressing(&[Key::Left, Key::Right]).to_move(),
            Move::N
        );
        assert_eq!(
            TickInput::pressing(&[Key::Down, Key::Right]).to_move(),
            Move::SD
        );
    }

    #[test]
    fn from_move_round_trips() {
        for mv in Move::ALL {
            assert_eq!(TickInput::from_move(mv, false).to_move(), mv);
        }
    }

    #[test]
    fn unknown_key_names_are_skipped() {
        let input = TickInput::from_key_names(["w", "jump", "RIGHT"]);
        assert_eq!(input.to_move(), Move::WD);
    }

    #[test]
    fn same_seed_same_stream() {
        let input = TickInput::idle().with_seed(42);
        let a: Vec<u32> = (0..4).map(|_| input.rng().gen()).collect();
        let mut rng = input.rng();
        let first: u32 = rng.gen();
        assert_eq!(a[0], first);
        assert!(a.iter().all(|&v| v == first));

        let other: u32 = TickInput::idle().with_seed(43).rng().gen();
        assert_ne!(first, other);
    }

    #[test]
    fn forced_input_keeps_step() {
        let step = MacroStep {
            mv: Move::WD,
            run: true,
        };
        let input = TickInput::forced(step);
        assert!(input.force_keys);
        assert_eq!(input.to_macro(), step);
    }
}
