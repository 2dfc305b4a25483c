use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod aggregate;
pub mod combatant;
pub mod encounter;
pub mod notation;
pub mod roster;
pub mod strategy;

pub use aggregate::{run_encounters, RunSummary, DEFAULT_TRIALS};
pub use combatant::{Action, ActionKind, Archetype, Combatant};
pub use encounter::{simulate_encounter, EncounterResult, Outcome};
pub use notation::{roll_dice, DiceExpr, NotationError};
pub use roster::{load_roster, parse_roster_json, parse_roster_yaml, CombatantDef};
pub use strategy::{strategy_for, TurnStrategy};

enum Source {
    Rng(ChaCha8Rng),
    Scripted { rolls: Vec<i32>, next: usize },
}

/// The single random source every roll in the engine draws from.
/// Passing `&mut Dice` down the call chain keeps draw order sequential,
/// so a seeded run replays exactly.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_entropy() -> Self {
        Self {
            source: Source::Rng(ChaCha8Rng::from_entropy()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Rng(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Scripted dice for tests: every draw pops the next value in order
    /// (clamped into the die's range), and repeats 1 once the script runs out.
    pub fn from_scripted(rolls: Vec<i32>) -> Self {
        Self {
            source: Source::Scripted { rolls, next: 0 },
        }
    }

    pub fn d20(&mut self) -> i32 {
        self.die(20)
    }

    /// Uniform draw in `1..=sides`.
    pub fn die(&mut self, sides: i32) -> i32 {
        let sides = sides.max(1);
        match &mut self.source {
            Source::Rng(rng) => rng.gen_range(1..=sides),
            Source::Scripted { rolls, next } => {
                let v = rolls.get(*next).copied().unwrap_or(1);
                *next += 1;
                v.clamp(1, sides)
            }
        }
    }

    /// Uniform index in `0..len`, for random target/ally selection.
    /// A single candidate is returned without consuming a draw.
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from an empty candidate list");
        if len <= 1 {
            return 0;
        }
        match &mut self.source {
            Source::Rng(rng) => rng.gen_range(0..len),
            Source::Scripted { rolls, next } => {
                let v = rolls.get(*next).copied().unwrap_or(0);
                *next += 1;
                (v.max(0) as usize) % len
            }
        }
    }
}
