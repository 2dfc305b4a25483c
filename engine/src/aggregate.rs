use std::time::Instant;

use serde::Serialize;

use crate::combatant::Combatant;
use crate::encounter::{simulate_encounter, EncounterResult, Outcome};
use crate::notation::NotationError;
use crate::Dice;

pub const DEFAULT_TRIALS: u32 = 500;

/// Aggregate statistics over a batch of simulated encounters.
///
/// Average remaining hp is taken over all trials, wins, losses and draws
/// alike (not only over encounters the side won).
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub trials: u32,
    pub party_wins: u32,
    pub monster_wins: u32,
    pub draws: u32,
    pub avg_party_hp: f64,
    pub avg_monster_hp: f64,
    pub seconds: f64,
}

impl RunSummary {
    pub fn percent(&self, count: u32) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            f64::from(count) * 100.0 / f64::from(self.trials)
        }
    }
}

/// Run `trials` encounters against the same rosters, resetting combatants
/// each time. `on_encounter` is called once per finished encounter (1-based
/// index) so the caller can persist each narration log; a dice parse error
/// aborts the whole batch.
pub fn run_encounters(
    party: &mut [Combatant],
    monsters: &mut [Combatant],
    trials: u32,
    dice: &mut Dice,
    mut on_encounter: impl FnMut(u32, &EncounterResult),
) -> Result<RunSummary, NotationError> {
    let start = Instant::now();
    let mut party_wins = 0u32;
    let mut monster_wins = 0u32;
    let mut draws = 0u32;
    let mut party_hp_total = 0i64;
    let mut monsters_hp_total = 0i64;

    for trial in 1..=trials {
        let result = simulate_encounter(party, monsters, dice)?;
        tracing::debug!(
            trial,
            outcome = result.outcome.as_str(),
            rounds = result.rounds,
            "encounter finished"
        );
        match result.outcome {
            Outcome::Party => party_wins += 1,
            Outcome::Monsters => monster_wins += 1,
            Outcome::Draw => draws += 1,
        }
        party_hp_total += i64::from(result.party_hp);
        monsters_hp_total += i64::from(result.monsters_hp);
        on_encounter(trial, &result);
    }

    let denom = f64::from(trials.max(1));
    Ok(RunSummary {
        trials,
        party_wins,
        monster_wins,
        draws,
        avg_party_hp: party_hp_total as f64 / denom,
        avg_monster_hp: monsters_hp_total as f64 / denom,
        seconds: start.elapsed().as_secs_f64(),
    })
}
