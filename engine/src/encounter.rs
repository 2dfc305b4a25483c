use serde::Serialize;

use crate::combatant::Combatant;
use crate::notation::NotationError;
use crate::strategy::strategy_for;
use crate::Dice;

/// Terminal classification of one encounter. Exactly one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Party,
    Monsters,
    Draw,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Party => "party",
            Outcome::Monsters => "monsters",
            Outcome::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncounterResult {
    pub outcome: Outcome,
    pub rounds: u32,
    /// Full narration: initiative, per-turn lines, round hp snapshots, end line.
    pub log: Vec<String>,
    /// Remaining hp summed over the side, clamped at 0 per combatant.
    pub party_hp: i32,
    pub monsters_hp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Party,
    Monsters,
}

/// Run one encounter to its terminal outcome. Every combatant is reset
/// first, so rosters can be reused across any number of calls. Initiative
/// is rolled once and the resulting order holds for the whole encounter.
pub fn simulate_encounter(
    party: &mut [Combatant],
    monsters: &mut [Combatant],
    dice: &mut Dice,
) -> Result<EncounterResult, NotationError> {
    for c in party.iter_mut().chain(monsters.iter_mut()) {
        c.reset();
    }

    let mut order: Vec<(Side, usize, i32)> = Vec::with_capacity(party.len() + monsters.len());
    for (i, c) in party.iter().enumerate() {
        order.push((Side::Party, i, c.roll_initiative(dice)));
    }
    for (i, c) in monsters.iter().enumerate() {
        order.push((Side::Monsters, i, c.roll_initiative(dice)));
    }
    // Stable sort: initiative ties keep roster order.
    order.sort_by(|a, b| b.2.cmp(&a.2));

    let mut log = Vec::new();
    log.push("[INIT] initiative order:".to_string());
    for &(side, idx, roll) in &order {
        let c = match side {
            Side::Party => &party[idx],
            Side::Monsters => &monsters[idx],
        };
        log.push(format!(
            "[INIT]   {} rolls {} (bonus {:+})",
            c.name, roll, c.initiative_bonus
        ));
    }

    let mut rounds = 0u32;
    while party.iter().any(|c| c.is_alive()) && monsters.iter().any(|c| c.is_alive()) {
        rounds += 1;
        log.push(format!("[ROUND] {}", rounds));

        for &(side, idx, _) in &order {
            let (allies, enemies) = match side {
                Side::Party => (&mut *party, &mut *monsters),
                Side::Monsters => (&mut *monsters, &mut *party),
            };
            if !allies[idx].is_alive() {
                continue;
            }
            // One side wiped mid-round ends the round, not just this turn.
            if !enemies.iter().any(|c| c.is_alive()) {
                break;
            }
            let lines = strategy_for(allies[idx].archetype).take_turn(idx, allies, enemies, dice)?;
            log.extend(lines);
        }

        log.push("[HP] party:".to_string());
        for c in party.iter() {
            log.push(format!("[HP]   {}: {}/{}", c.name, c.hp.max(0), c.max_hp));
        }
        log.push("[HP] monsters:".to_string());
        for c in monsters.iter() {
            log.push(format!("[HP]   {}: {}/{}", c.name, c.hp.max(0), c.max_hp));
        }
    }

    let party_alive = party.iter().any(|c| c.is_alive());
    let monsters_alive = monsters.iter().any(|c| c.is_alive());
    let outcome = if party_alive && !monsters_alive {
        Outcome::Party
    } else if monsters_alive && !party_alive {
        Outcome::Monsters
    } else {
        Outcome::Draw
    };
    log.push(match outcome {
        Outcome::Party => "[END] the party is victorious".to_string(),
        Outcome::Monsters => "[END] the party has been defeated".to_string(),
        Outcome::Draw => "[END] the battle ends in a draw".to_string(),
    });

    Ok(EncounterResult {
        outcome,
        rounds,
        log,
        party_hp: party.iter().map(|c| c.hp.max(0)).sum(),
        monsters_hp: monsters.iter().map(|c| c.hp.max(0)).sum(),
    })
}
