use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::notation::{DiceExpr, NotationError};
use crate::Dice;

/// Behavioral class of a combatant, selecting its turn strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Base,
    Martial,
    Spellcaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    AttackSpell,
    Heal,
    HealSpell,
    Summon,
    Utility,
}

/// One action or bonus-action definition. Immutable for the duration of an
/// encounter; dice expressions stay as strings and are parsed when rolled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub damage_dice: Option<String>,
    #[serde(default)]
    pub heal_dice: Option<String>,
    #[serde(default)]
    pub attack_bonus: i32,
    /// Spell-slot level consumed on cast.
    #[serde(default)]
    pub level: Option<u8>,
    /// Limited-use pool size (per encounter), tracked by action name.
    #[serde(default)]
    pub uses: Option<u32>,
}

impl Action {
    /// Counts against the one-spell-per-turn rule and the slot pools.
    pub fn is_spell(&self) -> bool {
        self.level.is_some()
            || matches!(
                self.kind,
                ActionKind::AttackSpell | ActionKind::HealSpell | ActionKind::Summon
            )
    }
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub name: String,
    pub max_hp: i32,
    /// May be driven below 0 by damage; clamp to 0 when displaying or summing.
    pub hp: i32,
    pub ac: i32,
    pub initiative_bonus: i32,
    pub archetype: Archetype,
    pub actions: Vec<Action>,
    pub bonus_actions: Vec<Action>,
    /// Configured slot pool; `spell_slots` is restored from this on reset.
    pub base_spell_slots: IndexMap<u8, u32>,
    pub spell_slots: IndexMap<u8, u32>,
    /// Remaining limited uses by action name, rebuilt on reset.
    pub uses: IndexMap<String, u32>,
    pub summon_active: bool,
    /// Encounter-scoped actions gained mid-fight (the summon attack).
    pub derived_bonus_actions: Vec<Action>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, max_hp: i32, ac: i32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            hp: max_hp,
            ac,
            initiative_bonus: 0,
            archetype: Archetype::Base,
            actions: Vec::new(),
            bonus_actions: Vec::new(),
            base_spell_slots: IndexMap::new(),
            spell_slots: IndexMap::new(),
            uses: IndexMap::new(),
            summon_active: false,
            derived_bonus_actions: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn roll_initiative(&self, dice: &mut Dice) -> i32 {
        dice.d20() + self.initiative_bonus
    }

    /// Restore hp and every resource pool to its configured base and drop
    /// encounter-scoped state. Runs before every encounter, not just the first.
    pub fn reset(&mut self) {
        self.hp = self.max_hp;
        self.spell_slots = self.base_spell_slots.clone();
        self.uses.clear();
        for action in self.actions.iter().chain(self.bonus_actions.iter()) {
            if let Some(n) = action.uses {
                self.uses.insert(action.name.clone(), n);
            }
        }
        self.summon_active = false;
        self.derived_bonus_actions.clear();
    }

    pub fn slots_remaining(&self, level: u8) -> u32 {
        self.spell_slots.get(&level).copied().unwrap_or(0)
    }

    /// Spending with nothing left is a silent no-op; counts never go negative.
    pub fn spend_slot(&mut self, level: u8) {
        if let Some(n) = self.spell_slots.get_mut(&level) {
            if *n > 0 {
                *n -= 1;
            }
        }
    }

    pub fn uses_remaining(&self, name: &str) -> u32 {
        self.uses.get(name).copied().unwrap_or(0)
    }

    pub fn spend_use(&mut self, name: &str) {
        if let Some(n) = self.uses.get_mut(name) {
            if *n > 0 {
                *n -= 1;
            }
        }
    }

    /// Whether a slot remains for this action's level (unleveled spells
    /// draw on level 1).
    pub fn can_cast(&self, action: &Action) -> bool {
        self.slots_remaining(action.level.unwrap_or(1)) > 0
    }

    /// Heal up to `amount`, clamped at max hp. Returns the hp actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// One attack roll against `target`. Natural 1 always misses; natural 20
    /// always hits and doubles the rolled damage; otherwise the attack hits
    /// iff `d20 + attack_bonus >= target.ac`. Mutates the target's hp and
    /// returns the narration line.
    pub fn resolve_attack(
        &self,
        action: &Action,
        target: &mut Combatant,
        dice: &mut Dice,
    ) -> Result<String, NotationError> {
        let roll = dice.d20();
        if roll == 1 {
            return Ok(format!(
                "[ATTACK][{}] {} vs {}: d20=1 → MISS (NAT1)",
                self.name, action.name, target.name
            ));
        }

        let total = roll + action.attack_bonus;
        if roll == 20 || total >= target.ac {
            let expr = action.damage_dice.as_deref().unwrap_or("0");
            let mut dmg = DiceExpr::parse(expr)?.roll(dice);
            let crit = roll == 20;
            if crit {
                dmg *= 2;
            }
            target.hp -= dmg;
            Ok(format!(
                "[ATTACK][{}] {} vs {}: d20={} to-hit={} vs AC={} → {} {} damage ({} HP left)",
                self.name,
                action.name,
                target.name,
                roll,
                total,
                target.ac,
                if crit { "CRIT!" } else { "HIT" },
                dmg,
                target.hp.max(0)
            ))
        } else {
            Ok(format!(
                "[ATTACK][{}] {} vs {}: d20={} to-hit={} vs AC={} → MISS",
                self.name, action.name, target.name, roll, total, target.ac
            ))
        }
    }
}
