use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::combatant::{Action, ActionKind, Archetype, Combatant};

/// One action as written in a roster file. `kind` may be omitted, in which
/// case it is inferred from the record's shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(default)]
    pub kind: Option<ActionKind>,
    #[serde(default)]
    pub damage_dice: Option<String>,
    #[serde(default)]
    pub heal_dice: Option<String>,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default)]
    pub uses: Option<u32>,
}

impl ActionDef {
    fn into_action(self) -> Action {
        let kind = self.kind.unwrap_or(match (&self.heal_dice, self.level) {
            (Some(_), Some(_)) => ActionKind::HealSpell,
            (Some(_), None) => ActionKind::Heal,
            (None, Some(_)) => ActionKind::AttackSpell,
            (None, None) => ActionKind::Attack,
        });
        Action {
            name: self.name,
            kind,
            damage_dice: self.damage_dice,
            heal_dice: self.heal_dice,
            attack_bonus: self.attack_bonus,
            level: self.level,
            uses: self.uses,
        }
    }
}

/// One combatant as written in a roster file. Missing numeric fields
/// default to zero; a missing archetype tag means martial.
#[derive(Debug, Clone, Deserialize)]
pub struct CombatantDef {
    pub name: String,
    pub hp: i32,
    pub ac: i32,
    #[serde(default)]
    pub initiative_bonus: i32,
    #[serde(default, alias = "type")]
    pub archetype: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub bonus_actions: Vec<ActionDef>,
    #[serde(default)]
    pub spell_slots: IndexMap<u8, u32>,
}

impl CombatantDef {
    pub fn into_combatant(self) -> Combatant {
        let archetype = match self.archetype.as_deref() {
            None | Some("martial") => Archetype::Martial,
            Some("spellcaster") => Archetype::Spellcaster,
            Some("base") => Archetype::Base,
            Some(other) => {
                tracing::warn!(name = %self.name, tag = other, "unknown archetype tag, treating as inert");
                Archetype::Base
            }
        };

        let mut c = Combatant::new(self.name, self.hp, self.ac);
        c.initiative_bonus = self.initiative_bonus;
        c.archetype = archetype;
        c.actions = self.actions.into_iter().map(ActionDef::into_action).collect();
        c.bonus_actions = self
            .bonus_actions
            .into_iter()
            .map(ActionDef::into_action)
            .collect();
        c.base_spell_slots = self.spell_slots;
        c.reset();
        c
    }
}

pub fn parse_roster_json(text: &str) -> Result<Vec<Combatant>> {
    let defs: Vec<CombatantDef> =
        serde_json::from_str(text).context("failed to parse roster JSON")?;
    Ok(defs.into_iter().map(CombatantDef::into_combatant).collect())
}

pub fn parse_roster_yaml(text: &str) -> Result<Vec<Combatant>> {
    let defs: Vec<CombatantDef> =
        serde_yaml::from_str(text).context("failed to parse roster YAML")?;
    Ok(defs.into_iter().map(CombatantDef::into_combatant).collect())
}

/// Read a roster file, dispatching on extension (`.yaml`/`.yml` vs JSON).
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<Combatant>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read roster: {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => parse_roster_yaml(&text)
            .with_context(|| format!("in roster file {}", path.display())),
        _ => parse_roster_json(&text).with_context(|| format!("in roster file {}", path.display())),
    }
}
