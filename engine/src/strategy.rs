use crate::combatant::{Action, ActionKind, Archetype, Combatant};
use crate::notation::{DiceExpr, NotationError};
use crate::Dice;

/// Scoring weight for heals relative to damage.
const HEAL_DISCOUNT: f64 = 0.8;
/// Scoring weight for the bonus-action half of a combo.
const BONUS_DISCOUNT: f64 = 0.8;
/// Scoring weight for spell heals (lower than martial heals).
const SPELL_HEAL_DISCOUNT: f64 = 0.6;
/// Casters only consider healing once an ally drops below this fraction of max hp.
const HURT_THRESHOLD: f64 = 0.6;

/// Per-archetype turn logic. `actor` indexes into `allies`; the returned
/// lines are appended to the encounter narration.
pub trait TurnStrategy {
    fn take_turn(
        &self,
        actor: usize,
        allies: &mut [Combatant],
        enemies: &mut [Combatant],
        dice: &mut Dice,
    ) -> Result<Vec<String>, NotationError>;
}

pub fn strategy_for(archetype: Archetype) -> &'static dyn TurnStrategy {
    match archetype {
        Archetype::Base => &BaseStrategy,
        Archetype::Martial => &MartialStrategy,
        Archetype::Spellcaster => &SpellcasterStrategy,
    }
}

/// Inert archetype: holds its turn. Also the fallback for unrecognized
/// archetype tags.
pub struct BaseStrategy;

impl TurnStrategy for BaseStrategy {
    fn take_turn(
        &self,
        actor: usize,
        allies: &mut [Combatant],
        _enemies: &mut [Combatant],
        _dice: &mut Dice,
    ) -> Result<Vec<String>, NotationError> {
        Ok(vec![format!("[TURN][{}] takes no action", allies[actor].name)])
    }
}

pub struct MartialStrategy;

impl TurnStrategy for MartialStrategy {
    fn take_turn(
        &self,
        actor: usize,
        allies: &mut [Combatant],
        enemies: &mut [Combatant],
        dice: &mut Dice,
    ) -> Result<Vec<String>, NotationError> {
        run_combo_turn(actor, allies, enemies, dice, false)
    }
}

pub struct SpellcasterStrategy;

impl TurnStrategy for SpellcasterStrategy {
    fn take_turn(
        &self,
        actor: usize,
        allies: &mut [Combatant],
        enemies: &mut [Combatant],
        dice: &mut Dice,
    ) -> Result<Vec<String>, NotationError> {
        run_combo_turn(actor, allies, enemies, dice, true)
    }
}

fn run_combo_turn(
    actor: usize,
    allies: &mut [Combatant],
    enemies: &mut [Combatant],
    dice: &mut Dice,
    caster: bool,
) -> Result<Vec<String>, NotationError> {
    if living_indices(enemies).is_empty() {
        return Ok(vec![format!("[TURN][{}] has no targets", allies[actor].name)]);
    }

    let Some((action, bonus)) = choose_combo(actor, allies, caster)? else {
        return Ok(vec![format!("[TURN][{}] takes no action", allies[actor].name)]);
    };

    let mut lines = Vec::new();
    if let Some(a) = action {
        perform(actor, allies, enemies, &a, dice, caster, &mut lines)?;
    }
    if let Some(b) = bonus {
        perform(actor, allies, enemies, &b, dice, caster, &mut lines)?;
    }
    Ok(lines)
}

/// Score every {action or none} × {bonus action or none} pairing (both-none
/// excluded) and clone out the first strictly-best one. Returns None when the
/// actor has nothing to pick from at all.
fn choose_combo(
    actor: usize,
    allies: &[Combatant],
    caster: bool,
) -> Result<Option<(Option<Action>, Option<Action>)>, NotationError> {
    let me = &allies[actor];
    let n_bonus = me.bonus_actions.len() + me.derived_bonus_actions.len();

    let mut best: Option<(f64, Option<usize>, Option<usize>)> = None;
    for a in (0..me.actions.len()).map(Some).chain(std::iter::once(None)) {
        for b in (0..n_bonus).map(Some).chain(std::iter::once(None)) {
            if a.is_none() && b.is_none() {
                continue;
            }
            let action = a.map(|i| &me.actions[i]);
            let bonus = b.map(|i| bonus_option(me, i));

            // Hard rule for casters: at most one spell per turn.
            if caster {
                let spells = action.is_some_and(Action::is_spell) as u8
                    + bonus.is_some_and(|x| x.is_spell()) as u8;
                if spells > 1 {
                    continue;
                }
            }

            let mut score = 0.0;
            if let Some(x) = action {
                score += action_value(x, me, allies, caster)?;
            }
            if let Some(x) = bonus {
                score += action_value(x, me, allies, caster)? * BONUS_DISCOUNT;
            }
            if best.is_none_or(|(s, _, _)| score > s) {
                best = Some((score, a, b));
            }
        }
    }

    Ok(best.map(|(score, a, b)| {
        tracing::debug!(actor = %me.name, score, "combo chosen");
        (
            a.map(|i| me.actions[i].clone()),
            b.map(|i| bonus_option(me, i).clone()),
        )
    }))
}

/// Bonus-action candidates: the configured list followed by any actions
/// derived during this encounter.
fn bonus_option(c: &Combatant, i: usize) -> &Action {
    if i < c.bonus_actions.len() {
        &c.bonus_actions[i]
    } else {
        &c.derived_bonus_actions[i - c.bonus_actions.len()]
    }
}

/// Expected value of one action for the scoring heuristic: attacks score
/// their damage average, heals a discounted heal average, everything else 0.
/// Exhausted limited-use actions and uncastable spells score 0; caster heals
/// also need an ally below the hurt threshold.
fn action_value(
    action: &Action,
    actor: &Combatant,
    allies: &[Combatant],
    caster: bool,
) -> Result<f64, NotationError> {
    if action.uses.is_some() && actor.uses_remaining(&action.name) == 0 {
        return Ok(0.0);
    }

    if let Some(heal) = &action.heal_dice {
        if caster {
            let hurt_ally = allies
                .iter()
                .any(|a| a.is_alive() && f64::from(a.hp) < f64::from(a.max_hp) * HURT_THRESHOLD);
            let slot_ok = !action.is_spell() || actor.can_cast(action);
            if hurt_ally && slot_ok {
                return Ok(DiceExpr::parse(heal)?.average() * SPELL_HEAL_DISCOUNT);
            }
            return Ok(0.0);
        }
        return Ok(DiceExpr::parse(heal)?.average() * HEAL_DISCOUNT);
    }

    if let Some(damage) = &action.damage_dice {
        if caster && action.is_spell() && !actor.can_cast(action) {
            return Ok(0.0);
        }
        return Ok(DiceExpr::parse(damage)?.average());
    }

    Ok(0.0)
}

fn living_indices(side: &[Combatant]) -> Vec<usize> {
    side.iter()
        .enumerate()
        .filter(|(_, c)| c.is_alive())
        .map(|(i, _)| i)
        .collect()
}

/// Attack a uniformly random living enemy. Returns None when none remain
/// (the rest of the turn's actions fizzle quietly).
fn attack_random(
    actor: usize,
    allies: &[Combatant],
    enemies: &mut [Combatant],
    action: &Action,
    dice: &mut Dice,
) -> Result<Option<String>, NotationError> {
    let targets = living_indices(enemies);
    if targets.is_empty() {
        return Ok(None);
    }
    let t = targets[dice.pick(targets.len())];
    Ok(Some(allies[actor].resolve_attack(
        action,
        &mut enemies[t],
        dice,
    )?))
}

/// Heal a uniformly random living ally below full hp, if any.
fn heal_random(
    healer: &str,
    allies: &mut [Combatant],
    action: &Action,
    dice: &mut Dice,
) -> Result<Option<String>, NotationError> {
    let hurt: Vec<usize> = allies
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_alive() && a.hp < a.max_hp)
        .map(|(i, _)| i)
        .collect();
    if hurt.is_empty() {
        return Ok(None);
    }
    let t = hurt[dice.pick(hurt.len())];
    let amount = DiceExpr::parse(action.heal_dice.as_deref().unwrap_or("0"))?.roll(dice);
    let gained = allies[t].heal(amount);
    Ok(Some(format!(
        "[HEAL][{}] {} on {}: +{} HP ({}/{})",
        healer,
        action.name,
        allies[t].name,
        gained,
        allies[t].hp.max(0),
        allies[t].max_hp
    )))
}

/// Execute one chosen action or bonus action. Spell attacks and heals spend
/// exactly one slot of their level; a limited-use action spends one use when
/// it actually did something.
fn perform(
    actor: usize,
    allies: &mut [Combatant],
    enemies: &mut [Combatant],
    action: &Action,
    dice: &mut Dice,
    caster: bool,
    lines: &mut Vec<String>,
) -> Result<(), NotationError> {
    let name = allies[actor].name.clone();
    let before = lines.len();

    match action.kind {
        ActionKind::Summon if caster => {
            if allies[actor].summon_active {
                lines.push(format!(
                    "[SUMMON][{}] {} is already active",
                    name, action.name
                ));
            } else if allies[actor].can_cast(action) {
                allies[actor].spend_slot(action.level.unwrap_or(1));
                allies[actor].summon_active = true;
                allies[actor].derived_bonus_actions.push(Action {
                    name: format!("{} Attack", action.name),
                    kind: ActionKind::Attack,
                    damage_dice: action.damage_dice.clone(),
                    heal_dice: None,
                    attack_bonus: action.attack_bonus,
                    level: None,
                    uses: None,
                });
                lines.push(format!("[SUMMON][{}] calls forth {}", name, action.name));
                if let Some(line) = attack_random(actor, allies, enemies, action, dice)? {
                    lines.push(line);
                }
            }
            // Inactive with no slot left: the turn component fizzles.
        }
        _ if action.heal_dice.is_some() => {
            if caster && action.is_spell() {
                if allies[actor].can_cast(action) {
                    if let Some(line) = heal_random(&name, allies, action, dice)? {
                        allies[actor].spend_slot(action.level.unwrap_or(1));
                        lines.push(line);
                    }
                }
            } else if let Some(line) = heal_random(&name, allies, action, dice)? {
                lines.push(line);
            }
        }
        _ if action.damage_dice.is_some() => {
            if caster && action.is_spell() {
                if allies[actor].can_cast(action) {
                    allies[actor].spend_slot(action.level.unwrap_or(1));
                    if let Some(line) = attack_random(actor, allies, enemies, action, dice)? {
                        lines.push(line);
                    }
                }
            } else if let Some(line) = attack_random(actor, allies, enemies, action, dice)? {
                lines.push(line);
            }
        }
        _ => lines.push(format!("[TURN][{}] uses {}", name, action.name)),
    }

    if action.uses.is_some() && lines.len() > before {
        allies[actor].spend_use(&action.name);
    }
    Ok(())
}
