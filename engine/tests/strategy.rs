use engine::{strategy_for, Action, ActionKind, Archetype, Combatant, Dice, TurnStrategy};

fn attack(name: &str, dice: &str, bonus: i32) -> Action {
    Action {
        name: name.to_string(),
        kind: ActionKind::Attack,
        damage_dice: Some(dice.to_string()),
        heal_dice: None,
        attack_bonus: bonus,
        level: None,
        uses: None,
    }
}

fn heal(name: &str, dice: &str) -> Action {
    Action {
        name: name.to_string(),
        kind: ActionKind::Heal,
        damage_dice: None,
        heal_dice: Some(dice.to_string()),
        attack_bonus: 0,
        level: None,
        uses: None,
    }
}

fn martial(name: &str, hp: i32, ac: i32) -> Combatant {
    let mut c = Combatant::new(name, hp, ac);
    c.archetype = Archetype::Martial;
    c
}

fn caster(name: &str, hp: i32, ac: i32) -> Combatant {
    let mut c = Combatant::new(name, hp, ac);
    c.archetype = Archetype::Spellcaster;
    c
}

fn dummy() -> Combatant {
    Combatant::new("Dummy", 30, 5)
}

fn take_turn(
    party: &mut Vec<Combatant>,
    monsters: &mut Vec<Combatant>,
    dice: &mut Dice,
) -> Vec<String> {
    let archetype = party[0].archetype;
    strategy_for(archetype)
        .take_turn(0, party, monsters, dice)
        .unwrap()
}

#[test]
fn martial_picks_the_highest_average_combo() {
    let mut hero = martial("Hero", 20, 10);
    hero.actions.push(attack("Jab", "1d4", 0));
    hero.actions.push(attack("Smash", "2d6+3", 0));
    let mut party = vec![hero];
    let mut monsters = vec![dummy()];

    let mut dice = Dice::from_scripted(vec![10, 6, 6]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Smash"), "{lines:?}");
    assert_eq!(monsters[0].hp, 30 - (6 + 6 + 3));
}

#[test]
fn martial_prefers_a_big_heal_over_a_weak_attack() {
    let mut hero = martial("Hero", 20, 10);
    hero.actions.push(attack("Jab", "1d4", 0));
    hero.actions.push(heal("Mend", "3d8"));
    let mut ally = martial("Ally", 20, 10);
    ally.hp = 5;
    let mut party = vec![hero, ally];
    let mut monsters = vec![dummy()];

    let mut dice = Dice::from_scripted(vec![8, 8, 8]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);

    assert!(lines[0].contains("[HEAL]") && lines[0].contains("Mend"), "{lines:?}");
    assert_eq!(party[1].hp, 20, "heal is clamped at max hp");
    assert_eq!(monsters[0].hp, 30);
}

#[test]
fn martial_reports_no_targets_when_enemies_are_down() {
    let mut hero = martial("Hero", 20, 10);
    hero.actions.push(attack("Jab", "1d4", 0));
    let mut party = vec![hero];
    let mut corpse = dummy();
    corpse.hp = 0;
    let mut monsters = vec![corpse];

    let mut dice = Dice::from_scripted(vec![]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert_eq!(lines, vec!["[TURN][Hero] has no targets".to_string()]);
}

#[test]
fn base_archetype_is_inert() {
    let mut party = vec![Combatant::new("Bystander", 10, 10)];
    let mut monsters = vec![dummy()];
    let mut dice = Dice::from_scripted(vec![]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert_eq!(lines, vec!["[TURN][Bystander] takes no action".to_string()]);
    assert_eq!(monsters[0].hp, 30);
}

#[test]
fn caster_never_spends_two_spells_in_one_turn() {
    let mut mage = caster("Mage", 20, 12);
    let mut scorch = attack("Scorch", "8d6", 5);
    scorch.kind = ActionKind::AttackSpell;
    scorch.level = Some(1);
    mage.actions.push(scorch);
    let mut cure = heal("Cure", "8d6");
    cure.kind = ActionKind::HealSpell;
    cure.level = Some(1);
    mage.bonus_actions.push(cure);
    mage.base_spell_slots.insert(1, 2);
    mage.reset();

    let mut ally = martial("Ally", 20, 10);
    ally.hp = 5; // hurt enough that the heal is in play
    let mut party = vec![mage, ally];
    let mut monsters = vec![dummy()];

    let mut dice = Dice::from_scripted(vec![10]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);

    assert_eq!(party[0].slots_remaining(1), 1, "exactly one slot spent");
    assert!(lines.iter().any(|l| l.contains("Scorch")), "{lines:?}");
    assert!(!lines.iter().any(|l| l.contains("[HEAL]")), "{lines:?}");
}

#[test]
fn caster_without_slots_cannot_cast() {
    let mut mage = caster("Mage", 20, 12);
    let mut scorch = attack("Scorch", "8d6", 5);
    scorch.kind = ActionKind::AttackSpell;
    scorch.level = Some(1);
    mage.actions.push(scorch);
    mage.reset();
    let mut party = vec![mage];
    let mut monsters = vec![dummy()];

    let mut dice = Dice::from_scripted(vec![10]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);

    assert!(lines.is_empty(), "{lines:?}");
    assert_eq!(monsters[0].hp, 30);
}

#[test]
fn summon_activates_once_then_attacks_through_its_derived_action() {
    let mut cleric = caster("Cleric", 25, 14);
    let mut summon = attack("Spirit Blade", "1d8+3", 4);
    summon.kind = ActionKind::Summon;
    summon.level = Some(2);
    cleric.bonus_actions.push(summon);
    cleric.base_spell_slots.insert(2, 1);
    cleric.reset();
    let mut party = vec![cleric];
    let mut monsters = vec![dummy()];

    // Turn 1: cast, gain the persistent attack, strike immediately.
    let mut dice = Dice::from_scripted(vec![10, 8]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert!(lines.iter().any(|l| l.contains("calls forth Spirit Blade")), "{lines:?}");
    assert!(party[0].summon_active);
    assert_eq!(party[0].derived_bonus_actions.len(), 1);
    assert_eq!(party[0].derived_bonus_actions[0].name, "Spirit Blade Attack");
    assert_eq!(party[0].slots_remaining(2), 0);
    assert_eq!(monsters[0].hp, 30 - (8 + 3));

    // Turn 2: no slot left, so the derived attack carries the bonus action.
    let mut dice = Dice::from_scripted(vec![10, 8]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert!(lines.iter().any(|l| l.contains("Spirit Blade Attack")), "{lines:?}");
    assert_eq!(party[0].derived_bonus_actions.len(), 1, "no second copy");
    assert_eq!(monsters[0].hp, 30 - 2 * (8 + 3));

    // Reset drops the derived action and the active flag.
    party[0].reset();
    assert!(!party[0].summon_active);
    assert!(party[0].derived_bonus_actions.is_empty());
    assert_eq!(party[0].slots_remaining(2), 1);
}

#[test]
fn re_choosing_an_active_summon_has_no_effect() {
    let mut cleric = caster("Cleric", 25, 14);
    let mut summon = attack("Spirit Blade", "1d8+3", 4);
    summon.kind = ActionKind::Summon;
    summon.level = Some(2);
    cleric.bonus_actions.push(summon);
    cleric.base_spell_slots.insert(2, 2);
    cleric.reset();
    let mut party = vec![cleric];
    let mut monsters = vec![dummy()];

    let mut dice = Dice::from_scripted(vec![10, 8]);
    take_turn(&mut party, &mut monsters, &mut dice);
    assert!(party[0].summon_active);
    assert_eq!(party[0].slots_remaining(2), 1);

    // Slots remain, so the summon still outscores nothing-better and is
    // re-chosen; it just reports itself active.
    let mut dice = Dice::from_scripted(vec![]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert!(lines.iter().any(|l| l.contains("already active")), "{lines:?}");
    assert_eq!(party[0].slots_remaining(2), 1, "no slot burned");
    assert_eq!(party[0].derived_bonus_actions.len(), 1);
}

#[test]
fn exhausted_limited_use_actions_drop_out_of_scoring() {
    let mut hero = martial("Hero", 20, 10);
    let mut smash = attack("Smash", "100", 0);
    smash.uses = Some(1);
    hero.actions.push(smash);
    hero.actions.push(attack("Jab", "1d4", 0));
    hero.reset();
    let mut party = vec![hero];
    let mut big = dummy();
    big.max_hp = 300;
    big.hp = 300;
    let mut monsters = vec![big];

    let mut dice = Dice::from_scripted(vec![10]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert!(lines[0].contains("Smash"), "{lines:?}");
    assert_eq!(party[0].uses_remaining("Smash"), 0);

    let mut dice = Dice::from_scripted(vec![10, 4]);
    let lines = take_turn(&mut party, &mut monsters, &mut dice);
    assert!(lines[0].contains("Jab"), "{lines:?}");
}
