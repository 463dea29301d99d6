//! Per-character periodic updates: class state on the player pulse,
//! regeneration and affect durations on the tick.

use super::PulseReport;
use crate::config::{GameConfig, POISON_TICK_DAMAGE, REGENERATION_TICK_HEAL};
use crate::list::Member;
use crate::world::{AffectChain, AffectKind, CharId, CharRoster, ClassState, Death, Position, World};

/// Runs every character's class update. Damage-over-time effects land on
/// the character's current opponent if it is still in the room.
pub fn player_update(world: &mut World, report: &mut PulseReport) {
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        let character = &mut world.characters[ch];
        if character.dying || character.class == ClassState::None {
            continue;
        }

        let mut class = std::mem::take(&mut character.class);
        let tick = class.update(character);
        character.class = class;

        if tick.opponent_damage <= 0 {
            continue;
        }
        let Some(victim) = character.fighting else {
            continue;
        };
        let room = character.in_room;
        let present = world
            .characters
            .get(victim)
            .is_some_and(|target| target.in_room == room);
        if !present {
            continue;
        }

        let outcome = world.damage(ch, victim, tick.opponent_damage);
        report.class_damage += i64::from(outcome.dealt);
        if outcome.death == Some(Death::Player) {
            report.player_deaths += 1;
        }
    }
}

/// Regenerates hit points, mana and movement, then ages every affect.
///
/// An affect with zero duration left expires; one with a negative
/// duration is permanent. Poison and regeneration apply their per-tick
/// effect after the affect walk, so a death from poison never disturbs
/// the chain being walked.
pub fn char_update(world: &mut World, config: &GameConfig, report: &mut PulseReport) {
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        if world.characters[ch].dying {
            continue;
        }
        regenerate(world, ch, config);

        let (poisoned, regenerating, expired) = age_affects(world, ch);
        report.affects_expired += expired;

        if regenerating {
            let character = &mut world.characters[ch];
            character.hit = (character.hit + REGENERATION_TICK_HEAL).min(character.max_hit);
        }
        if poisoned {
            world.characters[ch].send("You shiver and suffer.");
            if world.hurt(ch, POISON_TICK_DAMAGE) == Some(Death::Player) {
                report.player_deaths += 1;
            }
        }
    }
}

fn regenerate(world: &mut World, ch: CharId, config: &GameConfig) {
    let character = &mut world.characters[ch];
    let rates = if character.position == Position::Fighting {
        config.regen.fighting
    } else {
        config.regen.idle
    };
    let multiplier = match character.position {
        Position::Sleeping => 2,
        _ => 1,
    };
    character.hit = (character.hit + rates.hit * multiplier).min(character.max_hit);
    character.mana = (character.mana + rates.mana * multiplier).min(character.max_mana);
    character.movement =
        (character.movement + rates.movement * multiplier).min(character.max_movement);
}

/// Counts down every affect on `ch`, removing those that expire. Returns
/// whether poison and regeneration are active, and how many expired.
fn age_affects(world: &mut World, ch: CharId) -> (bool, bool, usize) {
    let mut poisoned = false;
    let mut regenerating = false;
    let mut expired = 0;

    let mut walk = world.characters[ch].affects.walk();
    while let Some(affect) = walk.next(&AffectChain::within(&world.affects)) {
        let data = &mut world.affects[affect];
        match data.kind {
            AffectKind::Poison => poisoned = true,
            AffectKind::Regeneration => regenerating = true,
            _ => {}
        }

        if data.duration > 0 {
            data.duration -= 1;
            continue;
        }
        if data.duration < 0 {
            continue;
        }

        let kind = data.kind;
        let next_is_same = walk
            .peek()
            .is_some_and(|next| world.affects[next].kind == kind);
        if world.affect_remove(affect).is_ok() {
            expired += 1;
            if !next_is_same {
                world.characters[ch].send(kind.wear_off());
            }
        }
    }

    (poisoned, regenerating, expired)
}
