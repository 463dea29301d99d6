//! # Class Ability State
//!
//! Each class keeps its timers and stacks in named fields of its own
//! variant. The periodic update runs once per player pulse: the class
//! resource builds while fighting and decays at rest, buff counters tick
//! down and fire their expiry exactly once, and damage-over-time effects
//! report damage for the scheduler to apply to the current opponent.

use super::entities::{AffectFlags, CharId, Character, Position};
use serde::{Deserialize, Serialize};

/// Resonance ceiling for dirgesingers.
pub const RESONANCE_CAP: i32 = 100;
/// Focus ceiling for psions.
pub const FOCUS_CAP: i32 = 100;
/// Base power ceiling for mechanists.
pub const POWER_CAP: i32 = 150;

const DIRGE_TICK_DAMAGE: i32 = 50;
const WARSONG_MANA_DRAIN: i32 = 25;
const CORE_POWER_BONUS_CAP: i32 = 25;
const CORE_POWER_BONUS_TICK: i32 = 1;
const CORE_REGEN_HP: i32 = 100;
const REPAIR_SWARM_HEAL: i32 = 100;

/// What a class update asks the scheduler to do on its behalf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassTick {
    /// Damage to deal to the character's current opponent
    pub opponent_damage: i32,
}

/// Per-class ability state, selected by the character's class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ClassState {
    #[default]
    None,
    Dirgesinger(Dirgesinger),
    Psion(Psion),
    Mechanist(Mechanist),
}

impl ClassState {
    pub fn dirgesinger() -> Self {
        ClassState::Dirgesinger(Dirgesinger::default())
    }

    pub fn psion() -> Self {
        ClassState::Psion(Psion::default())
    }

    pub fn mechanist() -> Self {
        ClassState::Mechanist(Mechanist::default())
    }

    /// Runs one periodic update against the character owning this state.
    ///
    /// The state must have been taken out of `ch.class` for the duration
    /// of the call.
    pub fn update(&mut self, ch: &mut Character) -> ClassTick {
        match self {
            ClassState::None => ClassTick::default(),
            ClassState::Dirgesinger(state) => state.update(ch),
            ClassState::Psion(state) => state.update(ch),
            ClassState::Mechanist(state) => state.update(ch),
        }
    }

    /// Extra melee damage granted by active buffs.
    pub fn damage_bonus(&self) -> i32 {
        match self {
            ClassState::Dirgesinger(state) if state.battlehymn > 0 => 10,
            ClassState::Mechanist(state) if state.servo_arms > 0 => 15,
            _ => 0,
        }
    }

    /// Lets shields soak incoming damage; returns what gets through.
    pub fn absorb(&mut self, damage: i32) -> i32 {
        match self {
            ClassState::Psion(state) => {
                let mut remaining = damage;
                for pool in [&mut state.thought_shield_hp, &mut state.kinetic_barrier_hp] {
                    let soaked = remaining.min(*pool);
                    *pool -= soaked;
                    remaining -= soaked;
                }
                remaining
            }
            ClassState::Dirgesinger(state) if state.ironsong > 0 => {
                (damage - state.armor_bonus).max(0)
            }
            ClassState::Mechanist(state) if state.reactive_plating > 0 => damage / 2,
            _ => damage,
        }
    }
}

/// Builds `amount` while fighting, otherwise decays by `decay`, clamped to
/// `[0, cap]`.
fn cycle_resource(ch: &mut Character, build: i32, decay: i32, cap: i32) {
    if ch.position == Position::Fighting {
        ch.resource = (ch.resource + build).min(cap);
    } else {
        ch.resource = (ch.resource - decay).max(0);
    }
}

/// Decrements a duration counter; true exactly on the tick it expires.
fn countdown(ticks: &mut i32) -> bool {
    if *ticks <= 0 {
        return false;
    }
    *ticks -= 1;
    *ticks == 0
}

/// Song-weaving class whose resonance builds in battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dirgesinger {
    pub dirge_ticks: i32,
    pub dirge_stacks: i32,
    pub battlehymn: i32,
    pub ironsong: i32,
    pub armor_bonus: i32,
    pub cadence: i32,
    pub dissonance: i32,
    pub warsong: bool,
    pub resonance_peak: i32,
}

impl Dirgesinger {
    fn update(&mut self, ch: &mut Character) -> ClassTick {
        let mut tick = ClassTick::default();

        cycle_resource(ch, 2, 3, RESONANCE_CAP);
        self.resonance_peak = self.resonance_peak.max(ch.resource);

        if self.dirge_ticks > 0 {
            if ch.fighting.is_some() {
                tick.opponent_damage += DIRGE_TICK_DAMAGE * self.dirge_stacks;
            }
            if countdown(&mut self.dirge_ticks) {
                self.dirge_stacks = 0;
                ch.send("Your dirge fades away.");
            }
        }

        if countdown(&mut self.battlehymn) {
            ch.send("Your battle hymn fades.");
        }
        if countdown(&mut self.ironsong) {
            self.armor_bonus = 0;
            ch.send("Your ironsong barrier dissipates.");
        }
        if countdown(&mut self.cadence) {
            ch.send("Your accelerated cadence slows to normal.");
        }
        countdown(&mut self.dissonance);

        if self.warsong {
            if ch.mana >= WARSONG_MANA_DRAIN {
                ch.mana -= WARSONG_MANA_DRAIN;
            } else {
                self.warsong = false;
                ch.send("Your warsong fades as your mana is depleted.");
            }
        }

        tick
    }
}

/// Mind-focused class whose focus builds slowly in battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psion {
    pub thought_shield: i32,
    pub thought_shield_hp: i32,
    pub kinetic_barrier: i32,
    pub kinetic_barrier_hp: i32,
    pub levitate: i32,
    pub mental_link: i32,
    #[serde(skip)]
    pub linked: Option<CharId>,
    pub mindscan: i32,
    pub peak_focus: i32,
}

impl Psion {
    fn update(&mut self, ch: &mut Character) -> ClassTick {
        cycle_resource(ch, 1, 2, FOCUS_CAP);
        self.peak_focus = self.peak_focus.max(ch.resource);

        if countdown(&mut self.thought_shield) {
            self.thought_shield_hp = 0;
            ch.send("Your Thought Shield fades away.");
        }
        if countdown(&mut self.kinetic_barrier) {
            self.kinetic_barrier_hp = 0;
            ch.send("Your Kinetic Barrier dissipates.");
        }
        if countdown(&mut self.levitate) {
            ch.affected_by.remove(AffectFlags::FLYING);
            ch.send("You slowly descend as your telekinetic lift fades.");
        }
        if countdown(&mut self.mental_link) {
            self.linked = None;
            ch.send("Your mental link fades.");
        }
        if countdown(&mut self.mindscan) {
            ch.affected_by
                .remove(AffectFlags::DETECT_HIDDEN | AffectFlags::DETECT_INVIS);
            ch.send("Your psychic awareness fades.");
        }

        ClassTick::default()
    }
}

/// Power core implanted in a mechanist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreImplant {
    #[default]
    None,
    Power,
    Regenerator,
}

/// Gadget class whose power never decays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mechanist {
    pub core: CoreImplant,
    pub neural_jack: i32,
    pub servo_arms: i32,
    pub reactive_plating: i32,
    pub repair_swarm: i32,
}

impl Mechanist {
    pub fn power_cap(&self) -> i32 {
        match self.core {
            CoreImplant::Power => POWER_CAP + CORE_POWER_BONUS_CAP,
            _ => POWER_CAP,
        }
    }

    fn update(&mut self, ch: &mut Character) -> ClassTick {
        let cap = self.power_cap();
        let bonus = match self.core {
            CoreImplant::Power => CORE_POWER_BONUS_TICK,
            _ => 0,
        };
        let gain = if ch.position == Position::Fighting { 3 } else { 1 };
        if ch.resource < cap {
            ch.resource = (ch.resource + gain + bonus).min(cap);
        }

        if self.core == CoreImplant::Regenerator {
            ch.hit = (ch.hit + CORE_REGEN_HP).min(ch.max_hit);
        }

        if countdown(&mut self.neural_jack) {
            ch.send("Your neural enhancement subsides.");
        }
        if countdown(&mut self.servo_arms) {
            ch.send("Your servo arms power down.");
        }
        if countdown(&mut self.reactive_plating) {
            ch.send("Your reactive plating deactivates.");
        }
        if self.repair_swarm > 0 {
            ch.hit = (ch.hit + REPAIR_SWARM_HEAL).min(ch.max_hit);
            if countdown(&mut self.repair_swarm) {
                ch.send("Your repair swarm disperses.");
            }
        }

        ClassTick::default()
    }
}
