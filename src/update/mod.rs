//! # Update Scheduler
//!
//! The pulse loop. Each call to [`Scheduler::pulse`] advances every
//! [`PulseCounter`] once and runs the updates whose counters fired. Every
//! update is a removal-safe walk over one roster; the only element an
//! update ever removes from the roster it walks is the current one. Deaths
//! are marked during the walks and collected by a final reaping walk.

pub mod area;
pub mod combat;
pub mod decay;
pub mod idle;
pub mod pulse;
pub mod regen;

pub use area::{area_update, weather_update};
pub use combat::{mobile_update, violence_update};
pub use decay::obj_update;
pub use idle::idle_update;
pub use pulse::*;
pub use regen::{char_update, player_update};

use crate::config::GameConfig;
use crate::world::World;
use crate::MudResult;
use log::debug;

/// What one or more pulses did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseReport {
    /// Pulses covered
    pub pulses: u64,
    /// Updates that ran, in order
    pub fired: Vec<PulseKind>,
    /// Attack rounds fought
    pub rounds: usize,
    /// Mobiles reaped after dying
    pub deaths: usize,
    /// Players killed and sent to recall
    pub player_deaths: usize,
    /// Damage dealt by class effects
    pub class_damage: i64,
    pub affects_expired: usize,
    pub objects_decayed: usize,
    pub areas_reset: usize,
    pub resets_deferred: usize,
    pub mobiles_spawned: usize,
    pub objects_spawned: usize,
    pub mobiles_moved: usize,
    /// Mobiles that started a fight on sight
    pub aggressions: usize,
    pub sessions_voided: usize,
    pub sessions_closed: usize,
    /// Players removed from the world by an idle disconnect
    pub players_quit: usize,
}

impl PulseReport {
    /// True if nothing happened beyond counters advancing.
    pub fn is_quiet(&self) -> bool {
        *self
            == PulseReport {
                pulses: self.pulses,
                fired: self.fired.clone(),
                ..PulseReport::default()
            }
    }

    /// Net change in the character roster.
    pub fn character_delta(&self) -> isize {
        self.mobiles_spawned as isize - self.deaths as isize - self.players_quit as isize
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: &PulseReport) {
        self.pulses += other.pulses;
        self.fired.extend_from_slice(&other.fired);
        self.rounds += other.rounds;
        self.deaths += other.deaths;
        self.player_deaths += other.player_deaths;
        self.class_damage += other.class_damage;
        self.affects_expired += other.affects_expired;
        self.objects_decayed += other.objects_decayed;
        self.areas_reset += other.areas_reset;
        self.resets_deferred += other.resets_deferred;
        self.mobiles_spawned += other.mobiles_spawned;
        self.objects_spawned += other.objects_spawned;
        self.mobiles_moved += other.mobiles_moved;
        self.aggressions += other.aggressions;
        self.sessions_voided += other.sessions_voided;
        self.sessions_closed += other.sessions_closed;
        self.players_quit += other.players_quit;
    }
}

/// Drives the periodic updates of one world.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: GameConfig,
    counters: PulseCounters,
    pulse: u64,
}

impl Scheduler {
    /// Creates a scheduler from a validated configuration.
    pub fn new(config: GameConfig) -> MudResult<Self> {
        config.validate()?;
        let counters = PulseCounters::new(&config.tick);
        Ok(Self {
            config,
            counters,
            pulse: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn counters(&self) -> &PulseCounters {
        &self.counters
    }

    /// Pulses run so far.
    pub fn pulse_count(&self) -> u64 {
        self.pulse
    }

    /// Runs one pulse.
    pub fn pulse(&mut self, world: &mut World) -> PulseReport {
        self.pulse += 1;
        // Resets triggered by placements between pulses belong to no report.
        let stale = world.take_deferred_resets();
        if !stale.is_empty() {
            debug!("Dropping {} resets run outside a pulse", stale.len());
        }
        let mut report = PulseReport {
            pulses: 1,
            fired: self.counters.advance(),
            ..PulseReport::default()
        };

        for kind in report.fired.clone() {
            match kind {
                PulseKind::Area => area_update(world, &self.config, &mut report),
                PulseKind::Idle => idle_update(world, &self.config, &mut report),
                PulseKind::Players => player_update(world, &mut report),
                PulseKind::Violence => violence_update(world, &mut report),
                PulseKind::Mobile => mobile_update(world, &mut report),
                PulseKind::Tick => {
                    weather_update(world);
                    char_update(world, &self.config, &mut report);
                    obj_update(world, &mut report);
                }
            }
        }

        // Players recalled or returning from the void may have set off a
        // deferred reset during the walks.
        for outcome in world.take_deferred_resets() {
            report.areas_reset += 1;
            report.mobiles_spawned += outcome.mobiles;
            report.objects_spawned += outcome.objects;
        }
        report.deaths += world.reap_dead();

        if !report.is_quiet() {
            debug!("Pulse {}: {:?}", self.pulse, report);
        }
        report
    }

    /// Runs `count` pulses and returns their combined report.
    pub fn run(&mut self, world: &mut World, count: u64) -> PulseReport {
        let mut total = PulseReport::default();
        for _ in 0..count {
            let report = self.pulse(world);
            total.merge(&report);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CharacterTemplate;

    #[test]
    fn test_empty_world_pulses_quietly() {
        let mut world = World::new(1);
        let mut scheduler = Scheduler::new(GameConfig::default()).unwrap();
        let report = scheduler.run(&mut world, 240);
        assert_eq!(report.pulses, 240);
        assert_eq!(scheduler.pulse_count(), 240);
        assert!(report.is_quiet());
        assert_eq!(
            report.fired.iter().filter(|k| **k == PulseKind::Area).count(),
            1
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GameConfig::default();
        config.tick.pulses_per_second = 0;
        assert!(Scheduler::new(config).is_err());
    }

    #[test]
    fn test_report_merge_and_delta() {
        let mut total = PulseReport::default();
        total.merge(&PulseReport {
            pulses: 1,
            mobiles_spawned: 3,
            deaths: 1,
            ..PulseReport::default()
        });
        total.merge(&PulseReport {
            pulses: 1,
            players_quit: 1,
            ..PulseReport::default()
        });
        assert_eq!(total.pulses, 2);
        assert_eq!(total.character_delta(), 1);
        assert!(!total.is_quiet());
    }

    #[test]
    fn test_marked_dead_are_reaped_each_pulse() {
        let mut world = World::new(1);
        let mob = world.create_character(&CharacterTemplate::mobile("rat", 1));
        world.character_mut(mob).unwrap().dying = true;
        let mut scheduler = Scheduler::new(GameConfig::default()).unwrap();

        let report = scheduler.pulse(&mut world);
        assert_eq!(report.deaths, 1);
        assert_eq!(world.character_count(), 0);
    }
}
