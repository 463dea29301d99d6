//! # Game Configuration
//!
//! Pulse timing, regeneration rates, idle limits and area reset timing.
//! Every section has defaults matching the classic server constants, so a
//! JSON file only needs to name what it changes.

use crate::world::Vnum;
use crate::{MudError, MudResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Room idle players are parked in
pub const ROOM_VNUM_LIMBO: Vnum = 2;

/// Room players return to after death
pub const ROOM_VNUM_ALTAR: Vnum = 3054;

/// Ticks before a mobile corpse rots
pub const CORPSE_NPC_TIMER: i32 = 6;

/// Ticks before a player corpse rots
pub const CORPSE_PC_TIMER: i32 = 25;

/// Area ticks between resets
pub const AREA_RESET_AGE: i32 = 15;

/// Area ticks before a reset is even considered
pub const AREA_MIN_AGE: i32 = 3;

/// Damage dealt by one tick of poison
pub const POISON_TICK_DAMAGE: i32 = 2;

/// Hit points restored by one tick of regeneration
pub const REGENERATION_TICK_HEAL: i32 = 10;

/// Undrained output lines kept per character; the oldest go first
pub const OUTPUT_LIMIT: usize = 100;

/// Pulse periods, in seconds of game time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub pulses_per_second: u32,
    pub violence_seconds: u32,
    pub mobile_seconds: u32,
    pub players_seconds: u32,
    pub tick_seconds: u32,
    pub area_seconds: u32,
    pub idle_seconds: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            pulses_per_second: 4,
            violence_seconds: 3,
            mobile_seconds: 4,
            players_seconds: 4,
            tick_seconds: 30,
            area_seconds: 60,
            idle_seconds: 60,
        }
    }
}

impl TickConfig {
    /// Converts seconds to pulses. Validated periods never saturate.
    pub fn pulses(&self, seconds: u32) -> u32 {
        seconds.saturating_mul(self.pulses_per_second)
    }

    fn validate(&self) -> MudResult<()> {
        let periods = [
            ("pulses_per_second", self.pulses_per_second),
            ("violence_seconds", self.violence_seconds),
            ("mobile_seconds", self.mobile_seconds),
            ("players_seconds", self.players_seconds),
            ("tick_seconds", self.tick_seconds),
            ("area_seconds", self.area_seconds),
            ("idle_seconds", self.idle_seconds),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(MudError::Config(format!("{} must be positive", name)));
            }
        }
        for (name, seconds) in &periods[1..] {
            if seconds.checked_mul(self.pulses_per_second).is_none() {
                return Err(MudError::Config(format!(
                    "{} of {} overflows at {} pulses per second",
                    name, seconds, self.pulses_per_second
                )));
            }
        }
        Ok(())
    }
}

/// Points restored per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenRates {
    pub hit: i32,
    pub mana: i32,
    pub movement: i32,
}

/// Regeneration while fighting and while not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    pub idle: RegenRates,
    pub fighting: RegenRates,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            idle: RegenRates {
                hit: 15,
                mana: 15,
                movement: 20,
            },
            fighting: RegenRates {
                hit: 3,
                mana: 3,
                movement: 5,
            },
        }
    }
}

/// Idle session handling, in idle-check periods (minutes by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub void_after: u32,
    pub disconnect_after: u32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            void_after: 12,
            disconnect_after: 30,
        }
    }
}

/// Area ageing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    /// Area ticks between resets
    pub reset_age: i32,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            reset_age: AREA_RESET_AGE,
        }
    }
}

/// Everything the scheduler reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tick: TickConfig,
    pub regen: RegenConfig,
    pub idle: IdleConfig,
    pub area: AreaConfig,
}

impl GameConfig {
    /// Loads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> MudResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> MudResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Rejects configurations the scheduler cannot run.
    pub fn validate(&self) -> MudResult<()> {
        self.tick.validate()?;
        if self.idle.void_after == 0 || self.idle.disconnect_after <= self.idle.void_after {
            return Err(MudError::Config(
                "idle limits must satisfy 0 < void_after < disconnect_after".to_string(),
            ));
        }
        if self.area.reset_age <= AREA_MIN_AGE {
            return Err(MudError::Config(format!(
                "reset_age must exceed {}",
                AREA_MIN_AGE
            )));
        }
        Ok(())
    }
}
