//! Countdown counters that decide which periodic updates run on a pulse.

use crate::config::TickConfig;
use serde::{Deserialize, Serialize};

/// The periodic updates driven by the pulse loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulseKind {
    Area,
    Idle,
    Players,
    Violence,
    Mobile,
    Tick,
}

/// Counts pulses down to the next firing of one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseCounter {
    period: u32,
    remaining: u32,
}

impl PulseCounter {
    /// A counter that first fires after `period` pulses.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: u32) -> Self {
        assert!(period > 0, "pulse period must be positive");
        Self {
            period,
            remaining: period,
        }
    }

    /// Advances one pulse. Returns true when the counter reaches zero, in
    /// which case it reloads with its full period.
    pub fn tick(&mut self) -> bool {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.remaining = self.period;
            true
        } else {
            false
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Pulses left until the next firing.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// One counter per periodic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseCounters {
    pub area: PulseCounter,
    pub idle: PulseCounter,
    pub players: PulseCounter,
    pub violence: PulseCounter,
    pub mobile: PulseCounter,
    pub tick: PulseCounter,
}

impl PulseCounters {
    pub fn new(config: &TickConfig) -> Self {
        Self {
            area: PulseCounter::new(config.pulses(config.area_seconds)),
            idle: PulseCounter::new(config.pulses(config.idle_seconds)),
            players: PulseCounter::new(config.pulses(config.players_seconds)),
            violence: PulseCounter::new(config.pulses(config.violence_seconds)),
            mobile: PulseCounter::new(config.pulses(config.mobile_seconds)),
            tick: PulseCounter::new(config.pulses(config.tick_seconds)),
        }
    }

    /// Advances every counter one pulse and returns the updates due, in
    /// the order they run.
    pub fn advance(&mut self) -> Vec<PulseKind> {
        let mut due = Vec::new();
        for (kind, counter) in [
            (PulseKind::Area, &mut self.area),
            (PulseKind::Idle, &mut self.idle),
            (PulseKind::Players, &mut self.players),
            (PulseKind::Violence, &mut self.violence),
            (PulseKind::Mobile, &mut self.mobile),
            (PulseKind::Tick, &mut self.tick),
        ] {
            if counter.tick() {
                due.push(kind);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_fires_every_period() {
        let mut counter = PulseCounter::new(3);
        let fired: Vec<bool> = (0..7).map(|_| counter.tick()).collect();
        assert_eq!(
            fired,
            vec![false, false, true, false, false, true, false]
        );
        assert_eq!(counter.remaining(), 2);
    }

    #[test]
    fn test_period_one_fires_every_pulse() {
        let mut counter = PulseCounter::new(1);
        assert!((0..5).all(|_| counter.tick()));
    }

    #[test]
    fn test_fire_count_over_many_pulses() {
        let mut counters = PulseCounters::new(&TickConfig::default());
        let mut violence = 0;
        let mut ticks = 0;
        for _ in 0..1200 {
            let due = counters.advance();
            violence += due.iter().filter(|k| **k == PulseKind::Violence).count();
            ticks += due.iter().filter(|k| **k == PulseKind::Tick).count();
        }
        assert_eq!(violence, 1200 / 12);
        assert_eq!(ticks, 1200 / 120);
    }

    #[test]
    #[should_panic(expected = "pulse period must be positive")]
    fn test_zero_period_panics() {
        PulseCounter::new(0);
    }
}
