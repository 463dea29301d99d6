//! Combat resolution: hits, damage, death and corpse handling.
//!
//! A mobile that dies is only marked; it stays linked everywhere until
//! [`World::reap_dead`] extracts it from the character roster as the
//! current element of its own walk. Players never leave the world on
//! death, they are moved to the recall room.

use super::entities::*;
use super::World;
use crate::config::{CORPSE_NPC_TIMER, CORPSE_PC_TIMER};
use crate::list::Member;
use log::{debug, info, warn};

/// Who died as the result of a blow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Death {
    /// Marked dying, extracted at the next reap
    Mobile,
    /// Sent to the recall room
    Player,
}

/// Result of dealing damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Damage that got past shields
    pub dealt: i32,
    pub death: Option<Death>,
}

impl World {
    /// Deals `amount` to `victim` from `ch`, starting combat on both sides
    /// when it has not started yet. Nothing happens unless the two can
    /// fight where they stand.
    pub fn damage(&mut self, ch: CharId, victim: CharId, amount: i32) -> DamageOutcome {
        if !self.can_be_hurt(victim) || !self.characters.contains_key(ch) {
            return DamageOutcome::default();
        }

        if ch != victim {
            if let Err(err) = self.can_engage(ch, victim) {
                debug!("Blow withheld: {}", err);
                return DamageOutcome::default();
            }
            if self.characters[victim].fighting.is_none()
                && self.characters[victim].position.is_awake()
            {
                self.set_fighting(victim, ch)
                    .unwrap_or_else(|err| debug!("{}", err));
            }
            if self.characters[ch].fighting.is_none() {
                self.set_fighting(ch, victim)
                    .unwrap_or_else(|err| debug!("{}", err));
            }
        }

        let target = &mut self.characters[victim];
        let mut dealt = target.class.absorb(amount.max(0));
        if target.affected_by.contains(AffectFlags::SANCTUARY) {
            dealt /= 2;
        }
        target.hit -= dealt;

        let death = if target.hit <= 0 {
            Some(self.raw_kill(victim, Some(ch)))
        } else {
            None
        };
        DamageOutcome { dealt, death }
    }

    /// Damage with no attacker, from poison and the like.
    pub fn hurt(&mut self, victim: CharId, amount: i32) -> Option<Death> {
        if !self.can_be_hurt(victim) {
            return None;
        }
        let target = &mut self.characters[victim];
        target.hit -= amount;
        if target.hit <= 0 {
            Some(self.raw_kill(victim, None))
        } else {
            None
        }
    }

    /// One melee swing.
    pub fn one_hit(&mut self, ch: CharId, victim: CharId) -> DamageOutcome {
        if !self.can_be_hurt(victim) {
            return DamageOutcome::default();
        }
        let (level, damroll, bonus) = {
            let attacker = &self.characters[ch];
            (attacker.level, attacker.damroll, attacker.class.damage_bonus())
        };

        if self.number_range(1, 20) == 1 {
            let name = self.characters[victim].name.clone();
            self.characters[ch].send(format!("You miss {}.", name));
            return self.damage(ch, victim, 0);
        }

        let amount = self.number_range(1, 4 + level) + damroll + bonus;
        let outcome = self.damage(ch, victim, amount);
        let name = self.characters[victim].name.clone();
        self.characters[ch].send(format!("You hit {} for {}.", name, outcome.dealt));
        outcome
    }

    /// A full round of attacks; haste grants a second swing.
    pub fn multi_hit(&mut self, ch: CharId, victim: CharId) -> DamageOutcome {
        let first = self.one_hit(ch, victim);
        if first.death.is_some()
            || !self.characters[ch]
                .affected_by
                .contains(AffectFlags::HASTE)
        {
            return first;
        }
        let second = self.one_hit(ch, victim);
        DamageOutcome {
            dealt: first.dealt + second.dealt,
            death: second.death,
        }
    }

    /// Kills a character: combat ends, a corpse takes its inventory, and
    /// the character is either marked for reaping or sent to recall.
    pub fn raw_kill(&mut self, victim: CharId, killer: Option<CharId>) -> Death {
        self.stop_fighting(victim, true);

        let name = self.characters[victim].name.clone();
        match killer.and_then(|k| self.characters.get(k)) {
            Some(killer) if killer.name != name => info!("{} killed by {}", name, killer.name),
            _ => info!("{} died", name),
        }

        if let Some(room) = self.characters[victim].in_room {
            self.send_to_room(room, &[victim], &format!("{} is DEAD!!", name));
            self.make_corpse(victim, room);
        }

        if self.characters[victim].is_npc {
            let target = &mut self.characters[victim];
            target.dying = true;
            target.position = Position::Dead;
            return Death::Mobile;
        }

        let mut walk = self.characters[victim].affects.walk();
        while let Some(affect) = walk.next(&AffectChain::within(&self.affects)) {
            if let Err(err) = self.affect_remove(affect) {
                warn!("Could not strip affect from {}: {}", name, err);
            }
        }

        {
            let target = &mut self.characters[victim];
            target.hit = target.hit.max(1);
            target.mana = target.mana.max(1);
            target.movement = target.movement.max(1);
            target.position = Position::Resting;
            target.send("You have been KILLED!!");
        }

        if let Some(recall) = self.recall {
            if let Err(err) = self.move_char(victim, recall) {
                warn!("Could not return {} to recall: {}", name, err);
            }
        }
        Death::Player
    }

    fn make_corpse(&mut self, victim: CharId, room: RoomId) {
        let (name, is_npc) = {
            let dead = &self.characters[victim];
            (dead.name.clone(), dead.is_npc)
        };
        let template = if is_npc {
            ObjectTemplate::new(format!("the corpse of {}", name), ItemType::NpcCorpse)
                .with_timer(CORPSE_NPC_TIMER)
        } else {
            ObjectTemplate::new(format!("the corpse of {}", name), ItemType::PcCorpse)
                .with_timer(CORPSE_PC_TIMER)
        };
        let corpse = self.create_object(&template);

        let mut walk = self.characters[victim].carrying.walk();
        while let Some(obj) = walk.next(&Contents::within(&self.objects)) {
            let moved = self
                .obj_from_char(obj)
                .and_then(|_| self.obj_to_obj(obj, corpse));
            if let Err(err) = moved {
                warn!("Lost {:?} while filling a corpse: {}", obj, err);
            }
        }

        if let Err(err) = self.obj_to_room(corpse, room) {
            warn!("Corpse of {} has nowhere to lie: {}", name, err);
        }
    }

    /// Extracts every character marked dying, returning how many.
    ///
    /// Each removal is of the walk's current element.
    pub fn reap_dead(&mut self) -> usize {
        let mut reaped = 0;
        let mut walk = self.char_list.walk();
        while let Some(ch) = walk.next(&CharRoster::within(&self.characters)) {
            if !self.characters[ch].dying {
                continue;
            }
            match self.extract_char(ch) {
                Ok(()) => reaped += 1,
                Err(err) => warn!("Could not reap {:?}: {}", ch, err),
            }
        }
        if reaped > 0 {
            debug!("Reaped {} dead", reaped);
        }
        reaped
    }

    fn can_be_hurt(&self, victim: CharId) -> bool {
        self.characters
            .get(victim)
            .is_some_and(|target| !target.dying && target.position != Position::Dead)
    }
}
