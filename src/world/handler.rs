//! # Handler Primitives
//!
//! Every move of an entity between collections goes through one of these
//! functions, so the location fields and the linked nodes never disagree.
//! Each `*_to_*` requires the entity to be detached from that kind of
//! collection and each `*_from_*` requires it to be attached; misuse is
//! reported as an error rather than silently corrupting a list.

use super::entities::*;
use super::World;
use crate::list::{List, ListNode, Member};
use crate::{MudError, MudResult};
use log::{debug, info, warn};

/// What an area reset brought back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    pub mobiles: usize,
    pub objects: usize,
}

impl World {
    // Characters and rooms

    /// Places a character in a room, at the front of its people.
    ///
    /// The first player entering an area whose reset came due while it
    /// was empty triggers that reset.
    pub fn char_to_room(&mut self, ch: CharId, room: RoomId) -> MudResult<()> {
        let character = self
            .characters
            .get(ch)
            .ok_or_else(|| MudError::NotFound("character".to_string()))?;
        if let Some(current) = character.in_room {
            return Err(MudError::InvalidAction(format!(
                "{} is already in room {}",
                character.name, self.rooms[current].vnum
            )));
        }
        let is_npc = character.is_npc;
        let area = self
            .rooms
            .get(room)
            .ok_or_else(|| MudError::NotFound("room".to_string()))?
            .area;

        self.rooms[room]
            .people
            .push_front(&mut RoomPeople::within_mut(&mut self.characters), ch);
        self.characters[ch].in_room = Some(room);

        if let (false, Some(area)) = (is_npc, area) {
            let data = &mut self.areas[area];
            data.nplayer += 1;
            if data.nplayer == 1 && data.needs_reset {
                data.needs_reset = false;
                info!("Deferred reset of {} on first player entry", data.name);
                let outcome = self.reset_area(area);
                self.deferred_resets.push(outcome);
            }
        }
        Ok(())
    }

    /// Takes a character out of its room and returns the room it left.
    pub fn char_from_room(&mut self, ch: CharId) -> MudResult<RoomId> {
        let character = self
            .characters
            .get(ch)
            .ok_or_else(|| MudError::NotFound("character".to_string()))?;
        let room = character.in_room.ok_or_else(|| {
            MudError::InvalidAction(format!("{} is not in a room", character.name))
        })?;
        let is_npc = character.is_npc;

        self.rooms[room]
            .people
            .remove(&mut RoomPeople::within_mut(&mut self.characters), ch);
        self.characters[ch].in_room = None;

        if let (false, Some(area)) = (is_npc, self.rooms[room].area) {
            let data = &mut self.areas[area];
            data.nplayer = (data.nplayer - 1).max(0);
        }
        Ok(room)
    }

    /// Moves a character to the room with the given vnum.
    pub fn move_char(&mut self, ch: CharId, to: Vnum) -> MudResult<RoomId> {
        let room = self.room_by_vnum(to)?;
        if self.characters.get(ch).and_then(|c| c.in_room).is_some() {
            self.char_from_room(ch)?;
        }
        self.char_to_room(ch, room)?;
        Ok(room)
    }

    // Objects

    /// Drops a detached object into a room.
    pub fn obj_to_room(&mut self, obj: ObjId, room: RoomId) -> MudResult<()> {
        self.require_detached(obj)?;
        let contents = &mut self
            .rooms
            .get_mut(room)
            .ok_or_else(|| MudError::NotFound("room".to_string()))?
            .contents;
        contents.push_front(&mut RoomContents::within_mut(&mut self.objects), obj);
        self.objects[obj].location = ObjLocation::Room(room);
        Ok(())
    }

    /// Picks an object up off the floor, returning the room it was in.
    pub fn obj_from_room(&mut self, obj: ObjId) -> MudResult<RoomId> {
        let room = match self.location_of(obj)? {
            ObjLocation::Room(room) => room,
            other => return Err(misplaced(&self.objects[obj], "in a room", other)),
        };
        self.rooms[room]
            .contents
            .remove(&mut RoomContents::within_mut(&mut self.objects), obj);
        self.objects[obj].location = ObjLocation::Nowhere;
        Ok(room)
    }

    /// Gives a detached object to a character.
    pub fn obj_to_char(&mut self, obj: ObjId, ch: CharId) -> MudResult<()> {
        self.require_detached(obj)?;
        let weight = self.total_weight(obj);
        let character = self
            .characters
            .get_mut(ch)
            .ok_or_else(|| MudError::NotFound("character".to_string()))?;
        character
            .carrying
            .push_front(&mut Contents::within_mut(&mut self.objects), obj);
        character.carry_number += 1;
        character.carry_weight += weight;
        self.objects[obj].location = ObjLocation::Carried(ch);
        Ok(())
    }

    /// Takes an object from its carrier, returning who carried it.
    pub fn obj_from_char(&mut self, obj: ObjId) -> MudResult<CharId> {
        let ch = match self.location_of(obj)? {
            ObjLocation::Carried(ch) => ch,
            other => return Err(misplaced(&self.objects[obj], "carried", other)),
        };
        let weight = self.total_weight(obj);
        let character = &mut self.characters[ch];
        character
            .carrying
            .remove(&mut Contents::within_mut(&mut self.objects), obj);
        character.carry_number -= 1;
        character.carry_weight -= weight;
        self.objects[obj].location = ObjLocation::Nowhere;
        Ok(ch)
    }

    /// Puts a detached object inside a container.
    pub fn obj_to_obj(&mut self, obj: ObjId, container: ObjId) -> MudResult<()> {
        self.require_detached(obj)?;
        let holder = self
            .objects
            .get(container)
            .ok_or_else(|| MudError::NotFound("container".to_string()))?;
        if !holder.item_type.holds_contents() {
            return Err(MudError::InvalidAction(format!(
                "{} cannot hold anything",
                holder.name
            )));
        }
        if self.encloses(obj, container) {
            return Err(MudError::InvalidAction(format!(
                "{} cannot be put inside itself",
                self.objects[obj].name
            )));
        }

        self.with_contents(container, |contents, objects| {
            contents.push_front(&mut Contents::within_mut(objects), obj)
        });
        self.objects[obj].location = ObjLocation::Inside(container);

        let weight = self.total_weight(obj);
        if let Some(carrier) = self.carrier_of(container) {
            self.characters[carrier].carry_weight += weight;
        }
        Ok(())
    }

    /// Takes an object out of its container, returning the container.
    pub fn obj_from_obj(&mut self, obj: ObjId) -> MudResult<ObjId> {
        let container = match self.location_of(obj)? {
            ObjLocation::Inside(container) => container,
            other => return Err(misplaced(&self.objects[obj], "in a container", other)),
        };

        let weight = self.total_weight(obj);
        if let Some(carrier) = self.carrier_of(container) {
            self.characters[carrier].carry_weight -= weight;
        }

        self.with_contents(container, |contents, objects| {
            contents.remove(&mut Contents::within_mut(objects), obj)
        });
        self.objects[obj].location = ObjLocation::Nowhere;
        Ok(container)
    }

    /// Detaches an object from wherever it is.
    pub fn obj_detach(&mut self, obj: ObjId) -> MudResult<()> {
        match self.location_of(obj)? {
            ObjLocation::Nowhere => {}
            ObjLocation::Room(_) => {
                self.obj_from_room(obj)?;
            }
            ObjLocation::Carried(_) => {
                self.obj_from_char(obj)?;
            }
            ObjLocation::Inside(_) => {
                self.obj_from_obj(obj)?;
            }
        }
        Ok(())
    }

    /// Destroys an object and, recursively, everything inside it.
    pub fn extract_obj(&mut self, obj: ObjId) -> MudResult<()> {
        if !self.objects.contains_key(obj) {
            return Err(MudError::NotFound("object".to_string()));
        }

        let mut walk = self.objects[obj].contents.walk();
        while let Some(inner) = walk.next(&Contents::within(&self.objects)) {
            self.extract_obj(inner)?;
        }

        self.obj_detach(obj)?;
        self.object_list
            .remove(&mut ObjRoster::within_mut(&mut self.objects), obj);
        self.objects.remove(obj);
        Ok(())
    }

    /// Runs `op` against a container's contents head. The head lives in
    /// the same arena as its nodes, so it is lifted out for the duration.
    fn with_contents<R>(
        &mut self,
        container: ObjId,
        op: impl FnOnce(&mut List<ObjId>, &mut slotmap::SlotMap<ObjId, Object>) -> R,
    ) -> R {
        let mut contents = std::mem::take(&mut self.objects[container].contents);
        let result = op(&mut contents, &mut self.objects);
        self.objects[container].contents = contents;
        result
    }

    fn location_of(&self, obj: ObjId) -> MudResult<ObjLocation> {
        self.objects
            .get(obj)
            .map(|o| o.location)
            .ok_or_else(|| MudError::NotFound("object".to_string()))
    }

    fn require_detached(&self, obj: ObjId) -> MudResult<()> {
        match self.location_of(obj)? {
            ObjLocation::Nowhere => Ok(()),
            other => Err(misplaced(&self.objects[obj], "detached", other)),
        }
    }

    /// True if `inner` is `outer` or sits somewhere inside it.
    fn encloses(&self, outer: ObjId, inner: ObjId) -> bool {
        let mut cursor = Some(inner);
        while let Some(obj) = cursor {
            if obj == outer {
                return true;
            }
            cursor = match self.objects[obj].location {
                ObjLocation::Inside(parent) => Some(parent),
                _ => None,
            };
        }
        false
    }

    /// The character ultimately carrying an object, through any containers.
    pub fn carrier_of(&self, obj: ObjId) -> Option<CharId> {
        let mut cursor = obj;
        loop {
            match self.objects.get(cursor)?.location {
                ObjLocation::Carried(ch) => return Some(ch),
                ObjLocation::Inside(parent) => cursor = parent,
                _ => return None,
            }
        }
    }

    /// The room an object is ultimately in, through containers and carriers.
    pub fn room_of_obj(&self, obj: ObjId) -> Option<RoomId> {
        let mut cursor = obj;
        loop {
            match self.objects.get(cursor)?.location {
                ObjLocation::Room(room) => return Some(room),
                ObjLocation::Carried(ch) => return self.characters.get(ch)?.in_room,
                ObjLocation::Inside(parent) => cursor = parent,
                ObjLocation::Nowhere => return None,
            }
        }
    }

    /// Weight of an object including everything inside it.
    pub fn total_weight(&self, obj: ObjId) -> i32 {
        self.objects[obj].weight
            + self
                .contents_of(obj)
                .map(|inner| self.total_weight(inner))
                .sum::<i32>()
    }

    // Characters leaving the world

    /// Removes a character from the world: its inventory and affects are
    /// destroyed, it leaves its room and every roster, and references to
    /// it held by other characters or its session are cleared.
    pub fn extract_char(&mut self, ch: CharId) -> MudResult<()> {
        if !self.characters.contains_key(ch) {
            return Err(MudError::NotFound("character".to_string()));
        }
        self.stop_fighting(ch, true);

        let mut walk = self.characters[ch].carrying.walk();
        while let Some(obj) = walk.next(&Contents::within(&self.objects)) {
            self.extract_obj(obj)?;
        }

        let mut walk = self.characters[ch].affects.walk();
        while let Some(affect) = walk.next(&AffectChain::within(&self.affects)) {
            self.unlink_affect(ch, affect);
        }

        if self.characters[ch].in_room.is_some() {
            self.char_from_room(ch)?;
        }

        if let Some(session) = self.characters[ch].session.take() {
            if let Some(data) = self.sessions.get_mut(session) {
                data.character = None;
            }
        }

        // Psionic links are the only other character references.
        let mut walk = self.char_list.walk();
        while let Some(other) = walk.next(&CharRoster::within(&self.characters)) {
            if let super::ClassState::Psion(state) = &mut self.characters[other].class {
                if state.linked == Some(ch) {
                    state.linked = None;
                }
            }
        }

        self.char_list
            .remove(&mut CharRoster::within_mut(&mut self.characters), ch);
        let gone = self.characters.remove(ch);
        if let Some(gone) = gone {
            debug!("Extracted {}", gone.name);
        }
        Ok(())
    }

    // Affects

    /// Attaches an affect to a character and applies its modifiers.
    pub fn affect_to_char(&mut self, ch: CharId, spec: AffectSpec) -> MudResult<AffectId> {
        let id = self.attach_affect(ch, spec)?;
        let character = &mut self.characters[ch];
        apply_modifier(character, spec.apply, spec.modifier);
        character.affected_by |= spec.flags;
        Ok(id)
    }

    /// Links an affect without touching the bearer's stats.
    pub(crate) fn attach_affect(&mut self, ch: CharId, spec: AffectSpec) -> MudResult<AffectId> {
        if !self.characters.contains_key(ch) {
            return Err(MudError::NotFound("character".to_string()));
        }
        let id = self.affects.insert_with_key(|id| Affect {
            node: ListNode::new(id),
            owner: ch,
            kind: spec.kind,
            duration: spec.duration,
            apply: spec.apply,
            modifier: spec.modifier,
            flags: spec.flags,
        });
        self.characters[ch]
            .affects
            .push_front(&mut AffectChain::within_mut(&mut self.affects), id);
        Ok(id)
    }

    /// Detaches an affect and reverses its modifiers.
    pub fn affect_remove(&mut self, affect: AffectId) -> MudResult<()> {
        let owner = self
            .affects
            .get(affect)
            .ok_or_else(|| MudError::NotFound("affect".to_string()))?
            .owner;
        self.unlink_affect(owner, affect);
        Ok(())
    }

    fn unlink_affect(&mut self, ch: CharId, affect: AffectId) {
        let character = &mut self.characters[ch];
        character
            .affects
            .remove(&mut AffectChain::within_mut(&mut self.affects), affect);
        if let Some(removed) = self.affects.remove(affect) {
            let character = &mut self.characters[ch];
            apply_modifier(character, removed.apply, -removed.modifier);
            character.affected_by.remove(removed.flags);
            // Flags another affect still grants stay set.
            let still_granted = self
                .affects_of(ch)
                .fold(AffectFlags::empty(), |flags, id| flags | self.affects[id].flags);
            self.characters[ch].affected_by |= still_granted & removed.flags;
        }
    }

    /// Removes every affect of `kind`, returning how many were removed.
    pub fn affect_strip(&mut self, ch: CharId, kind: AffectKind) -> usize {
        let Some(character) = self.characters.get(ch) else {
            return 0;
        };
        let mut stripped = 0;
        let mut walk = character.affects.walk();
        while let Some(affect) = walk.next(&AffectChain::within(&self.affects)) {
            if self.affects[affect].kind == kind {
                self.unlink_affect(ch, affect);
                stripped += 1;
            }
        }
        stripped
    }

    pub fn is_affected(&self, ch: CharId, kind: AffectKind) -> bool {
        self.characters.contains_key(ch)
            && self
                .affects_of(ch)
                .any(|affect| self.affects[affect].kind == kind)
    }

    /// Attaches an affect, folding in the duration and modifier of an
    /// existing affect of the same kind.
    pub fn affect_join(&mut self, ch: CharId, mut spec: AffectSpec) -> MudResult<AffectId> {
        if !self.characters.contains_key(ch) {
            return Err(MudError::NotFound("character".to_string()));
        }
        let existing = self
            .affects_of(ch)
            .find(|&affect| self.affects[affect].kind == spec.kind);
        if let Some(old) = existing {
            let old_data = &self.affects[old];
            if old_data.duration >= 0 && spec.duration >= 0 {
                spec.duration += old_data.duration;
            }
            spec.modifier += old_data.modifier;
            self.affect_remove(old)?;
        }
        self.affect_to_char(ch, spec)
    }

    // Combat state

    /// Starts `ch` fighting `victim`.
    pub fn set_fighting(&mut self, ch: CharId, victim: CharId) -> MudResult<()> {
        if ch == victim {
            return Err(MudError::InvalidAction(
                "a character cannot fight itself".to_string(),
            ));
        }
        let attacker = self
            .characters
            .get(ch)
            .ok_or_else(|| MudError::NotFound("attacker".to_string()))?;
        if !self.characters.contains_key(victim) {
            return Err(MudError::NotFound("victim".to_string()));
        }
        if attacker.fighting.is_some() {
            return Err(MudError::InvalidAction(format!(
                "{} is already fighting",
                attacker.name
            )));
        }
        self.can_engage(ch, victim)?;

        let attacker = &mut self.characters[ch];
        attacker.fighting = Some(victim);
        attacker.position = Position::Fighting;
        Ok(())
    }

    /// Checks that `ch` and `victim` share a room where fighting is allowed.
    pub fn can_engage(&self, ch: CharId, victim: CharId) -> MudResult<()> {
        let (Some(attacker), Some(target)) = (self.characters.get(ch), self.characters.get(victim))
        else {
            return Err(MudError::NotFound("combatant".to_string()));
        };
        let room = match attacker.in_room {
            Some(room) if attacker.in_room == target.in_room => room,
            _ => {
                return Err(MudError::InvalidAction(format!(
                    "{} and {} are not in the same room",
                    attacker.name, target.name
                )))
            }
        };
        if self.rooms[room].flags.contains(RoomFlags::SAFE) {
            return Err(MudError::InvalidAction(format!(
                "no fighting in {}",
                self.rooms[room].name
            )));
        }
        Ok(())
    }

    /// Ends combat for `ch`; with `both`, also for everyone fighting it.
    pub fn stop_fighting(&mut self, ch: CharId, both: bool) {
        let mut walk = self.char_list.walk();
        while let Some(other) = walk.next(&CharRoster::within(&self.characters)) {
            let data = &mut self.characters[other];
            if other == ch || (both && data.fighting == Some(ch)) {
                data.fighting = None;
                if data.position == Position::Fighting {
                    data.position = Position::Standing;
                }
            }
        }
    }

    // Areas

    /// Repopulates an area from its reset list.
    pub fn reset_area(&mut self, area: AreaId) -> ResetOutcome {
        let mut outcome = ResetOutcome::default();
        let Some(data) = self.areas.get(area) else {
            return outcome;
        };
        let resets = data.resets.clone();

        for reset in &resets {
            match reset {
                Reset::Mobile {
                    template,
                    room,
                    limit,
                } => {
                    let Ok(room) = self.room_by_vnum(*room) else {
                        warn!("Reset in {} names missing room", self.areas[area].name);
                        continue;
                    };
                    let present = self
                        .characters()
                        .filter(|&id| {
                            self.characters[id].origin.as_deref() == Some(template.name.as_str())
                        })
                        .count();
                    if present >= *limit {
                        continue;
                    }
                    let mob = self.create_character(template);
                    self.characters[mob].origin = Some(template.name.clone());
                    if self.char_to_room(mob, room).is_ok() {
                        outcome.mobiles += 1;
                    }
                }
                Reset::Object { template, room } => {
                    let Ok(room) = self.room_by_vnum(*room) else {
                        warn!("Reset in {} names missing room", self.areas[area].name);
                        continue;
                    };
                    let already = self
                        .contents_of_room(room)
                        .any(|obj| self.objects[obj].name == template.name);
                    if already {
                        continue;
                    }
                    let obj = self.create_object(template);
                    if self.obj_to_room(obj, room).is_ok() {
                        outcome.objects += 1;
                    }
                }
            }
        }

        info!(
            "Reset {}: {} mobiles, {} objects",
            self.areas[area].name, outcome.mobiles, outcome.objects
        );
        outcome
    }

    /// Drains the outcomes of resets triggered by players entering
    /// areas that came due while empty.
    pub fn take_deferred_resets(&mut self) -> Vec<ResetOutcome> {
        std::mem::take(&mut self.deferred_resets)
    }

    // Sessions

    /// Records input on a session, pulling its character back from the void.
    pub fn session_activity(&mut self, session: SessionId) -> MudResult<()> {
        let data = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| MudError::NotFound("session".to_string()))?;
        data.idle = 0;
        if data.state != ConnState::Void {
            return Ok(());
        }
        data.state = ConnState::Playing;

        if let Some(ch) = data.character {
            if let Some(back) = self.characters[ch].was_in_room.take() {
                if self.rooms.contains_key(back) {
                    if self.characters[ch].in_room.is_some() {
                        self.char_from_room(ch)?;
                    }
                    self.char_to_room(ch, back)?;
                }
            }
            let character = &mut self.characters[ch];
            character.send("You return from the void.");
        }
        Ok(())
    }

    /// Closes a session, leaving its character (if any) in the world.
    pub fn close_session(&mut self, session: SessionId) -> MudResult<Option<CharId>> {
        if !self.sessions.contains_key(session) {
            return Err(MudError::NotFound("session".to_string()));
        }
        self.session_list
            .remove(&mut SessionRoster::within_mut(&mut self.sessions), session);
        let character = self.sessions.remove(session).and_then(|data| data.character);
        if let Some(ch) = character {
            if let Some(data) = self.characters.get_mut(ch) {
                data.session = None;
            }
        }
        Ok(character)
    }
}

fn apply_modifier(ch: &mut Character, apply: Apply, modifier: i32) {
    match apply {
        Apply::None => {}
        Apply::Hitroll => ch.hitroll += modifier,
        Apply::Damroll => ch.damroll += modifier,
        Apply::Armor => ch.armor += modifier,
        Apply::MaxHit => {
            ch.max_hit += modifier;
            ch.hit = ch.hit.min(ch.max_hit);
        }
    }
}

fn misplaced(obj: &Object, wanted: &str, actual: ObjLocation) -> MudError {
    MudError::InvalidAction(format!(
        "{} must be {} but is at {:?}",
        obj.name, wanted, actual
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_room() -> (World, RoomId) {
        let mut world = World::new(3);
        let area = world.create_area("Test Area");
        let room = world.create_room(100, "Hall", Some(area)).unwrap();
        (world, room)
    }

    fn bless(modifier: i32) -> AffectSpec {
        AffectSpec {
            kind: AffectKind::Bless,
            duration: 5,
            apply: Apply::Hitroll,
            modifier,
            flags: AffectFlags::empty(),
        }
    }

    #[test]
    fn test_char_room_round_trip_tracks_players() {
        let (mut world, room) = world_with_room();
        let area = world.room(room).unwrap().area.unwrap();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let mob = world.create_character(&CharacterTemplate::mobile("rat", 1));

        world.char_to_room(pc, room).unwrap();
        world.char_to_room(mob, room).unwrap();
        assert_eq!(world.people_in(room).collect::<Vec<_>>(), vec![mob, pc]);
        assert_eq!(world.area(area).unwrap().nplayer, 1);
        assert!(world.char_to_room(pc, room).is_err());

        assert_eq!(world.char_from_room(pc).unwrap(), room);
        assert_eq!(world.area(area).unwrap().nplayer, 0);
        assert!(world.char_from_room(pc).is_err());
        assert!(world.check_integrity().is_ok());
    }

    #[test]
    fn test_deferred_reset_runs_on_first_player() {
        let (mut world, room) = world_with_room();
        let area = world.room(room).unwrap().area.unwrap();
        {
            let data = world.area_mut(area).unwrap();
            data.needs_reset = true;
            data.resets.push(Reset::Mobile {
                template: CharacterTemplate::mobile("guard", 5),
                room: 100,
                limit: 1,
            });
        }

        let mob = world.create_character(&CharacterTemplate::mobile("wanderer", 1));
        world.char_to_room(mob, room).unwrap();
        assert!(world.area(area).unwrap().needs_reset);

        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        world.char_to_room(pc, room).unwrap();
        assert!(!world.area(area).unwrap().needs_reset);
        assert_eq!(world.room(room).unwrap().people_count(), 3);
        assert_eq!(
            world.take_deferred_resets(),
            vec![ResetOutcome {
                mobiles: 1,
                objects: 0
            }]
        );
        assert!(world.take_deferred_resets().is_empty());
    }

    #[test]
    fn test_object_moves_keep_weight() {
        let (mut world, room) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let bag = world.create_object(
            &ObjectTemplate::new("bag", ItemType::Container).with_weight(2),
        );
        let gem = world.create_object(&ObjectTemplate::new("gem", ItemType::Trash).with_weight(3));

        world.obj_to_char(bag, pc).unwrap();
        world.obj_to_obj(gem, bag).unwrap();
        assert_eq!(world.character(pc).unwrap().carry_weight, 5);
        assert_eq!(world.carrier_of(gem), Some(pc));

        assert_eq!(world.obj_from_obj(gem).unwrap(), bag);
        assert_eq!(world.character(pc).unwrap().carry_weight, 2);
        world.obj_to_room(gem, room).unwrap();
        assert!(world.obj_to_room(gem, room).is_err());
        assert_eq!(world.object(gem).unwrap().location(), ObjLocation::Room(room));
        assert!(world.check_integrity().is_ok());
    }

    #[test]
    fn test_container_cannot_enclose_itself() {
        let (mut world, _) = world_with_room();
        let outer = world.create_object(&ObjectTemplate::new("chest", ItemType::Container));
        let inner = world.create_object(&ObjectTemplate::new("box", ItemType::Container));
        world.obj_to_obj(inner, outer).unwrap();
        assert!(world.obj_to_obj(outer, outer).is_err());

        world.obj_from_obj(inner).unwrap();
        world.obj_to_obj(outer, inner).unwrap();
        assert!(world.obj_to_obj(inner, outer).is_err());
        let sword = world.create_object(&ObjectTemplate::new("sword", ItemType::Weapon));
        assert!(world.obj_to_obj(inner, sword).is_err());
    }

    #[test]
    fn test_extract_obj_is_recursive() {
        let (mut world, room) = world_with_room();
        let chest = world.create_object(&ObjectTemplate::new("chest", ItemType::Container));
        let pouch = world.create_object(&ObjectTemplate::new("pouch", ItemType::Container));
        let coin = world.create_object(&ObjectTemplate::new("coin", ItemType::Trash));
        world.obj_to_room(chest, room).unwrap();
        world.obj_to_obj(pouch, chest).unwrap();
        world.obj_to_obj(coin, pouch).unwrap();

        world.extract_obj(chest).unwrap();
        assert_eq!(world.object_count(), 0);
        assert_eq!(world.room(room).unwrap().content_count(), 0);
        assert!(world.check_integrity().is_ok());
    }

    #[test]
    fn test_extract_char_clears_references() {
        let (mut world, room) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let mob = world.create_character(&CharacterTemplate::mobile("rat", 1));
        world.char_to_room(pc, room).unwrap();
        world.char_to_room(mob, room).unwrap();
        let session = world.open_session("localhost", Some(mob)).unwrap();
        let loot = world.create_object(&ObjectTemplate::new("tail", ItemType::Trash));
        world.obj_to_char(loot, mob).unwrap();
        world.affect_to_char(mob, bless(2)).unwrap();
        world.set_fighting(pc, mob).unwrap();
        world.set_fighting(mob, pc).unwrap();

        world.extract_char(mob).unwrap();
        let ava = world.character(pc).unwrap();
        assert_eq!(ava.fighting, None);
        assert_eq!(ava.position, Position::Standing);
        assert_eq!(world.session(session).unwrap().character, None);
        assert_eq!(world.object_count(), 0);
        assert_eq!(world.character_count(), 1);
        assert!(world.check_integrity().is_ok());
    }

    #[test]
    fn test_affect_modifiers_apply_and_reverse() {
        let (mut world, _) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let affect = world.affect_to_char(pc, bless(3)).unwrap();
        assert_eq!(world.character(pc).unwrap().hitroll, 3);
        assert!(world.is_affected(pc, AffectKind::Bless));

        world.affect_remove(affect).unwrap();
        assert_eq!(world.character(pc).unwrap().hitroll, 0);
        assert!(!world.is_affected(pc, AffectKind::Bless));
        assert!(world.affect_remove(affect).is_err());
    }

    #[test]
    fn test_shared_flags_survive_removal() {
        let (mut world, _) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let flying = |kind| AffectSpec {
            kind,
            duration: 3,
            apply: Apply::None,
            modifier: 0,
            flags: AffectFlags::FLYING,
        };
        let haste = world.affect_to_char(pc, flying(AffectKind::Haste)).unwrap();
        world.affect_to_char(pc, flying(AffectKind::Bless)).unwrap();

        world.affect_remove(haste).unwrap();
        assert!(world
            .character(pc)
            .unwrap()
            .affected_by
            .contains(AffectFlags::FLYING));
        assert_eq!(world.affect_strip(pc, AffectKind::Bless), 1);
        assert!(world.character(pc).unwrap().affected_by.is_empty());
    }

    #[test]
    fn test_affect_join_folds_existing() {
        let (mut world, _) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        world.affect_to_char(pc, bless(2)).unwrap();
        let joined = world.affect_join(pc, bless(1)).unwrap();

        let affect = world.affect(joined).unwrap();
        assert_eq!(affect.duration, 10);
        assert_eq!(affect.modifier, 3);
        assert_eq!(world.character(pc).unwrap().affect_count(), 1);
        assert_eq!(world.character(pc).unwrap().hitroll, 3);
    }

    #[test]
    fn test_safe_room_refuses_combat() {
        let (mut world, room) = world_with_room();
        world.room_mut(room).unwrap().flags |= RoomFlags::SAFE;
        let a = world.create_character(&CharacterTemplate::player("Ava"));
        let b = world.create_character(&CharacterTemplate::mobile("rat", 1));
        world.char_to_room(a, room).unwrap();
        world.char_to_room(b, room).unwrap();
        assert!(world.set_fighting(a, b).is_err());
        assert!(world.set_fighting(a, a).is_err());
    }

    #[test]
    fn test_close_session_detaches_character() {
        let (mut world, _) = world_with_room();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let session = world.open_session("localhost", Some(pc)).unwrap();
        assert_eq!(world.close_session(session).unwrap(), Some(pc));
        assert_eq!(world.character(pc).unwrap().session, None);
        assert_eq!(world.session_count(), 0);
        assert!(world.close_session(session).is_err());
    }
}
