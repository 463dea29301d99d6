//! # World Snapshots
//!
//! Serializable picture of a world, for saving to disk and restoring.
//!
//! Snapshots hold plain data only: no arena keys and no links. Cross
//! references are indices into the snapshot's own vectors, and every list
//! is stored in iteration order. Restoring creates every entity through
//! the normal factories and re-links it with the normal handler
//! primitives, so a restored world satisfies the same invariants as one
//! built live. Sessions, combat and characters awaiting reaping are not
//! persisted.

use crate::world::*;
use crate::{MudError, MudResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub time: GameTime,
    pub limbo: Option<Vnum>,
    pub recall: Option<Vnum>,
    pub areas: Vec<AreaSnapshot>,
    pub rooms: Vec<RoomSnapshot>,
    pub characters: Vec<CharacterSnapshot>,
    /// Objects outside every room, inventory and container
    pub loose_objects: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSnapshot {
    pub name: String,
    pub age: i32,
    pub needs_reset: bool,
    pub resets: Vec<Reset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub vnum: Vnum,
    pub name: String,
    /// Index into [`WorldSnapshot::areas`]
    pub area: Option<usize>,
    pub flags: RoomFlags,
    pub exits: Vec<Exit>,
    /// Indices into [`WorldSnapshot::characters`], in room order
    pub people: Vec<usize>,
    pub contents: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub uid: Uuid,
    pub name: String,
    pub is_npc: bool,
    pub level: i32,
    pub hit: i32,
    pub max_hit: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub movement: i32,
    pub max_movement: i32,
    pub hitroll: i32,
    pub damroll: i32,
    pub armor: i32,
    pub resource: i32,
    pub position: Position,
    pub affected_by: AffectFlags,
    pub act: ActFlags,
    pub class: ClassState,
    pub origin: Option<String>,
    /// Room to return to on leaving the void
    #[serde(default)]
    pub was_in_room: Option<Vnum>,
    /// Newest first, stats already include their modifiers
    pub affects: Vec<AffectSpec>,
    pub inventory: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub template: ObjectTemplate,
    pub contents: Vec<ObjectSnapshot>,
}

impl WorldSnapshot {
    /// Writes the snapshot as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> MudResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reads a JSON snapshot.
    pub fn load(path: impl AsRef<Path>) -> MudResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: WorldSnapshot = serde_json::from_str(&text)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(MudError::InvalidState(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

impl World {
    /// Captures the world's persistent state.
    pub fn snapshot(&self) -> WorldSnapshot {
        let area_index: HashMap<AreaId, usize> =
            self.areas().enumerate().map(|(i, id)| (id, i)).collect();

        let living: Vec<CharId> = self
            .characters()
            .filter(|&id| !self.characters[id].dying)
            .collect();
        let char_index: HashMap<CharId, usize> =
            living.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let areas = self
            .areas()
            .map(|id| {
                let area = &self.areas[id];
                AreaSnapshot {
                    name: area.name.clone(),
                    age: area.age,
                    needs_reset: area.needs_reset,
                    resets: area.resets.clone(),
                }
            })
            .collect();

        let rooms = self
            .rooms()
            .map(|id| {
                let room = &self.rooms[id];
                RoomSnapshot {
                    vnum: room.vnum,
                    name: room.name.clone(),
                    area: room.area.and_then(|a| area_index.get(&a).copied()),
                    flags: room.flags,
                    exits: room.exits.clone(),
                    people: self
                        .people_in(id)
                        .filter_map(|ch| char_index.get(&ch).copied())
                        .collect(),
                    contents: self
                        .contents_of_room(id)
                        .map(|obj| self.object_snapshot(obj))
                        .collect(),
                }
            })
            .collect();

        let characters = living
            .iter()
            .map(|&id| self.character_snapshot(id))
            .collect();

        let loose_objects = self
            .objects()
            .filter(|&obj| self.objects[obj].location == ObjLocation::Nowhere)
            .map(|obj| self.object_snapshot(obj))
            .collect();

        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            time: self.time,
            limbo: self.limbo,
            recall: self.recall,
            areas,
            rooms,
            characters,
            loose_objects,
        }
    }

    fn character_snapshot(&self, id: CharId) -> CharacterSnapshot {
        let ch = &self.characters[id];
        let position = match ch.position {
            Position::Fighting => Position::Standing,
            other => other,
        };
        CharacterSnapshot {
            uid: ch.uid,
            name: ch.name.clone(),
            is_npc: ch.is_npc,
            level: ch.level,
            hit: ch.hit,
            max_hit: ch.max_hit,
            mana: ch.mana,
            max_mana: ch.max_mana,
            movement: ch.movement,
            max_movement: ch.max_movement,
            hitroll: ch.hitroll,
            damroll: ch.damroll,
            armor: ch.armor,
            resource: ch.resource,
            position,
            affected_by: ch.affected_by,
            act: ch.act,
            class: ch.class.clone(),
            origin: ch.origin.clone(),
            was_in_room: ch
                .was_in_room
                .and_then(|room| self.rooms.get(room))
                .map(|room| room.vnum),
            affects: self
                .affects_of(id)
                .map(|affect| {
                    let data = &self.affects[affect];
                    AffectSpec {
                        kind: data.kind,
                        duration: data.duration,
                        apply: data.apply,
                        modifier: data.modifier,
                        flags: data.flags,
                    }
                })
                .collect(),
            inventory: self
                .carried_by(id)
                .map(|obj| self.object_snapshot(obj))
                .collect(),
        }
    }

    fn object_snapshot(&self, id: ObjId) -> ObjectSnapshot {
        let obj = &self.objects[id];
        ObjectSnapshot {
            template: ObjectTemplate {
                name: obj.name.clone(),
                item_type: obj.item_type,
                weight: obj.weight,
                timer: obj.timer,
            },
            contents: self
                .contents_of(id)
                .map(|inner| self.object_snapshot(inner))
                .collect(),
        }
    }

    /// Rebuilds a world from a snapshot.
    pub fn restore(snapshot: &WorldSnapshot, seed: u64) -> MudResult<World> {
        let mut world = World::new(seed);
        world.time = snapshot.time;
        world.limbo = snapshot.limbo;
        world.recall = snapshot.recall;

        let mut areas = Vec::with_capacity(snapshot.areas.len());
        for area in &snapshot.areas {
            let id = world.create_area(area.name.clone());
            let data = &mut world.areas[id];
            data.age = area.age;
            data.resets = area.resets.clone();
            areas.push(id);
        }

        let mut characters = Vec::with_capacity(snapshot.characters.len());
        for ch in &snapshot.characters {
            characters.push(world.restore_character(ch)?);
        }

        for room in &snapshot.rooms {
            let area = match room.area {
                Some(index) => Some(*areas.get(index).ok_or_else(|| {
                    MudError::InvalidState(format!("room {} names area {}", room.vnum, index))
                })?),
                None => None,
            };
            let id = world.create_room(room.vnum, room.name.clone(), area)?;
            world.rooms[id].flags = room.flags;
            world.rooms[id].exits = room.exits.clone();

            for &index in room.people.iter().rev() {
                let ch = *characters.get(index).ok_or_else(|| {
                    MudError::InvalidState(format!("room {} names character {}", room.vnum, index))
                })?;
                world.char_to_room(ch, id)?;
            }
            for obj in room.contents.iter().rev() {
                let obj = world.restore_object(obj)?;
                world.obj_to_room(obj, id)?;
            }
        }

        for obj in &snapshot.loose_objects {
            world.restore_object(obj)?;
        }

        for (&id, ch) in characters.iter().zip(&snapshot.characters) {
            if let Some(vnum) = ch.was_in_room {
                let room = world.room_by_vnum(vnum).map_err(|_| {
                    MudError::InvalidState(format!("{} returns to missing room {}", ch.name, vnum))
                })?;
                world.characters[id].was_in_room = Some(room);
            }
        }

        // Set last, so placing players does not trigger the pending resets.
        for (area, data) in areas.iter().zip(&snapshot.areas) {
            world.areas[*area].needs_reset = data.needs_reset;
        }

        world
            .check_integrity()
            .map_err(|err| MudError::InvalidState(err.to_string()))?;
        Ok(world)
    }

    fn restore_character(&mut self, snap: &CharacterSnapshot) -> MudResult<CharId> {
        let template = CharacterTemplate {
            name: snap.name.clone(),
            is_npc: snap.is_npc,
            level: snap.level,
            max_hit: snap.max_hit,
            max_mana: snap.max_mana,
            max_movement: snap.max_movement,
            damroll: snap.damroll,
            act: snap.act,
            class: snap.class.clone(),
        };
        let id = self.create_character(&template);
        {
            let ch = &mut self.characters[id];
            ch.uid = snap.uid;
            ch.hit = snap.hit;
            ch.mana = snap.mana;
            ch.movement = snap.movement;
            ch.hitroll = snap.hitroll;
            ch.armor = snap.armor;
            ch.resource = snap.resource;
            ch.position = snap.position;
            ch.affected_by = snap.affected_by;
            ch.origin = snap.origin.clone();
        }

        for spec in snap.affects.iter().rev() {
            self.attach_affect(id, *spec)?;
        }
        for obj in snap.inventory.iter().rev() {
            let obj = self.restore_object(obj)?;
            self.obj_to_char(obj, id)?;
        }
        Ok(id)
    }

    fn restore_object(&mut self, snap: &ObjectSnapshot) -> MudResult<ObjId> {
        let id = self.create_object(&snap.template);
        for inner in snap.contents.iter().rev() {
            let inner = self.restore_object(inner)?;
            self.obj_to_obj(inner, id)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> World {
        let mut world = World::new(13);
        let area = world.create_area("Keep");
        let hall = world.create_room(1, "Hall", Some(area)).unwrap();
        world.create_room(2, "Tower", Some(area)).unwrap();
        world.link_rooms(1, Direction::Up, 2).unwrap();

        let ava = world.create_character(&CharacterTemplate::player("Ava"));
        let bo = world.create_character(&CharacterTemplate::player("Bo"));
        world.char_to_room(ava, hall).unwrap();
        world.char_to_room(bo, hall).unwrap();
        world
            .affect_to_char(
                ava,
                AffectSpec {
                    kind: AffectKind::Bless,
                    duration: 4,
                    apply: Apply::Hitroll,
                    modifier: 2,
                    flags: AffectFlags::empty(),
                },
            )
            .unwrap();

        let pack = world.create_object(&ObjectTemplate::new("pack", ItemType::Container));
        let bread = world.create_object(&ObjectTemplate::new("bread", ItemType::Food).with_timer(9));
        world.obj_to_char(pack, ava).unwrap();
        world.obj_to_obj(bread, pack).unwrap();
        world
    }

    #[test]
    fn test_restore_reproduces_snapshot() {
        let world = small_world();
        let snapshot = world.snapshot();
        let restored = World::restore(&snapshot, 99).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.character_count(), 2);
        assert_eq!(restored.object_count(), 2);
        let hall = restored.room_by_vnum(1).unwrap();
        let names: Vec<_> = restored
            .people_in(hall)
            .map(|id| restored.character(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Bo", "Ava"]);
    }

    #[test]
    fn test_restore_does_not_reapply_modifiers() {
        let world = small_world();
        let restored = World::restore(&world.snapshot(), 1).unwrap();
        let ava = restored.find_character("Ava").unwrap();
        assert_eq!(restored.character(ava).unwrap().hitroll, 2);
        assert_eq!(restored.character(ava).unwrap().carry_weight, 2);
    }

    #[test]
    fn test_dying_characters_are_not_saved() {
        let mut world = small_world();
        let hall = world.room_by_vnum(1).unwrap();
        let rat = world.create_character(&CharacterTemplate::mobile("rat", 1));
        world.char_to_room(rat, hall).unwrap();
        world.character_mut(rat).unwrap().dying = true;

        let snapshot = world.snapshot();
        assert_eq!(snapshot.characters.len(), 2);
        assert_eq!(snapshot.rooms[0].people.len(), 2);
    }

    #[test]
    fn test_void_return_room_survives_restore() {
        let mut world = small_world();
        let tower = world.room_by_vnum(2).unwrap();
        let ava = world.find_character("Ava").unwrap();
        world.character_mut(ava).unwrap().was_in_room = Some(tower);

        let snapshot = world.snapshot();
        assert!(snapshot
            .characters
            .iter()
            .any(|ch| ch.name == "Ava" && ch.was_in_room == Some(2)));
        let restored = World::restore(&snapshot, 5).unwrap();
        assert_eq!(restored.snapshot(), snapshot);

        let ava = restored.find_character("Ava").unwrap();
        let tower = restored.room_by_vnum(2).unwrap();
        assert_eq!(restored.character(ava).unwrap().was_in_room, Some(tower));
        let bo = restored.find_character("Bo").unwrap();
        assert_eq!(restored.character(bo).unwrap().was_in_room, None);

        let mut broken = snapshot;
        for ch in &mut broken.characters {
            ch.was_in_room = ch.was_in_room.map(|_| 404);
        }
        assert!(matches!(
            World::restore(&broken, 5),
            Err(MudError::InvalidState(_))
        ));
    }

    #[test]
    fn test_bad_index_rejected() {
        let mut snapshot = small_world().snapshot();
        snapshot.rooms[0].people.push(7);
        assert!(matches!(
            World::restore(&snapshot, 1),
            Err(MudError::InvalidState(_))
        ));
    }
}
