//! # World Module
//!
//! The single aggregate owning every entity arena and every roster.
//!
//! Entities live in generational slot maps; membership lives in intrusive
//! lists threaded through nodes embedded in the entities. The world owns
//! the global rosters, each room owns its people and contents, each
//! character owns its inventory and affect chain, and each container owns
//! its contents. The scheduler and every handler receive the world by
//! reference; there is no ambient global state.

pub mod classes;
pub mod entities;
pub mod fight;
pub mod handler;
pub mod integrity;

pub use classes::*;
pub use entities::*;
pub use fight::{DamageOutcome, Death};
pub use handler::ResetOutcome;
pub use integrity::*;

use crate::list::{List, ListNode, Member};
use crate::{MudError, MudResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

/// Sky conditions cycled by the weather update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sky {
    Cloudless,
    Cloudy,
    Raining,
    Lightning,
}

/// In-game calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTime {
    pub hour: u32,
    pub day: u32,
    pub sky: Sky,
}

impl Default for GameTime {
    fn default() -> Self {
        Self {
            hour: 0,
            day: 0,
            sky: Sky::Cloudless,
        }
    }
}

/// Every live entity and every collection over them.
#[derive(Debug)]
pub struct World {
    pub(crate) characters: SlotMap<CharId, Character>,
    pub(crate) objects: SlotMap<ObjId, Object>,
    pub(crate) rooms: SlotMap<RoomId, Room>,
    pub(crate) areas: SlotMap<AreaId, Area>,
    pub(crate) affects: SlotMap<AffectId, Affect>,
    pub(crate) sessions: SlotMap<SessionId, Session>,

    pub(crate) char_list: List<CharId>,
    pub(crate) object_list: List<ObjId>,
    pub(crate) room_list: List<RoomId>,
    pub(crate) area_list: List<AreaId>,
    pub(crate) session_list: List<SessionId>,

    pub(crate) room_index: HashMap<Vnum, RoomId>,
    pub(crate) rng: StdRng,
    /// Resets run by `char_to_room` since the last drain
    pub(crate) deferred_resets: Vec<ResetOutcome>,

    pub time: GameTime,
    /// Room idle players are parked in
    pub limbo: Option<Vnum>,
    /// Room dead players are returned to
    pub recall: Option<Vnum>,
}

impl World {
    /// Creates an empty world with a seeded random source.
    ///
    /// # Examples
    ///
    /// ```
    /// use mudcore::World;
    ///
    /// let world = World::new(42);
    /// assert_eq!(world.character_count(), 0);
    /// assert_eq!(world.room_count(), 0);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            characters: SlotMap::with_key(),
            objects: SlotMap::with_key(),
            rooms: SlotMap::with_key(),
            areas: SlotMap::with_key(),
            affects: SlotMap::with_key(),
            sessions: SlotMap::with_key(),
            char_list: List::new(),
            object_list: List::new(),
            room_list: List::new(),
            area_list: List::new(),
            session_list: List::new(),
            room_index: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            deferred_resets: Vec::new(),
            time: GameTime::default(),
            limbo: None,
            recall: None,
        }
    }

    // Factories. Each builds every embedded node against the new key and
    // links the entity into its global roster before returning it.

    /// Creates a character outside any room and adds it to the roster.
    pub fn create_character(&mut self, template: &CharacterTemplate) -> CharId {
        let id = self
            .characters
            .insert_with_key(|id| Character::from_template(id, template));
        self.char_list
            .push_back(&mut CharRoster::within_mut(&mut self.characters), id);
        id
    }

    /// Creates an object located nowhere and adds it to the roster.
    pub fn create_object(&mut self, template: &ObjectTemplate) -> ObjId {
        let id = self
            .objects
            .insert_with_key(|id| Object::from_template(id, template));
        self.object_list
            .push_back(&mut ObjRoster::within_mut(&mut self.objects), id);
        id
    }

    /// Creates an area.
    pub fn create_area(&mut self, name: impl Into<String>) -> AreaId {
        let name = name.into();
        let id = self.areas.insert_with_key(|id| Area {
            node: ListNode::new(id),
            name,
            age: 0,
            nplayer: 0,
            needs_reset: false,
            resets: Vec::new(),
        });
        self.area_list
            .push_back(&mut AreaRoster::within_mut(&mut self.areas), id);
        id
    }

    /// Creates a room. Vnums are unique.
    pub fn create_room(
        &mut self,
        vnum: Vnum,
        name: impl Into<String>,
        area: Option<AreaId>,
    ) -> MudResult<RoomId> {
        if self.room_index.contains_key(&vnum) {
            return Err(MudError::InvalidState(format!(
                "room {} already exists",
                vnum
            )));
        }
        if let Some(area) = area {
            if !self.areas.contains_key(area) {
                return Err(MudError::NotFound(format!("area for room {}", vnum)));
            }
        }

        let name = name.into();
        let id = self.rooms.insert_with_key(|id| Room {
            node: ListNode::new(id),
            people: List::new(),
            contents: List::new(),
            vnum,
            name,
            area,
            flags: RoomFlags::empty(),
            exits: Vec::new(),
        });
        self.room_list
            .push_back(&mut RoomRoster::within_mut(&mut self.rooms), id);
        self.room_index.insert(vnum, id);
        Ok(id)
    }

    /// Adds a one-way exit. The destination may be created later.
    pub fn add_exit(&mut self, from: Vnum, direction: Direction, to: Vnum) -> MudResult<()> {
        let room = self.room_by_vnum(from)?;
        let exits = &mut self.rooms[room].exits;
        exits.retain(|exit| exit.direction != direction);
        exits.push(Exit { direction, to });
        Ok(())
    }

    /// Adds exits in both directions.
    pub fn link_rooms(&mut self, a: Vnum, direction: Direction, b: Vnum) -> MudResult<()> {
        let back = match direction {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        };
        self.add_exit(a, direction, b)?;
        self.add_exit(b, back, a)
    }

    /// Opens a session, optionally attached to a character.
    pub fn open_session(
        &mut self,
        host: impl Into<String>,
        character: Option<CharId>,
    ) -> MudResult<SessionId> {
        if let Some(ch) = character {
            let ch = self
                .characters
                .get(ch)
                .ok_or_else(|| MudError::NotFound("character for session".to_string()))?;
            if ch.session.is_some() {
                return Err(MudError::InvalidAction(format!(
                    "{} already has a session",
                    ch.name
                )));
            }
        }

        let host = host.into();
        let id = self.sessions.insert_with_key(|id| Session {
            node: ListNode::new(id),
            host,
            character,
            idle: 0,
            state: ConnState::Playing,
        });
        self.session_list
            .push_back(&mut SessionRoster::within_mut(&mut self.sessions), id);
        if let Some(ch) = character {
            self.characters[ch].session = Some(id);
        }
        Ok(id)
    }

    // Lookups

    pub fn character(&self, id: CharId) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: CharId) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    pub fn object(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.objects.get_mut(id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id)
    }

    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.areas.get_mut(id)
    }

    pub fn affect(&self, id: AffectId) -> Option<&Affect> {
        self.affects.get(id)
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Resolves a room vnum.
    pub fn room_by_vnum(&self, vnum: Vnum) -> MudResult<RoomId> {
        self.room_index
            .get(&vnum)
            .copied()
            .ok_or_else(|| MudError::NotFound(format!("room {}", vnum)))
    }

    /// Finds a live character by name in global roster order.
    pub fn find_character(&self, name: &str) -> Option<CharId> {
        self.characters()
            .find(|&id| self.characters[id].name.eq_ignore_ascii_case(name))
    }

    // Roster sizes

    pub fn character_count(&self) -> usize {
        self.char_list.len()
    }

    pub fn object_count(&self) -> usize {
        self.object_list.len()
    }

    pub fn room_count(&self) -> usize {
        self.room_list.len()
    }

    pub fn area_count(&self) -> usize {
        self.area_list.len()
    }

    pub fn session_count(&self) -> usize {
        self.session_list.len()
    }

    /// Affects attached across all characters.
    pub fn affect_count(&self) -> usize {
        self.affects.len()
    }

    // Roster traversal, in each collection's iteration order.

    pub fn characters(&self) -> impl Iterator<Item = CharId> + '_ {
        self.char_list.iter(CharRoster::within(&self.characters))
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.object_list.iter(ObjRoster::within(&self.objects))
    }

    pub fn rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.room_list.iter(RoomRoster::within(&self.rooms))
    }

    pub fn areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.area_list.iter(AreaRoster::within(&self.areas))
    }

    pub fn sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.session_list
            .iter(SessionRoster::within(&self.sessions))
    }

    /// People in a room, most recent arrival first.
    pub fn people_in(&self, room: RoomId) -> impl Iterator<Item = CharId> + '_ {
        self.rooms[room]
            .people
            .iter(RoomPeople::within(&self.characters))
    }

    /// Objects lying in a room, most recently dropped first.
    pub fn contents_of_room(&self, room: RoomId) -> impl Iterator<Item = ObjId> + '_ {
        self.rooms[room]
            .contents
            .iter(RoomContents::within(&self.objects))
    }

    /// Objects carried by a character.
    pub fn carried_by(&self, ch: CharId) -> impl Iterator<Item = ObjId> + '_ {
        self.characters[ch]
            .carrying
            .iter(Contents::within(&self.objects))
    }

    /// Objects inside a container.
    pub fn contents_of(&self, container: ObjId) -> impl Iterator<Item = ObjId> + '_ {
        self.objects[container]
            .contents
            .iter(Contents::within(&self.objects))
    }

    /// Affects on a character, newest first.
    pub fn affects_of(&self, ch: CharId) -> impl Iterator<Item = AffectId> + '_ {
        self.characters[ch]
            .affects
            .iter(AffectChain::within(&self.affects))
    }

    /// Queues a line for every awake character in a room except `exclude`.
    pub fn send_to_room(&mut self, room: RoomId, exclude: &[CharId], text: &str) {
        let listeners: Vec<CharId> = self
            .people_in(room)
            .filter(|id| !exclude.contains(id))
            .collect();
        for id in listeners {
            let ch = &mut self.characters[id];
            if ch.position.is_awake() {
                ch.send(text);
            }
        }
    }

    /// Draws a number in `low..=high`.
    pub(crate) fn number_range(&mut self, low: i32, high: i32) -> i32 {
        use rand::Rng;
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}
