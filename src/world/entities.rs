//! # Entities
//!
//! The in-world entity types and the embedded nodes that give them roster
//! membership. Entities are only created through the factories on
//! [`World`](super::World), which build every node against the entity's
//! arena key before the entity becomes reachable.

use super::classes::ClassState;
use crate::config::OUTPUT_LIMIT;
use crate::list::{List, ListNode};
use crate::list_member;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use uuid::Uuid;

new_key_type! {
    /// Arena handle for a character (player or mobile).
    pub struct CharId;
    /// Arena handle for an object.
    pub struct ObjId;
    /// Arena handle for a room.
    pub struct RoomId;
    /// Arena handle for an area.
    pub struct AreaId;
    /// Arena handle for an affect attached to a character.
    pub struct AffectId;
    /// Arena handle for a connected session.
    pub struct SessionId;
}

/// Room virtual number, the stable identifier used by area data.
pub type Vnum = u32;

bitflags! {
    /// Status flags a character can be affected by.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AffectFlags: u32 {
        const BLIND = 1 << 0;
        const INVISIBLE = 1 << 1;
        const DETECT_INVIS = 1 << 2;
        const DETECT_HIDDEN = 1 << 3;
        const SANCTUARY = 1 << 4;
        const POISON = 1 << 5;
        const FLYING = 1 << 6;
        const CHARM = 1 << 7;
        const HASTE = 1 << 8;
        const REGENERATION = 1 << 9;
    }
}

bitflags! {
    /// Behaviour flags for mobiles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActFlags: u32 {
        /// Never wanders.
        const SENTINEL = 1 << 0;
        /// Attacks players on sight.
        const AGGRESSIVE = 1 << 1;
        /// Does not wander out of its area.
        const STAY_AREA = 1 << 2;
    }
}

bitflags! {
    /// Room properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RoomFlags: u32 {
        /// Mobiles never wander in.
        const NO_MOB = 1 << 0;
        /// No combat may start here.
        const SAFE = 1 << 1;
        /// Weather messages are not heard here.
        const INDOORS = 1 << 2;
    }
}

/// Posture of a character; `Fighting` selects the combat regeneration rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Dead,
    Sleeping,
    Resting,
    Standing,
    Fighting,
}

impl Position {
    pub fn is_awake(self) -> bool {
        self > Position::Sleeping
    }
}

/// Exit directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// A one-way passage to another room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub direction: Direction,
    pub to: Vnum,
}

/// Kind of object, which decides how it decays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Trash,
    Light,
    Weapon,
    Armor,
    Food,
    Container,
    NpcCorpse,
    PcCorpse,
}

impl ItemType {
    pub fn holds_contents(self) -> bool {
        matches!(
            self,
            ItemType::Container | ItemType::NpcCorpse | ItemType::PcCorpse
        )
    }
}

/// Where an object currently is. Mirrors which embedded node is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjLocation {
    Nowhere,
    Room(RoomId),
    Carried(CharId),
    Inside(ObjId),
}

/// Stat an affect modifies while it is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Apply {
    None,
    Hitroll,
    Damroll,
    MaxHit,
    Armor,
}

/// The spell or effect an affect represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffectKind {
    Bless,
    Poison,
    Sanctuary,
    Haste,
    Regeneration,
    Blindness,
    Charm,
}

impl AffectKind {
    /// Message shown to the bearer when the affect wears off.
    pub fn wear_off(self) -> &'static str {
        match self {
            AffectKind::Bless => "You feel less righteous.",
            AffectKind::Poison => "You feel less sick.",
            AffectKind::Sanctuary => "The white aura around your body fades.",
            AffectKind::Haste => "You feel yourself slow down.",
            AffectKind::Regeneration => "Your body stops knitting itself together.",
            AffectKind::Blindness => "You can see again.",
            AffectKind::Charm => "You feel more self-confident.",
        }
    }
}

/// Parameters for attaching an affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectSpec {
    pub kind: AffectKind,
    /// Remaining ticks; negative means permanent.
    pub duration: i32,
    pub apply: Apply,
    pub modifier: i32,
    pub flags: AffectFlags,
}

/// Everything needed to construct a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterTemplate {
    pub name: String,
    pub is_npc: bool,
    pub level: i32,
    pub max_hit: i32,
    pub max_mana: i32,
    pub max_movement: i32,
    pub damroll: i32,
    pub act: ActFlags,
    pub class: ClassState,
}

impl CharacterTemplate {
    /// A player character at level 1.
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_npc: false,
            level: 1,
            max_hit: 100,
            max_mana: 100,
            max_movement: 100,
            damroll: 5,
            act: ActFlags::empty(),
            class: ClassState::None,
        }
    }

    /// A mobile scaled by level.
    pub fn mobile(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            is_npc: true,
            level,
            max_hit: 20 + level * 10,
            max_mana: 50,
            max_movement: 100,
            damroll: 2 + level,
            act: ActFlags::empty(),
            class: ClassState::None,
        }
    }

    pub fn with_act(mut self, act: ActFlags) -> Self {
        self.act = act;
        self
    }

    pub fn with_class(mut self, class: ClassState) -> Self {
        self.class = class;
        self
    }
}

/// One character, player or mobile.
#[derive(Debug, Clone)]
pub struct Character {
    pub(crate) char_node: ListNode<CharId>,
    pub(crate) room_node: ListNode<CharId>,
    pub(crate) affects: List<AffectId>,
    pub(crate) carrying: List<ObjId>,
    pub(crate) in_room: Option<RoomId>,
    pub(crate) dying: bool,

    /// Persistent identity, stable across save and restore
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
    /// Class resource (resonance, focus, power)
    pub resource: i32,
    pub position: Position,
    pub fighting: Option<CharId>,
    pub was_in_room: Option<RoomId>,
    pub affected_by: AffectFlags,
    pub act: ActFlags,
    pub class: ClassState,
    pub session: Option<SessionId>,
    pub carry_number: i32,
    pub carry_weight: i32,
    /// Template name this mobile was reset from
    pub origin: Option<String>,
    /// Pending output, drained by the network layer through
    /// [`Character::take_output`]. Never more than [`OUTPUT_LIMIT`] lines.
    pub messages: Vec<String>,
}

impl Character {
    pub(crate) fn from_template(id: CharId, template: &CharacterTemplate) -> Self {
        Self {
            char_node: ListNode::new(id),
            room_node: ListNode::new(id),
            affects: List::new(),
            carrying: List::new(),
            in_room: None,
            dying: false,
            uid: Uuid::new_v4(),
            name: template.name.clone(),
            is_npc: template.is_npc,
            level: template.level,
            hit: template.max_hit,
            max_hit: template.max_hit,
            mana: template.max_mana,
            max_mana: template.max_mana,
            movement: template.max_movement,
            max_movement: template.max_movement,
            hitroll: 0,
            damroll: template.damroll,
            armor: 0,
            resource: 0,
            position: Position::Standing,
            fighting: None,
            was_in_room: None,
            affected_by: AffectFlags::empty(),
            act: template.act,
            class: template.class.clone(),
            session: None,
            carry_number: 0,
            carry_weight: 0,
            origin: None,
            messages: Vec::new(),
        }
    }

    pub fn in_room(&self) -> Option<RoomId> {
        self.in_room
    }

    /// True once the character has died and awaits extraction.
    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub fn is_fighting(&self) -> bool {
        self.position == Position::Fighting
    }

    pub fn affect_count(&self) -> usize {
        self.affects.len()
    }

    pub fn carried_count(&self) -> usize {
        self.carrying.len()
    }

    /// Queues a line of output for this character. Mobiles have no one to
    /// read it, so nothing is kept for them.
    pub fn send(&mut self, text: impl Into<String>) {
        if self.is_npc {
            return;
        }
        if self.messages.len() >= OUTPUT_LIMIT {
            self.messages.remove(0);
        }
        self.messages.push(text.into());
    }

    /// Hands over the pending output, leaving the queue empty.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

/// Everything needed to construct an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    pub name: String,
    pub item_type: ItemType,
    pub weight: i32,
    /// Ticks until decay; zero never decays
    pub timer: i32,
}

impl ObjectTemplate {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
            weight: 1,
            timer: 0,
        }
    }

    pub fn with_timer(mut self, timer: i32) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }
}

/// One object instance.
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) obj_node: ListNode<ObjId>,
    pub(crate) room_node: ListNode<ObjId>,
    /// Shared by inventories and container contents; an object is in at
    /// most one of them at a time
    pub(crate) content_node: ListNode<ObjId>,
    pub(crate) contents: List<ObjId>,
    pub(crate) location: ObjLocation,

    pub name: String,
    pub item_type: ItemType,
    pub weight: i32,
    pub timer: i32,
}

impl Object {
    pub(crate) fn from_template(id: ObjId, template: &ObjectTemplate) -> Self {
        Self {
            obj_node: ListNode::new(id),
            room_node: ListNode::new(id),
            content_node: ListNode::new(id),
            contents: List::new(),
            location: ObjLocation::Nowhere,
            name: template.name.clone(),
            item_type: template.item_type,
            weight: template.weight,
            timer: template.timer,
        }
    }

    pub fn location(&self) -> ObjLocation {
        self.location
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }
}

/// One room.
#[derive(Debug, Clone)]
pub struct Room {
    pub(crate) node: ListNode<RoomId>,
    pub(crate) people: List<CharId>,
    pub(crate) contents: List<ObjId>,

    pub vnum: Vnum,
    pub name: String,
    pub area: Option<AreaId>,
    pub flags: RoomFlags,
    pub exits: Vec<Exit>,
}

impl Room {
    pub fn people_count(&self) -> usize {
        self.people.len()
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    pub fn exit(&self, direction: Direction) -> Option<Vnum> {
        self.exits
            .iter()
            .find(|exit| exit.direction == direction)
            .map(|exit| exit.to)
    }
}

/// A reset command run when an area repopulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reset {
    /// Load the mobile into the room until `limit` copies exist.
    Mobile {
        template: CharacterTemplate,
        room: Vnum,
        limit: usize,
    },
    /// Load the object into the room unless one of the same name lies there.
    Object { template: ObjectTemplate, room: Vnum },
}

/// A zone of rooms that ages and resets as a unit.
#[derive(Debug, Clone)]
pub struct Area {
    pub(crate) node: ListNode<AreaId>,

    pub name: String,
    /// Area ticks since the last reset
    pub age: i32,
    /// Players currently inside
    pub nplayer: i32,
    /// Came due while empty; resets when the first player enters
    pub needs_reset: bool,
    pub resets: Vec<Reset>,
}

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnState {
    Playing,
    /// Idle long enough to be pulled out of the world
    Void,
}

/// A connected client.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) node: ListNode<SessionId>,

    pub host: String,
    pub character: Option<CharId>,
    /// Idle minutes since the last input
    pub idle: u32,
    pub state: ConnState,
}

/// An affect attached to a character.
#[derive(Debug, Clone)]
pub struct Affect {
    pub(crate) node: ListNode<AffectId>,

    pub owner: CharId,
    pub kind: AffectKind,
    pub duration: i32,
    pub apply: Apply,
    pub modifier: i32,
    pub flags: AffectFlags,
}

impl Affect {
    pub fn is_permanent(&self) -> bool {
        self.duration < 0
    }
}

list_member!(
    /// Global character roster.
    pub CharRoster: Character, CharId, char_node
);
list_member!(
    /// A room's people.
    pub RoomPeople: Character, CharId, room_node
);
list_member!(
    /// Global object roster.
    pub ObjRoster: Object, ObjId, obj_node
);
list_member!(
    /// A room's contents.
    pub RoomContents: Object, ObjId, room_node
);
list_member!(
    /// An inventory or a container's contents.
    pub Contents: Object, ObjId, content_node
);
list_member!(
    /// Global room roster.
    pub RoomRoster: Room, RoomId, node
);
list_member!(
    /// Global area roster.
    pub AreaRoster: Area, AreaId, node
);
list_member!(
    /// Global session roster.
    pub SessionRoster: Session, SessionId, node
);
list_member!(
    /// A character's affects.
    pub AffectChain: Affect, AffectId, node
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn test_mobiles_keep_no_output() {
        let mut world = World::new(1);
        let mob = world.create_character(&CharacterTemplate::mobile("rat", 1));
        let rat = world.character_mut(mob).unwrap();
        rat.send("You are hit.");
        assert!(rat.messages.is_empty());
    }

    #[test]
    fn test_output_drops_oldest_past_limit() {
        let mut world = World::new(1);
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let ava = world.character_mut(pc).unwrap();
        for line in 0..OUTPUT_LIMIT + 5 {
            ava.send(format!("line {}", line));
        }
        assert_eq!(ava.messages.len(), OUTPUT_LIMIT);
        assert_eq!(ava.messages[0], "line 5");

        let output = ava.take_output();
        assert_eq!(output.len(), OUTPUT_LIMIT);
        assert_eq!(output.last().map(String::as_str), Some("line 104"));
        assert!(ava.messages.is_empty());
    }
}
