//! A small hand-built world for the binary and the scenario tests.

use crate::config::{ROOM_VNUM_ALTAR, ROOM_VNUM_LIMBO};
use crate::world::*;
use crate::MudResult;

/// Market square vnum.
pub const ROOM_VNUM_SQUARE: Vnum = 3001;
/// Forest path vnum.
pub const ROOM_VNUM_PATH: Vnum = 3002;
/// Wolf den vnum.
pub const ROOM_VNUM_DEN: Vnum = 3003;

/// Builds the outskirts: a temple, a market, a forest path and a wolf den,
/// three players of different classes with sessions, and the area's
/// first reset already run.
pub fn demo_world(seed: u64) -> MudResult<World> {
    let mut world = World::new(seed);
    world.limbo = Some(ROOM_VNUM_LIMBO);
    world.recall = Some(ROOM_VNUM_ALTAR);

    let outskirts = world.create_area("Midgaard Outskirts");
    let void = world.create_room(ROOM_VNUM_LIMBO, "The Void", None)?;
    if let Some(room) = world.room_mut(void) {
        room.flags |= RoomFlags::SAFE | RoomFlags::NO_MOB;
    }

    let altar = world.create_room(ROOM_VNUM_ALTAR, "The Temple Altar", Some(outskirts))?;
    if let Some(room) = world.room_mut(altar) {
        room.flags |= RoomFlags::SAFE | RoomFlags::INDOORS | RoomFlags::NO_MOB;
    }
    let square = world.create_room(ROOM_VNUM_SQUARE, "Market Square", Some(outskirts))?;
    let path = world.create_room(ROOM_VNUM_PATH, "Forest Path", Some(outskirts))?;
    let den = world.create_room(ROOM_VNUM_DEN, "Wolf Den", Some(outskirts))?;

    world.link_rooms(ROOM_VNUM_ALTAR, Direction::South, ROOM_VNUM_SQUARE)?;
    world.link_rooms(ROOM_VNUM_SQUARE, Direction::East, ROOM_VNUM_PATH)?;
    world.link_rooms(ROOM_VNUM_PATH, Direction::East, ROOM_VNUM_DEN)?;

    if let Some(area) = world.area_mut(outskirts) {
        area.resets = vec![
            Reset::Mobile {
                template: CharacterTemplate::mobile("a grey wolf", 3)
                    .with_act(ActFlags::AGGRESSIVE | ActFlags::STAY_AREA),
                room: ROOM_VNUM_DEN,
                limit: 2,
            },
            Reset::Mobile {
                template: CharacterTemplate::mobile("a rabbit", 1).with_act(ActFlags::STAY_AREA),
                room: ROOM_VNUM_PATH,
                limit: 3,
            },
            Reset::Mobile {
                template: CharacterTemplate::mobile("the town crier", 5)
                    .with_act(ActFlags::SENTINEL),
                room: ROOM_VNUM_SQUARE,
                limit: 1,
            },
            Reset::Object {
                template: ObjectTemplate::new("a rusty lantern", ItemType::Light),
                room: ROOM_VNUM_SQUARE,
            },
        ];
    }
    world.reset_area(outskirts);

    let aldric = world.create_character(
        &CharacterTemplate {
            level: 10,
            max_hit: 300,
            damroll: 12,
            ..CharacterTemplate::player("Aldric")
        }
        .with_class(ClassState::Dirgesinger(Dirgesinger {
            dirge_ticks: 4,
            dirge_stacks: 1,
            battlehymn: 6,
            ..Dirgesinger::default()
        })),
    );
    let mira = world.create_character(
        &CharacterTemplate::player("Mira").with_class(ClassState::Psion(Psion {
            levitate: 3,
            thought_shield: 5,
            thought_shield_hp: 40,
            ..Psion::default()
        })),
    );
    let tobin = world.create_character(
        &CharacterTemplate::player("Tobin").with_class(ClassState::Mechanist(Mechanist {
            core: CoreImplant::Regenerator,
            repair_swarm: 2,
            ..Mechanist::default()
        })),
    );

    world.char_to_room(aldric, den)?;
    world.char_to_room(mira, square)?;
    world.char_to_room(tobin, path)?;
    for (host, ch) in [("10.0.0.2", aldric), ("10.0.0.3", mira), ("10.0.0.4", tobin)] {
        world.open_session(host, Some(ch))?;
    }

    world.affect_to_char(
        tobin,
        AffectSpec {
            kind: AffectKind::Haste,
            duration: 6,
            apply: Apply::None,
            modifier: 0,
            flags: AffectFlags::HASTE,
        },
    )?;
    world.affect_to_char(
        mira,
        AffectSpec {
            kind: AffectKind::Regeneration,
            duration: 3,
            apply: Apply::None,
            modifier: 0,
            flags: AffectFlags::REGENERATION,
        },
    )?;
    if let Some(ch) = world.character_mut(mira) {
        ch.affected_by |= AffectFlags::FLYING;
    }

    let satchel = world.create_object(&ObjectTemplate::new("a leather satchel", ItemType::Container));
    let vial = world.create_object(&ObjectTemplate::new("a blue vial", ItemType::Trash));
    world.obj_to_char(satchel, mira)?;
    world.obj_to_obj(vial, satchel)?;

    let bread = world.create_object(
        &ObjectTemplate::new("a loaf of bread", ItemType::Food).with_timer(3),
    );
    world.obj_to_room(bread, square)?;

    if let Some(rabbit) = world.find_character("a rabbit") {
        world.affect_to_char(
            rabbit,
            AffectSpec {
                kind: AffectKind::Poison,
                duration: 2,
                apply: Apply::None,
                modifier: 0,
                flags: AffectFlags::POISON,
            },
        )?;
    }

    Ok(world)
}
