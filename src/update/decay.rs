//! Object timers.

use super::PulseReport;
use crate::list::Member;
use crate::world::{CharId, Contents, ItemType, ObjId, ObjLocation, ObjRoster, RoomId, World};
use crate::MudResult;
use log::warn;

/// Where a decaying container's contents end up.
enum Spill {
    Room(RoomId),
    Carrier(CharId),
    Container(ObjId),
    Nowhere,
}

/// Counts down object timers. An object whose timer runs out decays: its
/// contents spill out to wherever it was and the object is extracted as
/// the current element of the roster walk. Spilled contents stay in the
/// roster, so no other element is removed during the visit.
pub fn obj_update(world: &mut World, report: &mut PulseReport) {
    let mut walk = world.object_list.walk();
    while let Some(obj) = walk.next(&ObjRoster::within(&world.objects)) {
        let data = &mut world.objects[obj];
        if data.timer <= 0 {
            continue;
        }
        data.timer -= 1;
        if data.timer > 0 {
            continue;
        }

        match decay(world, obj) {
            Ok(()) => report.objects_decayed += 1,
            Err(err) => warn!("Decay of {:?} failed: {}", obj, err),
        }
    }
}

fn decay(world: &mut World, obj: ObjId) -> MudResult<()> {
    let (name, item_type, location) = {
        let data = &world.objects[obj];
        (data.name.clone(), data.item_type, data.location)
    };
    let message = match item_type {
        ItemType::NpcCorpse | ItemType::PcCorpse => format!("{} decays into dust.", name),
        ItemType::Food => format!("{} decomposes.", name),
        _ => format!("{} crumbles into dust.", name),
    };

    let spill = match location {
        ObjLocation::Room(room) => {
            world.send_to_room(room, &[], &message);
            Spill::Room(room)
        }
        ObjLocation::Carried(ch) => {
            world.characters[ch].send(message);
            match world.characters[ch].in_room {
                Some(room) => Spill::Room(room),
                None => Spill::Carrier(ch),
            }
        }
        ObjLocation::Inside(parent) => Spill::Container(parent),
        ObjLocation::Nowhere => Spill::Nowhere,
    };

    if item_type.holds_contents() {
        let mut walk = world.objects[obj].contents.walk();
        while let Some(inner) = walk.next(&Contents::within(&world.objects)) {
            world.obj_from_obj(inner)?;
            match spill {
                Spill::Room(room) => world.obj_to_room(inner, room)?,
                Spill::Carrier(ch) => world.obj_to_char(inner, ch)?,
                Spill::Container(parent) => world.obj_to_obj(inner, parent)?,
                Spill::Nowhere => warn!("{} spilled out of {} into nowhere", world.objects[inner].name, name),
            }
        }
    }

    world.extract_obj(obj)
}
