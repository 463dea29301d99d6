//! Combat rounds and mobile behaviour.

use super::PulseReport;
use crate::list::Member;
use crate::world::{ActFlags, CharId, CharRoster, Death, RoomFlags, World};
use log::{debug, warn};

/// One round for everyone fighting. A fighter whose opponent is gone,
/// dead or elsewhere stops fighting instead.
pub fn violence_update(world: &mut World, report: &mut PulseReport) {
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        let fighter = &world.characters[ch];
        if fighter.dying {
            continue;
        }
        let Some(victim) = fighter.fighting else {
            continue;
        };
        let room = fighter.in_room;
        let awake = fighter.position.is_awake();

        let present = world
            .characters
            .get(victim)
            .is_some_and(|target| !target.dying && room.is_some() && target.in_room == room);
        if !present {
            world.stop_fighting(ch, false);
            continue;
        }
        if !awake {
            continue;
        }

        report.rounds += 1;
        if let Some(Death::Player) = world.multi_hit(ch, victim).death {
            report.player_deaths += 1;
        }
    }
}

/// Aggressive mobiles engage players on sight; others may wander.
pub fn mobile_update(world: &mut World, report: &mut PulseReport) {
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        let mob = &world.characters[ch];
        if !mob.is_npc || mob.dying || mob.fighting.is_some() || !mob.position.is_awake() {
            continue;
        }
        let Some(room) = mob.in_room else {
            continue;
        };
        let act = mob.act;

        if act.contains(ActFlags::AGGRESSIVE)
            && !world.rooms[room].flags.contains(RoomFlags::SAFE)
        {
            if let Some(victim) = pick_victim(world, room) {
                report.aggressions += 1;
                if let Some(Death::Player) = world.multi_hit(ch, victim).death {
                    report.player_deaths += 1;
                }
                continue;
            }
        }

        if act.contains(ActFlags::SENTINEL) || world.number_range(0, 7) != 0 {
            continue;
        }
        if wander(world, ch, room) {
            report.mobiles_moved += 1;
        }
    }
}

/// The first awake player in the room.
fn pick_victim(world: &World, room: crate::world::RoomId) -> Option<CharId> {
    world.people_in(room).find(|&id| {
        let target = &world.characters[id];
        !target.is_npc && !target.dying && target.position.is_awake()
    })
}

/// Moves a mobile through a random exit, honouring no-mob rooms and
/// area confinement.
fn wander(world: &mut World, ch: CharId, room: crate::world::RoomId) -> bool {
    let exits = world.rooms[room].exits.clone();
    if exits.is_empty() {
        return false;
    }
    let exit = &exits[world.number_range(0, exits.len() as i32 - 1) as usize];

    let Ok(target) = world.room_by_vnum(exit.to) else {
        warn!(
            "Exit {} of room {} leads to missing room {}",
            exit.direction.name(),
            world.rooms[room].vnum,
            exit.to
        );
        return false;
    };
    let destination = &world.rooms[target];
    if destination.flags.contains(RoomFlags::NO_MOB) {
        return false;
    }
    if world.characters[ch].act.contains(ActFlags::STAY_AREA)
        && destination.area != world.rooms[room].area
    {
        return false;
    }

    let name = world.characters[ch].name.clone();
    world.send_to_room(room, &[ch], &format!("{} leaves {}.", name, exit.direction.name()));
    if world.char_from_room(ch).is_err() || world.char_to_room(ch, target).is_err() {
        return false;
    }
    world.send_to_room(target, &[ch], &format!("{} has arrived.", name));
    debug!("{} wandered {}", name, exit.direction.name());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CharacterTemplate, Direction, Position};

    fn den() -> (World, CharId, CharId) {
        let mut world = World::new(5);
        let area = world.create_area("Den");
        let room = world.create_room(1, "Den", Some(area)).unwrap();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        let wolf = world.create_character(
            &CharacterTemplate::mobile("wolf", 1).with_act(ActFlags::AGGRESSIVE | ActFlags::SENTINEL),
        );
        world.char_to_room(pc, room).unwrap();
        world.char_to_room(wolf, room).unwrap();
        (world, pc, wolf)
    }

    #[test]
    fn test_aggressive_mobile_engages_player() {
        let (mut world, pc, wolf) = den();
        let mut report = PulseReport::default();
        mobile_update(&mut world, &mut report);

        assert_eq!(report.aggressions, 1);
        assert_eq!(world.character(wolf).unwrap().fighting, Some(pc));
        assert_eq!(world.character(pc).unwrap().fighting, Some(wolf));
    }

    #[test]
    fn test_violence_round_per_fighter() {
        let (mut world, pc, wolf) = den();
        world.set_fighting(pc, wolf).unwrap();
        world.set_fighting(wolf, pc).unwrap();

        let mut report = PulseReport::default();
        violence_update(&mut world, &mut report);
        assert_eq!(report.rounds, 2);
        assert!(world.character(wolf).unwrap().hit <= 30);
        assert_eq!(world.character(wolf).unwrap().fighting, Some(pc));
    }

    #[test]
    fn test_fighter_stops_when_opponent_leaves() {
        let (mut world, pc, wolf) = den();
        world.set_fighting(pc, wolf).unwrap();
        world.char_from_room(wolf).unwrap();

        let mut report = PulseReport::default();
        violence_update(&mut world, &mut report);
        assert_eq!(report.rounds, 0);
        let ava = world.character(pc).unwrap();
        assert_eq!(ava.fighting, None);
        assert_eq!(ava.position, Position::Standing);
    }

    #[test]
    fn test_wanderers_stay_out_of_no_mob_rooms() {
        let mut world = World::new(9);
        let area = world.create_area("Fields");
        let field = world.create_room(1, "Field", Some(area)).unwrap();
        let shrine = world.create_room(2, "Shrine", Some(area)).unwrap();
        world.room_mut(shrine).unwrap().flags |= RoomFlags::NO_MOB;
        world.link_rooms(1, Direction::North, 2).unwrap();
        let rabbit = world.create_character(&CharacterTemplate::mobile("rabbit", 1));
        world.char_to_room(rabbit, field).unwrap();

        let mut report = PulseReport::default();
        for _ in 0..200 {
            mobile_update(&mut world, &mut report);
        }
        assert_eq!(report.mobiles_moved, 0);
        assert_eq!(world.character(rabbit).unwrap().in_room(), Some(field));
    }
}
