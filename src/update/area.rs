//! Area ageing and resets, and the game clock with its weather.

use super::PulseReport;
use crate::config::{GameConfig, AREA_MIN_AGE};
use crate::list::Member;
use crate::world::{AreaId, AreaRoster, CharRoster, RoomFlags, Sky, World};
use log::debug;

/// Ages every area. An area old enough resets at once if players are in
/// it; an empty one is marked and resets when the first player enters.
pub fn area_update(world: &mut World, config: &GameConfig, report: &mut PulseReport) {
    let reset_age = config.area.reset_age;
    let mut walk = world.area_list.walk();
    while let Some(area) = walk.next(&AreaRoster::within(&world.areas)) {
        let data = &mut world.areas[area];
        data.age += 1;
        if data.age < AREA_MIN_AGE {
            continue;
        }

        if data.nplayer > 0 && data.age == reset_age - 1 {
            ring_bell(world, area);
        }

        let data = &mut world.areas[area];
        if data.age < reset_age {
            continue;
        }
        if data.nplayer > 0 {
            data.needs_reset = false;
            let outcome = world.reset_area(area);
            report.areas_reset += 1;
            report.mobiles_spawned += outcome.mobiles;
            report.objects_spawned += outcome.objects;
        } else {
            debug!("Deferring reset of empty area {}", data.name);
            data.needs_reset = true;
            report.resets_deferred += 1;
        }
        let age = world.number_range(0, AREA_MIN_AGE);
        world.areas[area].age = age;
    }
}

/// Warns awake players that their area is about to reset.
fn ring_bell(world: &mut World, area: AreaId) {
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        let character = &world.characters[ch];
        let here = character
            .in_room
            .and_then(|room| world.rooms[room].area)
            .is_some_and(|a| a == area);
        if !character.is_npc && character.position.is_awake() && here {
            world.characters[ch].send("You hear the sound of a bell in the distance.");
        }
    }
}

/// Advances the game clock one hour and moves the weather along.
pub fn weather_update(world: &mut World) {
    let time = &mut world.time;
    time.hour += 1;
    let mut news = match time.hour {
        5 => Some("The day has begun."),
        6 => Some("The sun rises in the east."),
        19 => Some("The sun slowly disappears in the west."),
        20 => Some("The night has begun."),
        _ => None,
    };
    if time.hour >= 24 {
        time.hour = 0;
        time.day += 1;
    }

    let roll = world.number_range(0, 3);
    let sky = world.time.sky;
    let next = match (sky, roll) {
        (Sky::Cloudless, 0) => Sky::Cloudy,
        (Sky::Cloudy, 0) => Sky::Raining,
        (Sky::Cloudy, 1) => Sky::Cloudless,
        (Sky::Raining, 0) => Sky::Lightning,
        (Sky::Raining, 1) => Sky::Cloudy,
        (Sky::Lightning, 0 | 1) => Sky::Raining,
        (current, _) => current,
    };
    if next != sky {
        world.time.sky = next;
        let weather = match (sky, next) {
            (Sky::Cloudless, _) => "The sky is getting cloudy.",
            (Sky::Cloudy, Sky::Raining) => "It starts to rain.",
            (Sky::Cloudy, _) => "The clouds disappear.",
            (Sky::Raining, Sky::Lightning) => "Lightning flashes in the sky.",
            (Sky::Raining, _) => "The rain stopped.",
            (Sky::Lightning, _) => "The lightning has stopped.",
        };
        news = news.or(Some(weather));
    }

    let Some(news) = news else {
        return;
    };
    let mut walk = world.char_list.walk();
    while let Some(ch) = walk.next(&CharRoster::within(&world.characters)) {
        let character = &world.characters[ch];
        let outdoors = character
            .in_room
            .is_some_and(|room| !world.rooms[room].flags.contains(RoomFlags::INDOORS));
        if !character.is_npc && character.position.is_awake() && outdoors {
            world.characters[ch].send(news);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CharacterTemplate, Reset};

    fn village() -> (World, AreaId) {
        let mut world = World::new(8);
        let area = world.create_area("Village");
        world.create_room(1, "Square", Some(area)).unwrap();
        world.area_mut(area).unwrap().resets.push(Reset::Mobile {
            template: CharacterTemplate::mobile("guard", 3),
            room: 1,
            limit: 2,
        });
        (world, area)
    }

    #[test]
    fn test_empty_area_defers_reset() {
        let (mut world, area) = village();
        let config = GameConfig::default();
        let mut report = PulseReport::default();
        for _ in 0..config.area.reset_age {
            area_update(&mut world, &config, &mut report);
        }

        assert_eq!(report.resets_deferred, 1);
        assert_eq!(report.areas_reset, 0);
        assert!(world.area(area).unwrap().needs_reset);
        assert!(world.area(area).unwrap().age <= AREA_MIN_AGE);
        assert_eq!(world.character_count(), 0);
    }

    #[test]
    fn test_occupied_area_resets_and_rings() {
        let (mut world, area) = village();
        let config = GameConfig::default();
        let square = world.room_by_vnum(1).unwrap();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        world.char_to_room(pc, square).unwrap();

        let mut report = PulseReport::default();
        for _ in 0..config.area.reset_age {
            area_update(&mut world, &config, &mut report);
        }
        assert_eq!(report.areas_reset, 1);
        assert_eq!(report.mobiles_spawned, 1);
        assert!(!world.area(area).unwrap().needs_reset);
        assert!(world
            .character(pc)
            .unwrap()
            .messages
            .iter()
            .any(|m| m.contains("bell")));
    }

    #[test]
    fn test_clock_rolls_over_days() {
        let mut world = World::new(8);
        for _ in 0..24 {
            weather_update(&mut world);
        }
        assert_eq!(world.time.hour, 0);
        assert_eq!(world.time.day, 1);
    }

    #[test]
    fn test_indoor_players_miss_the_sunrise() {
        let mut world = World::new(8);
        let hall = world.create_room(1, "Hall", None).unwrap();
        let yard = world.create_room(2, "Yard", None).unwrap();
        world.room_mut(hall).unwrap().flags |= RoomFlags::INDOORS;
        let inside = world.create_character(&CharacterTemplate::player("In"));
        let outside = world.create_character(&CharacterTemplate::player("Out"));
        world.char_to_room(inside, hall).unwrap();
        world.char_to_room(outside, yard).unwrap();
        world.time.hour = 4;

        weather_update(&mut world);
        assert!(world.character(inside).unwrap().messages.is_empty());
        assert_eq!(
            world.character(outside).unwrap().messages,
            vec!["The day has begun.".to_string()]
        );
    }
}
