//! Idle sessions: parked in limbo first, disconnected later.

use super::PulseReport;
use crate::config::GameConfig;
use crate::list::Member;
use crate::world::{ConnState, SessionId, SessionRoster, World};
use crate::MudResult;
use log::{info, warn};

/// Bumps every session's idle counter. Characters of sessions idle past
/// `void_after` are pulled into limbo; sessions idle past
/// `disconnect_after` are closed and their characters leave the world.
pub fn idle_update(world: &mut World, config: &GameConfig, report: &mut PulseReport) {
    let mut walk = world.session_list.walk();
    while let Some(session) = walk.next(&SessionRoster::within(&world.sessions)) {
        let data = &mut world.sessions[session];
        data.idle += 1;
        let idle = data.idle;

        if idle >= config.idle.disconnect_after {
            match disconnect(world, session) {
                Ok(quit) => {
                    report.sessions_closed += 1;
                    if quit {
                        report.players_quit += 1;
                    }
                }
                Err(err) => warn!("Could not disconnect idle session: {}", err),
            }
        } else if idle >= config.idle.void_after && data.state == ConnState::Playing {
            match void(world, session) {
                Ok(()) => report.sessions_voided += 1,
                Err(err) => warn!("Could not void idle session: {}", err),
            }
        }
    }
}

/// Moves the session's character into limbo, remembering where it stood.
fn void(world: &mut World, session: SessionId) -> MudResult<()> {
    world.sessions[session].state = ConnState::Void;
    let Some(ch) = world.sessions[session].character else {
        return Ok(());
    };

    let character = &mut world.characters[ch];
    character.send("You disappear into the void.");
    if character.is_fighting() {
        world.stop_fighting(ch, true);
    }
    let Some(limbo) = world.limbo else {
        return Ok(());
    };
    if let Some(room) = world.characters[ch].in_room {
        world.characters[ch].was_in_room = Some(room);
        world.char_from_room(ch)?;
    }
    world.move_char(ch, limbo)?;
    Ok(())
}

/// Closes the session (the current element of the walk). Returns true if
/// a character left the world with it.
fn disconnect(world: &mut World, session: SessionId) -> MudResult<bool> {
    let host = world.sessions[session].host.clone();
    let character = world.close_session(session)?;
    info!("Closing idle link from {}", host);

    let Some(ch) = character else {
        return Ok(false);
    };
    world.extract_char(ch)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CharacterTemplate, RoomId};

    fn lobby() -> (World, RoomId) {
        let mut world = World::new(6);
        world.create_room(2, "The Void", None).unwrap();
        world.limbo = Some(2);
        let room = world.create_room(3001, "Lobby", None).unwrap();
        (world, room)
    }

    fn quick_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.idle.void_after = 2;
        config.idle.disconnect_after = 4;
        config
    }

    #[test]
    fn test_idle_player_voided_then_disconnected() {
        let (mut world, lobby) = lobby();
        let config = quick_config();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        world.char_to_room(pc, lobby).unwrap();
        let session = world.open_session("10.0.0.1", Some(pc)).unwrap();

        let mut report = PulseReport::default();
        idle_update(&mut world, &config, &mut report);
        assert_eq!(report.sessions_voided, 0);
        idle_update(&mut world, &config, &mut report);
        assert_eq!(report.sessions_voided, 1);
        let limbo = world.room_by_vnum(2).unwrap();
        assert_eq!(world.character(pc).unwrap().in_room(), Some(limbo));
        assert_eq!(world.character(pc).unwrap().was_in_room, Some(lobby));
        assert_eq!(world.session(session).unwrap().state, ConnState::Void);

        idle_update(&mut world, &config, &mut report);
        idle_update(&mut world, &config, &mut report);
        assert_eq!(report.sessions_voided, 1);
        assert_eq!(report.sessions_closed, 1);
        assert_eq!(report.players_quit, 1);
        assert_eq!(world.session_count(), 0);
        assert_eq!(world.character_count(), 0);
        assert!(world.check_integrity().is_ok());
    }

    #[test]
    fn test_activity_returns_from_void() {
        let (mut world, lobby) = lobby();
        let config = quick_config();
        let pc = world.create_character(&CharacterTemplate::player("Ava"));
        world.char_to_room(pc, lobby).unwrap();
        let session = world.open_session("10.0.0.1", Some(pc)).unwrap();

        let mut report = PulseReport::default();
        idle_update(&mut world, &config, &mut report);
        idle_update(&mut world, &config, &mut report);
        world.session_activity(session).unwrap();

        assert_eq!(world.character(pc).unwrap().in_room(), Some(lobby));
        assert_eq!(world.session(session).unwrap().idle, 0);
        assert_eq!(world.session(session).unwrap().state, ConnState::Playing);
    }

    #[test]
    fn test_every_session_closing_in_one_walk() {
        let (mut world, _) = lobby();
        let config = quick_config();
        for host in ["a", "b", "c"] {
            world.open_session(host, None).unwrap();
        }

        let mut report = PulseReport::default();
        for _ in 0..config.idle.disconnect_after {
            idle_update(&mut world, &config, &mut report);
        }
        assert_eq!(report.sessions_closed, 3);
        assert_eq!(report.players_quit, 0);
        assert_eq!(world.session_count(), 0);
    }
}
