//! Whole-world consistency sweep.
//!
//! Every roster is audited structurally, then cross-checked against the
//! location fields of its members: a character whose `in_room` names a room
//! must be in that room's people, an object's location must match the one
//! embedded node it has linked, and so on.

use super::entities::*;
use super::World;
use crate::list::{Corruption, Member};

/// A consistency violation found by [`World::check_integrity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// A list failed its structural audit
    #[error("{roster}: {source}")]
    Corrupt {
        roster: String,
        #[source]
        source: Corruption,
    },

    /// A global roster does not cover its arena
    #[error("{roster} roster holds {listed} entries but the arena holds {live}")]
    RosterSize {
        roster: &'static str,
        listed: usize,
        live: usize,
    },

    /// A member's own location disagrees with the list it was found in
    #[error("{0}")]
    Misplaced(String),
}

impl World {
    /// Audits every list and cross-checks membership against locations.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        self.check_rosters()?;
        self.check_rooms()?;
        self.check_characters()?;
        self.check_objects()?;
        Ok(())
    }

    fn check_rosters(&self) -> Result<(), IntegrityError> {
        audit("characters", || {
            self.char_list.audit(&CharRoster::within(&self.characters))
        })?;
        audit("objects", || {
            self.object_list.audit(&ObjRoster::within(&self.objects))
        })?;
        audit("rooms", || {
            self.room_list.audit(&RoomRoster::within(&self.rooms))
        })?;
        audit("areas", || {
            self.area_list.audit(&AreaRoster::within(&self.areas))
        })?;
        audit("sessions", || {
            self.session_list
                .audit(&SessionRoster::within(&self.sessions))
        })?;

        let sizes = [
            ("character", self.char_list.len(), self.characters.len()),
            ("object", self.object_list.len(), self.objects.len()),
            ("room", self.room_list.len(), self.rooms.len()),
            ("area", self.area_list.len(), self.areas.len()),
            ("session", self.session_list.len(), self.sessions.len()),
        ];
        for (roster, listed, live) in sizes {
            if listed != live {
                return Err(IntegrityError::RosterSize {
                    roster,
                    listed,
                    live,
                });
            }
        }
        Ok(())
    }

    fn check_rooms(&self) -> Result<(), IntegrityError> {
        for room in self.rooms() {
            let data = &self.rooms[room];
            audit(format!("people of room {}", data.vnum), || {
                data.people.audit(&RoomPeople::within(&self.characters))
            })?;
            audit(format!("contents of room {}", data.vnum), || {
                data.contents.audit(&RoomContents::within(&self.objects))
            })?;

            for ch in self.people_in(room) {
                if self.characters[ch].in_room != Some(room) {
                    return Err(IntegrityError::Misplaced(format!(
                        "{} is listed in room {} but believes it is elsewhere",
                        self.characters[ch].name, data.vnum
                    )));
                }
            }
            for obj in self.contents_of_room(room) {
                if self.objects[obj].location != ObjLocation::Room(room) {
                    return Err(IntegrityError::Misplaced(format!(
                        "{} is listed in room {} but believes it is elsewhere",
                        self.objects[obj].name, data.vnum
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_characters(&self) -> Result<(), IntegrityError> {
        let mut affect_total = 0;
        for ch in self.characters() {
            let data = &self.characters[ch];
            if data.room_node.is_linked() != data.in_room.is_some() {
                return Err(IntegrityError::Misplaced(format!(
                    "{} has a room link that disagrees with in_room",
                    data.name
                )));
            }
            if let Some(room) = data.in_room {
                if !self.rooms.contains_key(room) {
                    return Err(IntegrityError::Misplaced(format!(
                        "{} stands in a room that no longer exists",
                        data.name
                    )));
                }
            }

            audit(format!("inventory of {}", data.name), || {
                data.carrying.audit(&Contents::within(&self.objects))
            })?;
            for obj in self.carried_by(ch) {
                if self.objects[obj].location != ObjLocation::Carried(ch) {
                    return Err(IntegrityError::Misplaced(format!(
                        "{} is carried by {} but believes it is elsewhere",
                        self.objects[obj].name, data.name
                    )));
                }
            }

            audit(format!("affects of {}", data.name), || {
                data.affects.audit(&AffectChain::within(&self.affects))
            })?;
            for affect in self.affects_of(ch) {
                if self.affects[affect].owner != ch {
                    return Err(IntegrityError::Misplaced(format!(
                        "an affect on {} names another owner",
                        data.name
                    )));
                }
            }
            affect_total += data.affects.len();
        }

        if affect_total != self.affects.len() {
            return Err(IntegrityError::RosterSize {
                roster: "affect",
                listed: affect_total,
                live: self.affects.len(),
            });
        }
        Ok(())
    }

    fn check_objects(&self) -> Result<(), IntegrityError> {
        for obj in self.objects() {
            let data = &self.objects[obj];
            let in_room = data.room_node.is_linked();
            let in_contents = data.content_node.is_linked();
            let consistent = match data.location {
                ObjLocation::Nowhere => !in_room && !in_contents,
                ObjLocation::Room(_) => in_room && !in_contents,
                ObjLocation::Carried(_) | ObjLocation::Inside(_) => !in_room && in_contents,
            };
            if !consistent {
                return Err(IntegrityError::Misplaced(format!(
                    "{} is at {:?} but its links disagree",
                    data.name, data.location
                )));
            }

            audit(format!("contents of {}", data.name), || {
                data.contents.audit(&Contents::within(&self.objects))
            })?;
            for inner in self.contents_of(obj) {
                if self.objects[inner].location != ObjLocation::Inside(obj) {
                    return Err(IntegrityError::Misplaced(format!(
                        "{} is inside {} but believes it is elsewhere",
                        self.objects[inner].name, data.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn audit(
    roster: impl Into<String>,
    check: impl FnOnce() -> Result<(), Corruption>,
) -> Result<(), IntegrityError> {
    check().map_err(|source| IntegrityError::Corrupt {
        roster: roster.into(),
        source,
    })
}
