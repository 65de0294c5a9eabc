//! Room-aware server selection.
//!
//! Locality and popularity are soft preferences layered over a random
//! baseline:
//! 1. A random ready server is the fallback candidate.
//! 2. Any ready server already tracking the room beats the fallback.
//! 3. Among those, the one with the strictly highest hit count wins; ties
//!    keep the server found first in name order.
//!
//! The winning room's hit count is bumped, so a room that keeps landing on
//! the same server keeps pulling new clients there.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::NoServersFound;
use crate::server::ServerRecord;
use crate::state::RegistryState;

impl RegistryState {
    /// Picks the best ready server for `room`.
    ///
    /// The random source is only consulted for the fallback pick, so tests
    /// can pass a seeded RNG and get reproducible results.
    ///
    /// # Errors
    ///
    /// `NoServersFound` if no registered server is ready.
    pub fn select_server<R>(
        &mut self,
        room: &str,
        rng: &mut R,
    ) -> Result<&ServerRecord, NoServersFound>
    where
        R: Rng + ?Sized,
    {
        let preferred = self.preferred_server(room, rng)?;
        let server = self.servers.get_mut(&preferred).ok_or(NoServersFound)?;

        if let Some(record) = server.rooms.get_mut(room) {
            record.hit();
        }

        Ok(&*server)
    }

    fn preferred_server<R>(&self, room: &str, rng: &mut R) -> Result<String, NoServersFound>
    where
        R: Rng + ?Sized,
    {
        let ready: Vec<&ServerRecord> = self.ready_servers().collect();
        let mut preferred = *ready.choose(rng).ok_or(NoServersFound)?;
        let mut best: Option<u32> = None;

        for &server in &ready {
            if let Some(record) = server.room(room) {
                if best.map_or(true, |hits| record.hits > hits) {
                    preferred = server;
                    best = Some(record.hits);
                }
            }
        }

        Ok(preferred.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{RoomRecord, ServerAddress};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn server(name: &str) -> ServerRecord {
        ServerRecord::new(name, ServerAddress::new("localhost", 6767))
    }

    fn room_with_hits(name: &str, hits: u32) -> RoomRecord {
        let mut room = RoomRecord::new(name);
        room.hits = hits;
        room
    }

    fn hits(state: &RegistryState, server: &str, room: &str) -> u32 {
        state.server(server).unwrap().room(room).unwrap().hits
    }

    #[test]
    fn test_empty_registry_fails() {
        let mut state = RegistryState::new();
        let result = state.select_server("room", &mut rng());
        assert_eq!(result.err(), Some(NoServersFound));
    }

    #[test]
    fn test_all_full_fails() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.set_full("a", true);
        state.set_full("b", true);

        let result = state.select_server("room", &mut rng());
        assert_eq!(result.err(), Some(NoServersFound));
    }

    #[test]
    fn test_never_fails_with_a_ready_server() {
        let mut state = RegistryState::new();
        for i in 0..5 {
            state.add_server(server(&format!("s{i}")));
        }
        state.set_full("s0", true);
        state.set_full("s3", true);

        let mut rng = rng();
        for i in 0..200 {
            let selected = state.select_server(&format!("room-{i}"), &mut rng).unwrap();
            assert!(!selected.full);
        }
    }

    #[test]
    fn test_register_then_select_empty_room_name() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));

        let selected = state.select_server("", &mut rng()).unwrap();
        assert_eq!(selected.name, "s1");
        assert!(!selected.full);
        assert_eq!(selected.address, ServerAddress::new("localhost", 6767));
    }

    #[test]
    fn test_removed_server_is_not_selected() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));
        state.remove_server("s1");

        assert!(state.select_server("anything", &mut rng()).is_err());
    }

    #[test]
    fn test_full_then_ready_again() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));

        state.set_full("s1", true);
        assert!(state.select_server("anything", &mut rng()).is_err());

        state.set_full("s1", false);
        let selected = state.select_server("anything", &mut rng()).unwrap();
        assert_eq!(selected.name, "s1");
    }

    #[test]
    fn test_prefers_server_tracking_room() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.add_room("b", RoomRecord::new("room"));

        let mut rng = rng();
        for _ in 0..1000 {
            let selected = state.select_server("room", &mut rng).unwrap();
            assert_eq!(selected.name, "b");
        }
    }

    #[test]
    fn test_prefers_higher_hit_count() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.add_room("a", room_with_hits("room", 3));
        state.add_room("b", room_with_hits("room", 4));

        let mut rng = rng();
        for _ in 0..50 {
            let selected = state.select_server("room", &mut rng).unwrap();
            assert_eq!(selected.name, "b");
        }
        assert_eq!(hits(&state, "a", "room"), 3);
        assert_eq!(hits(&state, "b", "room"), 54);
    }

    #[test]
    fn test_tie_keeps_first_in_scan_order() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.add_room("a", RoomRecord::new("room"));
        state.add_room("b", RoomRecord::new("room"));

        let selected = state.select_server("room", &mut rng()).unwrap();
        assert_eq!(selected.name, "a");
        assert_eq!(hits(&state, "a", "room"), 1);
        assert_eq!(hits(&state, "b", "room"), 0);
    }

    #[test]
    fn test_full_server_excluded_even_when_tracking_room() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.add_room("b", room_with_hits("room", 100));
        state.set_full("b", true);

        let mut rng = rng();
        for _ in 0..100 {
            let selected = state.select_server("room", &mut rng).unwrap();
            assert_eq!(selected.name, "a");
        }
        assert_eq!(hits(&state, "b", "room"), 100);
    }

    #[test]
    fn test_hits_increment_by_one_per_selection() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));
        state.add_room("s1", RoomRecord::new("room"));

        let mut rng = rng();
        for expected in 1..=25 {
            state.select_server("room", &mut rng).unwrap();
            assert_eq!(hits(&state, "s1", "room"), expected);
        }
    }

    #[test]
    fn test_hits_wrap_to_zero() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));
        state.add_room("s1", room_with_hits("room", u32::MAX));

        state.select_server("room", &mut rng()).unwrap();
        assert_eq!(hits(&state, "s1", "room"), 0);

        state.select_server("room", &mut rng()).unwrap();
        assert_eq!(hits(&state, "s1", "room"), 1);
    }

    #[test]
    fn test_untracked_room_does_not_create_record() {
        let mut state = RegistryState::new();
        state.add_server(server("s1"));

        state.select_server("room", &mut rng()).unwrap();
        assert!(state.server("s1").unwrap().rooms.is_empty());
    }

    #[test]
    fn test_random_fallback_reaches_every_ready_server() {
        let mut state = RegistryState::new();
        state.add_server(server("a"));
        state.add_server(server("b"));
        state.add_server(server("c"));
        state.set_full("c", true);

        let mut rng = rng();
        let mut seen_a = false;
        let mut seen_b = false;
        for _ in 0..1000 {
            match state.select_server("unowned", &mut rng).unwrap().name.as_str() {
                "a" => seen_a = true,
                "b" => seen_b = true,
                other => panic!("unexpected server selected: {other}"),
            }
        }
        assert!(seen_a && seen_b);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let mut state = RegistryState::new();
        for i in 0..8 {
            state.add_server(server(&format!("s{i}")));
        }

        let picks = |state: &mut RegistryState| -> Vec<String> {
            let mut rng = StdRng::seed_from_u64(99);
            (0..20)
                .map(|_| state.select_server("x", &mut rng).unwrap().name.clone())
                .collect()
        };

        let first = picks(&mut state);
        let second = picks(&mut state);
        assert_eq!(first, second);
    }
}
