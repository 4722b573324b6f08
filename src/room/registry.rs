//! Registry of all live rooms, addressed by short join codes.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tracing::info;

use crate::config::Config;

use super::coordinator::{Room, RoomHandle};

/// Length of generated join codes
const CODE_LENGTH: usize = 4;

/// Registry of all active rooms
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, RoomHandle>>,
    config: Arc<Config>,
}

impl RoomRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    /// Fetch a room by code, spawning its actor on first use
    pub fn get_or_create(&self, code: &str) -> RoomHandle {
        self.rooms
            .entry(code.to_string())
            .or_insert_with(|| self.spawn_room(code.to_string()))
            .clone()
    }

    /// Create a room under a fresh random code
    pub fn create(&self) -> RoomHandle {
        loop {
            let code = generate_code();
            if !self.rooms.contains_key(&code) {
                return self.get_or_create(&code);
            }
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    fn spawn_room(&self, code: String) -> RoomHandle {
        let (room, handle) = Room::new(code.clone(), self.config.clone());

        let rooms = self.rooms.clone();
        tokio::spawn(async move {
            room.run().await;

            // Room actor exited; drop it from the registry
            rooms.remove(&code);
            info!(room = %code, "Room removed from registry");
        });

        handle
    }
}

/// Random uppercase join code, e.g. "KWRD"
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}
