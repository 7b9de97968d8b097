use huddle_core::{PeerId, RoomId};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("member {member} is already in room {room}")]
    DuplicateMember { member: PeerId, room: RoomId },
}

#[derive(Default)]
struct RegistryInner {
    /// Room -> members in insertion order. Insertion order is what fixes the
    /// initiator/responder roles: a joiner initiates toward exactly the
    /// members listed before it.
    rooms: HashMap<RoomId, Vec<PeerId>>,
    /// Member -> room index. A member id lives in at most one room.
    members: HashMap<PeerId, RoomId>,
}

/// In-memory room membership. Lifetime is process uptime; rooms are created
/// on first join and released when their member set empties.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `member` into `room` and returns the snapshot of the *other*
    /// members, in insertion order.
    pub fn join(&self, room: &RoomId, member: PeerId) -> Result<Vec<PeerId>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(existing) = inner.members.get(&member) {
            return Err(RegistryError::DuplicateMember {
                member,
                room: existing.clone(),
            });
        }

        let entry = inner.rooms.entry(room.clone()).or_default();
        let snapshot = entry.clone();
        entry.push(member);
        inner.members.insert(member, room.clone());

        info!("member {} joined room {}", member, room);
        Ok(snapshot)
    }

    /// Removes `member` from `room`. No-op if the member is not in that room.
    /// Releases the room entry when the member set becomes empty.
    pub fn leave(&self, room: &RoomId, member: &PeerId) {
        let mut inner = self.inner.lock().unwrap();

        if inner.members.get(member) != Some(room) {
            return;
        }
        inner.members.remove(member);

        if let Some(entry) = inner.rooms.get_mut(room) {
            entry.retain(|m| m != member);
            if entry.is_empty() {
                inner.rooms.remove(room);
                info!("room {} released (last member left)", room);
            }
        }
    }

    /// Current members of `room`, in insertion order.
    pub fn members(&self, room: &RoomId) -> Vec<PeerId> {
        let inner = self.inner.lock().unwrap();
        inner.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn room_of(&self, member: &PeerId) -> Option<RoomId> {
        let inner = self.inner.lock().unwrap();
        inner.members.get(member).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().unwrap().rooms.len()
    }
}
