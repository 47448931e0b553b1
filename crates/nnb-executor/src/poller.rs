//! Readiness poller: the arena of poll registrations.
//!
//! Each registration occupies one slot. Its [`PollId`] is the slot index
//! plus the slot's generation; the mio token is `index + 1` (token 0 is the
//! loop's waker).
//!
//! **Contract:**
//! - `remove` bumps the generation, so a stale id is rejected forever.
//! - A removed index is quarantined until [`PollArena::end_batch`]: events
//!   already fetched in the current loop turn can never reach a newer
//!   registration through a reused token.
//! - While a callback runs it is detached from its slot; if the slot was
//!   removed meanwhile, [`PollArena::restore`] drops the callback instead.
//! - Each registration owns its own duplicate of the socket's wait-handle.
//!   The duplicate stays open until the registration is dropped, so its fd
//!   number can never be reused by another socket while it is registered.

use std::os::fd::OwnedFd;

use mio::Token;
use nnb_core::error::ResourceError;
use nnb_core::poll::{EventMask, PollId};
use nnb_core::socket::{Direction, SocketHandle};

/// A readiness callback. Runs on the control thread, must not block.
pub type PollCallback = Box<dyn FnMut(EventMask)>;

pub(crate) struct Registration {
    pub fd: OwnedFd,
    pub socket: SocketHandle,
    pub direction: Direction,
    callback: Option<PollCallback>,
}

struct Slot {
    generation: u32,
    entry: Option<Registration>,
}

#[derive(Default)]
pub(crate) struct PollArena {
    slots: Vec<Slot>,
    /// LIFO stack of reusable indices.
    free: Vec<u32>,
    quarantine: Vec<u32>,
    live: usize,
}

impl PollArena {
    pub fn insert(&mut self, fd: OwnedFd, socket: SocketHandle, direction: Direction, callback: PollCallback) -> PollId {
        let entry = Registration { fd, socket, direction, callback: Some(callback) };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return PollId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, entry: Some(entry) });
        PollId::new(index, 0)
    }

    fn slot(&self, id: PollId) -> Option<&Slot> {
        self.slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation() && s.entry.is_some())
    }

    pub fn contains(&self, id: PollId) -> bool {
        self.slot(id).is_some()
    }

    /// Release `id`; the caller deregisters the returned fd, then drops it.
    pub fn remove(&mut self, id: PollId) -> Result<Registration, ResourceError> {
        if !self.contains(id) {
            return Err(ResourceError::InvalidHandle(id));
        }
        let slot = &mut self.slots[id.index() as usize];
        let entry = slot.entry.take().ok_or(ResourceError::InvalidHandle(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.quarantine.push(id.index());
        self.live -= 1;
        Ok(entry)
    }

    /// Detach the callback of the registration `token` points at.
    pub fn take_callback(&mut self, token: Token) -> Option<(PollId, PollCallback)> {
        let index = token.0.checked_sub(1)?;
        let slot = self.slots.get_mut(index)?;
        let callback = slot.entry.as_mut()?.callback.take()?;
        Some((PollId::new(index as u32, slot.generation), callback))
    }

    /// Reattach a callback after it ran, unless `id` was removed meanwhile.
    pub fn restore(&mut self, id: PollId, callback: PollCallback) {
        if let Some(slot) = self.slots.get_mut(id.index() as usize) {
            if slot.generation == id.generation() {
                if let Some(entry) = slot.entry.as_mut() {
                    entry.callback = Some(callback);
                }
            }
        }
    }

    /// End of a dispatch batch: quarantined indices become reusable.
    pub fn end_batch(&mut self) {
        self.free.append(&mut self.quarantine);
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Live registrations watching `socket`.
    pub fn count_for(&self, socket: SocketHandle) -> usize {
        self.slots
            .iter()
            .filter_map(|s| s.entry.as_ref())
            .filter(|e| e.socket == socket)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::os::fd::AsRawFd;

    fn noop() -> PollCallback {
        Box::new(|_| {})
    }

    fn fd() -> OwnedFd {
        File::open("/dev/null").unwrap().into()
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut arena = PollArena::default();
        let watched = fd();
        let raw = watched.as_raw_fd();
        let id = arena.insert(watched, SocketHandle::from_raw(0), Direction::Recv, noop());
        assert_eq!(arena.remove(id).unwrap().fd.as_raw_fd(), raw);
        assert_eq!(arena.remove(id).err(), Some(ResourceError::InvalidHandle(id)));
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn indices_are_reused_only_after_the_batch() {
        let mut arena = PollArena::default();
        let a = arena.insert(fd(), SocketHandle::from_raw(0), Direction::Send, noop());
        arena.remove(a).unwrap();
        let b = arena.insert(fd(), SocketHandle::from_raw(0), Direction::Send, noop());
        assert_ne!(a.index(), b.index());
        arena.end_batch();
        let c = arena.insert(fd(), SocketHandle::from_raw(0), Direction::Send, noop());
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
    }

    #[test]
    fn removed_while_running_drops_the_callback() {
        let mut arena = PollArena::default();
        let id = arena.insert(fd(), SocketHandle::from_raw(1), Direction::Recv, noop());
        let token = Token(id.index() as usize + 1);
        let (running, cb) = arena.take_callback(token).unwrap();
        assert_eq!(running, id);
        assert!(arena.take_callback(token).is_none());
        arena.remove(id).unwrap();
        arena.restore(running, cb);
        arena.end_batch();
        let next = arena.insert(fd(), SocketHandle::from_raw(1), Direction::Recv, noop());
        assert_eq!(next.index(), id.index());
        assert!(arena.take_callback(token).is_some());
    }

    #[test]
    fn counts_per_socket() {
        let mut arena = PollArena::default();
        let s = SocketHandle::from_raw(2);
        arena.insert(fd(), s, Direction::Recv, noop());
        arena.insert(fd(), s, Direction::Send, noop());
        arena.insert(fd(), SocketHandle::from_raw(9), Direction::Send, noop());
        assert_eq!(arena.count_for(s), 2);
        assert!(arena.take_callback(Token(0)).is_none());
    }
}
