//! In-memory browser sessions.
//!
//! A session carries the logged-in user (if any), the per-ticket unlock
//! markers used by the share-link gate, and pending flash messages. Sessions
//! live only as long as the process; losing one simply forces a new login or
//! a new password prompt on a protected share link.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "vh_session";

/// Sessions idle longer than this are evicted; anonymous share-link visits
/// would otherwise grow the map for the life of the process.
const SESSION_IDLE_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    unlocked_tickets: HashSet<Uuid>,
    flashes: Vec<Flash>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            user_id: None,
            unlocked_tickets: HashSet::new(),
            flashes: Vec::new(),
            last_seen: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<Uuid, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::new(id));
        id
    }

    /// Returns the session for `id`, creating a fresh one when the cookie is
    /// stale or absent. The returned id is the one the cookie should carry.
    /// Touching a session here also sweeps out idle ones.
    pub fn get_or_create(&mut self, id: Option<Uuid>) -> Uuid {
        let now = Utc::now();
        self.prune_idle(now);
        if let Some(id) = id {
            if let Some(session) = self.sessions.get_mut(&id) {
                session.last_seen = now;
                return id;
            }
        }
        self.create()
    }

    /// Evicts every session that has been idle past the TTL.
    pub fn prune_idle(&mut self, now: DateTime<Utc>) {
        self.sessions
            .retain(|_, s| (now - s.last_seen).num_seconds() <= SESSION_IDLE_SECONDS);
    }

    pub fn user_id(&self, session_id: Uuid) -> Option<Uuid> {
        self.sessions.get(&session_id).and_then(|s| s.user_id)
    }

    pub fn login(&mut self, session_id: Uuid, user_id: Uuid) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.user_id = Some(user_id);
        }
    }

    /// Drops the whole session: user binding, unlock markers and flashes.
    pub fn logout(&mut self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    pub fn unlock_ticket(&mut self, session_id: Uuid, ticket_id: Uuid) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.unlocked_tickets.insert(ticket_id);
        }
    }

    pub fn is_ticket_unlocked(&self, session_id: Uuid, ticket_id: Uuid) -> bool {
        self.sessions
            .get(&session_id)
            .map(|s| s.unlocked_tickets.contains(&ticket_id))
            .unwrap_or(false)
    }

    pub fn push_flash(&mut self, session_id: Uuid, kind: FlashKind, message: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.flashes.push(Flash {
                kind,
                message: message.into(),
            });
        }
    }

    pub fn take_flashes(&mut self, session_id: Uuid) -> Vec<Flash> {
        self.sessions
            .get_mut(&session_id)
            .map(|s| std::mem::take(&mut s.flashes))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_marker_is_scoped_to_one_ticket() {
        let mut manager = SessionManager::new();
        let sid = manager.create();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        manager.unlock_ticket(sid, a);

        assert!(manager.is_ticket_unlocked(sid, a));
        assert!(!manager.is_ticket_unlocked(sid, b));
    }

    #[test]
    fn unlock_marker_is_scoped_to_one_session() {
        let mut manager = SessionManager::new();
        let first = manager.create();
        let second = manager.create();
        let ticket = Uuid::new_v4();

        manager.unlock_ticket(first, ticket);

        assert!(manager.is_ticket_unlocked(first, ticket));
        assert!(!manager.is_ticket_unlocked(second, ticket));
    }

    #[test]
    fn logout_clears_markers() {
        let mut manager = SessionManager::new();
        let sid = manager.create();
        let ticket = Uuid::new_v4();
        manager.login(sid, Uuid::new_v4());
        manager.unlock_ticket(sid, ticket);

        manager.logout(sid);

        assert!(manager.user_id(sid).is_none());
        assert!(!manager.is_ticket_unlocked(sid, ticket));
    }

    #[test]
    fn get_or_create_keeps_live_sessions_and_replaces_stale_ids() {
        let mut manager = SessionManager::new();
        let live = manager.create();

        assert_eq!(manager.get_or_create(Some(live)), live);

        let stale = Uuid::new_v4();
        let fresh = manager.get_or_create(Some(stale));
        assert_ne!(fresh, stale);
    }

    #[test]
    fn idle_sessions_are_evicted_and_active_ones_survive() {
        use chrono::Duration;

        let mut manager = SessionManager::new();
        let idle = manager.create();
        let active = manager.create();
        let ticket = Uuid::new_v4();
        manager.unlock_ticket(idle, ticket);

        // `active` is touched much later; `idle` is not.
        let later = Utc::now() + Duration::hours(25);
        manager.sessions.get_mut(&active).unwrap().last_seen = later;

        manager.prune_idle(later);

        assert!(!manager.is_ticket_unlocked(idle, ticket));
        assert!(manager.get_or_create(Some(active)) == active);
        let replacement = manager.get_or_create(Some(idle));
        assert_ne!(replacement, idle);
    }

    #[test]
    fn flashes_drain_once() {
        let mut manager = SessionManager::new();
        let sid = manager.create();
        manager.push_flash(sid, FlashKind::Success, "saved");

        let flashes = manager.take_flashes(sid);
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "saved");
        assert!(manager.take_flashes(sid).is_empty());
    }
}
