//! Access decision for the public share page of a ticket.
//!
//! The outcome is derived fresh on every request from the ticket's share
//! configuration and the requester's session; nothing about it is persisted.

use chrono::{DateTime, Utc};

use crate::auth::passwords;

use super::models::{ShareMode, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAccess {
    /// Full content may be rendered: videos, comments, comment form.
    Granted,
    /// Time-limited link past its expiry. Terminal; wins over any
    /// password state.
    Expired,
    /// Password-protected and this session has not supplied the password
    /// for this ticket yet.
    Locked,
}

pub fn evaluate(
    mode: ShareMode,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    unlocked: bool,
) -> ShareAccess {
    if mode == ShareMode::TimeLimited {
        if let Some(expiry) = expires_at {
            if now > expiry {
                return ShareAccess::Expired;
            }
        }
    }
    if mode == ShareMode::PasswordProtected && !unlocked {
        return ShareAccess::Locked;
    }
    ShareAccess::Granted
}

pub fn evaluate_for(ticket: &Ticket, now: DateTime<Utc>, unlocked: bool) -> ShareAccess {
    evaluate(ticket.share_mode(), ticket.expires_at, now, unlocked)
}

pub fn hash_share_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    passwords::hash_password(password)
}

/// Exact, case-sensitive match of the supplied password against the stored
/// hash.
pub fn verify_share_password(hash: &str, supplied: &str) -> bool {
    passwords::verify_password(hash, supplied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn public_links_are_always_granted() {
        let now = Utc::now();
        assert_eq!(
            evaluate(ShareMode::Public, None, now, false),
            ShareAccess::Granted
        );
        // A leftover expiry on a public link is ignored.
        assert_eq!(
            evaluate(ShareMode::Public, Some(now - Duration::hours(1)), now, false),
            ShareAccess::Granted
        );
    }

    #[test]
    fn expired_time_limited_links_are_terminal() {
        let now = Utc::now();
        let past = Some(now - Duration::minutes(1));
        assert_eq!(
            evaluate(ShareMode::TimeLimited, past, now, false),
            ShareAccess::Expired
        );
        // Expiry wins regardless of any session state.
        assert_eq!(
            evaluate(ShareMode::TimeLimited, past, now, true),
            ShareAccess::Expired
        );
    }

    #[test]
    fn time_limited_links_before_expiry_are_granted() {
        let now = Utc::now();
        let future = Some(now + Duration::hours(2));
        assert_eq!(
            evaluate(ShareMode::TimeLimited, future, now, false),
            ShareAccess::Granted
        );
    }

    #[test]
    fn time_limited_without_expiry_is_not_expired() {
        let now = Utc::now();
        assert_eq!(
            evaluate(ShareMode::TimeLimited, None, now, false),
            ShareAccess::Granted
        );
    }

    #[test]
    fn password_protected_requires_session_marker() {
        let now = Utc::now();
        assert_eq!(
            evaluate(ShareMode::PasswordProtected, None, now, false),
            ShareAccess::Locked
        );
        assert_eq!(
            evaluate(ShareMode::PasswordProtected, None, now, true),
            ShareAccess::Granted
        );
    }

    #[test]
    fn password_verification_is_exact_and_case_sensitive() {
        let hash = hash_share_password("Segredo123").unwrap();
        assert!(verify_share_password(&hash, "Segredo123"));
        assert!(!verify_share_password(&hash, "segredo123"));
        assert!(!verify_share_password(&hash, "Segredo123 "));
        assert!(!verify_share_password("not-a-hash", "Segredo123"));
    }
}
