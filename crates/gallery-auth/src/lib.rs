use std::sync::Arc;

use gallery_store::{Database, Result};
use gallery_types::{Role, SessionUser};
use tracing::debug;

/// Thin layer over the store that checks credentials and hands back a
/// sanitized user view. Password hashes never cross this boundary.
pub struct AuthGateway {
    db: Arc<Database>,
}

impl AuthGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Checks a username/password pair. `Ok(None)` means no match — and it
    /// is deliberately the same answer for "unknown username" and "wrong
    /// password", so callers cannot enumerate accounts.
    pub fn verify_credentials(
        &self,
        username: &str,
        raw_password: &str,
    ) -> Result<Option<SessionUser>> {
        let Some(user) = self.db.find_user_by_username(username)? else {
            return Ok(None);
        };

        if !self.db.hasher().verify(raw_password, &user.password) {
            return Ok(None);
        }

        debug!("Authenticated {}", user.username);
        Ok(Some(SessionUser {
            id: user.id,
            username: user.username,
            role: user.role,
        }))
    }

    /// Creates a member account and returns its sanitized view.
    /// `StoreError::DuplicateUsername` propagates when the name is taken.
    pub fn register(&self, username: &str, raw_password: &str) -> Result<SessionUser> {
        let id = self.db.create_user(username, raw_password)?;
        Ok(SessionUser {
            id,
            username: username.to_string(),
            role: Role::Member,
        })
    }
}
