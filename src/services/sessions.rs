use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::expiring::ExpiringCache;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::models::keys::{Entity, SessionKey};
use crate::models::session::{ClientSession, UserSession};

/// Manages all the user sessions.
///
/// A stateless façade over the injected cache handle: every operation loads
/// the [`UserSession`] aggregate, mutates it in memory and writes the whole
/// aggregate back. The cache is the single source of truth.
///
/// Operations are read-modify-write sequences over independent cache calls,
/// so two concurrent calls against the same user can race and the second
/// writeback wins (last-writer-wins). The cache contract has no
/// compare-and-swap primitive; see DESIGN.md.
pub struct SessionManager {
    cache: Arc<dyn ExpiringCache>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new `SessionManager` over the given cache handle.
    pub fn new(cache: Arc<dyn ExpiringCache>, config: SessionConfig) -> Self {
        Self { cache, config }
    }

    fn cache_key(user_id: u64) -> String {
        SessionKey::build(Entity::UserSession, user_id)
    }

    fn to_json(session: &UserSession) -> Result<String> {
        sonic_rs::to_string(session).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    /// Raw cache read: returns whatever aggregate is stored, expired or not.
    /// Mutating operations use this so the writeback rule can evict a stale
    /// aggregate instead of silently skipping it.
    async fn load_user_session(&self, user_id: u64) -> Result<Option<UserSession>> {
        match self.cache.get(&Self::cache_key(user_id)).await? {
            Some(json) => {
                let session = sonic_rs::from_str(&json)
                    .map_err(|e| SessionError::Serialization(e.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Gets the user session if it exists, or `None`.
    ///
    /// A stored aggregate whose expiry date has already passed counts as
    /// absent. No side effects.
    pub async fn get_user_session(&self, user_id: u64) -> Result<Option<UserSession>> {
        Ok(self
            .load_user_session(user_id)
            .await?
            .filter(|session| !session.has_expired()))
    }

    /// Gets or creates a user session if one doesn't exist.
    ///
    /// Insertion is add-if-absent, so a concurrently created session is never
    /// overwritten; the losing writer returns the winner's session instead.
    pub async fn get_or_create_session(
        &self,
        user_id: u64,
        user_name: &str,
    ) -> Result<UserSession> {
        if let Some(existing) = self.get_user_session(user_id).await? {
            return Ok(existing);
        }

        let session = UserSession::new(user_id, user_name.to_string(), self.config.session_lifetime);
        let added = self.add_user_session(&session).await?;
        if added {
            tracing::info!("✅ Session created for user {}", user_id);
        } else {
            tracing::debug!("Lost session create race for user {}", user_id);
            if let Some(winner) = self.get_user_session(user_id).await? {
                return Ok(winner);
            }
        }

        Ok(session)
    }

    /// Adds a new client session pair for the user.
    ///
    /// Creates one ordinary and one secure client session on the aggregate,
    /// then writes the mutated aggregate back. Returns the pair.
    pub async fn add_client_session(
        &self,
        user_id: u64,
        user_name: &str,
        ip_address: &str,
        base64_client_modulus: &str,
    ) -> Result<(ClientSession, ClientSession)> {
        let mut session = self.get_or_create_session(user_id, user_name).await?;
        let client_sessions = session.create_new_client_sessions(
            ip_address,
            base64_client_modulus,
            self.config.session_lifetime,
        );
        self.update_user_session(&session).await?;

        tracing::debug!(
            "🔑 Client session pair created for user {} from {}",
            user_id,
            ip_address
        );
        Ok(client_sessions)
    }

    /// Removes the given client sessions from the user's session.
    ///
    /// Silent when the user session does not exist; each removal is
    /// independent and idempotent.
    pub async fn remove_client_sessions(
        &self,
        user_id: u64,
        client_session_ids: &HashSet<Uuid>,
    ) -> Result<()> {
        let Some(mut session) = self.load_user_session(user_id).await? else {
            return Ok(());
        };

        for client_session_id in client_session_ids {
            session.remove_client_session(*client_session_id);
        }
        self.update_user_session(&session).await
    }

    /// Gets the user's client session identified by `client_session_id`, if
    /// it exists.
    pub async fn get_user_client_session(
        &self,
        user_id: u64,
        client_session_id: Uuid,
    ) -> Result<Option<ClientSession>> {
        Ok(self
            .get_user_session(user_id)
            .await?
            .and_then(|session| session.get_client_session(client_session_id).cloned()))
    }

    /// Gets the user's secure client session identified by
    /// `client_session_id`, if it exists.
    pub async fn get_user_secure_client_session(
        &self,
        user_id: u64,
        client_session_id: Uuid,
    ) -> Result<Option<ClientSession>> {
        Ok(self
            .get_user_session(user_id)
            .await?
            .and_then(|session| session.secure_client_sessions().get(&client_session_id).cloned()))
    }

    /// Adds the user session to the cache. Add-if-absent; `Ok(false)` when a
    /// concurrent writer got there first.
    async fn add_user_session(&self, session: &UserSession) -> Result<bool> {
        let json = Self::to_json(session)?;
        let added = self
            .cache
            .add(&Self::cache_key(session.user_id), &json, session.expiry_date)
            .await?;
        Ok(added)
    }

    /// Updates the user session in the cache, or removes expired ones.
    ///
    /// Every mutating operation funnels through here: the whole aggregate is
    /// the unit of writeback, with its expiry date as the cache TTL. A
    /// `replace` on a vanished key is a no-op.
    async fn update_user_session(&self, session: &UserSession) -> Result<()> {
        let cache_key = Self::cache_key(session.user_id);
        if session.has_expired() {
            tracing::debug!("Session for user {} expired, evicting", session.user_id);
            self.cache.remove(&cache_key).await?;
        } else {
            let json = Self::to_json(session)?;
            self.cache
                .replace(&cache_key, &json, session.expiry_date)
                .await?;
        }
        Ok(())
    }
}
