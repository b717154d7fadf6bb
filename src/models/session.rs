use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single device/browser sub-session nested inside a [`UserSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSession {
    /// The session token handed to the client. Generated with `Uuid::new_v4`,
    /// so it is unguessable.
    pub session_id: Uuid,
    /// The client's network address observed at creation time.
    pub ip_address: String,
    /// Opaque credential-exchange artifact supplied by the client. Stored,
    /// never interpreted.
    pub base64_client_modulus: String,
    /// The timestamp when the client session was created.
    pub created_at: DateTime<Utc>,
}

impl ClientSession {
    fn new(ip_address: &str, base64_client_modulus: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            ip_address: ip_address.to_string(),
            base64_client_modulus: base64_client_modulus.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// The per-user session aggregate.
///
/// Owns one collection of ordinary client sessions and a parallel,
/// separately-keyed collection of sessions established over a secure
/// credential exchange. Both are mutated only through the methods here; the
/// cache holds the durable copy and any loaded instance is a working snapshot
/// valid for a single manager call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    /// The user's immutable identity.
    pub user_id: u64,
    /// Set at creation, not re-validated thereafter.
    pub user_name: String,
    /// Recomputed whenever the session is touched; drives the cache TTL.
    pub expiry_date: DateTime<Utc>,
    client_sessions: HashMap<Uuid, ClientSession>,
    secure_client_sessions: HashMap<Uuid, ClientSession>,
}

impl UserSession {
    /// Creates a fresh session expiring `lifetime` from now.
    pub fn new(user_id: u64, user_name: String, lifetime: Duration) -> Self {
        Self {
            user_id,
            user_name,
            expiry_date: Utc::now() + lifetime,
            client_sessions: HashMap::new(),
            secure_client_sessions: HashMap::new(),
        }
    }

    /// Whether the session's expiry date has been reached.
    pub fn has_expired(&self) -> bool {
        Utc::now() >= self.expiry_date
    }

    /// Creates one new ordinary client session and one new secure client
    /// session, both carrying `ip_address` and `base64_client_modulus`, each
    /// under a freshly generated id. Also pushes the expiry date out to
    /// `lifetime` from now.
    ///
    /// Mutates the aggregate in memory only; the caller persists it.
    pub fn create_new_client_sessions(
        &mut self,
        ip_address: &str,
        base64_client_modulus: &str,
        lifetime: Duration,
    ) -> (ClientSession, ClientSession) {
        let client_session = ClientSession::new(ip_address, base64_client_modulus);
        let secure_client_session = ClientSession::new(ip_address, base64_client_modulus);

        self.client_sessions
            .insert(client_session.session_id, client_session.clone());
        self.secure_client_sessions.insert(
            secure_client_session.session_id,
            secure_client_session.clone(),
        );

        self.expiry_date = Utc::now() + lifetime;

        (client_session, secure_client_session)
    }

    /// Removes the ordinary client session with `session_id`, if present.
    /// Not an error when absent. Secure client sessions are untouched.
    pub fn remove_client_session(&mut self, session_id: Uuid) {
        self.client_sessions.remove(&session_id);
    }

    /// Looks up an ordinary client session by id.
    pub fn get_client_session(&self, session_id: Uuid) -> Option<&ClientSession> {
        self.client_sessions.get(&session_id)
    }

    /// Read-only view of the ordinary client sessions.
    pub fn client_sessions(&self) -> &HashMap<Uuid, ClientSession> {
        &self.client_sessions
    }

    /// Read-only view of the secure client sessions.
    pub fn secure_client_sessions(&self) -> &HashMap<Uuid, ClientSession> {
        &self.secure_client_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_weeks() -> Duration {
        Duration::days(14)
    }

    #[test]
    fn test_new_session_is_not_expired() {
        let session = UserSession::new(7, "alice".to_string(), two_weeks());
        assert!(!session.has_expired());
        assert_eq!(session.user_id, 7);
        assert_eq!(session.user_name, "alice");
    }

    #[test]
    fn test_past_expiry_date_means_expired() {
        let mut session = UserSession::new(7, "alice".to_string(), two_weeks());
        session.expiry_date = Utc::now() - Duration::hours(1);
        assert!(session.has_expired());
    }

    #[test]
    fn test_create_new_client_sessions_is_paired() {
        let mut session = UserSession::new(7, "alice".to_string(), two_weeks());

        let (client, secure) =
            session.create_new_client_sessions("10.0.0.1", "MODKEY", two_weeks());

        assert_ne!(client.session_id, secure.session_id);
        assert_eq!(client.ip_address, "10.0.0.1");
        assert_eq!(secure.ip_address, "10.0.0.1");
        assert_eq!(client.base64_client_modulus, "MODKEY");
        assert_eq!(secure.base64_client_modulus, "MODKEY");

        assert_eq!(session.client_sessions().len(), 1);
        assert_eq!(session.secure_client_sessions().len(), 1);
        assert_eq!(session.get_client_session(client.session_id), Some(&client));
        assert_eq!(
            session.secure_client_sessions().get(&secure.session_id),
            Some(&secure),
        );

        // The ordinary id lives only in the ordinary collection.
        assert!(!session.secure_client_sessions().contains_key(&client.session_id));
        assert!(session.get_client_session(secure.session_id).is_none());
    }

    #[test]
    fn test_creation_refreshes_expiry() {
        let mut session = UserSession::new(7, "alice".to_string(), Duration::minutes(1));
        let old_expiry = session.expiry_date;

        session.create_new_client_sessions("10.0.0.1", "MODKEY", two_weeks());

        assert!(session.expiry_date > old_expiry);
    }

    #[test]
    fn test_remove_client_session_is_idempotent() {
        let mut session = UserSession::new(7, "alice".to_string(), two_weeks());
        let (client, _) = session.create_new_client_sessions("10.0.0.1", "MODKEY", two_weeks());

        session.remove_client_session(client.session_id);
        assert!(session.get_client_session(client.session_id).is_none());

        // Removing again, or removing an unknown id, is a no-op.
        session.remove_client_session(client.session_id);
        session.remove_client_session(Uuid::new_v4());
        assert_eq!(session.secure_client_sessions().len(), 1);
    }

    #[test]
    fn test_aggregate_round_trips_through_json() {
        let mut session = UserSession::new(7, "alice".to_string(), two_weeks());
        let (client, secure) =
            session.create_new_client_sessions("10.0.0.1", "MODKEY", two_weeks());

        let json = sonic_rs::to_string(&session).unwrap();
        let restored: UserSession = sonic_rs::from_str(&json).unwrap();

        assert_eq!(restored.user_id, 7);
        assert_eq!(restored.get_client_session(client.session_id), Some(&client));
        assert_eq!(
            restored.secure_client_sessions().get(&secure.session_id),
            Some(&secure),
        );
    }
}
