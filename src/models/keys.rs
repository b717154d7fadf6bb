/// The entity types stored in the cache. Each carries a stable tag so keys
/// for different entity types can never collide on the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    UserSession,
    ClientSession,
}

impl Entity {
    fn tag(self) -> &'static str {
        match self {
            Entity::UserSession => "usersession",
            Entity::ClientSession => "clientsession",
        }
    }
}

/// Builds the cache key for an entity type + identifier pair.
pub struct SessionKey;

impl SessionKey {
    /// Returns the urn-shaped cache key for `entity` and `id`.
    ///
    /// Pure and deterministic: the same inputs always yield the same key,
    /// across calls and across process restarts.
    pub fn build(entity: Entity, id: u64) -> String {
        format!("urn:{}:{}", entity.tag(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(
            SessionKey::build(Entity::UserSession, 42),
            SessionKey::build(Entity::UserSession, 42),
        );
        assert_eq!(SessionKey::build(Entity::UserSession, 42), "urn:usersession:42");
    }

    #[test]
    fn test_distinct_ids_yield_distinct_keys() {
        assert_ne!(
            SessionKey::build(Entity::UserSession, 42),
            SessionKey::build(Entity::UserSession, 43),
        );
    }

    #[test]
    fn test_distinct_entities_never_collide() {
        assert_ne!(
            SessionKey::build(Entity::UserSession, 42),
            SessionKey::build(Entity::ClientSession, 42),
        );
    }
}
