use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unified ID type that accepts both database integers and public UUIDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiId(pub String);

impl ApiId {
    /// Create from database integer ID
    pub fn from_i32(id: i32) -> Self {
        Self(id.to_string())
    }

    /// Create from UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Create from string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get as string (always available)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Try to parse as integer (for database IDs)
    pub fn as_i32(&self) -> Option<i32> {
        self.0.parse().ok()
    }

    /// Try to parse as UUID
    pub fn as_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl std::fmt::Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ApiId {
    fn from(id: i32) -> Self {
        Self::from_i32(id)
    }
}

impl From<Uuid> for ApiId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<String> for ApiId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApiId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_i32() {
        let id = ApiId::from_i32(42);
        assert_eq!(id.as_i32(), Some(42));
        assert_eq!(id.as_uuid(), None);
    }

    #[test]
    fn test_roundtrip_uuid() {
        let uuid = Uuid::new_v4();
        let id = ApiId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), Some(uuid));
        assert_eq!(id.as_i32(), None);
    }
}
