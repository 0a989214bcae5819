use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Patient,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Profile of the authenticated user.
///
/// The server's login response carries the profile and the role side by
/// side; the role is merged into the profile before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, alias = "_id", deserialize_with = "super::id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Name for display, falling back to the email when the server sent none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"patient\"").unwrap();
        assert_eq!(role, Role::Patient);
    }

    #[test]
    fn test_user_accepts_partial_profile() {
        let user: User = serde_json::from_str(r#"{"name":"Pat"}"#).unwrap();
        assert_eq!(user.name, "Pat");
        assert_eq!(user.id, "");
        assert_eq!(user.role, Role::Patient);
    }

    #[test]
    fn test_user_numeric_id() {
        let user: User = serde_json::from_str(r#"{"id":42,"email":"a@b.co"}"#).unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.display_name(), "a@b.co");
    }

    #[test]
    fn test_with_role_overrides() {
        let user: User = serde_json::from_str(r#"{"name":"Ada","role":"patient"}"#).unwrap();
        assert_eq!(user.with_role(Role::Admin).role, Role::Admin);
    }
}
