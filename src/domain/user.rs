use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_publisher(&self) -> bool {
        matches!(self.role, Role::Publisher)
    }

    pub fn can_publish(&self) -> bool {
        self.role.can_publish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Publisher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Publisher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "publisher" => Some(Role::Publisher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Student | Role::Publisher => false,
        }
    }

    /// Publishers and admins may post notices and events.
    pub fn can_publish(&self) -> bool {
        match self {
            Role::Publisher | Role::Admin => true,
            Role::Student => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const USERNAME_TAKEN: &str = "Username already taken. Please choose a different one.";
pub const EMAIL_TAKEN: &str = "Email address already registered. Please use a different one.";

/// Registration input after syntactic validation. New users are always students.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_column_value() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("poster"), None);
    }

    #[test]
    fn publishing_rights_by_role() {
        assert!(!Role::Student.can_publish());
        assert!(Role::Publisher.can_publish());
        assert!(Role::Admin.can_publish());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Publisher.is_admin());
        assert_eq!(Role::default(), Role::Student);
    }
}
