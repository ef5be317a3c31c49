use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Account role. Fixed at signup; there is no role change endpoint.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_names() {
        assert_eq!(Role::from_str_opt("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str_opt("employee"), Some(Role::Employee));
        assert_eq!(Role::from_str_opt("manager"), None);
    }

    #[test]
    fn renders_lowercase() {
        assert_eq!(Role::Admin.as_ref(), "admin");
        assert_eq!(Role::Employee.to_string(), "employee");
    }
}
