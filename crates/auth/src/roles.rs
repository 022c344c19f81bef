use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

use backoffice_core::UserFunction;

/// Role identifier carried by a principal.
///
/// Roles arrive as free-form strings from the identity provider. They are
/// normalised on construction (trimmed, upper-cased, `ROLE_` prefix removed) so
/// that `role_claim_manager` and `CLAIM_MANAGER` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Unrestricted access to every resource in every company.
    pub const APPLICATION_ADMIN: Role = Role(Cow::Borrowed("APPLICATION_ADMIN"));
    pub const COMPANY_MANAGER: Role = Role(Cow::Borrowed("COMPANY_MANAGER"));
    pub const USER_MANAGER: Role = Role(Cow::Borrowed("USER_MANAGER"));
    pub const CLAIM_MANAGER: Role = Role(Cow::Borrowed("CLAIM_MANAGER"));
    /// Access limited to the caller's own records.
    pub const CONSUMER: Role = Role(Cow::Borrowed("CONSUMER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);

        if bare == &*name {
            Self(name)
        } else {
            Self(Cow::Owned(bare.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::new(raw))
    }
}

impl From<UserFunction> for Role {
    fn from(value: UserFunction) -> Self {
        Role::new(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_prefix_and_case() {
        assert_eq!(Role::new("role_claim_manager"), Role::CLAIM_MANAGER);
        assert_eq!(Role::new("  Consumer "), Role::CONSUMER);
        assert_eq!(Role::new("APPLICATION_ADMIN"), Role::APPLICATION_ADMIN);
    }

    #[test]
    fn deserializes_through_normalisation() {
        let roles: Vec<Role> = serde_json::from_str(r#"["ROLE_USER_MANAGER", "consumer"]"#).unwrap();
        assert_eq!(roles, vec![Role::USER_MANAGER, Role::CONSUMER]);
    }

    #[test]
    fn user_functions_map_to_roles() {
        assert_eq!(Role::from(UserFunction::CompanyManager), Role::COMPANY_MANAGER);
    }
}
