use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to the fallback identities and checked by nav gating.
pub const ADMIN_ROLE: &str = "Admin";

/// Display name attached to the trusted inter-service identity.
pub const INTERNAL_MODULE_NAME: &str = "InternalModule";

/// Claims carried by a Werkbank bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a UUID string.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
}

/// The effective identity the gateway attaches to a request.
///
/// Exactly one variant reaches downstream handlers; requests the gateway
/// rejects never carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// Public path or unauthenticated page navigation.
    Anonymous,
    /// Auth is globally disabled; everyone acts as the admin.
    ImplicitAdmin,
    /// Trusted module-to-module traffic from the private network.
    InternalService,
    /// An end user with a validated token.
    User(Claims),
}

impl Principal {
    /// Stable identity for audit logs. The fallback identities share the
    /// nil UUID; a user whose `sub` is not a UUID also maps to nil.
    pub fn subject_id(&self) -> Uuid {
        match self {
            Self::Anonymous | Self::ImplicitAdmin | Self::InternalService => Uuid::nil(),
            Self::User(claims) => Uuid::parse_str(&claims.sub).unwrap_or(Uuid::nil()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Anonymous => "Anonymous",
            Self::ImplicitAdmin => "Admin",
            Self::InternalService => INTERNAL_MODULE_NAME,
            Self::User(claims) => claims.name.as_deref().unwrap_or(&claims.sub),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Self::Anonymous => false,
            // The fallback identities act with full rights.
            Self::ImplicitAdmin | Self::InternalService => role == ADMIN_ROLE,
            Self::User(claims) => claims.roles.iter().any(|r| r == role),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(sub: &str, roles: &[&str]) -> Principal {
        Principal::User(Claims {
            sub: sub.to_string(),
            name: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iss: "werkbank".to_string(),
            aud: "werkbank".to_string(),
            exp: 0,
        })
    }

    #[test]
    fn fallback_identities_use_nil_uuid_and_admin_role() {
        for p in [Principal::ImplicitAdmin, Principal::InternalService] {
            assert_eq!(p.subject_id(), Uuid::nil());
            assert!(p.has_role(ADMIN_ROLE));
            assert!(!p.has_role("Buchhaltung"));
            assert!(p.is_authenticated());
        }
    }

    #[test]
    fn anonymous_has_no_rights() {
        assert!(!Principal::Anonymous.is_authenticated());
        assert!(!Principal::Anonymous.has_role(ADMIN_ROLE));
    }

    #[test]
    fn user_roles_come_from_claims() {
        let p = user("c0b7f1ce-9d5e-4f57-9a30-000000000001", &["Buchhaltung"]);
        assert!(p.has_role("Buchhaltung"));
        assert!(!p.has_role(ADMIN_ROLE));
        assert_ne!(p.subject_id(), Uuid::nil());
    }
}
