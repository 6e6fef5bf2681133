//! Role model for authorization decisions.
//!
//! Bearer tokens carry a *set* of role tags; endpoints check capabilities
//! against that set rather than a single role string. Role names must
//! match whatever the external authenticator puts into token claims.

use serde::{Deserialize, Serialize};

/// A single role tag carried in an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular operator: read access to agents, commands, and VMs.
    User,
    /// Full administrative access.
    Admin,
    /// Infrastructure operator: may issue pairings and commands.
    Infra,
    /// A paired agent daemon. Tokens with this role carry an `agent_id`
    /// claim and are rejected on operator endpoints.
    Agent,
}

impl Role {
    /// Canonical string form, as used in token claims.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Infra => "infra",
            Role::Agent => "agent",
        }
    }

    /// Parse a role tag from its claim string. Unknown tags are rejected
    /// rather than ignored so a mis-issued token fails loudly.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "infra" => Some(Role::Infra),
            "agent" => Some(Role::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability checks over a role set.
///
/// These are free functions (not methods on a wrapper type) so both the
/// API middleware and tests can call them on a plain slice.
pub mod capability {
    use super::Role;

    /// May read agents, commands, and VM ownership records.
    pub fn is_operator(roles: &[Role]) -> bool {
        roles
            .iter()
            .any(|r| matches!(r, Role::User | Role::Admin | Role::Infra))
    }

    /// May create pairings, enqueue commands, cancel commands, and
    /// revoke agents.
    pub fn can_administer_agents(roles: &[Role]) -> bool {
        roles.iter().any(|r| matches!(r, Role::Admin | Role::Infra))
    }

    /// Is a paired agent daemon (heartbeat, poll, ack, report).
    pub fn is_agent(roles: &[Role]) -> bool {
        roles.contains(&Role::Agent)
    }
}

#[cfg(test)]
mod tests {
    use super::capability::*;
    use super::*;

    #[test]
    fn parse_roundtrips_all_roles() {
        for role in [Role::User, Role::Admin, Role::Infra, Role::Agent] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn agent_role_is_not_an_operator() {
        assert!(!is_operator(&[Role::Agent]));
        assert!(is_operator(&[Role::User]));
        assert!(is_operator(&[Role::Agent, Role::User]));
    }

    #[test]
    fn only_admin_and_infra_administer_agents() {
        assert!(can_administer_agents(&[Role::Admin]));
        assert!(can_administer_agents(&[Role::User, Role::Infra]));
        assert!(!can_administer_agents(&[Role::User]));
        assert!(!can_administer_agents(&[Role::Agent]));
    }
}
