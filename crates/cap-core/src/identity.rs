use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuthMethod, Role};

/// Authenticated actor behind a request.
///
/// Produced by the identity collaborator (request headers in `cap-server`);
/// carries no credentials, only what the guards need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub auth_method: AuthMethod,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            auth_method: AuthMethod::WebSession,
        }
    }

    #[must_use]
    pub const fn with_auth_method(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Whether the actor may act on an entry owned by `developer_id`.
    #[must_use]
    pub fn may_act_for(&self, developer_id: &str) -> bool {
        self.id == developer_id || self.role.can_act_for_others()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn developers_act_only_for_themselves() {
        let dev = Actor::new("dev-1", Role::Developer);
        assert!(dev.may_act_for("dev-1"));
        assert!(!dev.may_act_for("dev-2"));
    }

    #[test]
    fn managers_act_for_anyone() {
        let mgr = Actor::new("mgr-1", Role::Manager);
        assert!(mgr.may_act_for("dev-2"));
    }

    #[test]
    fn auth_method_defaults_to_web_session() {
        let actor: Actor = serde_json::from_str(r#"{"id":"dev-1","role":"developer"}"#).unwrap();
        assert_eq!(actor.auth_method, AuthMethod::WebSession);
    }
}
