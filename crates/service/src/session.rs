use serde::Serialize;

use crate::gate::AllowListGate;

/// Who is acting and whether they passed the allow-list.
///
/// Built once per identity change (login, logout, or per request on the HTTP
/// surface) and handed to whatever needs it; never stored globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    identity_id: Option<String>,
    is_admin: bool,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { identity_id: None, is_admin: false }
    }

    /// Resolve a session for an identity event. `None` means logged out.
    pub async fn resolve(gate: &AllowListGate, identity_id: Option<&str>) -> Self {
        match identity_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Self { identity_id: Some(id.to_string()), is_admin: gate.is_allowed(id).await },
            None => Self::anonymous(),
        }
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity_id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
