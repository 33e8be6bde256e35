//! User profile carried in session tokens and API responses.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Identity of a signed-in user, as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Provider subject identifier
    pub uid: String,
    /// Display name
    pub name: Option<String>,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
}

impl UserProfile {
    /// Name to greet the user with: display name, then email, then uid.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}
