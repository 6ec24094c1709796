use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload sealed inside the `sid` cookie.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    #[serde(rename = "sessionID")]
    pub session_id: Uuid,
}

impl SessionCookie {
    pub fn new(session_id: Uuid) -> Self {
        Self { session_id }
    }
}
