use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub is_moderator: bool,
}

impl RoleSummary {
    pub fn can_moderate(&self) -> bool {
        self.is_admin || self.is_moderator
    }
}
