use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::roles::RoleSet;

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl UpdateProfileRequest {
    pub fn wants_password_change(&self) -> bool {
        !self.new_password.is_empty()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub roles: RoleSet,
    pub profile_picture: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
