use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{AccountDeletionRequest, RoleApplication};
use crate::roles::Role;

/// Which role a user is applying for. Shares one submission shape; the
/// variants differ only in required fields and attachment handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationKind {
    Admin,
    Support,
    Seller,
}

impl ApplicationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationKind::Admin => "admin",
            ApplicationKind::Support => "support",
            ApplicationKind::Seller => "seller",
        }
    }

    pub fn target_role(&self) -> Role {
        match self {
            ApplicationKind::Admin => Role::Admin,
            ApplicationKind::Support => Role::Support,
            ApplicationKind::Seller => Role::Seller,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ApplicationRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub reason: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub availability: String,
}

/// Raw uploaded file, already read into memory by the multipart layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationSubmitted {
    pub application_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletionRequested {
    pub request_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyRequests {
    pub applications: Vec<RoleApplication>,
    pub deletion_request: Option<AccountDeletionRequest>,
}
