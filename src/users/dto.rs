use serde::{Deserialize, Serialize};

use crate::users::repo_types::RecordId;

/// Request body for creating a user; the password is generated server-side.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub office_mail: Option<String>,
    pub mobile: String,
    pub role: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update; only the fields that are present and non-null are applied.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.office_mail.is_none()
            && self.mobile.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: RecordId,
    pub email: String,
    pub name: String,
}
