//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use keyhub_core::{AppError, AppResult};
use keyhub_entity::{PermissionId, RoleId};

/// Run a payload's declared validations, folding failures into one
/// validation error.
pub fn validate(payload: &impl Validate) -> AppResult<()> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

/// Sign-in request body. Either `email` + `password` or a previously
/// issued bearer `token`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Raw password.
    #[serde(default)]
    pub password: String,
    /// A "remember me" token from an earlier sign-in.
    #[serde(default)]
    pub token: String,
    /// IANA timezone name to adopt for this session.
    #[serde(default)]
    pub timezone: String,
    /// Issue a long-lived token with the signed-in user.
    #[serde(default)]
    pub remember: bool,
}

impl LoginRequest {
    /// Password sign-in.
    pub fn with_password(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            token: String::new(),
            timezone: String::new(),
            remember: false,
        }
    }

    /// Token sign-in.
    pub fn with_token(token: &str) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            token: token.to_string(),
            timezone: String::new(),
            remember: false,
        }
    }
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email, lowercase-normalized on creation.
    #[validate(email(message = "invalid email"))]
    pub email: String,
    /// Raw password.
    #[validate(length(min = 6, message = "password too short"))]
    pub password: String,
    /// Preferred display name.
    #[serde(default)]
    pub display_name: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Preferred locale.
    #[serde(default)]
    pub locale: String,
    /// IANA timezone name.
    #[serde(default)]
    pub timezone: String,
    /// Registration source tag (e.g. "web", "import").
    #[serde(default)]
    pub source: String,
}

impl RegisterRequest {
    /// Minimal registration.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            display_name: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            locale: String::new(),
            timezone: String::new(),
            source: String::new(),
        }
    }
}

/// Password change request for the signed-in principal.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// The new raw password.
    #[validate(length(min = 6, message = "password too short"))]
    pub password: String,
}

/// Role create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    /// Role key; unset when creating.
    #[serde(default)]
    pub id: RoleId,
    /// Unique role name.
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// The full grant set; replaces any previous set on update.
    #[serde(default)]
    pub permission_ids: Vec<PermissionId>,
}

/// Permission create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    /// Permission key; unset when creating.
    #[serde(default)]
    pub id: PermissionId,
    /// Unique permission name.
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Parent permission for one-level grouping.
    #[serde(default)]
    pub parent_id: Option<PermissionId>,
    /// Grant every holder regardless of policy values.
    #[serde(default)]
    pub anonymous: bool,
    /// Ordered policy slots, at most three.
    #[serde(default)]
    pub policies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validates_email_and_password() {
        assert!(validate(&RegisterRequest::new("bob@x.com", "secret-1")).is_ok());
        assert!(validate(&RegisterRequest::new("not-an-email", "secret-1")).is_err());
        assert!(validate(&RegisterRequest::new("bob@x.com", "short")).is_err());
    }

    #[test]
    fn test_role_request_wire_names() {
        let req: RoleRequest = serde_json::from_value(serde_json::json!({
            "name": "reader",
            "label": "Reader",
            "permissionIds": [1, 2]
        }))
        .unwrap();
        assert!(!req.id.is_set());
        assert_eq!(req.permission_ids.len(), 2);
    }
}
