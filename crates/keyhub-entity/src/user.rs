//! Principal (user) model.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

use crate::id::UserId;

/// Opaque profile blob stored as a JSON column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar: String,
    /// Free-form gender string.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gender: String,
    /// City name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    /// Region/state name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Country name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    /// Anything else the embedder wants to stash.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A registered principal.
///
/// `auth_token` only ever exists on the in-memory value handed back to the
/// caller after a "remember me" login; the store never sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key, assigned by the store.
    #[serde(default)]
    pub id: UserId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Unique lowercase-normalized email.
    pub email: String,
    /// Salted password digest (`sha256$salt+hex`).
    pub password: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Preferred display name.
    #[serde(default)]
    pub display_name: String,
    /// Superuser flag; short-circuits every permission check.
    #[serde(default)]
    pub is_super_user: bool,
    /// Staff flag (organizational only).
    #[serde(default)]
    pub is_staff: bool,
    /// Disabled principals behave as absent during identity resolution.
    #[serde(default)]
    pub enabled: bool,
    /// Whether the account passed activation.
    #[serde(default)]
    pub activated: bool,
    /// Last successful login time, second precision.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Client IP of the last login.
    #[serde(default)]
    pub last_login_ip: String,
    /// Registration source tag.
    #[serde(default)]
    pub source: String,
    /// Preferred locale.
    #[serde(default)]
    pub locale: String,
    /// Preferred IANA timezone name.
    #[serde(default)]
    pub timezone: String,
    /// Opaque profile blob.
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Ephemeral bearer token, never persisted.
    #[serde(default)]
    pub auth_token: String,
}

static USER_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "users",
        vec![
            FieldMeta::new("id", FieldKind::Integer).primary_key().hidden(),
            FieldMeta::new("created_at", FieldKind::Timestamp).hidden(),
            FieldMeta::new("updated_at", FieldKind::Timestamp).hidden(),
            FieldMeta::new("email", FieldKind::Text),
            FieldMeta::new("password", FieldKind::Text).hidden(),
            FieldMeta::new("phone", FieldKind::Text),
            FieldMeta::new("first_name", FieldKind::Text).json("firstName"),
            FieldMeta::new("last_name", FieldKind::Text).json("lastName"),
            FieldMeta::new("display_name", FieldKind::Text).json("displayName"),
            FieldMeta::new("is_super_user", FieldKind::Bool).hidden(),
            FieldMeta::new("is_staff", FieldKind::Bool).hidden(),
            FieldMeta::new("enabled", FieldKind::Bool).hidden(),
            FieldMeta::new("activated", FieldKind::Bool).hidden(),
            FieldMeta::new("last_login", FieldKind::Timestamp)
                .json("lastLogin")
                .nullable(),
            FieldMeta::new("last_login_ip", FieldKind::Text).hidden(),
            FieldMeta::new("source", FieldKind::Text).hidden(),
            FieldMeta::new("locale", FieldKind::Text),
            FieldMeta::new("timezone", FieldKind::Text),
            FieldMeta::new("profile", FieldKind::Json).nullable(),
            FieldMeta::new("auth_token", FieldKind::Text)
                .json("token")
                .ephemeral(),
        ],
    )
});

impl Model for User {
    fn meta() -> &'static EntityMeta {
        &USER_META
    }
}

impl User {
    /// Create a fresh, enabled, not-yet-activated principal. The email is
    /// lowercase-normalized; `password` must already be a digest.
    pub fn new(email: &str, password_digest: &str) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::UNSET,
            created_at: now,
            updated_at: now,
            email: email.trim().to_lowercase(),
            password: password_digest.to_string(),
            phone: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            display_name: String::new(),
            is_super_user: false,
            is_staff: false,
            enabled: true,
            activated: false,
            last_login: None,
            last_login_ip: String::new(),
            source: String::new(),
            locale: String::new(),
            timezone: String::new(),
            profile: None,
            auth_token: String::new(),
        }
    }

    /// Best human-readable name: display name, else first name, else last.
    pub fn visible_name(&self) -> &str {
        if !self.display_name.is_empty() {
            return &self.display_name;
        }
        if !self.first_name.is_empty() {
            return &self.first_name;
        }
        &self.last_name
    }

    /// The profile blob, defaulting to empty.
    pub fn profile_or_default(&self) -> Profile {
        self.profile.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_email() {
        let user = User::new(" Bob@X.COM ", "sha256$x");
        assert_eq!(user.email, "bob@x.com");
        assert!(user.enabled);
        assert!(!user.activated);
    }

    #[test]
    fn test_visible_name_fallbacks() {
        let mut user = User::new("a@b.c", "d");
        user.last_name = "Stone".to_string();
        assert_eq!(user.visible_name(), "Stone");
        user.first_name = "Ada".to_string();
        assert_eq!(user.visible_name(), "Ada");
        user.display_name = "ada.s".to_string();
        assert_eq!(user.visible_name(), "ada.s");
    }

    #[test]
    fn test_serde_keys_are_columns() {
        let user = User::new("a@b.c", "d");
        let row = serde_json::to_value(&user).unwrap();
        assert!(row.get("last_login_ip").is_some());
        assert!(row.get("auth_token").is_some());
        assert!(row.get("lastLogin").is_none());
    }

    #[test]
    fn test_meta_wire_names() {
        let meta = User::meta();
        assert_eq!(meta.primary_key_column(), "id");
        assert_eq!(
            meta.field_for_json_name("displayName").unwrap().column,
            "display_name"
        );
        // Internal flags are not reachable from the wire.
        assert!(meta.field_for_json_name("is_super_user").is_none());
        assert!(meta.field_for_json_name("password").is_none());
    }
}
