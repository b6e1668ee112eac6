//! Principal queries and mutations over the record store.

use chrono::{DateTime, Utc};
use serde_json::Value;

use keyhub_core::{AppError, AppResult};
use keyhub_entity::{User, UserId};
use keyhub_store::{Filter, RecordStore, typed};

use crate::password::PasswordHasher;

/// Load a principal by key. Disabled principals read as absent.
pub async fn get_user_by_id(store: &dyn RecordStore, id: UserId) -> AppResult<Option<User>> {
    let filter = Filter::by("id", id.value()).and("enabled", true);
    typed::get_one(store, filter).await
}

/// Load a principal by lowercase-normalized email, enabled or not.
pub async fn get_user_by_email(store: &dyn RecordStore, email: &str) -> AppResult<Option<User>> {
    let filter = Filter::by("email", email.trim().to_lowercase());
    typed::get_one(store, filter).await
}

/// Whether any principal (enabled or not) holds this email.
pub async fn is_exist_by_email(store: &dyn RecordStore, email: &str) -> AppResult<bool> {
    Ok(get_user_by_email(store, email).await?.is_some())
}

/// Create an enabled, not-yet-activated principal with a hashed password.
pub async fn create_user(
    store: &dyn RecordStore,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let user = User::new(email, &hasher.hash_password(password));
    typed::create(store, &user).await
}

/// Re-hash and persist a new password, updating the in-memory value too.
/// Every previously issued bearer token bound to the old digest dies here.
pub async fn set_password(
    store: &dyn RecordStore,
    hasher: &PasswordHasher,
    user: &mut User,
    password: &str,
) -> AppResult<()> {
    let digest = hasher.hash_password(password);
    let mut changes = keyhub_store::Row::new();
    changes.insert("password".to_string(), Value::from(digest.clone()));
    let touched = typed::update_fields::<User>(store, user.id.value(), changes).await?;
    if touched == 0 {
        return Err(AppError::not_found("user not found"));
    }
    user.password = digest;
    Ok(())
}

/// Stamp the last-login time (second precision) and client IP.
pub async fn set_last_login(
    store: &dyn RecordStore,
    user: &mut User,
    client_ip: &str,
) -> AppResult<()> {
    let now = truncate_to_second(Utc::now());
    let mut changes = keyhub_store::Row::new();
    changes.insert("last_login".to_string(), serde_json::to_value(now)?);
    changes.insert("last_login_ip".to_string(), Value::from(client_ip));
    typed::update_fields::<User>(store, user.id.value(), changes).await?;
    user.last_login = Some(now);
    user.last_login_ip = client_ip.to_string();
    Ok(())
}

/// Set arbitrary already-validated columns on a principal.
pub async fn update_user_fields(
    store: &dyn RecordStore,
    user: &User,
    changes: keyhub_store::Row,
) -> AppResult<u64> {
    typed::update_fields::<User>(store, user.id.value(), changes).await
}

/// Drop sub-second precision so the timestamp survives storage round-trips
/// identically; the token digest binds to it byte-for-byte.
pub fn truncate_to_second(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}
