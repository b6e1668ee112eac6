//! Stateless, self-verifying bearer tokens.
//!
//! Wire format (the one bit-exact external contract of the engine):
//!
//! ```text
//! base64_no_pad(email + "$" + expiry_unix) + "-" + hex(sha256(secret + login_ts + password_digest + payload))
//! ```
//!
//! where `login_ts` is the principal's last-login unix timestamp when the
//! token is bound to last-login, `"0"` otherwise. Decoding recomputes the
//! expected token from the current principal record and compares
//! byte-for-byte, so there is no per-token server state and any change to
//! the bound inputs (password digest, secret, bound last-login) silently
//! revokes the token.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use chrono::Utc;
use sha2::{Digest, Sha256};

use keyhub_core::{AppError, AppResult};
use keyhub_entity::User;
use keyhub_store::RecordStore;

use crate::users::get_user_by_email;

/// Encodes and decodes the stateless bearer token.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: String,
}

impl TokenCodec {
    /// Creates a codec keyed with the process-wide secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    /// Encode a token for `user` expiring at `expiry_unix`.
    ///
    /// With `bind_last_login` the digest also covers the last-login
    /// timestamp, so the token additionally dies on the next login.
    pub fn encode(&self, user: &User, expiry_unix: i64, bind_last_login: bool) -> String {
        let login_ts = match (bind_last_login, user.last_login) {
            (true, Some(at)) => at.timestamp().to_string(),
            _ => "0".to_string(),
        };
        let payload = format!("{}${}", user.email, expiry_unix);
        let digest = Sha256::digest(
            format!("{}{}{}{}", self.secret, login_ts, user.password, payload).as_bytes(),
        );
        format!(
            "{}-{}",
            STANDARD_NO_PAD.encode(payload.as_bytes()),
            hex::encode(digest)
        )
    }

    /// Decode and verify a presented token, returning its principal.
    ///
    /// Any malformation, unknown principal, or digest mismatch fails as
    /// "bad token"; only a structurally valid but out-of-date token fails
    /// as "token expired".
    pub async fn decode(
        &self,
        store: &dyn RecordStore,
        token: &str,
        bind_last_login: bool,
    ) -> AppResult<User> {
        let bad_token = || AppError::authentication("bad token");

        let parts: Vec<&str> = token.split('-').collect();
        let [payload_b64, _digest] = parts.as_slice() else {
            return Err(bad_token());
        };

        let payload_bytes = STANDARD_NO_PAD
            .decode(payload_b64)
            .map_err(|_| bad_token())?;
        let payload = String::from_utf8(payload_bytes).map_err(|_| bad_token())?;

        let fields: Vec<&str> = payload.split('$').collect();
        let [email, expiry_text] = fields.as_slice() else {
            return Err(bad_token());
        };
        let expiry: i64 = expiry_text.parse().map_err(|_| bad_token())?;

        if Utc::now().timestamp() > expiry {
            return Err(AppError::authentication("token expired"));
        }

        let user = get_user_by_email(store, *email)
            .await?
            .ok_or_else(bad_token)?;

        let expected = self.encode(&user, expiry, bind_last_login);
        if expected != token {
            return Err(bad_token());
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use keyhub_store::MemoryStore;

    use crate::password::PasswordHasher;
    use crate::users::{create_user, set_last_login, set_password};

    const SECRET: &str = "test-secret";

    async fn seeded_user(store: &MemoryStore) -> User {
        create_user(store, &PasswordHasher::new(SECRET), "bob@x.com", "secret")
            .await
            .unwrap()
    }

    fn expires_in(minutes: i64) -> i64 {
        (Utc::now() + Duration::minutes(minutes)).timestamp()
    }

    #[tokio::test]
    async fn test_round_trip_before_expiry() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let token = codec.encode(&user, expires_in(10), false);
        let decoded = codec.decode(&store, &token, false).await.unwrap();
        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.email, "bob@x.com");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let token = codec.encode(&user, expires_in(-1), false);
        let err = codec.decode(&store, &token, false).await.unwrap_err();
        assert_eq!(err.message, "token expired");
    }

    #[tokio::test]
    async fn test_malformed_tokens() {
        let store = MemoryStore::new();
        seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let no_separator = format!("{}-deadbeef", STANDARD_NO_PAD.encode("noseparator"));
        let bad_expiry = format!("{}-deadbeef", STANDARD_NO_PAD.encode("bob@x.com$notanumber"));
        for token in [
            "nodash",
            "a-b-c",
            "!!!-deadbeef",
            no_separator.as_str(),
            bad_expiry.as_str(),
        ] {
            let err = codec.decode(&store, token, false).await.unwrap_err();
            assert_eq!(err.message, "bad token", "token: {token}");
        }
    }

    #[tokio::test]
    async fn test_unknown_email_is_bad_token() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let mut ghost = user.clone();
        ghost.email = "ghost@x.com".to_string();
        let token = codec.encode(&ghost, expires_in(10), false);
        let err = codec.decode(&store, &token, false).await.unwrap_err();
        assert_eq!(err.message, "bad token");
    }

    #[tokio::test]
    async fn test_password_change_revokes_tokens() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(SECRET);
        let mut user = seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let token = codec.encode(&user, expires_in(10), false);
        codec.decode(&store, &token, false).await.unwrap();

        set_password(&store, &hasher, &mut user, "changed")
            .await
            .unwrap();
        let err = codec.decode(&store, &token, false).await.unwrap_err();
        assert_eq!(err.message, "bad token");
    }

    #[tokio::test]
    async fn test_last_login_binding() {
        let store = MemoryStore::new();
        let mut user = seeded_user(&store).await;
        set_last_login(&store, &mut user, "10.0.0.1").await.unwrap();
        let codec = TokenCodec::new(SECRET);

        let bound = codec.encode(&user, expires_in(10), true);
        codec.decode(&store, &bound, true).await.unwrap();

        // Another login moves the timestamp and kills the bound token.
        let mut changes = keyhub_store::Row::new();
        let later = user.last_login.unwrap() + Duration::seconds(30);
        changes.insert("last_login".to_string(), serde_json::to_value(later).unwrap());
        crate::users::update_user_fields(&store, &user, changes)
            .await
            .unwrap();

        let err = codec.decode(&store, &bound, true).await.unwrap_err();
        assert_eq!(err.message, "bad token");

        // An unbound token presented for bound decoding also fails.
        let unbound = codec.encode(&user, expires_in(10), false);
        assert!(codec.decode(&store, &unbound, true).await.is_err());
    }

    #[tokio::test]
    async fn test_wire_format_shape() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let codec = TokenCodec::new(SECRET);

        let expiry = expires_in(10);
        let token = codec.encode(&user, expiry, false);
        let (payload_b64, digest_hex) = token.split_once('-').unwrap();
        assert_eq!(
            STANDARD_NO_PAD.decode(payload_b64).unwrap(),
            format!("bob@x.com${expiry}").into_bytes()
        );
        assert_eq!(digest_hex.len(), 64);
        assert!(digest_hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
