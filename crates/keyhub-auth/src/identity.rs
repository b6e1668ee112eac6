//! Request-scoped identity resolution.
//!
//! One [`RequestContext`] is created per inbound request and owned by it
//! exclusively; the principal, group, and timezone caches live for that
//! request only. Resolution order for the principal: cache, then the
//! session slot, then (when the caller supplies one) the bearer token.

use tracing::debug;

use keyhub_core::{AppError, AppResult};
use keyhub_entity::{Group, GroupId, User, UserId};
use keyhub_store::{RecordStore, typed};

use crate::session::{GROUP_KEY, SessionState, TZ_KEY, USER_KEY};
use crate::token::TokenCodec;

/// Per-request identity state: the caller's session, client address, and
/// the request-scoped caches populated by resolution.
pub struct RequestContext {
    session: Box<dyn SessionState>,
    client_ip: String,
    user: Option<User>,
    group: Option<Group>,
    timezone: Option<String>,
}

impl RequestContext {
    /// Wrap one request's session state.
    pub fn new(session: Box<dyn SessionState>, client_ip: &str) -> Self {
        Self {
            session,
            client_ip: client_ip.to_string(),
            user: None,
            group: None,
            timezone: None,
        }
    }

    /// The client address the request arrived from.
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// The current principal: request cache first, then the session slot.
    /// Disabled principals (and dangling session slots) resolve to `None`.
    pub async fn current_user(&mut self, store: &dyn RecordStore) -> AppResult<Option<User>> {
        if self.user.is_some() {
            return Ok(self.user.clone());
        }
        let Some(uid) = self.session_user_id() else {
            return Ok(None);
        };
        let Some(user) = crate::users::get_user_by_id(store, uid).await? else {
            return Ok(None);
        };
        self.user = Some(user.clone());
        Ok(Some(user))
    }

    /// Resolve the principal, falling back to a bearer `Authorization`
    /// header value. On token success the session and cache are populated
    /// so the rest of the pipeline sees a session-equivalent identity; any
    /// failure is an authentication error.
    pub async fn authenticate(
        &mut self,
        store: &dyn RecordStore,
        codec: &TokenCodec,
        authorization: Option<&str>,
    ) -> AppResult<User> {
        if let Some(user) = self.current_user(store).await? {
            return Ok(user);
        }

        let header = authorization
            .ok_or_else(|| AppError::authentication("authorization header not found"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("invalid authorization header"))?;

        let user = codec.decode(store, token, false).await?;
        if !user.enabled {
            return Err(AppError::authentication("bad token"));
        }

        debug!(user_id = %user.id, "authenticated via bearer token");
        self.attach_user(&user);
        Ok(user)
    }

    /// Populate the session slot and request cache for this principal.
    pub fn attach_user(&mut self, user: &User) {
        self.session.set(USER_KEY, &user.id.to_string());
        self.user = Some(user.clone());
    }

    /// Clear the principal from both the session and the cache.
    pub fn detach_user(&mut self) {
        self.session.remove(USER_KEY);
        self.user = None;
    }

    /// The signed-in principal id recorded in the session, if any.
    pub fn session_user_id(&self) -> Option<UserId> {
        self.session.get(USER_KEY)?.parse().ok()
    }

    /// The current group: cache, then the session slot.
    pub async fn current_group(&mut self, store: &dyn RecordStore) -> AppResult<Option<Group>> {
        if self.group.is_some() {
            return Ok(self.group.clone());
        }
        let Some(gid) = self.session.get(GROUP_KEY).and_then(|v| v.parse::<GroupId>().ok()) else {
            return Ok(None);
        };
        let group: Option<Group> = typed::get_by_id(store, gid.value()).await?;
        self.group = group.clone();
        Ok(group)
    }

    /// Record a group switch in the session and cache.
    pub fn switch_group(&mut self, group: &Group) {
        self.session.set(GROUP_KEY, &group.id.to_string());
        self.group = Some(group.clone());
    }

    /// Adopt a timezone for this session.
    pub fn in_timezone(&mut self, timezone: &str) {
        self.session.set(TZ_KEY, timezone);
        self.timezone = Some(timezone.to_string());
    }

    /// The effective timezone name: cache, session, the principal's
    /// preference, then UTC.
    pub fn current_timezone(&mut self) -> String {
        if let Some(tz) = &self.timezone {
            return tz.clone();
        }
        let tz = self
            .session
            .get(TZ_KEY)
            .or_else(|| {
                self.user
                    .as_ref()
                    .map(|u| u.timezone.clone())
                    .filter(|tz| !tz.is_empty())
            })
            .unwrap_or_else(|| "UTC".to_string());
        self.timezone = Some(tz.clone());
        tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    use keyhub_store::MemoryStore;

    use crate::password::PasswordHasher;
    use crate::session::MemorySession;
    use crate::users::{create_user, update_user_fields};

    const SECRET: &str = "test-secret";

    fn context() -> RequestContext {
        RequestContext::new(Box::new(MemorySession::new()), "127.0.0.1")
    }

    #[tokio::test]
    async fn test_session_resolution_and_cache() {
        let store = MemoryStore::new();
        let user = create_user(&store, &PasswordHasher::new(SECRET), "a@b.c", "pw")
            .await
            .unwrap();

        let mut ctx = context();
        assert!(ctx.current_user(&store).await.unwrap().is_none());

        ctx.attach_user(&user);
        let resolved = ctx.current_user(&store).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_disabled_user_resolves_to_none() {
        let store = MemoryStore::new();
        let user = create_user(&store, &PasswordHasher::new(SECRET), "a@b.c", "pw")
            .await
            .unwrap();

        let mut ctx = context();
        ctx.attach_user(&user);
        ctx.user = None; // keep the session slot, drop the cache

        let mut changes = keyhub_store::Row::new();
        changes.insert("enabled".to_string(), Value::from(false));
        update_user_fields(&store, &user, changes).await.unwrap();

        assert!(ctx.current_user(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bearer_authentication_populates_session() {
        let store = MemoryStore::new();
        let user = create_user(&store, &PasswordHasher::new(SECRET), "a@b.c", "pw")
            .await
            .unwrap();
        let codec = TokenCodec::new(SECRET);
        let token = user_token(&codec, &user);

        let mut ctx = context();
        let header = format!("Bearer {token}");
        let resolved = ctx
            .authenticate(&store, &codec, Some(&header))
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(ctx.session_user_id(), Some(user.id));

        // Subsequent middleware sees a session-equivalent identity.
        let again = ctx.current_user(&store).await.unwrap().unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_authentication_errors() {
        let store = MemoryStore::new();
        let codec = TokenCodec::new(SECRET);

        let mut ctx = context();
        let err = ctx.authenticate(&store, &codec, None).await.unwrap_err();
        assert_eq!(err.message, "authorization header not found");

        let err = ctx
            .authenticate(&store, &codec, Some("Basic dXNlcg=="))
            .await
            .unwrap_err();
        assert_eq!(err.message, "invalid authorization header");

        let err = ctx
            .authenticate(&store, &codec, Some("Bearer garbage"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "bad token");
    }

    #[tokio::test]
    async fn test_timezone_fallbacks() {
        let mut ctx = context();
        assert_eq!(ctx.current_timezone(), "UTC");

        ctx.in_timezone("Asia/Tokyo");
        assert_eq!(ctx.current_timezone(), "Asia/Tokyo");
    }

    fn user_token(codec: &TokenCodec, user: &User) -> String {
        let expiry = (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp();
        codec.encode(user, expiry, false)
    }
}
