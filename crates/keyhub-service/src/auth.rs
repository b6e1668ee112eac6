//! Sign-in, sign-up, sign-out, password change, and action authorization.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use keyhub_auth::rbac::check_user_permission;
use keyhub_auth::users::{
    create_user, get_user_by_email, is_exist_by_email, set_last_login, set_password,
    update_user_fields,
};
use keyhub_auth::{PasswordHasher, RequestContext, TokenCodec};
use keyhub_core::{AppError, AppResult, AuthConfig, AuthEvent, EventSink};
use keyhub_entity::{Action, User};
use keyhub_store::{RecordStore, Row};

use crate::request::{ChangePasswordRequest, LoginRequest, RegisterRequest, validate};
use crate::settings::Settings;

/// Outcome of a registration.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The created principal. Signed in (session populated) unless
    /// activation is pending.
    pub user: User,
    /// Whether the account still awaits activation.
    pub pending_activation: bool,
}

/// The authentication flows. One per process; cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn RecordStore>,
    config: AuthConfig,
    hasher: PasswordHasher,
    codec: TokenCodec,
    settings: Settings,
    events: Arc<dyn EventSink>,
}

impl AuthService {
    /// Wire the flows to a store, configuration, and event sink.
    pub fn new(store: Arc<dyn RecordStore>, config: AuthConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            hasher: PasswordHasher::new(&config.secret),
            codec: TokenCodec::new(&config.secret),
            settings: Settings::new(store.clone()),
            store,
            config,
            events,
        }
    }

    /// The settings view this service reads its policy switches from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sign a principal in by email + password, or by a previously issued
    /// token. On success the session carries the principal; `remember`
    /// additionally returns a long-lived token in `User::auth_token`.
    pub async fn sign_in(
        &self,
        ctx: &mut RequestContext,
        req: &LoginRequest,
    ) -> AppResult<User> {
        validate(req)?;
        let store = self.store.as_ref();

        let mut user = if !req.token.is_empty() {
            self.codec.decode(store, &req.token, false).await?
        } else {
            let user = get_user_by_email(store, &req.email)
                .await?
                .ok_or_else(|| AppError::not_found("user not exists"))?;
            if !self.hasher.verify_password(&user.password, &req.password) {
                return Err(AppError::authentication("unauthorized"));
            }
            user
        };

        self.check_allow_login(&user).await?;

        if !req.timezone.is_empty() {
            ctx.in_timezone(&req.timezone);
        } else if !user.timezone.is_empty() {
            ctx.in_timezone(&user.timezone);
        }

        set_last_login(store, &mut user, ctx.client_ip()).await?;
        ctx.attach_user(&user);

        if req.remember {
            // Unbound from last-login so the token survives later logins;
            // only a password change revokes it.
            let expiry = Utc::now().timestamp() + self.config.remember_token_days * 86_400;
            user.auth_token = self.codec.encode(&user, expiry, false);
        }

        info!(user_id = %user.id, email = %user.email, "user signed in");
        self.events.dispatch(AuthEvent::Login {
            user_id: user.id.value(),
            email: user.email.clone(),
            ip_address: ctx.client_ip().to_string(),
        });
        Ok(user)
    }

    /// Register a new principal. The account is enabled immediately; when
    /// the activation switch is on it stays signed out until activated,
    /// otherwise it is signed in right away.
    pub async fn sign_up(
        &self,
        ctx: &mut RequestContext,
        req: &RegisterRequest,
    ) -> AppResult<SignUpOutcome> {
        validate(req)?;
        let store = self.store.as_ref();

        if is_exist_by_email(store, &req.email).await? {
            return Err(AppError::conflict("email has exists"));
        }

        let mut user = create_user(store, &self.hasher, &req.email, &req.password).await?;
        self.apply_registration_fields(&mut user, req).await?;

        let pending_activation = self
            .settings
            .get_bool(&self.config.activation_required_key)
            .await?;
        if !pending_activation {
            set_last_login(store, &mut user, ctx.client_ip()).await?;
            ctx.attach_user(&user);
        }

        info!(user_id = %user.id, email = %user.email, pending_activation, "user registered");
        self.events.dispatch(AuthEvent::Created {
            user_id: user.id.value(),
            email: user.email.clone(),
            pending_activation,
        });
        Ok(SignUpOutcome {
            user,
            pending_activation,
        })
    }

    /// Sign the current principal out, clearing the session.
    pub async fn sign_out(&self, ctx: &mut RequestContext) -> AppResult<()> {
        if let Some(user) = ctx.current_user(self.store.as_ref()).await? {
            info!(user_id = %user.id, email = %user.email, "user signed out");
            self.events.dispatch(AuthEvent::Logout {
                user_id: user.id.value(),
                email: user.email,
            });
        }
        ctx.detach_user();
        Ok(())
    }

    /// Change the signed-in principal's password. Every previously issued
    /// token dies with the old digest.
    pub async fn change_password(
        &self,
        ctx: &mut RequestContext,
        req: &ChangePasswordRequest,
    ) -> AppResult<()> {
        validate(req)?;
        let store = self.store.as_ref();

        let mut user = ctx
            .current_user(store)
            .await?
            .ok_or_else(|| AppError::authentication("unauthorized"))?;
        self.check_allow_login(&user).await?;

        set_password(store, &self.hasher, &mut user, &req.password).await?;
        ctx.attach_user(&user);
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Decide whether the current principal may perform the action.
    ///
    /// With the authorization switch off every request passes. Otherwise a
    /// principal is required, a superuser always passes, and anyone else
    /// needs a role permission covering the action.
    pub async fn authorize(
        &self,
        ctx: &mut RequestContext,
        action: &Action,
    ) -> AppResult<()> {
        let need_auth = self
            .settings
            .get_bool(&self.config.authorization_required_key)
            .await?;
        if !need_auth {
            return Ok(());
        }

        let store = self.store.as_ref();
        let user = ctx
            .current_user(store)
            .await?
            .ok_or_else(|| AppError::authentication("unauthorized"))?;
        if user.is_super_user {
            return Ok(());
        }
        if check_user_permission(store, user.id, action).await? {
            return Ok(());
        }
        Err(AppError::forbidden("permission denied"))
    }

    async fn check_allow_login(&self, user: &User) -> AppResult<()> {
        if !user.enabled {
            return Err(AppError::authentication("user not allow login"));
        }
        let need_activate = self
            .settings
            .get_bool(&self.config.activation_required_key)
            .await?;
        if need_activate && !user.activated {
            return Err(AppError::authentication("waiting for activation"));
        }
        Ok(())
    }

    async fn apply_registration_fields(
        &self,
        user: &mut User,
        req: &RegisterRequest,
    ) -> AppResult<()> {
        let mut changes = Row::new();
        let fields = [
            ("display_name", &req.display_name),
            ("first_name", &req.first_name),
            ("last_name", &req.last_name),
            ("locale", &req.locale),
            ("timezone", &req.timezone),
            ("source", &req.source),
        ];
        for (column, value) in fields {
            if !value.is_empty() {
                changes.insert(column.to_string(), json!(value));
            }
        }
        if changes.is_empty() {
            return Ok(());
        }
        update_user_fields(self.store.as_ref(), user, changes).await?;
        user.display_name.clone_from(&req.display_name);
        user.first_name.clone_from(&req.first_name);
        user.last_name.clone_from(&req.last_name);
        user.locale.clone_from(&req.locale);
        user.timezone.clone_from(&req.timezone);
        user.source.clone_from(&req.source);
        Ok(())
    }
}
