//! Authentication domain events and the injected sink they are dispatched to.
//!
//! The engine never holds a global listener registry. Components that emit
//! events receive an [`EventSink`] at construction time; the embedding
//! application decides what drains it (a channel, a bus, a no-op).

use serde::{Deserialize, Serialize};

/// Events emitted by the authentication flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthEvent {
    /// A user signed in (password or token).
    Login {
        /// The user ID.
        user_id: i64,
        /// The lowercase email.
        email: String,
        /// Client IP the login came from.
        ip_address: String,
    },
    /// A user signed out.
    Logout {
        /// The user ID.
        user_id: i64,
        /// The lowercase email.
        email: String,
    },
    /// A new user registered.
    Created {
        /// The user ID.
        user_id: i64,
        /// The lowercase email.
        email: String,
        /// Whether the account still awaits activation.
        pending_activation: bool,
    },
}

/// Outbound sink for [`AuthEvent`]s, injected into the services that emit.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Implementations must not block the request path;
    /// queue and return.
    fn dispatch(&self, event: AuthEvent);
}

/// Sink that discards every event. The default when the embedder does not
/// care about post-login/post-create hooks.
#[derive(Debug, Clone, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&self, _event: AuthEvent) {}
}
