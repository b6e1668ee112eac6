//! Shared test helpers for scenario tests.

use std::sync::{Arc, Mutex};

use keyhub_auth::{MemorySession, RequestContext};
use keyhub_core::{AuthConfig, AuthEvent, EventSink};
use keyhub_service::{AuthService, RbacAdminService};
use keyhub_store::MemoryStore;

/// Event sink that records everything dispatched to it.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<AuthEvent>>,
}

impl CaptureSink {
    pub fn drain(&self) -> Vec<AuthEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl EventSink for CaptureSink {
    fn dispatch(&self, event: AuthEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Test application context: services wired to one in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub auth: AuthService,
    pub admin: RbacAdminService,
    pub config: AuthConfig,
    pub events: Arc<CaptureSink>,
}

impl TestApp {
    /// Create a fresh application over an empty store.
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let store = Arc::new(MemoryStore::new());
        let config = AuthConfig::default();
        let events = Arc::new(CaptureSink::default());
        let auth = AuthService::new(store.clone(), config.clone(), events.clone());
        let admin = RbacAdminService::new(store.clone());
        Self {
            store,
            auth,
            admin,
            config,
            events,
        }
    }

    /// A fresh request context with its own session.
    pub fn context(&self) -> RequestContext {
        RequestContext::new(Box::new(MemorySession::new()), "127.0.0.1")
    }
}
