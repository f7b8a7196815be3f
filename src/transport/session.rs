//! Session State and Event Bus
//!
//! Holds the bearer credential and the signed-in user, and broadcasts
//! session changes to any number of subscribers. Subscribers register
//! explicitly; nothing is dispatched through ambient globals.

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::auth::models::{Role, User};

/// Capacity of the event channel; slow subscribers miss older events.
const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn { user_id: String, role: Role },
    SignedOut,
    /// The server stopped accepting the credential.
    Expired { message: String },
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// The authenticated session shared by the transport and the auth store.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an anonymous session.
    pub fn new() -> Self {
        Self::with_token(None)
    }

    /// Creates a session from a credential obtained elsewhere.
    pub fn with_token(token: Option<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(SessionState { token, user: None }),
            events,
        }
    }

    /// Registers a new observer of session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    /// Stores a fresh credential and announces it.
    pub async fn sign_in(&self, token: String, user: User) {
        let event = SessionEvent::SignedIn {
            user_id: user.id.clone(),
            role: user.role,
        };

        {
            let mut state = self.state.write().await;
            state.token = Some(token);
            state.user = Some(user);
        }

        info!(?event, "session started");
        self.publish(event);
    }

    /// Replaces the cached user without touching the credential.
    pub async fn set_user(&self, user: User) {
        self.state.write().await.user = Some(user);
    }

    /// Drops the credential at the user's request.
    pub async fn sign_out(&self) {
        self.clear().await;
        info!("session ended");
        self.publish(SessionEvent::SignedOut);
    }

    /// Drops the credential because the server rejected it.
    pub async fn expire(&self, message: String) {
        self.clear().await;
        warn!(%message, "session expired");
        self.publish(SessionEvent::Expired { message });
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.token = None;
        state.user = None;
    }

    fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("no session subscribers");
        }
    }
}
