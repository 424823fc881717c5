//! Optional hooks fired after account lifecycle changes are persisted.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEvent {
    SignedUp { user_id: Uuid },
    LoggedIn { user_id: Uuid },
    LoggedOut { user_id: Uuid },
    LoggedOutAll { user_id: Uuid },
    AccountDeleted { user_id: Uuid },
}

impl AccountEvent {
    pub fn user_id(&self) -> Uuid {
        match *self {
            AccountEvent::SignedUp { user_id }
            | AccountEvent::LoggedIn { user_id }
            | AccountEvent::LoggedOut { user_id }
            | AccountEvent::LoggedOutAll { user_id }
            | AccountEvent::AccountDeleted { user_id } => user_id,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&AccountEvent) + Send + Sync>;

/// Handlers are called in registration order.
#[derive(Clone, Default)]
pub struct EventHooks {
    handlers: Vec<EventHandler>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&AccountEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn emit(&self, event: AccountEvent) {
        log::debug!("dispatching {:?} to {} handler(s)", event, self.handlers.len());
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
