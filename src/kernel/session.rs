use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ValidationError;

/// The one signal consumed from the identity/profile collaborator.
pub trait SessionGate: Send + Sync {
    fn is_active(&self) -> bool;
}

/// Switchable gate owned by whatever tracks sign-in state. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct SessionFlag {
    active: Arc<AtomicBool>,
}

impl SessionFlag {
    pub fn new(active: bool) -> Self {
        Self { active: Arc::new(AtomicBool::new(active)) }
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl SessionGate for SessionFlag {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Injected capability handed to the orchestrator and screening driver.
#[derive(Clone)]
pub struct SessionContext {
    gate: Arc<dyn SessionGate>,
}

impl SessionContext {
    pub fn new(gate: Arc<dyn SessionGate>) -> Self {
        Self { gate }
    }

    /// Always-on session, for local runs where sign-in is handled elsewhere.
    pub fn active() -> Self {
        Self::new(Arc::new(SessionFlag::new(true)))
    }

    pub fn inactive() -> Self {
        Self::new(Arc::new(SessionFlag::new(false)))
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn require_active(&self) -> Result<(), ValidationError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(ValidationError::NoActiveSession)
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_follows_flag() {
        let flag = SessionFlag::new(false);
        let session = SessionContext::new(Arc::new(flag.clone()));
        assert_eq!(session.require_active(), Err(ValidationError::NoActiveSession));

        flag.set_active(true);
        assert!(session.require_active().is_ok());
    }
}
