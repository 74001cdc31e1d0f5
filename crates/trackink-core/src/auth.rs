//! Gate checked before a peer joins the relay.

use crate::error::AuthError;

/// Decides whether this peer may join the relay and start interpreting.
pub trait AuthGuard {
    fn is_authorized(&self) -> bool;
}

/// Guard that lets everyone in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthGuard for AllowAll {
    fn is_authorized(&self) -> bool {
        true
    }
}

/// Shared-secret guard: authorized when the presented token matches.
#[derive(Debug, Clone)]
pub struct TokenGuard {
    expected: String,
    presented: Option<String>,
}

impl TokenGuard {
    pub fn new(expected: impl Into<String>, presented: Option<String>) -> Self {
        Self {
            expected: expected.into(),
            presented,
        }
    }
}

impl AuthGuard for TokenGuard {
    fn is_authorized(&self) -> bool {
        !self.expected.is_empty() && self.presented.as_deref() == Some(self.expected.as_str())
    }
}

impl<F: Fn() -> bool> AuthGuard for F {
    fn is_authorized(&self) -> bool {
        self()
    }
}

pub fn ensure_authorized(guard: &dyn AuthGuard) -> Result<(), AuthError> {
    if guard.is_authorized() {
        Ok(())
    } else {
        log::warn!("Auth guard refused to start the peer");
        Err(AuthError::Unauthorized)
    }
}
