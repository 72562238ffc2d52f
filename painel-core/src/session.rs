//! Explicit request context carrying the authenticated actor.
//!
//! Authentication itself happens in front of the service; operations that
//! need to know who is acting receive a `SessionContext` instead of looking
//! the user up from ambient state.

use serde::{Deserialize, Serialize};

use crate::error::PainelError;

/// An authenticated user, identified by the identity provider's uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub actor: Option<Actor>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self {
            actor: Some(Actor { uid: uid.into() }),
        }
    }

    /// Build a context from an optional forwarded uid header value.
    /// Blank values are treated as anonymous.
    pub fn from_forwarded_uid(uid: Option<&str>) -> Self {
        match uid.map(str::trim) {
            Some(uid) if !uid.is_empty() => Self::authenticated(uid),
            _ => Self::anonymous(),
        }
    }

    pub fn require_actor(&self) -> Result<&Actor, PainelError> {
        self.actor.as_ref().ok_or(PainelError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_forwarded_uid_is_anonymous() {
        assert!(SessionContext::from_forwarded_uid(None).actor.is_none());
        assert!(SessionContext::from_forwarded_uid(Some("   ")).actor.is_none());
    }

    #[test]
    fn test_forwarded_uid_is_trimmed() {
        let ctx = SessionContext::from_forwarded_uid(Some(" uid-42 "));
        assert_eq!(ctx.require_actor().unwrap().uid, "uid-42");
    }

    #[test]
    fn test_require_actor_fails_when_anonymous() {
        let err = SessionContext::anonymous().require_actor().unwrap_err();
        assert!(matches!(err, PainelError::Unauthenticated));
    }
}
