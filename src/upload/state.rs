//! Upload attempt state machine
//!
//! `Idle → FetchingCredential → (TransportFailed | SigningFailed | CredentialReady)
//! → Transferring → (Succeeded | TransferFailed)`. No state is re-entered; a new
//! upload starts a new attempt.

use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadState {
    Idle,
    FetchingCredential,
    TransportFailed,
    SigningFailed,
    CredentialReady,
    Transferring,
    Succeeded,
    TransferFailed,
}

impl UploadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UploadState::TransportFailed
                | UploadState::SigningFailed
                | UploadState::Succeeded
                | UploadState::TransferFailed
        )
    }

    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;

        matches!(
            (self, next),
            (Idle, FetchingCredential)
                | (FetchingCredential, TransportFailed)
                | (FetchingCredential, SigningFailed)
                | (FetchingCredential, CredentialReady)
                | (CredentialReady, Transferring)
                | (Transferring, Succeeded)
                | (Transferring, TransferFailed)
        )
    }

    /// Terminal state for a failed signing call
    pub fn after_signing_error(err: &UploadError) -> UploadState {
        match err {
            UploadError::Transport { .. } => UploadState::TransportFailed,
            _ => UploadState::SigningFailed,
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One run of the state machine
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    id: Uuid,
    state: UploadState,
    history: Vec<UploadState>,
}

impl UploadAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: UploadState::Idle,
            history: vec![UploadState::Idle],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[UploadState] {
        &self.history
    }

    pub fn advance(&mut self, next: UploadState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(UploadError::invalid_transition(self.state, next));
        }

        log::debug!("upload {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }
}

impl Default for UploadAttempt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UploadState::*;

    #[test]
    fn test_happy_path() {
        let mut attempt = UploadAttempt::new();
        for next in [FetchingCredential, CredentialReady, Transferring, Succeeded] {
            attempt.advance(next).unwrap();
        }

        assert_eq!(attempt.state(), Succeeded);
        assert!(attempt.state().is_terminal());
        assert_eq!(
            attempt.history(),
            &[Idle, FetchingCredential, CredentialReady, Transferring, Succeeded]
        );
    }

    #[test]
    fn test_signing_failure_is_terminal() {
        let mut attempt = UploadAttempt::new();
        attempt.advance(FetchingCredential).unwrap();
        attempt.advance(SigningFailed).unwrap();

        let err = attempt.advance(Transferring).unwrap_err();
        assert_eq!(err, UploadError::invalid_transition("SigningFailed", "Transferring"));
        assert_eq!(attempt.state(), SigningFailed);
    }

    #[test]
    fn test_no_state_is_reentered() {
        let mut attempt = UploadAttempt::new();
        attempt.advance(FetchingCredential).unwrap();
        assert!(attempt.advance(FetchingCredential).is_err());
        assert!(attempt.advance(Idle).is_err());
        assert!(!Succeeded.can_transition_to(Transferring));
        assert!(!Idle.can_transition_to(Transferring));
    }

    #[test]
    fn test_after_signing_error() {
        assert_eq!(
            UploadState::after_signing_error(&UploadError::transport("reset")),
            TransportFailed
        );
        assert_eq!(
            UploadState::after_signing_error(&UploadError::http_status(500)),
            SigningFailed
        );
        assert_eq!(
            UploadState::after_signing_error(&UploadError::malformed("x")),
            SigningFailed
        );
    }

    #[test]
    fn test_attempt_ids_differ() {
        assert_ne!(UploadAttempt::new().id(), UploadAttempt::new().id());
    }
}
