//! Viewer-side unlock attempts
//!
//! `decrypt` itself is stateless and imposes no limit on attempts. `Unlocker`
//! layers the viewer's policy on top: it tracks the phase of the current
//! attempt and stops offering attempts once a budget is used up.

use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use crate::password::Password;
use crate::payload::Payload;
use crate::record::Record;

/// Phase of a single decode attempt.
///
/// `Unattempted → Deriving → Verifying → Revealed | Rejected`, and
/// `Rejected → Unattempted` when the caller retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockPhase {
    /// No password submitted yet for this attempt.
    Unattempted,
    /// The KDF is running.
    Deriving,
    /// The cipher is checking the tag.
    Verifying,
    /// Terminal success.
    Revealed,
    /// The attempt failed; a retry may follow.
    Rejected,
}

type Observer = Box<dyn FnMut(UnlockPhase)>;

pub struct Unlocker {
    record: Record,
    max_attempts: u32,
    attempts: u32,
    phase: UnlockPhase,
    revealed: Option<Payload>,
    observer: Option<Observer>,
}

impl Unlocker {
    pub fn new(record: Record, max_attempts: u32) -> Self {
        Self {
            record,
            max_attempts,
            attempts: 0,
            phase: UnlockPhase::Unattempted,
            revealed: None,
            observer: None,
        }
    }

    /// Register a callback for every phase transition.
    pub fn with_observer(mut self, observer: impl FnMut(UnlockPhase) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn phase(&self) -> UnlockPhase {
        self.phase
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// True once the budget is spent without a successful unlock.
    pub fn is_locked(&self) -> bool {
        self.revealed.is_none() && self.attempts_remaining() == 0
    }

    /// The payload, once an attempt has succeeded.
    pub fn payload(&self) -> Option<&Payload> {
        self.revealed.as_ref()
    }

    /// Try to open the record with `password`.
    ///
    /// After a successful unlock further calls return the revealed payload
    /// without deriving again. Once the budget is spent every call fails with
    /// `AttemptsExhausted` and the KDF is not run.
    pub fn try_password(&mut self, password: &Password) -> Result<&Payload> {
        if self.revealed.is_some() {
            return self.revealed.as_ref().ok_or_else(|| {
                KeepsakeError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::InternalInvariant,
                    "revealed payload went missing",
                )
            });
        }

        if self.attempts >= self.max_attempts {
            return Err(KeepsakeError::with_kind(
                ErrorCategory::User,
                ErrorKind::AttemptsExhausted,
                "too many incorrect attempts",
            ));
        }

        if self.phase == UnlockPhase::Rejected {
            self.transition(UnlockPhase::Unattempted);
        }
        self.attempts += 1;

        let record = &self.record;
        let phase = &mut self.phase;
        let observer = &mut self.observer;
        let result = envelope::decrypt_observed(record, password, &mut |next| {
            *phase = next;
            if let Some(observer) = observer.as_mut() {
                observer(next);
            }
        });

        match result {
            Ok(payload) => {
                tracing::debug!(attempt = self.attempts, "record unlocked");
                let payload: &Payload = self.revealed.insert(payload);
                Ok(payload)
            }
            Err(e) => {
                tracing::warn!(
                    attempt = self.attempts,
                    remaining = self.attempts_remaining(),
                    "unlock attempt rejected"
                );
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: UnlockPhase) {
        self.phase = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::encrypt;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sealed_ada() -> Record {
        let payload = Payload::new("Ada", "Hi", vec![]).unwrap();
        encrypt(&payload, &Password::new("CorrectHorse42!")).unwrap()
    }

    #[test]
    fn test_unlock_first_try() {
        let mut unlocker = Unlocker::new(sealed_ada(), 3);
        assert_eq!(unlocker.phase(), UnlockPhase::Unattempted);

        let payload = unlocker
            .try_password(&Password::new("CorrectHorse42!"))
            .unwrap();
        assert_eq!(payload.name(), "Ada");
        assert_eq!(unlocker.phase(), UnlockPhase::Revealed);
        assert_eq!(unlocker.attempts_used(), 1);
        assert!(!unlocker.is_locked());
    }

    #[test]
    fn test_retry_after_rejection() {
        let transitions = Rc::new(RefCell::new(Vec::new()));
        let sink = transitions.clone();
        let mut unlocker =
            Unlocker::new(sealed_ada(), 3).with_observer(move |p| sink.borrow_mut().push(p));

        let err = unlocker
            .try_password(&Password::new("wrongpass123!"))
            .expect_err("wrong password");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert_eq!(unlocker.phase(), UnlockPhase::Rejected);
        assert_eq!(unlocker.attempts_remaining(), 2);

        unlocker
            .try_password(&Password::new("CorrectHorse42!"))
            .unwrap();
        assert_eq!(unlocker.phase(), UnlockPhase::Revealed);

        assert_eq!(
            *transitions.borrow(),
            vec![
                UnlockPhase::Deriving,
                UnlockPhase::Verifying,
                UnlockPhase::Rejected,
                UnlockPhase::Unattempted,
                UnlockPhase::Deriving,
                UnlockPhase::Verifying,
                UnlockPhase::Revealed,
            ]
        );
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut unlocker = Unlocker::new(sealed_ada(), 2);
        let wrong = Password::new("wrongpass123!");

        assert!(unlocker.try_password(&wrong).is_err());
        assert!(!unlocker.is_locked());
        assert!(unlocker.try_password(&wrong).is_err());
        assert!(unlocker.is_locked());

        // Even the right password is refused now, without running the KDF.
        let err = unlocker
            .try_password(&Password::new("CorrectHorse42!"))
            .expect_err("locked out");
        assert_eq!(err.kind, Some(ErrorKind::AttemptsExhausted));
        assert_eq!(unlocker.attempts_used(), 2);
        assert_eq!(unlocker.phase(), UnlockPhase::Rejected);
    }

    #[test]
    fn test_revealed_is_terminal() {
        let mut unlocker = Unlocker::new(sealed_ada(), 1);
        unlocker
            .try_password(&Password::new("CorrectHorse42!"))
            .unwrap();

        // Budget is spent but the record is open, so it is not locked.
        assert!(!unlocker.is_locked());
        let again = unlocker
            .try_password(&Password::new("anything"))
            .unwrap();
        assert_eq!(again.name(), "Ada");
        assert_eq!(unlocker.attempts_used(), 1);
    }

    #[test]
    fn test_zero_budget_never_derives() {
        let mut unlocker = Unlocker::new(sealed_ada(), 0);
        let err = unlocker
            .try_password(&Password::new("CorrectHorse42!"))
            .expect_err("no attempts allowed");
        assert_eq!(err.kind, Some(ErrorKind::AttemptsExhausted));
        assert_eq!(unlocker.phase(), UnlockPhase::Unattempted);
    }
}
