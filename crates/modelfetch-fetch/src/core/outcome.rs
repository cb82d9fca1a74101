use crate::core::interstitial::is_interstitial_candidate;
use crate::error::FetchError;

/// A failed attempt together with what the obstruction detector may need.
#[derive(Debug)]
pub struct AttemptFailure {
    pub error:          FetchError,
    pub bytes_received: u64,

    /// The whole body, kept only while it is small enough to be an
    /// interstitial page.
    pub body: Option<Vec<u8>>,
}

impl AttemptFailure {
    pub fn new(error: FetchError) -> Self {
        Self {
            error,
            bytes_received: 0,
            body: None,
        }
    }

    pub fn with_body(error: FetchError, bytes_received: u64, body: Vec<u8>) -> Self {
        let body = is_interstitial_candidate(bytes_received).then_some(body);
        Self {
            error,
            bytes_received,
            body,
        }
    }
}

impl From<FetchError> for AttemptFailure {
    fn from(error: FetchError) -> Self { Self::new(error) }
}

#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// Charged against the budget; the loop goes round again.
    Recoverable(AttemptFailure),
    /// Terminal. Either the budget ran out or the error cannot be retried.
    Exhausted(FetchError),
}

/// Attempt accounting for one locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    max:  u32,
    used: u32,
}

impl AttemptBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max:  max_attempts.max(1),
            used: 0,
        }
    }

    /// Charge one attempt and return its 1-based number.
    pub fn start(&mut self) -> u32 {
        self.used = self.used.saturating_add(1);
        self.used
    }

    pub fn used(&self) -> u32 { self.used }

    pub fn remaining(&self) -> u32 { self.max.saturating_sub(self.used) }

    /// Classify the result of the attempt most recently started.
    pub fn settle<T>(&self, result: Result<T, AttemptFailure>) -> AttemptOutcome<T> {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(failure) if !failure.error.is_retryable() => AttemptOutcome::Exhausted(failure.error),
            Err(failure) if self.remaining() == 0 => AttemptOutcome::Exhausted(FetchError::AttemptsExhausted {
                attempts: self.used,
                last:     Box::new(failure.error),
            }),
            Err(failure) => AttemptOutcome::Recoverable(failure),
        }
    }
}
