//! Pure decisions: backoff, attempt accounting, validation, and
//! interstitial-page detection. Nothing here touches the network or disk.

mod interstitial;
mod outcome;
mod retry;
mod validation;

pub use interstitial::{
    ConfirmLinkDetector, INTERSTITIAL_LIMIT, NoDetector, ObstructionDetector, is_interstitial_candidate,
    unescape_html,
};
pub use outcome::{AttemptBudget, AttemptFailure, AttemptOutcome};
pub use retry::{MAX_RETRY_DELAY, backoff, retry_delay};
pub use validation::validate;
