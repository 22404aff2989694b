//! Change detection for live documents.
//!
//! [`ResourceFingerprinter`] hashes local files or HTTP resources and
//! [`ChangeDetector`] polls that fingerprint, signalling once when it changes.
//! Any fetch failure ends detection; callers restart a detector after
//! handling a change.

mod detector;
mod fingerprint;

pub use detector::{
    ChangeDetector, CheckOutcome, DEFAULT_INTERVAL, DetectorError, DetectorState, MIN_INTERVAL,
};
pub use fingerprint::{
    DEFAULT_FETCH_TIMEOUT, FetchError, Fingerprinter, ResourceFingerprinter, Target, TargetPolicy,
    digest,
};
