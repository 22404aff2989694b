//! Active-heading tracking for scroll-linked outlines.
//!
//! The tracker decides which heading the reader is "at" so an outline can
//! highlight it. It is a pure state machine ([`ActiveHeadingTracker`]) fed by
//! two channels:
//! - navigation intent ([`NavigationInput`]): outline clicks lock the active
//!   heading, manual scroll gestures release the lock;
//! - observation ([`ObservationInput`]): intersection changes within the
//!   [`ObservationZone`] and raw scroll positions for gaps between headings.
//!
//! [`TrackerSession`] runs the machine as a task for one mounted view, after
//! [`discover_headings`] has waited (bounded) for the view to be populated.

mod discovery;
mod machine;
mod session;
mod zone;

pub use discovery::{DEFAULT_DISCOVERY_TIMEOUT, discover_headings};
pub use machine::{
    ActiveHeadingState, ActiveHeadingTracker, NavigationInput, ObservationInput, ScrollGesture,
    Transition,
};
pub use session::{ScrollHandler, SessionConfig, TrackerInput, TrackerSession};
pub use zone::{
    DEFAULT_BOTTOM_EXCLUSION, DEFAULT_HEADER_OFFSET, HeadingPosition, IntersectionEntry,
    ObservationZone, SCROLL_TOLERANCE,
};
