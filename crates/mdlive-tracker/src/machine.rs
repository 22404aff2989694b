//! The active-heading state machine.
//!
//! Two independent inputs drive it:
//! - navigation intent: outline clicks and manual scroll gestures,
//! - observation: intersection changes and scroll positions.
//!
//! A click locks the active heading to the clicked one. Observations cannot
//! move it until the reader scrolls by hand; no timer ever releases the lock.

use std::collections::{HashMap, HashSet};

use crate::zone::{HeadingPosition, IntersectionEntry, ObservationZone};

/// Manual scroll gestures that release a navigation lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollGesture {
    Wheel,
    Touch,
    Keyboard,
}

/// Input from the reader's explicit actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationInput {
    /// An outline entry was clicked.
    Click { id: String },
    ManualScroll(ScrollGesture),
}

/// Input from watching the document.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationInput {
    /// Headings entering or leaving the observation zone.
    Intersections(Vec<IntersectionEntry>),
    /// Current heading positions after a scroll event.
    Scroll(Vec<HeadingPosition>),
}

/// Observable tracker state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveHeadingState {
    pub active_id: Option<String>,
    pub user_locked: bool,
}

/// Effects of one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// New active heading, when it changed.
    pub activated: Option<String>,
    /// Heading the view should scroll to programmatically.
    pub scroll_to: Option<String>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn activate(id: String) -> Self {
        Self {
            activated: Some(id),
            scroll_to: None,
        }
    }
}

/// Tracks which heading the reader is currently at.
#[derive(Debug, Clone)]
pub struct ActiveHeadingTracker {
    zone: ObservationZone,
    headings: Vec<String>,
    order: HashMap<String, usize>,
    visible: HashSet<String>,
    state: ActiveHeadingState,
}

impl ActiveHeadingTracker {
    #[must_use]
    pub fn new(zone: ObservationZone) -> Self {
        Self {
            zone,
            headings: Vec::new(),
            order: HashMap::new(),
            visible: HashSet::new(),
            state: ActiveHeadingState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ActiveHeadingState {
        &self.state
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.state.active_id.as_deref()
    }

    #[must_use]
    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    /// Replace the tracked headings (document order).
    ///
    /// Visibility is reset. The active heading is kept when it still exists,
    /// otherwise the first heading becomes active. An empty list is valid and
    /// leaves no heading active.
    pub fn set_headings(&mut self, headings: Vec<String>) -> Transition {
        self.order = headings
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        self.headings = headings;
        self.visible.clear();

        let keep = self
            .state
            .active_id
            .as_ref()
            .is_some_and(|id| self.order.contains_key(id));
        if keep {
            return Transition::none();
        }

        self.state.user_locked = false;
        let first = self.headings.first().cloned();
        self.set_active(first)
    }

    /// Apply a navigation input.
    pub fn navigate(&mut self, input: NavigationInput) -> Transition {
        match input {
            NavigationInput::Click { id } => {
                if !self.order.contains_key(&id) {
                    tracing::debug!(id = %id, "Ignoring click on unknown heading");
                    return Transition::none();
                }
                self.state.user_locked = true;
                let mut transition = self.set_active(Some(id.clone()));
                transition.scroll_to = Some(id);
                transition
            }
            NavigationInput::ManualScroll(gesture) => {
                if self.state.user_locked {
                    tracing::trace!(?gesture, "Navigation lock released");
                }
                self.state.user_locked = false;
                Transition::none()
            }
        }
    }

    /// Apply an observation input.
    pub fn observe(&mut self, input: ObservationInput) -> Transition {
        match input {
            ObservationInput::Intersections(entries) => {
                for entry in entries {
                    if !self.order.contains_key(&entry.id) {
                        continue;
                    }
                    if entry.is_intersecting {
                        self.visible.insert(entry.id);
                    } else {
                        self.visible.remove(&entry.id);
                    }
                }
                if self.state.user_locked {
                    return Transition::none();
                }
                let topmost = self
                    .visible
                    .iter()
                    .min_by_key(|id| self.order.get(*id).copied().unwrap_or(usize::MAX))
                    .cloned();
                match topmost {
                    Some(id) => self.set_active(Some(id)),
                    None => Transition::none(),
                }
            }
            ObservationInput::Scroll(positions) => {
                if self.state.user_locked || !self.visible.is_empty() {
                    return Transition::none();
                }
                let fallback = self.fallback(&positions);
                self.set_active(fallback)
            }
        }
    }

    /// Last heading that has scrolled past the header band, else the first.
    fn fallback(&self, positions: &[HeadingPosition]) -> Option<String> {
        let tops: HashMap<&str, f64> = positions.iter().map(|p| (p.id.as_str(), p.top)).collect();
        self.headings
            .iter()
            .rev()
            .find(|id| tops.get(id.as_str()).is_some_and(|&top| self.zone.has_passed(top)))
            .or_else(|| self.headings.first())
            .cloned()
    }

    fn set_active(&mut self, id: Option<String>) -> Transition {
        if self.state.active_id == id {
            return Transition::none();
        }
        self.state.active_id.clone_from(&id);
        match id {
            Some(id) => Transition::activate(id),
            None => Transition::none(),
        }
    }
}

impl Default for ActiveHeadingTracker {
    fn default() -> Self {
        Self::new(ObservationZone::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker(ids: &[&str]) -> ActiveHeadingTracker {
        let mut tracker = ActiveHeadingTracker::default();
        tracker.set_headings(ids.iter().map(|s| (*s).to_owned()).collect());
        tracker
    }

    fn enter(ids: &[&str]) -> ObservationInput {
        ObservationInput::Intersections(
            ids.iter()
                .map(|id| IntersectionEntry {
                    id: (*id).to_owned(),
                    is_intersecting: true,
                })
                .collect(),
        )
    }

    fn leave(ids: &[&str]) -> ObservationInput {
        ObservationInput::Intersections(
            ids.iter()
                .map(|id| IntersectionEntry {
                    id: (*id).to_owned(),
                    is_intersecting: false,
                })
                .collect(),
        )
    }

    fn click(id: &str) -> NavigationInput {
        NavigationInput::Click { id: id.to_owned() }
    }

    #[test]
    fn test_first_heading_active_initially() {
        let tracker = tracker(&["a", "b"]);
        assert_eq!(tracker.active_id(), Some("a"));
    }

    #[test]
    fn test_no_headings_is_not_an_error() {
        let mut tracker = tracker(&[]);
        assert_eq!(tracker.active_id(), None);
        assert_eq!(tracker.observe(enter(&["x"])), Transition::none());
        assert_eq!(tracker.observe(ObservationInput::Scroll(vec![])), Transition::none());
        assert_eq!(tracker.navigate(click("x")), Transition::none());
    }

    #[test]
    fn test_topmost_visible_wins() {
        let mut tracker = tracker(&["a", "b", "c"]);
        let t = tracker.observe(enter(&["c", "b"]));
        assert_eq!(t.activated.as_deref(), Some("b"));
        let t = tracker.observe(leave(&["b"]));
        assert_eq!(t.activated.as_deref(), Some("c"));
    }

    #[test]
    fn test_click_locks_and_scrolls() {
        let mut tracker = tracker(&["a", "b", "c"]);
        let t = tracker.navigate(click("c"));
        assert_eq!(
            t,
            Transition {
                activated: Some("c".to_owned()),
                scroll_to: Some("c".to_owned()),
            }
        );
        assert!(tracker.state().user_locked);

        // Observations while the programmatic scroll passes other headings
        // must not move the active heading.
        assert_eq!(tracker.observe(enter(&["a", "b"])), Transition::none());
        assert_eq!(tracker.active_id(), Some("c"));
    }

    #[test]
    fn test_click_same_heading_still_scrolls() {
        let mut tracker = tracker(&["a", "b"]);
        let t = tracker.navigate(click("a"));
        assert_eq!(t.activated, None);
        assert_eq!(t.scroll_to.as_deref(), Some("a"));
    }

    #[test]
    fn test_manual_scroll_releases_lock() {
        let mut tracker = tracker(&["a", "b", "c"]);
        tracker.navigate(click("c"));
        tracker.observe(enter(&["a"]));
        assert_eq!(tracker.active_id(), Some("c"));

        for gesture in [ScrollGesture::Wheel, ScrollGesture::Touch, ScrollGesture::Keyboard] {
            tracker.navigate(click("c"));
            tracker.navigate(NavigationInput::ManualScroll(gesture));
            assert!(!tracker.state().user_locked);
        }

        let t = tracker.observe(enter(&["b"]));
        assert_eq!(t.activated.as_deref(), Some("a"));
    }

    #[test]
    fn test_scroll_fallback_in_gap() {
        let mut tracker = tracker(&["a", "b", "c"]);
        let t = tracker.observe(ObservationInput::Scroll(vec![
            HeadingPosition::new("a", -900.0),
            HeadingPosition::new("b", -20.0),
            HeadingPosition::new("c", 900.0),
        ]));
        assert_eq!(t.activated.as_deref(), Some("b"));
    }

    #[test]
    fn test_scroll_fallback_defaults_to_first() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.navigate(click("b"));
        tracker.navigate(NavigationInput::ManualScroll(ScrollGesture::Wheel));
        let t = tracker.observe(ObservationInput::Scroll(vec![
            HeadingPosition::new("a", 400.0),
            HeadingPosition::new("b", 900.0),
        ]));
        assert_eq!(t.activated.as_deref(), Some("a"));
    }

    #[test]
    fn test_scroll_ignored_while_headings_visible() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.observe(enter(&["b"]));
        let t = tracker.observe(ObservationInput::Scroll(vec![
            HeadingPosition::new("a", -500.0),
            HeadingPosition::new("b", 100.0),
        ]));
        assert_eq!(t, Transition::none());
        assert_eq!(tracker.active_id(), Some("b"));
    }

    #[test]
    fn test_scroll_ignored_while_locked() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.navigate(click("a"));
        let t = tracker.observe(ObservationInput::Scroll(vec![HeadingPosition::new("b", -10.0)]));
        assert_eq!(t, Transition::none());
    }

    #[test]
    fn test_set_headings_keeps_existing_active() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.navigate(click("b"));
        let t = tracker.set_headings(vec!["x".to_owned(), "b".to_owned()]);
        assert_eq!(t, Transition::none());
        assert_eq!(tracker.active_id(), Some("b"));
        assert!(tracker.state().user_locked);
    }

    #[test]
    fn test_set_headings_resets_missing_active() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.navigate(click("b"));
        let t = tracker.set_headings(vec!["x".to_owned()]);
        assert_eq!(t.activated.as_deref(), Some("x"));
        assert!(!tracker.state().user_locked);
    }

    #[test]
    fn test_unknown_intersections_ignored() {
        let mut tracker = tracker(&["a"]);
        assert_eq!(tracker.observe(enter(&["ghost"])), Transition::none());
    }
}
