//! A reader scrolling through a document, driven from viewport geometry.

use mdlive_tracker::{
    ActiveHeadingTracker, HeadingPosition, NavigationInput, ObservationInput, ObservationZone,
    ScrollGesture,
};

const VIEWPORT: f64 = 1000.0;

/// Document-space heading offsets.
const LAYOUT: &[(&str, f64)] = &[
    ("intro", 0.0),
    ("install", 400.0),
    ("usage", 2400.0),
    ("faq", 2600.0),
];

fn positions(scroll_y: f64) -> Vec<HeadingPosition> {
    LAYOUT
        .iter()
        .map(|(id, y)| HeadingPosition::new(*id, y - scroll_y))
        .collect()
}

/// Feed both observation inputs for a scroll position, like a browser would.
fn scroll_to(tracker: &mut ActiveHeadingTracker, zone: &ObservationZone, scroll_y: f64) {
    let current = positions(scroll_y);
    tracker.observe(ObservationInput::Intersections(
        zone.intersections(&current, VIEWPORT),
    ));
    tracker.observe(ObservationInput::Scroll(current));
}

#[test]
fn follows_the_reader() {
    let zone = ObservationZone::default();
    let mut tracker = ActiveHeadingTracker::new(zone);
    tracker.set_headings(LAYOUT.iter().map(|(id, _)| (*id).to_owned()).collect());

    scroll_to(&mut tracker, &zone, 0.0);
    assert_eq!(tracker.active_id(), Some("intro"));

    // "install" enters the zone.
    scroll_to(&mut tracker, &zone, 250.0);
    assert_eq!(tracker.active_id(), Some("install"));

    // Long section: no heading in the zone, the fallback keeps "install".
    scroll_to(&mut tracker, &zone, 1200.0);
    assert_eq!(tracker.active_id(), Some("install"));

    // Both later headings visible: the top-most one wins.
    scroll_to(&mut tracker, &zone, 2300.0);
    assert_eq!(tracker.active_id(), Some("usage"));
}

#[test]
fn click_holds_until_manual_scroll() {
    let zone = ObservationZone::default();
    let mut tracker = ActiveHeadingTracker::new(zone);
    tracker.set_headings(LAYOUT.iter().map(|(id, _)| (*id).to_owned()).collect());

    let transition = tracker.navigate(NavigationInput::Click {
        id: "faq".to_owned(),
    });
    assert_eq!(transition.scroll_to.as_deref(), Some("faq"));

    // The programmatic scroll passes "install" and "usage" on the way.
    for y in [300.0, 1500.0, 2300.0, 2550.0] {
        scroll_to(&mut tracker, &zone, y);
        assert_eq!(tracker.active_id(), Some("faq"), "at {y}");
    }

    tracker.navigate(NavigationInput::ManualScroll(ScrollGesture::Touch));
    scroll_to(&mut tracker, &zone, 250.0);
    assert_eq!(tracker.active_id(), Some("install"));
}
