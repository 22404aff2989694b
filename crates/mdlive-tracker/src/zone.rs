//! Viewport geometry of the observation zone.

/// Default height of the fixed header band, in CSS pixels.
pub const DEFAULT_HEADER_OFFSET: f64 = 64.0;

/// Share of the viewport, measured from the bottom, that never counts as
/// "reading position".
pub const DEFAULT_BOTTOM_EXCLUSION: f64 = 0.7;

/// Slack when comparing a heading top against the header band, so a heading
/// scrolled exactly to the band edge counts as passed.
pub const SCROLL_TOLERANCE: f64 = 1.0;

/// A heading's position relative to the top of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingPosition {
    pub id: String,
    pub top: f64,
}

impl HeadingPosition {
    pub fn new(id: impl Into<String>, top: f64) -> Self {
        Self {
            id: id.into(),
            top,
        }
    }
}

/// Change in a heading's visibility inside the observation zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
}

/// The band of the viewport where a heading counts as being read: below the
/// header and above the excluded bottom part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationZone {
    pub header_offset: f64,
    pub bottom_exclusion: f64,
}

impl Default for ObservationZone {
    fn default() -> Self {
        Self {
            header_offset: DEFAULT_HEADER_OFFSET,
            bottom_exclusion: DEFAULT_BOTTOM_EXCLUSION,
        }
    }
}

impl ObservationZone {
    #[must_use]
    pub fn with_header_offset(header_offset: f64) -> Self {
        Self {
            header_offset,
            ..Self::default()
        }
    }

    /// Zone bounds `(top, bottom)` for a viewport of the given height.
    #[must_use]
    pub fn bounds(&self, viewport_height: f64) -> (f64, f64) {
        let bottom = viewport_height - viewport_height * self.bottom_exclusion;
        (self.header_offset, bottom.max(self.header_offset))
    }

    #[must_use]
    pub fn contains(&self, top: f64, viewport_height: f64) -> bool {
        let (zone_top, zone_bottom) = self.bounds(viewport_height);
        top >= zone_top && top < zone_bottom
    }

    /// Whether a heading has scrolled past the header band.
    #[must_use]
    pub fn has_passed(&self, top: f64) -> bool {
        top <= self.header_offset + SCROLL_TOLERANCE
    }

    /// Intersection entries for every heading, computed from geometry.
    ///
    /// Hosts without a native intersection observer can feed these straight
    /// into the tracker.
    #[must_use]
    pub fn intersections(
        &self,
        positions: &[HeadingPosition],
        viewport_height: f64,
    ) -> Vec<IntersectionEntry> {
        positions
            .iter()
            .map(|p| IntersectionEntry {
                id: p.id.clone(),
                is_intersecting: self.contains(p.top, viewport_height),
            })
            .collect()
    }

    /// The zone as an intersection-observer `rootMargin` value.
    #[must_use]
    pub fn root_margin(&self) -> String {
        format!(
            "-{}px 0px -{}% 0px",
            self.header_offset,
            (self.bottom_exclusion * 100.0).round()
        )
    }
}
