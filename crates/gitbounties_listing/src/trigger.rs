//! Infinite scroll: a sentinel at the end of the list asks for the next page
//! once it comes into view.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{FetchDirection, SortOrder};

/// How eagerly the sentinel counts as visible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverOptions {
    /// Pixels the viewport is grown by on each side, so loading starts early
    pub root_margin: f64,
    /// Fraction of the sentinel that has to be inside the grown viewport
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        ObserverOptions {
            root_margin: 100.0,
            threshold: 0.1,
        }
    }
}

/// Vertical extent of the sentinel and the viewport, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    pub sentinel_top: f64,
    pub sentinel_bottom: f64,
    pub viewport_top: f64,
    pub viewport_bottom: f64,
}

impl Intersection {
    /// Share of the sentinel inside the viewport grown by `root_margin`
    pub fn ratio(&self, options: &ObserverOptions) -> f64 {
        let top = self.viewport_top - options.root_margin;
        let bottom = self.viewport_bottom + options.root_margin;
        let height = self.sentinel_bottom - self.sentinel_top;

        if height <= 0.0 {
            let inside = self.sentinel_top >= top && self.sentinel_top <= bottom;
            return if inside { 1.0 } else { 0.0 };
        }

        let overlap = self.sentinel_bottom.min(bottom) - self.sentinel_top.max(top);
        (overlap.max(0.0) / height).min(1.0)
    }

    pub fn is_intersecting(&self, options: &ObserverOptions) -> bool {
        let ratio = self.ratio(options);
        ratio > 0.0 && ratio >= options.threshold
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    #[default]
    Idle,
    FetchInFlight,
    Exhausted,
}

#[derive(Debug, Clone, Default)]
pub struct ScrollTrigger {
    state: TriggerState,
    options: ObserverOptions,
}

impl ScrollTrigger {
    pub fn new(options: ObserverOptions) -> Self {
        ScrollTrigger {
            state: TriggerState::Idle,
            options,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Sentinel visibility changed. Returns the direction to fetch the next page in
    /// when a fetch should start.
    pub fn on_visible(
        &mut self,
        intersection: &Intersection,
        order: SortOrder,
    ) -> Option<FetchDirection> {
        if self.state != TriggerState::Idle || !intersection.is_intersecting(&self.options) {
            return None;
        }

        debug!("Sentinel visible, fetching next page");
        self.state = TriggerState::FetchInFlight;
        Some(order.direction())
    }

    /// A page came back, whether the sentinel asked for it or not
    pub fn on_page_arrived(&mut self, more_remaining: bool) {
        self.state = match (self.state, more_remaining) {
            (_, false) => TriggerState::Exhausted,
            (TriggerState::FetchInFlight, true) => TriggerState::Idle,
            (state, true) => state,
        };
    }

    pub fn on_fetch_failed(&mut self) {
        if self.state == TriggerState::FetchInFlight {
            self.state = TriggerState::Idle;
        }
    }

    /// A refetch started a new query
    pub fn reset(&mut self) {
        self.state = TriggerState::Idle;
    }
}
