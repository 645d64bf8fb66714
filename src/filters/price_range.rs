//! Dual-handle price range.
//!
//! Each bound has two faces: the text field the user types into and the
//! slider handle. Both live on the domain `[0, ceiling]`. A bound is active
//! only while its text is non-blank and numeric; inactive handles rest on
//! their domain edge. After every edit `min_handle <= max_handle` holds: when
//! an edit would cross the bounds, the other bound moves to the edited value.
//!
//! Requests only carry the typed text; the drag and ceiling transitions are
//! the ones the UI's slider mirrors client-side.

use serde::Serialize;
use utoipa::ToSchema;

use crate::format::to_number_or_null;

pub const DEFAULT_PRICE_STEP: f64 = 10_000.0;

/// Observed maximum rounded up to the next multiple of `step`; one step
/// when nothing was observed.
pub fn clean_ceiling(observed_max: Option<f64>, step: f64) -> f64 {
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        DEFAULT_PRICE_STEP
    };
    match observed_max {
        Some(max) if max.is_finite() && max > 0.0 => (max / step).ceil() * step,
        _ => step,
    }
}

fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceRange {
    ceiling: f64,
    min_text: String,
    max_text: String,
    min_handle: f64,
    max_handle: f64,
    /// Min text was non-blank but not a number.
    min_invalid: bool,
    max_invalid: bool,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_STEP)
    }
}

impl PriceRange {
    pub fn new(ceiling: f64) -> Self {
        let ceiling = if ceiling.is_finite() && ceiling > 0.0 {
            ceiling
        } else {
            DEFAULT_PRICE_STEP
        };
        Self {
            ceiling,
            min_text: String::new(),
            max_text: String::new(),
            min_handle: 0.0,
            max_handle: ceiling,
            min_invalid: false,
            max_invalid: false,
        }
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn min_text(&self) -> &str {
        &self.min_text
    }

    pub fn max_text(&self) -> &str {
        &self.max_text
    }

    pub fn handles(&self) -> (f64, f64) {
        (self.min_handle, self.max_handle)
    }

    pub fn min_invalid(&self) -> bool {
        self.min_invalid
    }

    pub fn max_invalid(&self) -> bool {
        self.max_invalid
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(0.0, self.ceiling)
    }

    fn min_active(&self) -> bool {
        !self.min_invalid && !self.min_text.trim().is_empty()
    }

    fn max_active(&self) -> bool {
        !self.max_invalid && !self.max_text.trim().is_empty()
    }

    /// Active bounds as `(gte, lte)` values.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (
            self.min_active().then_some(self.min_handle),
            self.max_active().then_some(self.max_handle),
        )
    }

    pub fn is_default(&self) -> bool {
        self == &PriceRange::new(self.ceiling)
    }

    /// Min moved: pull max up to it if they crossed.
    fn settle_after_min(&mut self) {
        if self.max_handle < self.min_handle {
            self.max_handle = self.min_handle;
            self.max_text = plain_number(self.min_handle);
            self.max_invalid = false;
        }
    }

    /// Max moved: push min down to it if they crossed.
    fn settle_after_max(&mut self) {
        if self.min_handle > self.max_handle {
            self.min_handle = self.max_handle;
            self.min_text = plain_number(self.max_handle);
            self.min_invalid = false;
        }
    }

    pub fn set_min_text(&mut self, text: &str) {
        self.min_text = text.to_string();
        match (text.trim().is_empty(), to_number_or_null(text)) {
            (true, _) => {
                self.min_invalid = false;
                self.min_handle = 0.0;
            }
            (false, None) => {
                self.min_invalid = true;
                self.min_handle = 0.0;
            }
            (false, Some(value)) => {
                self.min_invalid = false;
                self.min_handle = self.clamp(value);
                self.settle_after_min();
            }
        }
    }

    pub fn set_max_text(&mut self, text: &str) {
        self.max_text = text.to_string();
        match (text.trim().is_empty(), to_number_or_null(text)) {
            (true, _) => {
                self.max_invalid = false;
                self.max_handle = self.ceiling;
            }
            (false, None) => {
                self.max_invalid = true;
                self.max_handle = self.ceiling;
            }
            (false, Some(value)) => {
                self.max_invalid = false;
                self.max_handle = self.clamp(value);
                self.settle_after_max();
            }
        }
    }

    pub fn drag_min(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.min_handle = self.clamp(value);
        self.min_text = plain_number(self.min_handle);
        self.min_invalid = false;
        self.settle_after_min();
    }

    pub fn drag_max(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { self.ceiling };
        self.max_handle = self.clamp(value);
        self.max_text = plain_number(self.max_handle);
        self.max_invalid = false;
        self.settle_after_max();
    }

    /// Re-derives the domain from the observed maximum and re-clamps both bounds.
    pub fn set_ceiling(&mut self, observed_max: Option<f64>, step: f64) {
        self.ceiling = clean_ceiling(observed_max, step);

        if self.min_active() {
            let clamped = self.clamp(self.min_handle);
            if clamped != self.min_handle {
                self.min_handle = clamped;
                self.min_text = plain_number(clamped);
            }
        } else {
            self.min_handle = 0.0;
        }

        if self.max_active() {
            let clamped = self.clamp(self.max_handle);
            if clamped != self.max_handle {
                self.max_handle = clamped;
                self.max_text = plain_number(clamped);
            }
        } else {
            self.max_handle = self.ceiling;
        }

        self.settle_after_max();
    }

    pub fn reset(&mut self) {
        *self = PriceRange::new(self.ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> PriceRange {
        PriceRange::new(100_000.0)
    }

    fn ordered(r: &PriceRange) -> bool {
        let (lo, hi) = r.handles();
        lo <= hi
    }

    #[test]
    fn ceiling_rounds_up_to_step() {
        assert_eq!(clean_ceiling(Some(87_500.0), 10_000.0), 90_000.0);
        assert_eq!(clean_ceiling(Some(90_000.0), 10_000.0), 90_000.0);
        assert_eq!(clean_ceiling(Some(1.0), 10_000.0), 10_000.0);
        assert_eq!(clean_ceiling(None, 10_000.0), 10_000.0);
        assert_eq!(clean_ceiling(Some(0.0), 5_000.0), 5_000.0);
        assert_eq!(clean_ceiling(Some(12_000.0), 0.0), 20_000.0);
    }

    #[test]
    fn fresh_range_has_no_bounds() {
        let r = range();
        assert_eq!(r.bounds(), (None, None));
        assert_eq!(r.handles(), (0.0, 100_000.0));
        assert!(r.is_default());
    }

    #[test]
    fn typed_values_are_clamped_into_the_domain() {
        let mut r = range();
        r.set_min_text("-500");
        assert_eq!(r.bounds(), (Some(0.0), None));
        r.set_max_text("250000");
        assert_eq!(r.bounds(), (Some(0.0), Some(100_000.0)));
        assert_eq!(r.max_text(), "250000");
    }

    #[test]
    fn max_below_min_lowers_min() {
        let mut r = range();
        r.set_min_text("60000");
        r.set_max_text("40000");
        assert_eq!(r.bounds(), (Some(40_000.0), Some(40_000.0)));
        assert_eq!(r.min_text(), "40000");
        assert!(ordered(&r));
    }

    #[test]
    fn min_above_max_raises_max() {
        let mut r = range();
        r.set_max_text("30000");
        r.set_min_text("45000");
        assert_eq!(r.bounds(), (Some(45_000.0), Some(45_000.0)));
        assert_eq!(r.max_text(), "45000");
    }

    #[test]
    fn drags_write_back_into_text() {
        let mut r = range();
        r.drag_min(20_000.0);
        assert_eq!(r.min_text(), "20000");
        r.drag_max(10_000.0);
        assert_eq!(r.max_text(), "10000");
        assert_eq!(r.min_text(), "10000");
        assert!(ordered(&r));

        r.drag_max(500_000.0);
        assert_eq!(r.max_text(), "100000");
    }

    #[test]
    fn blank_text_returns_handle_to_edge() {
        let mut r = range();
        r.set_min_text("30000");
        r.set_min_text("  ");
        assert_eq!(r.handles().0, 0.0);
        assert_eq!(r.bounds().0, None);

        r.set_max_text("70000");
        r.set_max_text("");
        assert_eq!(r.handles().1, 100_000.0);
    }

    #[test]
    fn non_numeric_text_is_reported_and_ignored() {
        let mut r = range();
        r.set_min_text("cheap");
        assert!(r.min_invalid());
        assert_eq!(r.bounds(), (None, None));
        r.set_min_text("5000");
        assert!(!r.min_invalid());
        assert_eq!(r.bounds().0, Some(5_000.0));
    }

    #[test]
    fn shrinking_ceiling_reclamps_active_bounds() {
        let mut r = range();
        r.set_min_text("80000");
        r.set_max_text("95000");
        r.set_ceiling(Some(42_000.0), 10_000.0);
        assert_eq!(r.ceiling(), 50_000.0);
        assert_eq!(r.bounds(), (Some(50_000.0), Some(50_000.0)));
        assert_eq!(r.max_text(), "50000");
        assert!(ordered(&r));
    }

    #[test]
    fn growing_ceiling_moves_inactive_max_edge() {
        let mut r = range();
        r.set_ceiling(Some(180_000.0), 10_000.0);
        assert_eq!(r.handles(), (0.0, 180_000.0));
        assert_eq!(r.bounds(), (None, None));
    }

    #[test]
    fn every_edit_keeps_bounds_ordered() {
        let mut r = range();
        let edits: &[&dyn Fn(&mut PriceRange)] = &[
            &|r| r.set_min_text("90000"),
            &|r| r.drag_max(5_000.0),
            &|r| r.set_max_text("abc"),
            &|r| r.drag_min(99_999.0),
            &|r| r.set_max_text("1"),
            &|r| r.set_ceiling(Some(3_000.0), 1_000.0),
            &|r| r.set_min_text("1e9"),
        ];
        for edit in edits {
            edit(&mut r);
            assert!(ordered(&r), "bounds crossed: {r:?}");
        }
    }

    #[test]
    fn reset_restores_defaults_and_keeps_ceiling() {
        let mut r = range();
        r.set_min_text("10000");
        r.set_max_text("x");
        r.reset();
        assert!(r.is_default());
        assert_eq!(r.ceiling(), 100_000.0);
        assert_eq!(r.min_text(), "");
    }
}
