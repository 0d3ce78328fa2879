#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that recomputes business KPIs every tick.

use churn_defence_core::{CustomerView, EconomySnapshot, Event, MetricsReport};

mod metrics;

pub use metrics::{
    churn_rate, customer_acquisition_cost, lifetime_value, retention, AccountRevenue,
    MetricsCalculator, RevenueSnapshot, HISTORY_CAPACITY,
};

/// Pure analytics system that publishes a metrics report whenever it changes.
#[derive(Debug, Default)]
pub struct Analytics {
    calculator: MetricsCalculator,
    last_report: Option<MetricsReport>,
}

impl Analytics {
    /// Creates a new analytics system with an empty revenue history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last metrics report published by the system, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&MetricsReport> {
        self.last_report.as_ref()
    }

    /// Provides read-only access to the underlying calculator.
    #[must_use]
    pub fn calculator(&self) -> &MetricsCalculator {
        &self.calculator
    }

    /// Consumes world events and recomputes metrics once per observed tick.
    ///
    /// `Event::MetricsUpdated` is emitted only when the report differs from the
    /// previously published one.
    pub fn handle(
        &mut self,
        events: &[Event],
        customers: &CustomerView,
        economy: EconomySnapshot,
        out: &mut Vec<Event>,
    ) {
        let tick_observed = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !tick_observed {
            return;
        }

        let report = self.calculator.calculate(customers, &economy);
        if self.last_report.as_ref() == Some(&report) {
            return;
        }

        self.last_report = Some(report);
        out.push(Event::MetricsUpdated { report });
    }
}
