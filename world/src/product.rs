//! Product upgrade track and the bulk effect of a finished release.

use churn_defence_core::{ProductLaunchOutcome, ProductUpgradeSnapshot};
use rand::Rng;

use crate::customers::Customer;

const POSITIVE_LAUNCH_CHANCE: f64 = 0.8;
const POSITIVE_HEALTH_BOOST: f64 = 20.0;
const POSITIVE_TRUST_BOOST: f64 = 15.0;
const SPEND_BUMP_CHANCE: f64 = 0.3;
const SPEND_BUMP_FACTOR: f64 = 1.1;
const NEGATIVE_HEALTH_HIT: f64 = 15.0;
const NEGATIVE_TRUST_HIT: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ProductUpgrade {
    active: bool,
    elapsed: u32,
    duration: u32,
}

impl ProductUpgrade {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn start(&mut self, duration_ticks: u32) {
        self.active = true;
        self.elapsed = 0;
        self.duration = duration_ticks.max(1);
    }

    /// Adds one tick of progress. Returns `true` on the tick the upgrade completes.
    pub(crate) fn advance(&mut self) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed = self.elapsed.saturating_add(1);
        if self.elapsed < self.duration {
            return false;
        }

        self.active = false;
        self.elapsed = 0;
        true
    }

    pub(crate) fn snapshot(&self) -> ProductUpgradeSnapshot {
        let progress = if self.active {
            f64::from(self.elapsed) / f64::from(self.duration.max(1))
        } else {
            0.0
        };
        ProductUpgradeSnapshot {
            active: self.active,
            progress,
        }
    }
}

/// Rolls the reception of a finished release and applies it to every
/// revenue-bearing customer.
pub(crate) fn launch<R: Rng>(customers: &mut [Customer], rng: &mut R) -> ProductLaunchOutcome {
    let outcome = if rng.gen_bool(POSITIVE_LAUNCH_CHANCE) {
        ProductLaunchOutcome::Positive
    } else {
        ProductLaunchOutcome::Negative
    };

    for customer in customers
        .iter_mut()
        .filter(|customer| customer.status.is_revenue_bearing())
    {
        match outcome {
            ProductLaunchOutcome::Positive => {
                customer.nurture(POSITIVE_HEALTH_BOOST, POSITIVE_TRUST_BOOST);
                if rng.gen_bool(SPEND_BUMP_CHANCE) {
                    customer.spend *= SPEND_BUMP_FACTOR;
                }
            }
            ProductLaunchOutcome::Negative => {
                customer.adjust_health(-NEGATIVE_HEALTH_HIT);
                customer.adjust_trust(-NEGATIVE_TRUST_HIT);
            }
        }
    }

    outcome
}
