//! Revenue history and the business KPIs derived from it.

use std::collections::VecDeque;

use churn_defence_core::{CustomerId, CustomerView, EconomySnapshot, MetricsReport};

/// Maximum number of revenue snapshots retained for retention metrics.
pub const HISTORY_CAPACITY: usize = 12;

const MONTHS_PER_YEAR: f64 = 12.0;
const DEFAULT_LIFESPAN_YEARS: f64 = 5.0;

/// Spend of a single revenue-bearing account at capture time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccountRevenue {
    /// Account identifier.
    pub id: CustomerId,
    /// Contract value when the snapshot was taken.
    pub spend: f64,
}

/// Revenue-bearing accounts captured at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevenueSnapshot {
    arr: f64,
    accounts: Vec<AccountRevenue>,
}

impl RevenueSnapshot {
    /// Creates a snapshot from explicit accounts, sorting them by identifier.
    #[must_use]
    pub fn from_accounts(mut accounts: Vec<AccountRevenue>) -> Self {
        accounts.sort_by_key(|account| account.id);
        let arr = accounts.iter().map(|account| account.spend).sum();
        Self { arr, accounts }
    }

    /// Captures every active and gold account of the population.
    #[must_use]
    pub fn capture(customers: &CustomerView) -> Self {
        Self::from_accounts(
            customers
                .iter()
                .filter(|customer| customer.status.is_revenue_bearing())
                .map(|customer| AccountRevenue {
                    id: customer.id,
                    spend: customer.spend,
                })
                .collect(),
        )
    }

    /// Annual recurring revenue represented by the snapshot.
    #[must_use]
    pub fn arr(&self) -> f64 {
        self.arr
    }

    /// Accounts in identifier order.
    #[must_use]
    pub fn accounts(&self) -> &[AccountRevenue] {
        &self.accounts
    }

    fn spend_of(&self, id: CustomerId) -> Option<f64> {
        self.accounts
            .binary_search_by_key(&id, |account| account.id)
            .ok()
            .map(|index| self.accounts[index].spend)
    }
}

/// Gross and net revenue retention between two snapshots.
///
/// Returns `(grr, nrr)`; both are zero when the earlier snapshot carries no revenue.
#[must_use]
pub fn retention(previous: &RevenueSnapshot, current: &RevenueSnapshot) -> (f64, f64) {
    let total_previous: f64 = previous.accounts.iter().map(|account| account.spend).sum();
    if total_previous <= 0.0 {
        return (0.0, 0.0);
    }

    let (retained_previous, retained_current) = previous
        .accounts
        .iter()
        .filter_map(|account| {
            current
                .spend_of(account.id)
                .map(|spend| (account.spend, spend))
        })
        .fold((0.0, 0.0), |(prev, curr), (before, after)| {
            (prev + before, curr + after)
        });

    let grr = (retained_previous / total_previous).min(1.0);
    let nrr = retained_current / total_previous;
    (grr, nrr)
}

/// Share of accounts lost between two snapshots, ignoring accounts gained.
#[must_use]
pub fn churn_rate(previous: &RevenueSnapshot, current: &RevenueSnapshot) -> f64 {
    let previous_count = previous.accounts.len();
    if previous_count == 0 {
        return 0.0;
    }
    let lost = previous_count.saturating_sub(current.accounts.len());
    lost as f64 / previous_count as f64
}

/// Tower investment per converted account; zero before the first conversion.
#[must_use]
pub fn customer_acquisition_cost(economy: &EconomySnapshot) -> f64 {
    if economy.customers_acquired == 0 {
        return 0.0;
    }
    economy.tower_investment / economy.customers_acquired as f64
}

/// Average account revenue multiplied by the expected lifespan in years.
#[must_use]
pub fn lifetime_value(arr: f64, customer_count: usize, churn_rate: f64) -> f64 {
    let lifespan = if churn_rate > 0.0 {
        1.0 / churn_rate
    } else {
        DEFAULT_LIFESPAN_YEARS
    };
    arr / customer_count.max(1) as f64 * lifespan
}

/// Derives [`MetricsReport`] values from the customer population while
/// keeping a bounded revenue history.
#[derive(Debug, Default)]
pub struct MetricsCalculator {
    history: VecDeque<RevenueSnapshot>,
}

impl MetricsCalculator {
    /// Creates a calculator with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revenue snapshots from oldest to newest.
    pub fn history(&self) -> impl Iterator<Item = &RevenueSnapshot> {
        self.history.iter()
    }

    /// Stores the snapshot unless its revenue equals the latest stored one.
    ///
    /// Returns `true` when the snapshot was appended.
    pub fn record(&mut self, snapshot: RevenueSnapshot) -> bool {
        if self
            .history
            .back()
            .is_some_and(|latest| latest.arr == snapshot.arr)
        {
            return false;
        }

        if self.history.len() == HISTORY_CAPACITY {
            let _ = self.history.pop_front();
        }
        self.history.push_back(snapshot);
        true
    }

    /// Captures the population into the history and recomputes every KPI.
    pub fn calculate(
        &mut self,
        customers: &CustomerView,
        economy: &EconomySnapshot,
    ) -> MetricsReport {
        let snapshot = RevenueSnapshot::capture(customers);
        let arr = snapshot.arr;
        let customer_count = snapshot.accounts.len();
        let _ = self.record(snapshot);

        let (grr, nrr, churn_rate) = match self.latest_pair() {
            Some((previous, current)) => {
                let (grr, nrr) = retention(previous, current);
                (grr, nrr, churn_rate(previous, current))
            }
            None => (0.0, 0.0, 0.0),
        };

        MetricsReport {
            arr,
            mrr: arr / MONTHS_PER_YEAR,
            nrr,
            grr,
            cac: customer_acquisition_cost(economy),
            ltv: lifetime_value(arr, customer_count, churn_rate),
            customer_count,
            churn_rate,
        }
    }

    fn latest_pair(&self) -> Option<(&RevenueSnapshot, &RevenueSnapshot)> {
        let len = self.history.len();
        if len < 2 {
            return None;
        }
        Some((self.history.get(len - 2)?, self.history.get(len - 1)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn accounts(entries: &[(u32, f64)]) -> RevenueSnapshot {
        RevenueSnapshot::from_accounts(
            entries
                .iter()
                .map(|&(id, spend)| AccountRevenue {
                    id: CustomerId::new(id),
                    spend,
                })
                .collect(),
        )
    }

    #[test]
    fn unchanged_population_retains_everything() {
        let entries: Vec<(u32, f64)> = (0..10).map(|id| (id, 10_000.0)).collect();
        let snapshot = accounts(&entries);
        let (grr, nrr) = retention(&snapshot, &snapshot);
        assert!((grr - 1.0).abs() < 1e-12);
        assert!((nrr - 1.0).abs() < 1e-12);
        assert_eq!(churn_rate(&snapshot, &snapshot), 0.0);
    }

    #[test]
    fn lost_accounts_reduce_both_retention_figures() {
        let mut previous: Vec<(u32, f64)> = (0..8).map(|id| (id, 11_250.0)).collect();
        previous.extend([(8, 5_000.0), (9, 5_000.0)]);
        let current: Vec<(u32, f64)> = (0..8).map(|id| (id, 11_250.0)).collect();

        let (grr, nrr) = retention(&accounts(&previous), &accounts(&current));
        assert!((grr - 0.9).abs() < 1e-12);
        assert!((nrr - 0.9).abs() < 1e-12);
        assert!((churn_rate(&accounts(&previous), &accounts(&current)) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn expansion_lifts_nrr_but_caps_grr() {
        let previous = accounts(&[(1, 10_000.0), (2, 10_000.0)]);
        let current = accounts(&[(1, 15_000.0), (2, 15_000.0)]);
        let (grr, nrr) = retention(&previous, &current);
        assert_eq!(grr, 1.0);
        assert!((nrr - 1.5).abs() < 1e-12);
    }

    #[test]
    fn empty_previous_snapshot_yields_zero_retention() {
        let (grr, nrr) = retention(&RevenueSnapshot::default(), &accounts(&[(1, 5.0)]));
        assert_eq!((grr, nrr), (0.0, 0.0));
    }

    #[test]
    fn history_skips_duplicate_revenue_and_is_bounded() {
        let mut calculator = MetricsCalculator::new();
        assert!(calculator.record(accounts(&[(1, 100.0)])));
        assert!(!calculator.record(accounts(&[(2, 100.0)])));

        for step in 0..20u32 {
            let _ = calculator.record(accounts(&[(1, 200.0 + f64::from(step))]));
        }
        let history: Vec<f64> = calculator.history().map(RevenueSnapshot::arr).collect();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.first().copied(), Some(208.0));
        assert_eq!(history.last().copied(), Some(219.0));
    }

    #[test]
    fn cac_divides_investment_by_conversions() {
        let economy = EconomySnapshot {
            capital: 0.0,
            tower_investment: 150_000.0,
            customers_acquired: 3,
        };
        assert_eq!(customer_acquisition_cost(&economy), 50_000.0);
        assert_eq!(customer_acquisition_cost(&EconomySnapshot::default()), 0.0);
    }

    #[test]
    fn ltv_uses_default_lifespan_without_churn() {
        assert_eq!(lifetime_value(100_000.0, 4, 0.0), 125_000.0);
        assert_eq!(lifetime_value(100_000.0, 4, 0.5), 50_000.0);
        assert_eq!(lifetime_value(0.0, 0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn grr_never_exceeds_one(
            previous in prop::collection::vec(1.0f64..1e6, 1..20),
            growth in prop::collection::vec(0.0f64..3.0, 1..20),
        ) {
            let before: Vec<(u32, f64)> = previous
                .iter()
                .enumerate()
                .map(|(id, &spend)| (id as u32, spend))
                .collect();
            let after: Vec<(u32, f64)> = before
                .iter()
                .zip(growth.iter())
                .map(|(&(id, spend), &factor)| (id, spend * factor))
                .collect();
            let (grr, nrr) = retention(&accounts(&before), &accounts(&after));
            prop_assert!((0.0..=1.0).contains(&grr));
            prop_assert!(nrr >= 0.0);
        }
    }
}
