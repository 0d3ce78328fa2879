#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that refreshes tower target sets from world snapshots.

use std::cmp::Ordering;

use churn_defence_core::{
    Command, CustomerId, CustomerSnapshot, CustomerView, TowerKind, TowerSnapshot, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    retained: Vec<CustomerId>,
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes refreshed target sets for every tower.
    ///
    /// An `AssignTargets` command is emitted only for towers whose target set
    /// changed.
    pub fn handle(&mut self, towers: &TowerView, customers: &CustomerView, out: &mut Vec<Command>) {
        for tower in towers.iter() {
            let managed = self.retain_valid_targets(tower, customers);

            if self.retained.len() < tower.stats.max_targets {
                self.prepare_candidates(tower, customers);
                self.fill_from_candidates(tower, managed);
            }

            if self.retained != tower.targets {
                out.push(Command::AssignTargets {
                    tower: tower.id,
                    customers: self.retained.clone(),
                });
            }
        }
    }

    /// Keeps current targets that are still present, in range, and within the
    /// value cap after any spend growth. Returns the value they represent.
    fn retain_valid_targets(&mut self, tower: &TowerSnapshot, customers: &CustomerView) -> f64 {
        self.retained.clear();
        let mut managed = 0.0;

        for &id in &tower.targets {
            if self.retained.len() >= tower.stats.max_targets {
                break;
            }
            let Some(customer) = customers.get(id) else {
                continue;
            };
            if !in_range(tower, customer) {
                continue;
            }
            if managed + customer.spend > tower.stats.max_value_managed {
                continue;
            }
            managed += customer.spend;
            self.retained.push(id);
        }

        managed
    }

    fn prepare_candidates(&mut self, tower: &TowerSnapshot, customers: &CustomerView) {
        self.candidates.clear();
        for customer in customers.iter() {
            if self.retained.contains(&customer.id)
                || !in_range(tower, customer)
                || !tower.strategy.admits(customer)
            {
                continue;
            }
            self.candidates.push(Candidate {
                id: customer.id,
                spend: customer.spend,
                health: customer.health,
            });
        }

        let kind = tower.kind;
        self.candidates.sort_by(|a, b| a.priority(b, kind));
    }

    fn fill_from_candidates(&mut self, tower: &TowerSnapshot, mut managed: f64) {
        for candidate in &self.candidates {
            if self.retained.len() >= tower.stats.max_targets {
                break;
            }
            if managed + candidate.spend > tower.stats.max_value_managed {
                continue;
            }
            managed += candidate.spend;
            self.retained.push(candidate.id);
        }
    }
}

fn in_range(tower: &TowerSnapshot, customer: &CustomerSnapshot) -> bool {
    tower.position.distance_to(customer.position) <= tower.stats.range
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: CustomerId,
    spend: f64,
    health: f64,
}

impl Candidate {
    /// Sales towers chase the largest accounts; customer success towers
    /// attend to the least healthy first.
    fn priority(&self, other: &Self, kind: TowerKind) -> Ordering {
        let primary = match kind {
            TowerKind::Sales => other.spend.total_cmp(&self.spend),
            TowerKind::Csm => self.health.total_cmp(&other.health),
        };
        primary.then_with(|| self.id.cmp(&other.id))
    }
}
