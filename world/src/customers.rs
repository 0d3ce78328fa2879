//! Customer lifecycle state machine and movement policy.

use churn_defence_core::{
    CustomerId, CustomerKind, CustomerProfile, CustomerSnapshot, CustomerStatus, MovementPhase,
    Point, EDGE_MARGIN, MAX_VITALITY,
};
use rand::Rng;

use crate::path::TrackPath;

const WANDER_STEP: f64 = 1.0;
const ARRIVAL_EPSILON: f64 = 0.5;
const LAP_DECAY: f64 = 5.0;
const ORGANIC_GROWTH_CHANCE: f64 = 0.2;
const ORGANIC_GROWTH_CEILING: f64 = 1.1;

/// Movement sub-machine keyed on engagement and track membership.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Movement {
    Wandering,
    Approaching { target: Point, path_position: f64 },
    OnTrack,
}

/// Result of moving a customer for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    Moved,
    EnteredTrack { path_position: f64 },
    CompletedLap { lap_count: u32, renewal: Renewal },
}

/// Outcome of the renewal decision taken at lap completion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Renewal {
    NotDue,
    Renewed { spend: f64 },
    Churned,
}

#[derive(Clone, Debug)]
pub(crate) struct Customer {
    pub(crate) id: CustomerId,
    pub(crate) kind: CustomerKind,
    pub(crate) status: CustomerStatus,
    pub(crate) health: f64,
    pub(crate) trust: f64,
    pub(crate) spend: f64,
    pub(crate) position: Point,
    pub(crate) path_position: f64,
    pub(crate) lap_count: u32,
    pub(crate) engaged: bool,
    pub(crate) movement_speed: f64,
    pub(crate) approach_speed: f64,
    pub(crate) movement: Movement,
}

impl Customer {
    pub(crate) fn from_profile(id: CustomerId, profile: &CustomerProfile) -> Self {
        Self {
            id,
            kind: profile.kind,
            status: CustomerStatus::Prospect,
            health: MAX_VITALITY,
            trust: MAX_VITALITY,
            spend: profile.spend,
            position: profile.position,
            path_position: 0.0,
            lap_count: 0,
            engaged: false,
            movement_speed: profile.movement_speed,
            approach_speed: profile.approach_speed,
            movement: Movement::Wandering,
        }
    }

    pub(crate) fn phase(&self) -> MovementPhase {
        match self.movement {
            Movement::Wandering => MovementPhase::Wandering,
            Movement::Approaching { .. } => MovementPhase::Approaching,
            Movement::OnTrack => MovementPhase::OnTrack,
        }
    }

    pub(crate) fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            id: self.id,
            kind: self.kind,
            status: self.status,
            position: self.position,
            health: self.health,
            trust: self.trust,
            spend: self.spend,
            path_position: self.path_position,
            lap_count: self.lap_count,
            phase: self.phase(),
            engaged: self.engaged,
        }
    }

    pub(crate) fn adjust_health(&mut self, delta: f64) {
        self.health = clamp_vitality(self.health + delta);
    }

    pub(crate) fn adjust_trust(&mut self, delta: f64) {
        self.trust = clamp_vitality(self.trust + delta);
    }

    pub(crate) fn nurture(&mut self, health: f64, trust: f64) {
        self.adjust_health(health);
        self.adjust_trust(trust);
    }

    pub(crate) fn engage(&mut self) {
        self.engaged = true;
    }

    /// Prospect becomes an active account. Returns whether the status changed.
    pub(crate) fn convert(&mut self) -> bool {
        if self.status != CustomerStatus::Prospect {
            return false;
        }
        self.status = CustomerStatus::Active;
        true
    }

    /// Expands an active account's spend, returning the added amount.
    pub(crate) fn upsell(&mut self, factor: f64) -> Option<f64> {
        if self.status != CustomerStatus::Active || !factor.is_finite() || factor <= 1.0 {
            return None;
        }
        let previous = self.spend;
        self.spend *= factor;
        Some(self.spend - previous)
    }

    /// Churned account recovers into the gold tier with restored vitality.
    pub(crate) fn win_back(&mut self) -> bool {
        if self.status != CustomerStatus::Churned {
            return false;
        }
        self.status = CustomerStatus::Gold;
        self.health = MAX_VITALITY;
        self.trust = MAX_VITALITY;
        true
    }

    pub(crate) fn advance<R: Rng>(&mut self, path: &TrackPath, rng: &mut R) -> Step {
        match self.movement {
            Movement::Wandering if !self.engaged => {
                let dx = rng.gen_range(-WANDER_STEP..=WANDER_STEP);
                let dy = rng.gen_range(-WANDER_STEP..=WANDER_STEP);
                self.position = path
                    .canvas()
                    .clamp(self.position.offset(dx, dy), EDGE_MARGIN);
                Step::Moved
            }
            Movement::Wandering => {
                let path_position = rng.gen_range(0.0..1.0);
                self.movement = Movement::Approaching {
                    target: path.position_at(path_position),
                    path_position,
                };
                self.approach()
            }
            Movement::Approaching { .. } => self.approach(),
            Movement::OnTrack => self.travel(path, rng),
        }
    }

    fn approach(&mut self) -> Step {
        let Movement::Approaching {
            target,
            path_position,
        } = self.movement
        else {
            return Step::Moved;
        };

        let remaining = self.position.distance_to(target);
        if self.approach_speed >= remaining || remaining < ARRIVAL_EPSILON {
            self.position = target;
            self.path_position = path_position;
            self.movement = Movement::OnTrack;
            return Step::EnteredTrack { path_position };
        }

        let ratio = self.approach_speed / remaining;
        self.position = self.position.offset(
            (target.x() - self.position.x()) * ratio,
            (target.y() - self.position.y()) * ratio,
        );
        Step::Moved
    }

    fn travel<R: Rng>(&mut self, path: &TrackPath, rng: &mut R) -> Step {
        self.path_position += self.movement_speed;
        if self.path_position < 1.0 {
            self.position = path.position_at(self.path_position);
            return Step::Moved;
        }

        self.lap_count = self.lap_count.saturating_add(1);
        let renewal = self.complete_lap(rng);
        self.path_position = 0.0;
        self.position = path.position_at(0.0);
        Step::CompletedLap {
            lap_count: self.lap_count,
            renewal,
        }
    }

    fn complete_lap<R: Rng>(&mut self, rng: &mut R) -> Renewal {
        let renewal = match self.status {
            CustomerStatus::Prospect => return Renewal::NotDue,
            CustomerStatus::Active => {
                if rng.gen_range(0.0..1.0) < self.churn_probability() {
                    self.status = CustomerStatus::Churned;
                    Renewal::Churned
                } else {
                    if rng.gen_bool(ORGANIC_GROWTH_CHANCE) {
                        self.spend *= rng.gen_range(1.0..ORGANIC_GROWTH_CEILING);
                    }
                    Renewal::Renewed { spend: self.spend }
                }
            }
            CustomerStatus::Churned | CustomerStatus::Gold => Renewal::NotDue,
        };

        self.adjust_trust(-LAP_DECAY);
        self.adjust_health(-LAP_DECAY);
        renewal
    }

    pub(crate) fn churn_probability(&self) -> f64 {
        (1.0 - self.trust / MAX_VITALITY) * (1.0 - self.health / MAX_VITALITY)
    }
}

fn clamp_vitality(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_VITALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_defence_core::CanvasSize;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn profile(kind: CustomerKind) -> CustomerProfile {
        CustomerProfile {
            kind,
            position: Point::new(10.0, 300.0),
            spend: 10_000.0,
            movement_speed: 0.3,
            approach_speed: 1.0,
        }
    }

    fn customer() -> Customer {
        Customer::from_profile(CustomerId::new(1), &profile(CustomerKind::Small))
    }

    fn path() -> TrackPath {
        TrackPath::new(CanvasSize::new(800.0, 600.0))
    }

    #[test]
    fn new_customers_start_as_wandering_prospects() {
        let customer = customer();
        assert_eq!(customer.status, CustomerStatus::Prospect);
        assert_eq!(customer.phase(), MovementPhase::Wandering);
        assert!(!customer.engaged);
        assert_eq!(customer.health, MAX_VITALITY);
        assert_eq!(customer.trust, MAX_VITALITY);
    }

    #[test]
    fn unengaged_customers_never_leave_the_edge() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut customer = customer();
        for _ in 0..500 {
            assert_eq!(customer.advance(&path, &mut rng), Step::Moved);
            assert_eq!(customer.phase(), MovementPhase::Wandering);
            assert!(path.canvas().contains(customer.position, EDGE_MARGIN));
        }
    }

    #[test]
    fn approaching_customer_joins_track_when_step_covers_remaining_distance() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut customer = customer();
        customer.engage();
        customer.position = Point::new(100.0, 100.0);
        customer.movement = Movement::Approaching {
            target: Point::new(103.0, 100.0),
            path_position: 0.25,
        };

        assert_eq!(customer.advance(&path, &mut rng), Step::Moved);
        assert_eq!(customer.advance(&path, &mut rng), Step::Moved);
        assert_eq!(customer.phase(), MovementPhase::Approaching);
        assert_eq!(
            customer.advance(&path, &mut rng),
            Step::EnteredTrack {
                path_position: 0.25
            }
        );
        assert_eq!(customer.phase(), MovementPhase::OnTrack);
        assert_eq!(customer.position, Point::new(103.0, 100.0));
        assert_eq!(customer.path_position, 0.25);
    }

    #[test]
    fn engaged_customer_picks_a_fixed_track_target() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut customer = customer();
        customer.engage();
        let _ = customer.advance(&path, &mut rng);

        let Movement::Approaching {
            target,
            path_position,
        } = customer.movement
        else {
            panic!("engaged customer should approach the track");
        };
        assert!(target.distance_to(path.position_at(path_position)) < 1e-9);

        let _ = customer.advance(&path, &mut rng);
        assert!(matches!(
            customer.movement,
            Movement::Approaching { target: same, .. } if same == target
        ));
    }

    #[test]
    fn wraparound_counts_exactly_one_lap() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut customer = customer();
        customer.engage();
        customer.movement = Movement::OnTrack;
        customer.path_position = 0.8;

        let step = customer.advance(&path, &mut rng);
        assert_eq!(
            step,
            Step::CompletedLap {
                lap_count: 1,
                renewal: Renewal::NotDue
            }
        );
        assert_eq!(customer.path_position, 0.0);
        assert_eq!(customer.health, MAX_VITALITY, "prospects do not decay");
    }

    #[test]
    fn healthy_active_account_renews_and_decays() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut customer = customer();
        assert!(customer.convert());
        customer.movement = Movement::OnTrack;
        customer.path_position = 0.9;

        let step = customer.advance(&path, &mut rng);
        let Step::CompletedLap { renewal, .. } = step else {
            panic!("expected a lap completion, got {step:?}");
        };
        assert!(matches!(renewal, Renewal::Renewed { spend } if spend >= 10_000.0));
        assert_eq!(customer.status, CustomerStatus::Active);
        assert_eq!(customer.health, 95.0);
        assert_eq!(customer.trust, 95.0);
    }

    #[test]
    fn exhausted_active_account_always_churns() {
        let path = path();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut customer = customer();
        assert!(customer.convert());
        customer.health = 0.0;
        customer.trust = 0.0;
        customer.movement = Movement::OnTrack;
        customer.path_position = 0.9;

        let step = customer.advance(&path, &mut rng);
        assert!(matches!(
            step,
            Step::CompletedLap {
                renewal: Renewal::Churned,
                ..
            }
        ));
        assert_eq!(customer.status, CustomerStatus::Churned);
        assert_eq!(customer.health, 0.0);
    }

    #[test]
    fn lifecycle_transitions_are_guarded() {
        let mut customer = customer();
        assert!(customer.upsell(1.05).is_none(), "prospects cannot expand");
        assert!(!customer.win_back());
        assert!(customer.convert());
        assert!(!customer.convert());

        let added = customer.upsell(1.05).expect("active accounts expand");
        assert!((added - 500.0).abs() < 1e-9);

        customer.status = CustomerStatus::Churned;
        customer.health = 10.0;
        assert!(customer.win_back());
        assert_eq!(customer.status, CustomerStatus::Gold);
        assert_eq!(customer.health, MAX_VITALITY);
        assert!(!customer.win_back());
    }

    proptest! {
        #[test]
        fn vitality_stays_clamped(deltas in prop::collection::vec((-250.0f64..250.0, -250.0f64..250.0), 1..64)) {
            let mut customer = customer();
            for (health, trust) in deltas {
                customer.nurture(health, trust);
                prop_assert!((0.0..=MAX_VITALITY).contains(&customer.health));
                prop_assert!((0.0..=MAX_VITALITY).contains(&customer.trust));
            }
        }

        #[test]
        fn lap_count_never_decreases(seed in any::<u64>(), ticks in 1usize..400) {
            let path = path();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut customer = customer();
            customer.engage();
            let mut previous = customer.lap_count;
            for _ in 0..ticks {
                let step = customer.advance(&path, &mut rng);
                if let Step::CompletedLap { lap_count, .. } = step {
                    prop_assert_eq!(lap_count, previous + 1);
                }
                prop_assert!(customer.lap_count >= previous);
                previous = customer.lap_count;
            }
        }
    }
}
