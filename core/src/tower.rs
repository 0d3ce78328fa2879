//! Tower kinds, level-derived statistics, economics, and targeting strategies.

use serde::{Deserialize, Serialize};

use crate::{CustomerKind, CustomerSnapshot, CustomerStatus};

/// Upper bound applied to a tower's burnout level.
pub const MAX_BURNOUT: f64 = 100.0;

/// Shortest cooldown, in ticks, that upgrades may reduce a tower to.
pub const MIN_ATTACK_SPEED: f64 = 10.0;

const UPGRADE_COST_FACTOR: f64 = 0.75;
const SELL_FRACTION: f64 = 0.7;
const RANGE_GROWTH_PER_LEVEL: f64 = 0.1;
const ATTACK_SPEED_GAIN_PER_LEVEL: f64 = 0.05;
const VALUE_GROWTH_PER_LEVEL: f64 = 0.2;

/// Types of towers that can be placed beside the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Converts prospects, upsells active accounts, and wins back churned ones.
    Sales,
    /// Customer success team that nurtures the health and trust of active accounts.
    Csm,
}

impl TowerKind {
    /// Every constructible tower kind in a stable order.
    pub const ALL: [TowerKind; 2] = [TowerKind::Sales, TowerKind::Csm];

    /// Capital required to place a level one tower of this kind.
    #[must_use]
    pub const fn base_cost(self) -> f64 {
        match self {
            Self::Sales => 75_000.0,
            Self::Csm => 60_000.0,
        }
    }

    /// Lowest base cost across every tower kind.
    #[must_use]
    pub fn cheapest_base_cost() -> f64 {
        Self::ALL
            .iter()
            .map(|kind| kind.base_cost())
            .fold(f64::INFINITY, f64::min)
    }

    /// Side length of the square footprint occupied by the tower.
    #[must_use]
    pub const fn footprint(self) -> f64 {
        30.0
    }

    const fn base_range(self) -> f64 {
        match self {
            Self::Sales => 100.0,
            Self::Csm => 120.0,
        }
    }

    const fn base_attack_speed(self) -> f64 {
        match self {
            Self::Sales => 60.0,
            Self::Csm => 30.0,
        }
    }

    const fn base_max_targets(self) -> usize {
        match self {
            Self::Sales => 3,
            Self::Csm => 5,
        }
    }

    const fn base_max_value_managed(self) -> f64 {
        match self {
            Self::Sales => 300_000.0,
            Self::Csm => 500_000.0,
        }
    }

    /// Derives the statistics of a tower of this kind at the provided level.
    ///
    /// Levels below one are treated as level one.
    #[must_use]
    pub fn stats_at(self, level: u32) -> TowerStats {
        let steps = f64::from(level.max(1) - 1);
        let attack_speed =
            (self.base_attack_speed() * (1.0 - ATTACK_SPEED_GAIN_PER_LEVEL * steps))
                .max(MIN_ATTACK_SPEED);
        let extra_targets = usize::try_from((level.max(1) - 1) / 2).unwrap_or(0);

        TowerStats {
            range: self.base_range() * (1.0 + RANGE_GROWTH_PER_LEVEL * steps),
            attack_speed,
            max_targets: self.base_max_targets() + extra_targets,
            max_value_managed: self.base_max_value_managed()
                * (1.0 + VALUE_GROWTH_PER_LEVEL * steps),
        }
    }

    /// Capital required to raise a tower from `level` to `level + 1`.
    #[must_use]
    pub fn upgrade_cost(self, level: u32) -> f64 {
        (self.base_cost() * UPGRADE_COST_FACTOR * f64::from(level)).round()
    }

    /// Total capital invested into a tower that reached `level`.
    #[must_use]
    pub fn total_invested(self, level: u32) -> f64 {
        (1..level.max(1)).fold(self.base_cost(), |total, step| {
            total + self.upgrade_cost(step)
        })
    }

    /// Capital refunded when selling a tower at `level`.
    #[must_use]
    pub fn sell_value(self, level: u32) -> f64 {
        (SELL_FRACTION * self.total_invested(level)).round()
    }
}

/// Statistics recomputed from a tower's kind and level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Euclidean reach measured in canvas units.
    pub range: f64,
    /// Cooldown between actions measured in ticks before burnout scaling.
    pub attack_speed: f64,
    /// Maximum number of customers the tower may target at once.
    pub max_targets: usize,
    /// Upper bound on the combined spend of targeted customers.
    pub max_value_managed: f64,
}

/// Multiplier applied to effect magnitudes and chances for the given burnout.
#[must_use]
pub fn burnout_efficiency(burnout: f64) -> f64 {
    1.0 - burnout.clamp(0.0, MAX_BURNOUT) / MAX_BURNOUT
}

/// Cooldown, in ticks, a tower waits after acting under the given burnout.
#[must_use]
pub fn cooldown_after_action(attack_speed: f64, burnout: f64) -> u32 {
    let scaled = attack_speed * (1.0 + burnout.clamp(0.0, MAX_BURNOUT) / MAX_BURNOUT);
    // Saturating float-to-int conversion.
    scaled.round().max(0.0) as u32
}

/// Targeting filters available to sales towers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesStrategy {
    /// Any customer inside the tower's range.
    #[default]
    Default,
    /// Prospects that have not converted yet.
    Prospects,
    /// Active accounts eligible for expansion.
    Upsell,
    /// Churned accounts eligible for winback.
    Winback,
    /// Enterprise accounts regardless of status.
    Enterprise,
    /// Small and medium accounts regardless of status.
    Smb,
}

/// Targeting filters available to customer success towers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsmStrategy {
    /// Every active account.
    #[default]
    Default,
    /// Active accounts with health at or below 25.
    Red,
    /// Active accounts with health above 25 and at or below 75.
    Yellow,
    /// Active accounts with health above 75.
    Green,
}

/// Targeting strategy tagged with the tower kind it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingStrategy {
    /// Strategy applicable to [`TowerKind::Sales`].
    Sales(SalesStrategy),
    /// Strategy applicable to [`TowerKind::Csm`].
    Csm(CsmStrategy),
}

impl TargetingStrategy {
    /// Strategy assigned to freshly placed towers of the given kind.
    #[must_use]
    pub const fn default_for(kind: TowerKind) -> Self {
        match kind {
            TowerKind::Sales => Self::Sales(SalesStrategy::Default),
            TowerKind::Csm => Self::Csm(CsmStrategy::Default),
        }
    }

    /// Tower kind this strategy belongs to.
    #[must_use]
    pub const fn tower_kind(self) -> TowerKind {
        match self {
            Self::Sales(_) => TowerKind::Sales,
            Self::Csm(_) => TowerKind::Csm,
        }
    }

    /// Reports whether a customer passes this strategy's filter.
    #[must_use]
    pub fn admits(self, customer: &CustomerSnapshot) -> bool {
        let status = customer.status;
        match self {
            Self::Sales(strategy) => match strategy {
                SalesStrategy::Default => true,
                SalesStrategy::Prospects => status == CustomerStatus::Prospect,
                SalesStrategy::Upsell => status == CustomerStatus::Active,
                SalesStrategy::Winback => status == CustomerStatus::Churned,
                SalesStrategy::Enterprise => customer.kind == CustomerKind::Enterprise,
                SalesStrategy::Smb => {
                    matches!(customer.kind, CustomerKind::Small | CustomerKind::Medium)
                }
            },
            Self::Csm(strategy) => {
                if status != CustomerStatus::Active {
                    return false;
                }
                let health = customer.health;
                match strategy {
                    CsmStrategy::Default => true,
                    CsmStrategy::Red => health <= 25.0,
                    CsmStrategy::Yellow => health > 25.0 && health <= 75.0,
                    CsmStrategy::Green => health > 75.0,
                }
            }
        }
    }
}
