#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Churn Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and the orchestrator submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod tower;

pub use tower::{
    burnout_efficiency, cooldown_after_action, CsmStrategy, SalesStrategy, TargetingStrategy,
    TowerKind, TowerStats, MAX_BURNOUT, MIN_ATTACK_SPEED,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Churn Defence.";

/// Upper bound shared by customer health and trust.
pub const MAX_VITALITY: f64 = 100.0;

/// Inset from the canvas border kept by spawning and wandering customers.
pub const EDGE_MARGIN: f64 = 10.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Resizes the canvas and regenerates the track to fit it.
    ConfigureCanvas {
        /// New canvas dimensions.
        canvas: CanvasSize,
    },
    /// Advances the frame counter by one tick.
    Tick,
    /// Inserts a new prospect described by the provided profile.
    SpawnCustomer {
        /// Randomised attributes drawn by the spawner.
        profile: CustomerProfile,
    },
    /// Moves every customer one tick according to its movement phase.
    AdvanceCustomers,
    /// Requests placement of a tower centred at the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Canvas position of the tower centre.
        position: Point,
    },
    /// Requests that a tower advance to the next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests removal of a tower in exchange for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Replaces the targeting strategy of a tower.
    SetTargetingStrategy {
        /// Identifier of the tower to reconfigure.
        tower: TowerId,
        /// Strategy that should filter future candidates.
        strategy: TargetingStrategy,
    },
    /// Replaces the target set of a tower.
    AssignTargets {
        /// Identifier of the tower whose targets change.
        tower: TowerId,
        /// Customers the tower should manage, in priority order.
        customers: Vec<CustomerId>,
    },
    /// Updates burnout and cooldowns for every tower.
    UpdateTowerFatigue,
    /// Marks a customer as engaged so it starts heading for the track.
    EngageCustomer {
        /// Customer that was contacted by a tower.
        customer: CustomerId,
    },
    /// Converts a prospect into an active account.
    ConvertCustomer {
        /// Customer to convert.
        customer: CustomerId,
    },
    /// Expands the spend of an active account.
    UpsellCustomer {
        /// Customer to upsell.
        customer: CustomerId,
        /// Multiplier applied to the customer's spend.
        factor: f64,
    },
    /// Recovers a churned account into the gold tier.
    WinBackCustomer {
        /// Customer to recover.
        customer: CustomerId,
    },
    /// Raises the health and trust of a customer.
    NurtureCustomer {
        /// Customer receiving attention.
        customer: CustomerId,
        /// Health added before clamping.
        health: f64,
        /// Trust added before clamping.
        trust: f64,
    },
    /// Resets a tower's cooldown after it acted.
    RearmTower {
        /// Identifier of the tower that acted.
        tower: TowerId,
    },
    /// Requests the start of a product upgrade.
    StartProductUpgrade,
    /// Advances any in-progress product upgrade by one tick.
    AdvanceProductUpgrade,
    /// Checks whether the simulation reached its terminal state.
    EvaluateOutcome,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the canvas was resized.
    CanvasConfigured {
        /// Dimensions now in effect.
        canvas: CanvasSize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Frame counter after the advance.
        frame: u64,
    },
    /// Confirms that a new prospect appeared at the map edge.
    CustomerSpawned {
        /// Identifier assigned to the customer.
        customer: CustomerId,
        /// Size category of the customer.
        kind: CustomerKind,
        /// Canvas position of the customer.
        position: Point,
    },
    /// Reports that an approaching customer reached the track.
    CustomerEnteredTrack {
        /// Customer that reached the track.
        customer: CustomerId,
        /// Track position the customer joined at.
        path_position: f64,
    },
    /// Reports that a customer completed a lap of the track.
    LapCompleted {
        /// Customer that wrapped around.
        customer: CustomerId,
        /// Lap count after the increment.
        lap_count: u32,
    },
    /// Reports that a prospect converted into an active account.
    CustomerConverted {
        /// Converted customer.
        customer: CustomerId,
        /// Spend booked on conversion.
        spend: f64,
    },
    /// Reports that an active account renewed at the renewal point.
    CustomerRenewed {
        /// Renewed customer.
        customer: CustomerId,
        /// Spend booked on renewal.
        spend: f64,
    },
    /// Reports that an active account churned at the renewal point.
    CustomerChurned {
        /// Churned customer.
        customer: CustomerId,
    },
    /// Reports that an active account expanded its spend.
    CustomerUpsold {
        /// Upsold customer.
        customer: CustomerId,
        /// Spend after the expansion.
        spend: f64,
    },
    /// Reports that a churned account was recovered into the gold tier.
    CustomerWonBack {
        /// Recovered customer.
        customer: CustomerId,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Canvas position of the tower centre.
        position: Point,
        /// Capital debited for the placement.
        cost: f64,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested.
        kind: TowerKind,
        /// Requested position.
        position: Point,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level after the upgrade.
        level: u32,
        /// Capital debited for the upgrade.
        cost: f64,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Capital credited for the sale.
        refund: f64,
    },
    /// Reports that a tower sale request was rejected.
    TowerSaleRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Confirms that a tower switched targeting strategy.
    TargetingStrategyChanged {
        /// Identifier of the reconfigured tower.
        tower: TowerId,
        /// Strategy now in effect.
        strategy: TargetingStrategy,
    },
    /// Reports that a strategy change was rejected.
    TargetingStrategyRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the change failed.
        reason: StrategyError,
    },
    /// Announces that a tower's cooldown elapsed while it holds targets.
    TowerReady {
        /// Identifier of the ready tower.
        tower: TowerId,
    },
    /// Confirms that a product upgrade started.
    ProductUpgradeStarted {
        /// Capital debited for the upgrade.
        cost: f64,
    },
    /// Reports that a product upgrade request was rejected.
    ProductUpgradeRejected {
        /// Specific reason the request failed.
        reason: ProductUpgradeError,
    },
    /// Reports the completion of a product upgrade and how it landed.
    ProductUpgradeCompleted {
        /// Whether the release helped or hurt the customer base.
        outcome: ProductLaunchOutcome,
    },
    /// Announces that the simulation reached its terminal loss state.
    SimulationEnded {
        /// Frame on which the simulation ended.
        frame: u64,
    },
    /// Publishes a freshly computed metrics report.
    MetricsUpdated {
        /// Latest metrics snapshot.
        report: MetricsReport,
    },
}

/// Dimensions of the drawable canvas measured in canvas units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    width: f64,
    height: f64,
}

impl CanvasSize {
    /// Creates a new canvas size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Horizontal extent of the canvas.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Vertical extent of the canvas.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Reports whether the point lies inside the canvas, inset by `margin`.
    #[must_use]
    pub fn contains(&self, point: Point, margin: f64) -> bool {
        point.x() >= margin
            && point.y() >= margin
            && point.x() <= self.width - margin
            && point.y() <= self.height - margin
    }

    /// Clamps the point into the canvas, inset by `margin`.
    #[must_use]
    pub fn clamp(&self, point: Point, margin: f64) -> Point {
        let max_x = (self.width - margin).max(margin);
        let max_y = (self.height - margin).max(margin);
        Point::new(point.x().clamp(margin, max_x), point.y().clamp(margin, max_y))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Continuous position on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the point shifted by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Unique identifier assigned to a customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(u32);

impl CustomerId {
    /// Creates a new customer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "customer-{}", self.0)
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tower-{}", self.0)
    }
}

/// Account size category, fixed when the customer spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerKind {
    /// Fast-moving account with a small contract.
    Small,
    /// Mid-market account.
    Medium,
    /// Slow-moving account with a large contract.
    Enterprise,
}

impl CustomerKind {
    /// Every customer kind in spawn-table order.
    pub const ALL: [CustomerKind; 3] = [
        CustomerKind::Small,
        CustomerKind::Medium,
        CustomerKind::Enterprise,
    ];

    /// Relative likelihood of this kind appearing in a spawn.
    #[must_use]
    pub const fn spawn_weight(self) -> f64 {
        match self {
            Self::Small => 0.6,
            Self::Medium => 0.3,
            Self::Enterprise => 0.1,
        }
    }

    /// Track fraction covered per tick before per-customer jitter.
    #[must_use]
    pub const fn base_movement_speed(self) -> f64 {
        match self {
            Self::Small => 0.0025,
            Self::Medium => 0.0018,
            Self::Enterprise => 0.0010,
        }
    }

    /// Inclusive-exclusive range the initial spend is drawn from.
    #[must_use]
    pub const fn spend_range(self) -> (f64, f64) {
        match self {
            Self::Small => (5_000.0, 15_000.0),
            Self::Medium => (20_000.0, 50_000.0),
            Self::Enterprise => (80_000.0, 200_000.0),
        }
    }
}

/// Position of a customer within the business lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerStatus {
    /// Not yet converted.
    Prospect,
    /// Paying account subject to renewal.
    Active,
    /// Lost account that may be won back.
    Churned,
    /// Recovered account that no longer churns.
    Gold,
}

impl CustomerStatus {
    /// Reports whether the status contributes recurring revenue.
    #[must_use]
    pub const fn is_revenue_bearing(self) -> bool {
        matches!(self, Self::Active | Self::Gold)
    }
}

/// Movement sub-state of a customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPhase {
    /// Drifting near the map edge, waiting to be engaged.
    Wandering,
    /// Heading for a fixed point on the track.
    Approaching,
    /// Travelling along the track.
    OnTrack,
}

/// Randomised attributes of a customer about to spawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Size category of the customer.
    pub kind: CustomerKind,
    /// Map-edge position the customer appears at.
    pub position: Point,
    /// Initial contract value.
    pub spend: f64,
    /// Track fraction covered per tick once on the track.
    pub movement_speed: f64,
    /// Canvas units covered per tick while approaching the track.
    pub approach_speed: f64,
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// Capital does not cover the tower's base cost.
    #[error("insufficient capital to place the tower")]
    InsufficientFunds,
    /// The footprint leaves the canvas, overlaps the track, or overlaps another tower.
    #[error("the tower cannot be placed at the requested position")]
    InvalidPlacement,
}

/// Reasons a tower upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// Capital does not cover the upgrade cost.
    #[error("insufficient capital to upgrade the tower")]
    InsufficientFunds,
}

/// Reasons a tower sale request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SaleError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons a targeting strategy change may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum StrategyError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The strategy belongs to a different tower kind.
    #[error("strategy does not apply to this tower kind")]
    IncompatibleStrategy,
}

/// Reasons a product upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ProductUpgradeError {
    /// Another product upgrade is still in progress.
    #[error("a product upgrade is already in progress")]
    AlreadyActive,
    /// Capital does not cover the product upgrade cost.
    #[error("insufficient capital to start a product upgrade")]
    InsufficientFunds,
}

/// Reception of a completed product upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductLaunchOutcome {
    /// The release raised health and trust across the base.
    Positive,
    /// The release lowered health and trust across the base.
    Negative,
}

/// Immutable representation of a single customer's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    /// Unique identifier assigned to the customer.
    pub id: CustomerId,
    /// Size category of the customer.
    pub kind: CustomerKind,
    /// Lifecycle status of the customer.
    pub status: CustomerStatus,
    /// Current canvas position.
    pub position: Point,
    /// Health in `[0, 100]`.
    pub health: f64,
    /// Trust in `[0, 100]`; hidden from the player-facing info panel.
    pub trust: f64,
    /// Current contract value.
    pub spend: f64,
    /// Track position in `[0, 1)`.
    pub path_position: f64,
    /// Completed laps.
    pub lap_count: u32,
    /// Movement sub-state.
    pub phase: MovementPhase,
    /// Whether a tower has contacted the customer.
    pub engaged: bool,
}

/// Read-only snapshot describing every customer in the simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomerView {
    snapshots: Vec<CustomerSnapshot>,
}

impl CustomerView {
    /// Creates a new customer view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CustomerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured customer snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CustomerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided customer.
    #[must_use]
    pub fn get(&self, id: CustomerId) -> Option<&CustomerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of customers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no customers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CustomerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Current level, starting at one.
    pub level: u32,
    /// Canvas position of the tower centre.
    pub position: Point,
    /// Level-derived statistics.
    pub stats: TowerStats,
    /// Overutilisation penalty in `[0, 100]`.
    pub burnout: f64,
    /// Ticks until the tower may act again.
    pub cooldown: u32,
    /// Active targeting strategy.
    pub strategy: TargetingStrategy,
    /// Customers currently managed by the tower.
    pub targets: Vec<CustomerId>,
}

/// Read-only snapshot describing all towers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided tower.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Business KPIs derived from the customer population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Annual recurring revenue of active and gold accounts.
    pub arr: f64,
    /// Monthly recurring revenue, `arr / 12`.
    pub mrr: f64,
    /// Net revenue retention between the two latest history samples.
    pub nrr: f64,
    /// Gross revenue retention between the two latest history samples, at most one.
    pub grr: f64,
    /// Customer acquisition cost.
    pub cac: f64,
    /// Projected lifetime value per account.
    pub ltv: f64,
    /// Number of active and gold accounts.
    pub customer_count: usize,
    /// Share of accounts lost between the two latest history samples.
    pub churn_rate: f64,
}

/// Economy figures required by metric computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    /// Current capital balance.
    pub capital: f64,
    /// Cumulative capital spent on tower placements and upgrades.
    pub tower_investment: f64,
    /// Number of prospects converted so far.
    pub customers_acquired: u64,
}

/// Progress of the product upgrade track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpgradeSnapshot {
    /// Whether an upgrade is in progress.
    pub active: bool,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
}

/// Read-only snapshot of everything a renderer displays.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSnapshot {
    /// Frames advanced since the simulation started.
    pub frame: u64,
    /// Canvas the positions refer to.
    pub canvas: CanvasSize,
    /// Current capital balance.
    pub capital: f64,
    /// Every customer in identifier order.
    pub customers: CustomerView,
    /// Every tower in identifier order.
    pub towers: TowerView,
    /// Latest metrics report.
    pub metrics: MetricsReport,
    /// Product upgrade progress.
    pub product_upgrade: ProductUpgradeSnapshot,
    /// Whether the simulation reached its terminal loss state.
    pub ended: bool,
}

/// Tunables for the product upgrade track.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductUpgradeConfig {
    /// Capital debited when an upgrade starts.
    pub cost: f64,
    /// Ticks required for an upgrade to complete.
    pub duration_ticks: u32,
}

impl Default for ProductUpgradeConfig {
    fn default() -> Self {
        Self {
            cost: 100_000.0,
            duration_ticks: 600,
        }
    }
}

/// Configuration parameters required to construct a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Canvas dimensions the track is fitted to.
    pub canvas: CanvasSize,
    /// Capital available before the first tick.
    pub starting_capital: f64,
    /// Chance per tick that a new prospect spawns.
    pub spawn_probability: f64,
    /// Seed feeding every pseudo-random source.
    pub rng_seed: u64,
    /// Product upgrade tunables.
    pub product_upgrade: ProductUpgradeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            starting_capital: 500_000.0,
            spawn_probability: 0.02,
            rng_seed: 0x5eed_c0de_cafe_f00d,
            product_upgrade: ProductUpgradeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CanvasSize, CsmStrategy, CustomerId, CustomerStatus, PlacementError, Point,
        SimulationConfig, TargetingStrategy, TowerId,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn contract_types_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&PlacementError::InvalidPlacement);
        assert_round_trip(&TargetingStrategy::Csm(CsmStrategy::Yellow));
        assert_round_trip(&SimulationConfig::default());
    }

    #[test]
    fn distance_is_euclidean() {
        let origin = Point::new(1.0, 1.0);
        let other = Point::new(4.0, 5.0);
        assert!((origin.distance_to(other) - 5.0).abs() < 1e-12);
        assert!((other.distance_to(origin) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn canvas_clamp_respects_margin() {
        let canvas = CanvasSize::new(100.0, 50.0);
        let clamped = canvas.clamp(Point::new(-5.0, 80.0), 10.0);
        assert_eq!(clamped, Point::new(10.0, 40.0));
        assert!(canvas.contains(clamped, 10.0));
        assert!(!canvas.contains(Point::new(95.0, 25.0), 10.0));
    }

    #[test]
    fn only_active_and_gold_bear_revenue() {
        assert!(CustomerStatus::Active.is_revenue_bearing());
        assert!(CustomerStatus::Gold.is_revenue_bearing());
        assert!(!CustomerStatus::Prospect.is_revenue_bearing());
        assert!(!CustomerStatus::Churned.is_revenue_bearing());
    }

    #[test]
    fn identifiers_display_with_prefix() {
        assert_eq!(CustomerId::new(7).to_string(), "customer-7");
        assert_eq!(TowerId::new(3).to_string(), "tower-3");
    }
}
