#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Churn Defence.

use churn_defence_core::{
    Command, CustomerId, CustomerProfile, Event, PlacementError, Point, ProductUpgradeError,
    SaleError, SimulationConfig, StrategyError, TargetingStrategy, TowerId, TowerKind,
    UpgradeError, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

mod analytics;
mod customers;
mod path;
mod product;
mod towers;

pub use path::{TrackPath, TRACK_HALF_WIDTH};

use customers::{Customer, Renewal, Step};
use product::ProductUpgrade;
use towers::TowerRegistry;

const WORLD_RNG_STREAM: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Represents the authoritative Churn Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    path: TrackPath,
    customers: Vec<Customer>,
    next_customer_id: CustomerId,
    towers: TowerRegistry,
    capital: f64,
    tower_investment: f64,
    customers_acquired: u64,
    product_upgrade: ProductUpgrade,
    frame: u64,
    ended: bool,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a new world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new world from the provided configuration.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            path: TrackPath::new(config.canvas),
            customers: Vec::new(),
            next_customer_id: CustomerId::new(0),
            towers: TowerRegistry::new(),
            capital: config.starting_capital,
            tower_investment: 0.0,
            customers_acquired: 0,
            product_upgrade: ProductUpgrade::default(),
            frame: 0,
            ended: false,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed ^ WORLD_RNG_STREAM),
            config,
        }
    }

    fn customer_mut(&mut self, id: CustomerId) -> Option<&mut Customer> {
        self.customers
            .binary_search_by_key(&id, |customer| customer.id)
            .ok()
            .map(|index| &mut self.customers[index])
    }

    fn customer(&self, id: CustomerId) -> Option<&Customer> {
        find_customer(&self.customers, id)
    }

    /// Re-applies every tower's value cap after customer spend has grown.
    fn enforce_value_caps(&mut self) {
        let customers = &self.customers;
        for tower in self.towers.iter_mut() {
            tower.trim_to_value_cap(|id| {
                find_customer(customers, id).map(|customer| customer.spend)
            });
        }
    }

    fn spawn_customer(&mut self, profile: CustomerProfile, out_events: &mut Vec<Event>) {
        let id = self.next_customer_id;
        self.next_customer_id = CustomerId::new(id.get().saturating_add(1));

        let mut profile = profile;
        profile.position = self
            .config
            .canvas
            .clamp(profile.position, churn_defence_core::EDGE_MARGIN);
        self.customers.push(Customer::from_profile(id, &profile));
        trace!(customer = %id, kind = ?profile.kind, spend = profile.spend, "customer spawned");
        out_events.push(Event::CustomerSpawned {
            customer: id,
            kind: profile.kind,
            position: profile.position,
        });
    }

    fn advance_customers(&mut self, out_events: &mut Vec<Event>) {
        for customer in self.customers.iter_mut() {
            match customer.advance(&self.path, &mut self.rng) {
                Step::Moved => {}
                Step::EnteredTrack { path_position } => {
                    out_events.push(Event::CustomerEnteredTrack {
                        customer: customer.id,
                        path_position,
                    });
                }
                Step::CompletedLap { lap_count, renewal } => {
                    out_events.push(Event::LapCompleted {
                        customer: customer.id,
                        lap_count,
                    });
                    match renewal {
                        Renewal::NotDue => {}
                        Renewal::Renewed { spend } => {
                            self.capital += spend;
                            out_events.push(Event::CustomerRenewed {
                                customer: customer.id,
                                spend,
                            });
                        }
                        Renewal::Churned => {
                            debug!(
                                customer = %customer.id,
                                lap_count,
                                "customer churned at renewal"
                            );
                            out_events.push(Event::CustomerChurned {
                                customer: customer.id,
                            });
                        }
                    }
                }
            }
        }
        self.enforce_value_caps();
    }

    fn place_tower(&mut self, kind: TowerKind, position: Point, out_events: &mut Vec<Event>) {
        let cost = kind.base_cost();
        let rejection = if self.capital < cost {
            Some(PlacementError::InsufficientFunds)
        } else if !self.is_valid_tower_position(kind, position) {
            Some(PlacementError::InvalidPlacement)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(?kind, ?position, %reason, "tower placement rejected");
            out_events.push(Event::TowerPlacementRejected {
                kind,
                position,
                reason,
            });
            return;
        }

        self.capital -= cost;
        self.tower_investment += cost;
        let tower = self.towers.insert(kind, position);
        info!(%tower, ?kind, cost, capital = self.capital, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            position,
            cost,
        });
    }

    fn is_valid_tower_position(&self, kind: TowerKind, position: Point) -> bool {
        let footprint = kind.footprint();
        self.path.is_valid_placement(position, footprint)
            && !self.towers.overlaps(position, footprint)
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            out_events.push(Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::MissingTower,
            });
            return;
        };

        let cost = state.kind.upgrade_cost(state.level);
        if self.capital < cost {
            debug!(%tower, cost, capital = self.capital, "tower upgrade rejected");
            out_events.push(Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::InsufficientFunds,
            });
            return;
        }

        self.capital -= cost;
        self.tower_investment += cost;
        state.upgrade();
        info!(%tower, level = state.level, cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded {
            tower,
            level: state.level,
            cost,
        });
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.remove(tower) else {
            out_events.push(Event::TowerSaleRejected {
                tower,
                reason: SaleError::MissingTower,
            });
            return;
        };

        let refund = state.kind.sell_value(state.level);
        self.capital += refund;
        info!(%tower, level = state.level, refund, "tower sold");
        out_events.push(Event::TowerSold { tower, refund });
    }

    fn set_targeting_strategy(
        &mut self,
        tower: TowerId,
        strategy: TargetingStrategy,
        out_events: &mut Vec<Event>,
    ) {
        let reason = match self.towers.get_mut(tower) {
            None => StrategyError::MissingTower,
            Some(state) if state.kind != strategy.tower_kind() => {
                StrategyError::IncompatibleStrategy
            }
            Some(state) => {
                state.strategy = strategy;
                out_events.push(Event::TargetingStrategyChanged { tower, strategy });
                return;
            }
        };
        out_events.push(Event::TargetingStrategyRejected { tower, reason });
    }

    /// Replaces a tower's targets, dropping any that violate range or capacity.
    fn assign_targets(&mut self, tower: TowerId, requested: Vec<CustomerId>) {
        let Some(state) = self.towers.get(tower) else {
            return;
        };

        let mut accepted: Vec<CustomerId> = Vec::with_capacity(state.stats.max_targets);
        let mut managed = 0.0;
        for id in requested {
            if accepted.len() >= state.stats.max_targets {
                break;
            }
            if accepted.contains(&id) {
                continue;
            }
            let Some(customer) = self.customer(id) else {
                continue;
            };
            if !state.in_range(customer.position) {
                continue;
            }
            if managed + customer.spend > state.stats.max_value_managed {
                continue;
            }
            managed += customer.spend;
            accepted.push(id);
        }

        if let Some(state) = self.towers.get_mut(tower) {
            state.targets = accepted;
        }
    }

    fn update_tower_fatigue(&mut self, out_events: &mut Vec<Event>) {
        for tower in self.towers.iter_mut() {
            if tower.update_fatigue() {
                out_events.push(Event::TowerReady { tower: tower.id });
            }
        }
    }

    fn convert_customer(&mut self, id: CustomerId, out_events: &mut Vec<Event>) {
        let Some(customer) = self.customer_mut(id) else {
            return;
        };
        if !customer.convert() {
            return;
        }

        let spend = customer.spend;
        self.capital += spend;
        self.customers_acquired += 1;
        debug!(customer = %id, spend, "prospect converted");
        out_events.push(Event::CustomerConverted { customer: id, spend });
    }

    fn upsell_customer(&mut self, id: CustomerId, factor: f64, out_events: &mut Vec<Event>) {
        let Some(customer) = self.customer_mut(id) else {
            return;
        };
        let Some(added) = customer.upsell(factor) else {
            return;
        };

        let spend = customer.spend;
        self.capital += added;
        debug!(customer = %id, spend, "account expanded");
        out_events.push(Event::CustomerUpsold { customer: id, spend });
        self.enforce_value_caps();
    }

    fn win_back_customer(&mut self, id: CustomerId, out_events: &mut Vec<Event>) {
        let Some(customer) = self.customer_mut(id) else {
            return;
        };
        if !customer.win_back() {
            return;
        }

        let spend = customer.spend;
        self.capital += spend;
        debug!(customer = %id, spend, "churned account won back");
        out_events.push(Event::CustomerWonBack { customer: id });
    }

    fn nurture_customer(&mut self, id: CustomerId, health: f64, trust: f64) {
        if !health.is_finite() || !trust.is_finite() {
            return;
        }
        if let Some(customer) = self.customer_mut(id) {
            customer.nurture(health, trust);
        }
    }

    fn start_product_upgrade(&mut self, out_events: &mut Vec<Event>) {
        let cost = self.config.product_upgrade.cost;
        let rejection = if self.product_upgrade.is_active() {
            Some(ProductUpgradeError::AlreadyActive)
        } else if self.capital < cost {
            Some(ProductUpgradeError::InsufficientFunds)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(%reason, "product upgrade rejected");
            out_events.push(Event::ProductUpgradeRejected { reason });
            return;
        }

        self.capital -= cost;
        self.product_upgrade
            .start(self.config.product_upgrade.duration_ticks);
        info!(cost, capital = self.capital, "product upgrade started");
        out_events.push(Event::ProductUpgradeStarted { cost });
    }

    fn advance_product_upgrade(&mut self, out_events: &mut Vec<Event>) {
        if !self.product_upgrade.advance() {
            return;
        }

        let outcome = product::launch(&mut self.customers, &mut self.rng);
        self.enforce_value_caps();
        info!(?outcome, "product upgrade completed");
        out_events.push(Event::ProductUpgradeCompleted { outcome });
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.ended {
            return;
        }

        let revenue_bearing = self
            .customers
            .iter()
            .any(|customer| customer.status.is_revenue_bearing());
        if revenue_bearing || self.capital >= TowerKind::cheapest_base_cost() {
            return;
        }

        self.ended = true;
        info!(frame = self.frame, capital = self.capital, "simulation ended");
        out_events.push(Event::SimulationEnded { frame: self.frame });
    }
}

fn find_customer(customers: &[Customer], id: CustomerId) -> Option<&Customer> {
    customers
        .binary_search_by_key(&id, |customer| customer.id)
        .ok()
        .map(|index| &customers[index])
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically
/// for a given seed.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureCanvas { canvas } => {
            world.config.canvas = canvas;
            world.path.resize(canvas);
            out_events.push(Event::CanvasConfigured { canvas });
        }
        Command::Tick => {
            if world.ended {
                return;
            }
            world.frame = world.frame.saturating_add(1);
            trace!(frame = world.frame, "tick");
            out_events.push(Event::TimeAdvanced { frame: world.frame });
        }
        Command::SpawnCustomer { profile } => world.spawn_customer(profile, out_events),
        Command::AdvanceCustomers => world.advance_customers(out_events),
        Command::PlaceTower { kind, position } => world.place_tower(kind, position, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::SetTargetingStrategy { tower, strategy } => {
            world.set_targeting_strategy(tower, strategy, out_events);
        }
        Command::AssignTargets { tower, customers } => world.assign_targets(tower, customers),
        Command::UpdateTowerFatigue => world.update_tower_fatigue(out_events),
        Command::EngageCustomer { customer } => {
            if let Some(customer) = world.customer_mut(customer) {
                customer.engage();
            }
        }
        Command::ConvertCustomer { customer } => world.convert_customer(customer, out_events),
        Command::UpsellCustomer { customer, factor } => {
            world.upsell_customer(customer, factor, out_events);
        }
        Command::WinBackCustomer { customer } => world.win_back_customer(customer, out_events),
        Command::NurtureCustomer {
            customer,
            health,
            trust,
        } => world.nurture_customer(customer, health, trust),
        Command::RearmTower { tower } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.rearm();
            }
        }
        Command::StartProductUpgrade => world.start_product_upgrade(out_events),
        Command::AdvanceProductUpgrade => world.advance_product_upgrade(out_events),
        Command::EvaluateOutcome => world.evaluate_outcome(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use churn_defence_core::{
        CanvasSize, CustomerView, EconomySnapshot, Point, ProductUpgradeSnapshot,
        SimulationConfig, TowerId, TowerKind, TowerSnapshot, TowerView,
    };

    use super::{analytics, TrackPath, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created with, including the current canvas.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Canvas the world's coordinates refer to.
    #[must_use]
    pub fn canvas(world: &World) -> CanvasSize {
        world.config.canvas
    }

    /// Provides read-only access to the track customers travel along.
    #[must_use]
    pub fn track_path(world: &World) -> &TrackPath {
        &world.path
    }

    /// Frames advanced since the world was created.
    #[must_use]
    pub fn frame(world: &World) -> u64 {
        world.frame
    }

    /// Current capital balance.
    #[must_use]
    pub fn capital(world: &World) -> f64 {
        world.capital
    }

    /// Economy figures consumed by metric computation.
    #[must_use]
    pub fn economy(world: &World) -> EconomySnapshot {
        analytics::economy_snapshot(world)
    }

    /// Captures a read-only view of every customer.
    #[must_use]
    pub fn customer_view(world: &World) -> CustomerView {
        analytics::customer_view(world)
    }

    /// Captures a read-only view of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the state of a single tower, if it exists.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Reports whether a tower of the given kind could be placed at the position,
    /// ignoring affordability.
    #[must_use]
    pub fn can_place(world: &World, kind: TowerKind, position: Point) -> bool {
        world.is_valid_tower_position(kind, position)
    }

    /// Progress of the product upgrade track.
    #[must_use]
    pub fn product_upgrade(world: &World) -> ProductUpgradeSnapshot {
        world.product_upgrade.snapshot()
    }

    /// Reports whether the simulation reached its terminal loss state.
    #[must_use]
    pub fn is_ended(world: &World) -> bool {
        world.ended
    }
}
