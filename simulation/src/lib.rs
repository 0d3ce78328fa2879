#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestrator that owns the Churn Defence world and drives its systems.
//!
//! Every tick runs the same fixed pipeline: the clock advances, prospects may
//! spawn, customers move, towers refresh their targets, fatigue and act, the
//! product upgrade progresses, metrics are recomputed, and finally the
//! terminal condition is evaluated. Player operations are applied immediately
//! and report their outcome through `Result` values.

use churn_defence_core::{
    CanvasSize, Command, Event, MetricsReport, PlacementError, Point, ProductUpgradeError,
    SaleError, SimulationConfig, SimulationSnapshot, StrategyError, TargetingStrategy, TowerId,
    TowerKind, UpgradeError,
};
use churn_defence_system_analytics::Analytics;
use churn_defence_system_spawning::{self as spawning, Spawning};
use churn_defence_system_tower_engagement::{self as engagement, TowerEngagement};
use churn_defence_system_tower_targeting::TowerTargeting;
use churn_defence_world::{self as world, query, World};
use tracing::trace;

/// Tick-driven simulation that couples the world with every system.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    spawning: Spawning,
    targeting: TowerTargeting,
    engagement: TowerEngagement,
    analytics: Analytics,
    events: Vec<Event>,
    commands: Vec<Command>,
    published: Vec<Event>,
}

impl Simulation {
    /// Creates a fresh simulation from the provided configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            world: World::with_config(config),
            spawning: Spawning::new(spawning::Config::new(
                config.spawn_probability,
                config.rng_seed,
            )),
            targeting: TowerTargeting::new(),
            engagement: TowerEngagement::new(engagement::Config::new(config.rng_seed)),
            analytics: Analytics::new(),
            events: Vec::new(),
            commands: Vec::new(),
            published: Vec::new(),
            config,
        }
    }

    /// Configuration the simulation was created with, including canvas changes.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Provides read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Advances the simulation by a single tick.
    ///
    /// Returns the events produced by the tick. Once the simulation has ended
    /// this is a no-op returning no events.
    pub fn advance(&mut self) -> &[Event] {
        self.events.clear();
        let _ = self.run_tick();
        &self.events
    }

    /// Advances up to `ticks` ticks, stopping early once the simulation ends.
    ///
    /// Returns the number of ticks that actually ran. Events from every tick
    /// remain available through [`Simulation::recent_events`].
    pub fn advance_by(&mut self, ticks: u32) -> u32 {
        self.events.clear();
        let mut advanced = 0;
        while advanced < ticks && self.run_tick() {
            advanced += 1;
        }
        advanced
    }

    /// Discards all state and starts over from the stored configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Resizes the canvas and refits the track to it.
    pub fn resize(&mut self, canvas: CanvasSize) {
        self.config.canvas = canvas;
        let _ = self.execute(Command::ConfigureCanvas { canvas });
    }

    /// Places a tower, debiting its base cost.
    pub fn place_tower(
        &mut self,
        kind: TowerKind,
        position: Point,
    ) -> Result<TowerId, PlacementError> {
        let events = self.execute(Command::PlaceTower { kind, position });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::InvalidPlacement))
    }

    /// Raises a tower by one level, returning the new level.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<u32, UpgradeError> {
        let events = self.execute(Command::UpgradeTower { tower });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
                Event::TowerUpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(UpgradeError::MissingTower))
    }

    /// Sells a tower, returning the refunded capital.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<f64, SaleError> {
        let events = self.execute(Command::SellTower { tower });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerSold { refund, .. } => Some(Ok(*refund)),
                Event::TowerSaleRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(SaleError::MissingTower))
    }

    /// Replaces the targeting strategy of a tower.
    pub fn set_targeting_strategy(
        &mut self,
        tower: TowerId,
        strategy: TargetingStrategy,
    ) -> Result<(), StrategyError> {
        let events = self.execute(Command::SetTargetingStrategy { tower, strategy });
        events
            .iter()
            .find_map(|event| match event {
                Event::TargetingStrategyChanged { .. } => Some(Ok(())),
                Event::TargetingStrategyRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(StrategyError::MissingTower))
    }

    /// Starts a product upgrade, debiting its cost.
    pub fn start_product_upgrade(&mut self) -> Result<(), ProductUpgradeError> {
        let events = self.execute(Command::StartProductUpgrade);
        events
            .iter()
            .find_map(|event| match event {
                Event::ProductUpgradeStarted { .. } => Some(Ok(())),
                Event::ProductUpgradeRejected { reason } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(ProductUpgradeError::AlreadyActive))
    }

    /// Reports whether a tower of the given kind fits at the position.
    ///
    /// Affordability is not considered.
    #[must_use]
    pub fn can_place(&self, kind: TowerKind, position: Point) -> bool {
        query::can_place(&self.world, kind, position)
    }

    /// Latest published metrics, or an all-zero report before the first tick.
    #[must_use]
    pub fn metrics(&self) -> MetricsReport {
        self.analytics.last_report().copied().unwrap_or_default()
    }

    /// Current capital balance.
    #[must_use]
    pub fn capital(&self) -> f64 {
        query::capital(&self.world)
    }

    /// Reports whether the simulation reached its terminal loss state.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        query::is_ended(&self.world)
    }

    /// Events produced by the latest advance and any operations applied since.
    #[must_use]
    pub fn recent_events(&self) -> &[Event] {
        &self.events
    }

    /// Captures an immutable view of everything a renderer displays.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            frame: query::frame(&self.world),
            canvas: query::canvas(&self.world),
            capital: query::capital(&self.world),
            customers: query::customer_view(&self.world),
            towers: query::tower_view(&self.world),
            metrics: self.metrics(),
            product_upgrade: query::product_upgrade(&self.world),
            ended: query::is_ended(&self.world),
        }
    }

    fn execute(&mut self, command: Command) -> &[Event] {
        let start = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        &self.events[start..]
    }

    /// Runs the per-tick pipeline, appending its events. Returns `false` when
    /// the simulation has already ended.
    fn run_tick(&mut self) -> bool {
        let start = self.events.len();
        world::apply(&mut self.world, Command::Tick, &mut self.events);
        if self.events.len() == start {
            return false;
        }

        let canvas = query::canvas(&self.world);
        self.spawning
            .handle(&self.events[start..], canvas, &mut self.commands);
        dispatch(&mut self.world, &mut self.commands, &mut self.events);

        world::apply(&mut self.world, Command::AdvanceCustomers, &mut self.events);

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::customer_view(&self.world),
            &mut self.commands,
        );
        dispatch(&mut self.world, &mut self.commands, &mut self.events);

        let fatigue_start = self.events.len();
        world::apply(&mut self.world, Command::UpdateTowerFatigue, &mut self.events);
        self.engagement.handle(
            &self.events[fatigue_start..],
            &query::tower_view(&self.world),
            &query::customer_view(&self.world),
            &mut self.commands,
        );
        dispatch(&mut self.world, &mut self.commands, &mut self.events);

        world::apply(
            &mut self.world,
            Command::AdvanceProductUpgrade,
            &mut self.events,
        );

        self.analytics.handle(
            &self.events[start..],
            &query::customer_view(&self.world),
            query::economy(&self.world),
            &mut self.published,
        );
        self.events.append(&mut self.published);

        world::apply(&mut self.world, Command::EvaluateOutcome, &mut self.events);

        trace!(
            frame = query::frame(&self.world),
            events = self.events.len() - start,
            "tick complete"
        );
        true
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

fn dispatch(world: &mut World, commands: &mut Vec<Command>, out: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, out);
    }
}
