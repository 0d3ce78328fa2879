#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns ready towers into customer effect commands.

use churn_defence_core::{
    burnout_efficiency, Command, CustomerStatus, CustomerView, Event, TowerKind, TowerSnapshot,
    TowerView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ENGAGEMENT_RNG_STREAM: u64 = 0xd1b5_4a32_d192_ed03;
const CONVERSION_CHANCE: f64 = 0.01;
const UPSELL_CHANCE: f64 = 0.005;
const WINBACK_CHANCE: f64 = 0.002;
const UPSELL_FACTOR: f64 = 1.05;
const NURTURE_HEALTH: f64 = 1.0;
const NURTURE_TRUST: f64 = 0.5;

/// Configuration parameters required to construct the engagement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Tower engagement system that queues effect commands for ready towers.
#[derive(Debug)]
pub struct TowerEngagement {
    rng: ChaCha8Rng,
    scratch: Vec<Command>,
}

impl TowerEngagement {
    /// Creates a new engagement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed ^ ENGAGEMENT_RNG_STREAM),
            scratch: Vec::new(),
        }
    }

    /// Emits engagement, effect, and rearm commands for every `TowerReady` event.
    pub fn handle(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        customers: &CustomerView,
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();

        for event in events {
            let Event::TowerReady { tower } = event else {
                continue;
            };
            let Some(snapshot) = towers.get(*tower) else {
                continue;
            };
            self.act(snapshot, customers);
            self.scratch.push(Command::RearmTower { tower: *tower });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn act(&mut self, tower: &TowerSnapshot, customers: &CustomerView) {
        let efficiency = burnout_efficiency(tower.burnout);

        for &id in &tower.targets {
            let Some(customer) = customers.get(id) else {
                continue;
            };
            self.scratch.push(Command::EngageCustomer { customer: id });

            match tower.kind {
                TowerKind::Sales => {
                    let effect = match customer.status {
                        CustomerStatus::Prospect => self
                            .roll(CONVERSION_CHANCE * efficiency)
                            .then_some(Command::ConvertCustomer { customer: id }),
                        CustomerStatus::Active => {
                            self.roll(UPSELL_CHANCE * efficiency).then_some(
                                Command::UpsellCustomer {
                                    customer: id,
                                    factor: UPSELL_FACTOR,
                                },
                            )
                        }
                        CustomerStatus::Churned => self
                            .roll(WINBACK_CHANCE * efficiency)
                            .then_some(Command::WinBackCustomer { customer: id }),
                        CustomerStatus::Gold => None,
                    };
                    if let Some(command) = effect {
                        self.scratch.push(command);
                    }
                }
                TowerKind::Csm => self.scratch.push(Command::NurtureCustomer {
                    customer: id,
                    health: NURTURE_HEALTH * efficiency,
                    trust: NURTURE_TRUST * efficiency,
                }),
            }
        }
    }

    fn roll(&mut self, chance: f64) -> bool {
        self.rng.gen_bool(chance.clamp(0.0, 1.0))
    }
}
