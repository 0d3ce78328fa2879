use churn_defence_core::{
    CsmStrategy, Event, Point, SimulationConfig, SimulationSnapshot, TargetingStrategy, TowerKind,
};
use churn_defence_simulation::Simulation;

fn scripted_run(seed: u64) -> (SimulationSnapshot, Vec<Event>) {
    let mut simulation = Simulation::new(SimulationConfig {
        rng_seed: seed,
        spawn_probability: 0.1,
        ..SimulationConfig::default()
    });
    let sales = simulation
        .place_tower(TowerKind::Sales, Point::new(60.0, 60.0))
        .expect("sales placement succeeds");
    let csm = simulation
        .place_tower(TowerKind::Csm, Point::new(740.0, 540.0))
        .expect("csm placement succeeds");

    let mut log = Vec::new();
    for tick in 0..2_000u32 {
        match tick {
            250 => {
                let _ = simulation.upgrade_tower(sales);
            }
            500 => {
                let _ = simulation
                    .set_targeting_strategy(csm, TargetingStrategy::Csm(CsmStrategy::Red));
            }
            750 => {
                let _ = simulation.start_product_upgrade();
            }
            _ => {}
        }
        log.extend_from_slice(simulation.advance());
    }

    (simulation.snapshot(), log)
}

#[test]
fn identical_seeds_replay_identically() {
    let (first_snapshot, first_log) = scripted_run(0x5eed);
    let (second_snapshot, second_log) = scripted_run(0x5eed);
    assert_eq!(first_snapshot, second_snapshot, "snapshots diverged");
    assert_eq!(first_log, second_log, "event logs diverged");
    assert!(!first_snapshot.customers.is_empty());
}

#[test]
fn different_seeds_diverge() {
    let (first, _) = scripted_run(1);
    let (second, _) = scripted_run(2);
    assert_ne!(first.customers, second.customers);
}

mod batched {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn advance_by_matches_single_steps(seed in any::<u64>(), ticks in 1u32..300) {
            let config = SimulationConfig {
                rng_seed: seed,
                spawn_probability: 0.1,
                ..SimulationConfig::default()
            };
            let mut batched = Simulation::new(config);
            let mut stepped = Simulation::new(config);

            prop_assert_eq!(batched.advance_by(ticks), ticks);
            for _ in 0..ticks {
                let _ = stepped.advance();
            }
            prop_assert_eq!(batched.snapshot(), stepped.snapshot());
        }
    }
}
