use churn_defence_core::{
    Command, CustomerId, CustomerKind, CustomerProfile, Event, MetricsReport, Point, TowerKind,
};
use churn_defence_system_analytics::Analytics;
use churn_defence_world::{self as world, query, World};

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn spawn(spend: f64) -> Command {
    Command::SpawnCustomer {
        profile: CustomerProfile {
            kind: CustomerKind::Medium,
            position: Point::new(20.0, 20.0),
            spend,
            movement_speed: 0.002,
            approach_speed: 1.0,
        },
    }
}

fn tick(world: &mut World, analytics: &mut Analytics) -> Option<MetricsReport> {
    let events = apply_all(world, vec![Command::Tick]);
    let mut published = Vec::new();
    analytics.handle(
        &events,
        &query::customer_view(world),
        query::economy(world),
        &mut published,
    );
    published.into_iter().find_map(|event| match event {
        Event::MetricsUpdated { report } => Some(report),
        _ => None,
    })
}

#[test]
fn metrics_follow_conversions_investment_and_expansion() {
    let mut world = World::new();
    let mut analytics = Analytics::new();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceTower {
                kind: TowerKind::Sales,
                position: Point::new(400.0, 300.0),
            },
            spawn(24_000.0),
            spawn(36_000.0),
            spawn(48_000.0),
            Command::ConvertCustomer {
                customer: CustomerId::new(0),
            },
            Command::ConvertCustomer {
                customer: CustomerId::new(1),
            },
        ],
    );

    let first = tick(&mut world, &mut analytics).expect("first tick publishes");
    assert_eq!(first.arr, 60_000.0);
    assert_eq!(first.mrr, 5_000.0);
    assert_eq!(first.customer_count, 2);
    assert_eq!(first.cac, 37_500.0);
    assert_eq!(first.grr, 0.0, "retention needs two samples");
    assert_eq!(first.nrr, 0.0);
    assert_eq!(first.ltv, 150_000.0);

    assert!(
        tick(&mut world, &mut analytics).is_none(),
        "an unchanged population publishes nothing"
    );

    let _ = apply_all(
        &mut world,
        vec![Command::UpsellCustomer {
            customer: CustomerId::new(0),
            factor: 1.5,
        }],
    );
    let expanded = tick(&mut world, &mut analytics).expect("expansion publishes");
    assert!((expanded.arr - 72_000.0).abs() < 1e-6);
    assert!((expanded.nrr - 1.2).abs() < 1e-9);
    assert_eq!(expanded.grr, 1.0);
    assert_eq!(expanded.churn_rate, 0.0);
}

#[test]
fn cac_is_zero_before_any_conversion() {
    let mut world = World::new();
    let mut analytics = Analytics::new();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceTower {
                kind: TowerKind::Csm,
                position: Point::new(400.0, 300.0),
            },
            spawn(10_000.0),
        ],
    );

    let report = tick(&mut world, &mut analytics).unwrap_or_default();
    assert_eq!(report.cac, 0.0);
    assert_eq!(report.arr, 0.0);
    assert_eq!(report.customer_count, 0);
}
