use churn_defence_core::{
    Command, CustomerId, CustomerKind, CustomerProfile, CustomerStatus, Event, Point, TowerId,
    TowerKind,
};
use churn_defence_system_tower_engagement::{Config, TowerEngagement};
use churn_defence_world::{self as world, query, World};

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn ready_csm_tower_engages_nurtures_and_rearms() {
    let mut world = World::new();
    let tower_spot = Point::new(400.0, 300.0);
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceTower {
                kind: TowerKind::Csm,
                position: tower_spot,
            },
            Command::SpawnCustomer {
                profile: CustomerProfile {
                    kind: CustomerKind::Medium,
                    position: tower_spot.offset(30.0, 0.0),
                    spend: 25_000.0,
                    movement_speed: 0.002,
                    approach_speed: 1.0,
                },
            },
            Command::ConvertCustomer {
                customer: CustomerId::new(0),
            },
            Command::AssignTargets {
                tower: TowerId::new(0),
                customers: vec![CustomerId::new(0)],
            },
        ],
    );

    // Pull health below the ceiling so the nurture is observable.
    let _ = apply_all(
        &mut world,
        vec![Command::NurtureCustomer {
            customer: CustomerId::new(0),
            health: -40.0,
            trust: -40.0,
        }],
    );

    let events = apply_all(&mut world, vec![Command::UpdateTowerFatigue]);
    assert_eq!(
        events,
        vec![Event::TowerReady {
            tower: TowerId::new(0)
        }]
    );

    let mut engagement = TowerEngagement::new(Config::new(11));
    let mut commands = Vec::new();
    engagement.handle(
        &events,
        &query::tower_view(&world),
        &query::customer_view(&world),
        &mut commands,
    );
    let _ = apply_all(&mut world, commands);

    let customer = *query::customer_view(&world)
        .get(CustomerId::new(0))
        .expect("customer exists");
    assert!(customer.engaged);
    assert_eq!(customer.status, CustomerStatus::Active);
    assert!(customer.health > 60.0 && customer.health < 61.0);
    assert!(customer.trust > 60.0 && customer.trust < 60.5);

    let tower = query::tower(&world, TowerId::new(0)).expect("tower exists");
    assert!(tower.cooldown >= 30, "tower waits before acting again");
}
