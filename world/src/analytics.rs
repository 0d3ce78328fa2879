//! Immutable analytics snapshots sourced from the authoritative world state.

use churn_defence_core::{CustomerView, EconomySnapshot};

use crate::World;

/// Captures the economy figures metric computation depends on.
pub(crate) fn economy_snapshot(world: &World) -> EconomySnapshot {
    EconomySnapshot {
        capital: world.capital,
        tower_investment: world.tower_investment,
        customers_acquired: world.customers_acquired,
    }
}

/// Captures every customer in identifier order.
pub(crate) fn customer_view(world: &World) -> CustomerView {
    CustomerView::from_snapshots(
        world
            .customers
            .iter()
            .map(|customer| customer.snapshot())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use churn_defence_core::{Command, CustomerKind, CustomerProfile, Point, SimulationConfig};

    use super::*;
    use crate::apply;

    #[test]
    fn fresh_world_reports_starting_capital() {
        let world = World::with_config(SimulationConfig {
            starting_capital: 123_000.0,
            ..SimulationConfig::default()
        });
        let economy = economy_snapshot(&world);
        assert_eq!(economy.capital, 123_000.0);
        assert_eq!(economy.tower_investment, 0.0);
        assert_eq!(economy.customers_acquired, 0);
        assert!(customer_view(&world).is_empty());
    }

    #[test]
    fn customer_view_is_sorted_by_identifier() {
        let mut world = World::new();
        let mut events = Vec::new();
        for spend in [30_000.0, 10_000.0, 20_000.0] {
            apply(
                &mut world,
                Command::SpawnCustomer {
                    profile: CustomerProfile {
                        kind: CustomerKind::Small,
                        position: Point::new(20.0, 20.0),
                        spend,
                        movement_speed: 0.002,
                        approach_speed: 1.0,
                    },
                },
                &mut events,
            );
        }

        let view = customer_view(&world);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(events.len(), 3);
    }
}
