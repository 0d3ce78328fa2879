//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use churn_defence_core::{
    cooldown_after_action, CustomerId, Point, TargetingStrategy, TowerId, TowerKind,
    TowerSnapshot, TowerStats, MAX_BURNOUT,
};

const BURNOUT_RECOVERY: f64 = 0.5;
const BURNOUT_STRAIN: f64 = 0.1;

/// State of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) level: u32,
    pub(crate) position: Point,
    /// Cached copy of `kind.stats_at(level)`, refreshed on upgrade.
    pub(crate) stats: TowerStats,
    pub(crate) targets: Vec<CustomerId>,
    pub(crate) burnout: f64,
    pub(crate) cooldown: u32,
    pub(crate) strategy: TargetingStrategy,
}

impl TowerState {
    fn new(id: TowerId, kind: TowerKind, position: Point) -> Self {
        Self {
            id,
            kind,
            level: 1,
            position,
            stats: kind.stats_at(1),
            targets: Vec::new(),
            burnout: 0.0,
            cooldown: 0,
            strategy: TargetingStrategy::default_for(kind),
        }
    }

    pub(crate) fn upgrade(&mut self) {
        self.level = self.level.saturating_add(1);
        self.stats = self.kind.stats_at(self.level);
    }

    /// Updates burnout for the current load, then counts the cooldown down.
    ///
    /// Returns `true` when the tower may act this tick.
    pub(crate) fn update_fatigue(&mut self) -> bool {
        if self.targets.is_empty() {
            self.burnout = (self.burnout - BURNOUT_RECOVERY).max(0.0);
        } else {
            let load = self.targets.len() as f64 / self.stats.max_targets.max(1) as f64;
            self.burnout = (self.burnout + load * BURNOUT_STRAIN).min(MAX_BURNOUT);
        }

        if self.cooldown > 0 {
            self.cooldown -= 1;
            return false;
        }
        !self.targets.is_empty()
    }

    /// Walks targets in order and drops any whose spend would push the
    /// managed value past the cap.
    pub(crate) fn trim_to_value_cap(&mut self, spend_of: impl Fn(CustomerId) -> Option<f64>) {
        let cap = self.stats.max_value_managed;
        let mut managed = 0.0;
        self.targets.retain(|&id| match spend_of(id) {
            Some(spend) if managed + spend <= cap => {
                managed += spend;
                true
            }
            _ => false,
        });
    }

    pub(crate) fn rearm(&mut self) {
        self.cooldown = cooldown_after_action(self.stats.attack_speed, self.burnout);
    }

    pub(crate) fn in_range(&self, point: Point) -> bool {
        self.position.distance_to(point) <= self.stats.range
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            level: self.level,
            position: self.position,
            stats: self.stats,
            burnout: self.burnout,
            cooldown: self.cooldown,
            strategy: self.strategy,
            targets: self.targets.clone(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, kind: TowerKind, position: Point) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, TowerState::new(id, kind, position));
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Reports whether a footprint of side `size` centred at `position`
    /// would overlap an existing tower.
    pub(crate) fn overlaps(&self, position: Point, size: f64) -> bool {
        self.entries.values().any(|tower| {
            let spacing = (tower.kind.footprint() + size) / 2.0;
            (tower.position.x() - position.x()).abs() < spacing
                && (tower.position.y() - position.y()).abs() < spacing
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(TowerKind::Sales, Point::new(10.0, 10.0));
        let second = registry.insert(TowerKind::Csm, Point::new(90.0, 10.0));
        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));

        let _ = registry.remove(first);
        let third = registry.insert(TowerKind::Sales, Point::new(10.0, 10.0));
        assert_eq!(third, TowerId::new(2), "identifiers are never reused");
    }

    #[test]
    fn new_tower_starts_at_level_one_with_default_strategy() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Csm, Point::new(0.0, 0.0));
        let tower = registry.get(id).expect("tower exists");
        assert_eq!(tower.level, 1);
        assert_eq!(tower.stats, TowerKind::Csm.stats_at(1));
        assert_eq!(tower.strategy, TargetingStrategy::default_for(TowerKind::Csm));
        assert_eq!(tower.cooldown, 0);
        assert_eq!(tower.burnout, 0.0);
    }

    #[test]
    fn upgrade_refreshes_cached_stats() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Sales, Point::new(0.0, 0.0));
        let tower = registry.get_mut(id).expect("tower exists");
        tower.upgrade();
        tower.upgrade();
        assert_eq!(tower.level, 3);
        assert_eq!(tower.stats, TowerKind::Sales.stats_at(3));
    }

    #[test]
    fn overlapping_footprints_are_detected() {
        let mut registry = TowerRegistry::new();
        let _ = registry.insert(TowerKind::Sales, Point::new(100.0, 100.0));
        assert!(registry.overlaps(Point::new(120.0, 110.0), 30.0));
        assert!(!registry.overlaps(Point::new(131.0, 100.0), 30.0));
    }

    #[test]
    fn idle_tower_recovers_from_burnout() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Sales, Point::new(0.0, 0.0));
        let tower = registry.get_mut(id).expect("tower exists");
        tower.burnout = 0.3;
        assert!(!tower.update_fatigue(), "idle towers never act");
        assert!((tower.burnout - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn busy_tower_accumulates_burnout_and_waits_for_cooldown() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Sales, Point::new(0.0, 0.0));
        let tower = registry.get_mut(id).expect("tower exists");
        tower.targets = vec![CustomerId::new(1), CustomerId::new(2), CustomerId::new(3)];

        assert!(tower.update_fatigue(), "a fresh tower acts immediately");
        assert!((tower.burnout - 0.1).abs() < 1e-12);

        tower.rearm();
        assert_eq!(tower.cooldown, 60);
        for _ in 0..60 {
            assert!(!tower.update_fatigue());
        }
        assert_eq!(tower.cooldown, 0);
        assert!(tower.update_fatigue());
    }

    #[test]
    fn value_cap_trim_drops_targets_that_no_longer_fit() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Sales, Point::new(0.0, 0.0));
        let tower = registry.get_mut(id).expect("tower exists");
        tower.targets = vec![CustomerId::new(0), CustomerId::new(1), CustomerId::new(2)];

        tower.trim_to_value_cap(|id| match id.get() {
            0 => Some(157_500.0),
            1 => Some(150_000.0),
            2 => Some(100_000.0),
            _ => None,
        });
        assert_eq!(tower.targets, vec![CustomerId::new(0), CustomerId::new(2)]);
    }

    #[test]
    fn burnout_is_capped() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Sales, Point::new(0.0, 0.0));
        let tower = registry.get_mut(id).expect("tower exists");
        tower.targets = vec![CustomerId::new(1)];
        tower.burnout = 99.99;
        let _ = tower.update_fatigue();
        assert_eq!(tower.burnout, MAX_BURNOUT);
    }
}
