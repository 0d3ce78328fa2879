use churn_defence_core::{Point, SimulationConfig, TargetingStrategy, TowerKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter separating the coordinates of a point argument.
const COORDINATE_DELIMITER: char = ',';

/// Starting conditions loaded from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    /// Simulation tunables; omitted fields fall back to their defaults.
    pub(crate) simulation: SimulationConfig,
    /// Towers placed before the first tick, in order.
    pub(crate) towers: Vec<TowerPlacement>,
    /// Tick on which a product upgrade is started, if any.
    pub(crate) product_upgrade_at: Option<u32>,
}

impl Scenario {
    /// Parses a scenario from its TOML representation.
    pub(crate) fn from_toml(value: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = toml::from_str(value).map_err(ScenarioError::InvalidToml)?;
        for tower in &scenario.towers {
            if let Some(strategy) = tower.strategy {
                if strategy.tower_kind() != tower.kind {
                    return Err(ScenarioError::MismatchedStrategy(tower.kind));
                }
            }
        }
        Ok(scenario)
    }
}

/// Tower described by a scenario file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerPlacement {
    /// Type of tower to place.
    pub(crate) kind: TowerKind,
    /// Horizontal coordinate of the tower centre.
    pub(crate) x: f64,
    /// Vertical coordinate of the tower centre.
    pub(crate) y: f64,
    /// Strategy applied right after placement.
    #[serde(default)]
    pub(crate) strategy: Option<TargetingStrategy>,
}

impl TowerPlacement {
    pub(crate) fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Errors that can occur while reading scenario input.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The scenario file was not valid TOML or did not match the schema.
    #[error("could not parse scenario: {0}")]
    InvalidToml(#[source] toml::de::Error),
    /// A tower was given a strategy belonging to another tower kind.
    #[error("strategy does not apply to {0:?} towers")]
    MismatchedStrategy(TowerKind),
    /// A point argument did not have the `x,y` form.
    #[error("could not parse point '{0}', expected x,y")]
    InvalidPoint(String),
}

/// Parses an `x,y` command-line argument into a canvas point.
pub(crate) fn parse_point(value: &str) -> Result<Point, ScenarioError> {
    let invalid = || ScenarioError::InvalidPoint(value.to_owned());
    let (x, y) = value.split_once(COORDINATE_DELIMITER).ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}
