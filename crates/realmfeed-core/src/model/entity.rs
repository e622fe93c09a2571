// ── Entity types ──
//
// Identity, position, and realm of one visualized item.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Number of axes in the coordinate space.
pub const AXES: usize = 3;

// ── EntityId ────────────────────────────────────────────────────────

/// Stable identifier of an entity across updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Coordinate ──────────────────────────────────────────────────────

/// Semantic position in the abstract multi-axis space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate(pub [f64; AXES]);

impl Coordinate {
    pub fn axes(&self) -> &[f64; AXES] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl TryFrom<&[f64]> for Coordinate {
    type Error = usize;

    /// Fails with the offending length when `values` is not `AXES` long.
    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        <[f64; AXES]>::try_from(values)
            .map(Self)
            .map_err(|_| values.len())
    }
}

/// Inclusive bounds of a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Non-empty, ordered, and with a finite span.
    pub fn is_usable(&self) -> bool {
        self.min < self.max && self.span().is_finite()
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Per-axis bounds of the coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateDomain(pub [AxisBounds; AXES]);

impl CoordinateDomain {
    pub fn axes(&self) -> &[AxisBounds; AXES] {
        &self.0
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.0
            .iter()
            .zip(coordinate.axes())
            .all(|(bounds, v)| bounds.contains(*v))
    }

    pub fn clamp(&self, coordinate: Coordinate) -> Coordinate {
        let mut out = coordinate.0;
        for (v, bounds) in out.iter_mut().zip(&self.0) {
            *v = bounds.clamp(*v);
        }
        Coordinate(out)
    }
}

impl Default for CoordinateDomain {
    fn default() -> Self {
        Self([AxisBounds::new(-100.0, 100.0); AXES])
    }
}

// ── Realm ───────────────────────────────────────────────────────────

/// Category tag used downstream for color-coding.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Realm {
    Ember,
    Tide,
    Grove,
    Gale,
    Stone,
    Void,
}

impl Realm {
    /// Relative frequency when the synthesizer picks a realm.
    pub fn weight(self) -> u32 {
        match self {
            Self::Ember | Self::Tide => 4,
            Self::Grove | Self::Gale => 3,
            Self::Stone => 2,
            Self::Void => 1,
        }
    }
}

// ── Entity ──────────────────────────────────────────────────────────

/// One visualized item.
///
/// Field names on the wire follow the emitted-event contract:
/// `category` for the realm and `timestamp` (epoch millis) for the last update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub coordinate: Coordinate,
    #[serde(rename = "category")]
    pub realm: Realm,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn coordinate_from_slice_checks_dimension() {
        let ok = Coordinate::try_from([1.0, 2.0, 3.0].as_slice()).unwrap();
        assert_eq!(ok.axes(), &[1.0, 2.0, 3.0]);

        assert_eq!(Coordinate::try_from([1.0, 2.0].as_slice()), Err(2));
        assert_eq!(Coordinate::try_from([0.0; 4].as_slice()), Err(4));
    }

    #[test]
    fn domain_clamps_each_axis() {
        let domain = CoordinateDomain([
            AxisBounds::new(0.0, 10.0),
            AxisBounds::new(-5.0, 5.0),
            AxisBounds::new(-1.0, 1.0),
        ]);
        let clamped = domain.clamp(Coordinate([12.0, -7.5, 0.5]));
        assert_eq!(clamped, Coordinate([10.0, -5.0, 0.5]));
        assert!(domain.contains(&clamped));
        assert!(!domain.contains(&Coordinate([12.0, 0.0, 0.0])));
    }

    #[test]
    fn axis_bounds_need_a_finite_nonempty_span() {
        assert!(AxisBounds::new(-1.0, 1.0).is_usable());
        assert!(!AxisBounds::new(3.0, 3.0).is_usable());
        assert!(!AxisBounds::new(5.0, -5.0).is_usable());
        assert!(!AxisBounds::new(f64::NAN, 1.0).is_usable());
        assert!(!AxisBounds::new(0.0, f64::INFINITY).is_usable());
        assert!(!AxisBounds::new(-f64::MAX, f64::MAX).is_usable());
    }

    #[test]
    fn realm_parses_case_insensitively() {
        assert_eq!("TIDE".parse::<Realm>().unwrap(), Realm::Tide);
        assert_eq!("void".parse::<Realm>().unwrap(), Realm::Void);
        assert!("aether".parse::<Realm>().is_err());
        assert_eq!(Realm::Grove.to_string(), "grove");
    }

    #[test]
    fn every_realm_has_positive_weight() {
        assert!(Realm::iter().all(|r| r.weight() > 0));
    }

    #[test]
    fn entity_serializes_with_event_field_names() {
        let entity = Entity {
            id: EntityId::from("e1"),
            coordinate: Coordinate([1.0, 2.0, 3.0]),
            realm: Realm::Ember,
            updated_at: DateTime::from_timestamp_millis(1_760_000_000_000).unwrap(),
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "e1",
                "coordinate": [1.0, 2.0, 3.0],
                "category": "ember",
                "timestamp": 1_760_000_000_000_i64
            })
        );
    }
}
