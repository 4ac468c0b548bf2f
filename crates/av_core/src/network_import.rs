//! Network import: raw location/connection records and a JSON file loader.
//!
//! The engine only needs the records; the JSON document is one concrete
//! source format:
//!
//! ```json
//! {
//!   "locations":   [{ "id": 1, "x": 13.40, "y": 52.52 }],
//!   "connections": [{ "id": 0, "source": 1, "target": 2, "length": 120.5,
//!                     "max_speed": "30 mph", "oneway": false, "name": "Main St" }]
//! }
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::{Connection, LocationId, RoadAttributes, RoadNetwork, DEFAULT_SPEED_KPH};

const MPH_TO_KPH: f64 = 1.609344;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: LocationId,
    pub x: f64,
    pub y: f64,
}

/// Speed as found in source data: a plain km/h number or an OSM-style tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxSpeed {
    Kph(f64),
    /// Tag such as `"30 mph"`; the first integer is read as mph.
    Tag(String),
}

impl MaxSpeed {
    pub fn to_kph(&self) -> f64 {
        match self {
            MaxSpeed::Kph(kph) if kph.is_finite() && *kph > 0.0 => *kph,
            MaxSpeed::Kph(_) => DEFAULT_SPEED_KPH,
            MaxSpeed::Tag(tag) => parse_speed_tag(tag),
        }
    }
}

fn parse_speed_tag(tag: &str) -> f64 {
    let digits: String = tag
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<f64>() {
        Ok(mph) if mph > 0.0 => mph * MPH_TO_KPH,
        _ => DEFAULT_SPEED_KPH,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub id: i64,
    pub source: LocationId,
    pub target: LocationId,
    /// Metres; absent means unknown (+∞).
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<MaxSpeed>,
    #[serde(default)]
    pub oneway: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub highway: String,
    #[serde(default, rename = "ref")]
    pub reference: String,
}

impl ConnectionRecord {
    pub fn new(id: i64, source: LocationId, target: LocationId) -> Self {
        Self {
            id,
            source,
            target,
            length: None,
            max_speed: None,
            oneway: false,
            name: String::new(),
            highway: String::new(),
            reference: String::new(),
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_speed_kph(mut self, kph: f64) -> Self {
        self.max_speed = Some(MaxSpeed::Kph(kph));
        self
    }

    pub fn one_way(mut self) -> Self {
        self.oneway = true;
        self
    }

    /// Connection with defaults applied: unknown length is `+∞`, unknown speed 50 km/h.
    pub fn to_connection(&self) -> Connection {
        let length_m = match self.length {
            Some(length) if length >= 0.0 => length,
            _ => f64::INFINITY,
        };
        let max_speed_kph = self
            .max_speed
            .as_ref()
            .map(MaxSpeed::to_kph)
            .unwrap_or(DEFAULT_SPEED_KPH);
        Connection::new(self.source, self.target, length_m, max_speed_kph).with_attributes(
            RoadAttributes {
                name: self.name.clone(),
                road_class: self.highway.clone(),
                reference: self.reference.clone(),
            },
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkRecords {
    pub locations: Vec<LocationRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl NetworkRecords {
    pub fn into_network(self, source: impl Into<String>) -> SimResult<RoadNetwork> {
        RoadNetwork::from_records(source, &self.locations, &self.connections)
    }
}

/// Source identity used to key cached validation results: the file stem.
pub fn source_identity(path: &Path) -> SimResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .ok_or_else(|| SimError::InvalidRecord(format!("unusable network path {}", path.display())))
}

/// Reads a JSON network document and builds the road network from it.
pub fn load_network_file(path: &Path) -> SimResult<RoadNetwork> {
    let data = fs::read_to_string(path)?;
    let records: NetworkRecords = serde_json::from_str(&data)?;
    let source = source_identity(path)?;
    let raw_locations = records.locations.len();
    let network = records.into_network(source)?;
    info!(
        "loaded network '{}': {} of {} locations kept, {} directed connections",
        network.source(),
        network.location_count(),
        raw_locations,
        network.connection_count()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_tags_are_read_as_mph() {
        assert!((MaxSpeed::Tag("30 mph".into()).to_kph() - 48.28032).abs() < 1e-9);
        assert!((MaxSpeed::Tag("['25', '35']".into()).to_kph() - 25.0 * MPH_TO_KPH).abs() < 1e-9);
        assert_eq!(MaxSpeed::Tag("signals".into()).to_kph(), DEFAULT_SPEED_KPH);
        assert_eq!(MaxSpeed::Kph(80.0).to_kph(), 80.0);
        assert_eq!(MaxSpeed::Kph(0.0).to_kph(), DEFAULT_SPEED_KPH);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let record: ConnectionRecord =
            serde_json::from_str(r#"{"source": 1, "target": 2}"#).expect("record");
        let connection = record.to_connection();
        assert!(connection.length_m.is_infinite());
        assert_eq!(connection.max_speed_kph, DEFAULT_SPEED_KPH);
        assert!(!record.oneway);
    }

    #[test]
    fn attributes_are_carried_through() {
        let record: ConnectionRecord = serde_json::from_str(
            r#"{"source": 1, "target": 2, "length": 12.5, "max_speed": 40,
                "name": "", "highway": "residential", "ref": "B96"}"#,
        )
        .expect("record");
        let connection = record.to_connection();
        assert_eq!(connection.length_m, 12.5);
        assert_eq!(connection.max_speed_kph, 40.0);
        assert_eq!(connection.attributes.road_class, "residential");
        assert_eq!(connection.attributes.label(), "B96");
    }

    #[test]
    fn records_build_a_pruned_network() {
        let records = NetworkRecords {
            locations: vec![
                LocationRecord { id: 1, x: 0.0, y: 0.0 },
                LocationRecord { id: 2, x: 10.0, y: 0.0 },
                LocationRecord { id: 3, x: 20.0, y: 0.0 },
            ],
            connections: vec![ConnectionRecord::new(0, 1, 2).with_length(10.0).one_way()],
        };
        let network = records.into_network("line").expect("network");
        assert_eq!(network.location_ids(), &[1, 2]);
        assert_eq!(network.connection_count(), 1);
        assert_eq!(network.source(), "line");
    }

    #[test]
    fn dangling_connection_is_fatal() {
        let records = NetworkRecords {
            locations: vec![LocationRecord { id: 1, x: 0.0, y: 0.0 }],
            connections: vec![ConnectionRecord::new(0, 1, 9).with_length(1.0)],
        };
        assert!(matches!(
            records.into_network("bad"),
            Err(SimError::InvalidLocation(9))
        ));
    }
}
