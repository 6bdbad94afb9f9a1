use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::files::INDEX_FILE_NAME;
use crate::data::LegRecord;
use crate::errors::TallyError;
use crate::source::{LegIter, LegSource};
use crate::transport::fs::{read_json, scan_day_files};
use crate::types::{FriendList, UnitId};

/// One unit listed by a race index with its precomputed totals.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitEntry {
    /// Unit id, relative to the race directory.
    pub unit: UnitId,
    /// Sum of leg distances in the unit, in km.
    pub distance: f64,
    /// Number of legs in the unit.
    pub legs: u64,
}

/// Participants, units, and totals of one race directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RaceIndex {
    /// Participant names as listed by the index.
    pub friends: FriendList,
    /// Units in processing order.
    pub units: Vec<UnitEntry>,
}

/// On-disk `index.json` layout: `files` rows are `[file_name, distance, legs]`.
#[derive(Deserialize)]
struct IndexFile {
    friends: FriendList,
    files: Vec<(UnitId, f64, u64)>,
}

impl RaceIndex {
    /// Read `index.json` from `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, TallyError> {
        let path = root.as_ref().join(INDEX_FILE_NAME);
        let file: IndexFile = read_json(&path).map_err(|err| {
            TallyError::Configuration(format!(
                "failed reading race index {}: {err}",
                path.display()
            ))
        })?;
        let units = file
            .files
            .into_iter()
            .map(|(unit, distance, legs)| UnitEntry {
                unit,
                distance,
                legs,
            })
            .collect();
        Ok(Self {
            friends: file.friends,
            units,
        })
    }

    /// Build an index by reading every `day_*.json` below `root`.
    ///
    /// Units are ordered by path; friends are participants in first-seen order.
    /// Any malformed record fails the scan.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self, TallyError> {
        let source = FileLegSource::new(root.as_ref());
        let mut friends = IndexSet::new();
        let mut units = Vec::new();
        for unit in scan_day_files(source.root(), false) {
            let mut entry = UnitEntry {
                unit: unit.clone(),
                distance: 0.0,
                legs: 0,
            };
            for leg in source.legs(&unit)? {
                let leg = leg?;
                entry.distance += leg.distance;
                entry.legs += 1;
                if !friends.contains(&leg.participant) {
                    friends.insert(leg.participant);
                }
            }
            units.push(entry);
        }
        debug!(
            root = %source.root().display(),
            units = units.len(),
            friends = friends.len(),
            "scanned race directory"
        );
        Ok(Self {
            friends: friends.into_iter().collect(),
            units,
        })
    }

    /// Unit ids in processing order.
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|entry| entry.unit.clone()).collect()
    }

    /// Sum of leg counts across all units.
    pub fn total_legs(&self) -> u64 {
        self.units.iter().map(|entry| entry.legs).sum()
    }

    /// Sum of distances across all units, in km.
    pub fn total_distance(&self) -> f64 {
        self.units.iter().map(|entry| entry.distance).sum()
    }
}

/// Leg source reading one JSON array of leg objects per unit file.
#[derive(Clone, Debug)]
pub struct FileLegSource {
    root: PathBuf,
}

impl FileLegSource {
    /// Create a source rooted at a race directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Race directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LegSource for FileLegSource {
    fn legs(&self, unit: &UnitId) -> Result<LegIter<'_>, TallyError> {
        let path = self.root.join(unit);
        let document: Value = read_json(&path).map_err(|err| TallyError::UnitUnavailable {
            unit: unit.clone(),
            reason: format!("{}: {err}", path.display()),
        })?;
        let Value::Array(items) = document else {
            return Err(TallyError::UnitUnavailable {
                unit: unit.clone(),
                reason: format!("{} does not contain a list of legs", path.display()),
            });
        };
        let unit = unit.clone();
        Ok(Box::new(items.into_iter().enumerate().map(move |(leg, value)| {
            LegRecord::from_value(&value).map_err(|reason| TallyError::MalformedRecord {
                unit: unit.clone(),
                leg,
                reason,
            })
        })))
    }
}
