//! Leg sources: where batch workers read their input units from.
//!
//! Ownership model:
//! - `LegSource` is the worker-facing interface; it is shared read-only by all
//!   workers of a run.
//! - A unit's legs are produced lazily, one decoded record at a time, so a bad
//!   record surfaces only when the worker reaches it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::LegRecord;
use crate::errors::TallyError;
use crate::types::UnitId;

/// Filesystem race directories (`index.json` plus per-day leg files).
pub mod file_source;

pub use file_source::{FileLegSource, RaceIndex, UnitEntry};

/// Ordered stream of decoded legs for one unit.
pub type LegIter<'a> = Box<dyn Iterator<Item = Result<LegRecord, TallyError>> + 'a>;

/// Worker-facing leg source interface.
///
/// For a fixed dataset, `legs` must yield the same records in the same order on
/// every call.
pub trait LegSource: Send + Sync {
    /// Open `unit` and stream its legs in file order.
    ///
    /// Returns `UnitUnavailable` (or an IO error) when the unit cannot be opened,
    /// and yields `MalformedRecord` items for records that cannot be decoded.
    fn legs(&self, unit: &UnitId) -> Result<LegIter<'_>, TallyError>;
}

/// Leg source backed by records held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLegSource {
    units: Arc<HashMap<UnitId, Vec<LegRecord>>>,
    order: Vec<UnitId>,
}

impl InMemoryLegSource {
    /// Create a source from `(unit, legs)` pairs; `unit_ids` follows the given order.
    pub fn new<I, U>(units: I) -> Self
    where
        I: IntoIterator<Item = (U, Vec<LegRecord>)>,
        U: Into<UnitId>,
    {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for (unit, legs) in units {
            let unit = unit.into();
            if map.insert(unit.clone(), legs).is_none() {
                order.push(unit);
            }
        }
        Self {
            units: Arc::new(map),
            order,
        }
    }

    /// Unit ids in insertion order.
    pub fn unit_ids(&self) -> &[UnitId] {
        &self.order
    }

    /// Sum of leg counts across all units.
    pub fn total_legs(&self) -> u64 {
        self.units.values().map(|legs| legs.len() as u64).sum()
    }

    /// Sum of leg distances across all units.
    pub fn total_distance(&self) -> f64 {
        self.order
            .iter()
            .filter_map(|unit| self.units.get(unit))
            .flat_map(|legs| legs.iter().map(|leg| leg.distance))
            .sum()
    }
}

impl LegSource for InMemoryLegSource {
    fn legs(&self, unit: &UnitId) -> Result<LegIter<'_>, TallyError> {
        let legs = self
            .units
            .get(unit)
            .ok_or_else(|| TallyError::UnitUnavailable {
                unit: unit.clone(),
                reason: "unit is not registered with the in-memory source".to_string(),
            })?;
        Ok(Box::new(legs.iter().cloned().map(Ok)))
    }
}
