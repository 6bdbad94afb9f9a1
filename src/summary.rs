//! Per-participant accumulator and the weighted-harmonic speed merge.
//!
//! A summary never stores total travel time. Each fold keeps
//! `speed == distance / time` by combining the running average with the
//! incoming one as
//!
//! ```text
//! new_speed = old_speed * speed * (old_distance + distance)
//!           / (old_distance * speed + distance * old_speed)
//! ```
//!
//! which is the same quantity as `(d1 + d2) / (d1 / s1 + d2 / s2)`. Because the
//! fold only depends on (distance, speed) pairs, folding a whole summary in is
//! equivalent to replaying the legs that built it.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::constants::summary::INITIAL_SPEED;
use crate::data::{LegRecord, Transport};
use crate::errors::TallyError;
use crate::types::TransportTag;

/// Running totals for one participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    /// Total distance travelled, in km.
    pub distance: f64,
    /// Average speed over all legs (total distance / total time), in km/h.
    ///
    /// Holds a placeholder until the first leg with distance arrives.
    pub speed: f64,
    /// Transport modes in first-seen order, without duplicates.
    pub transport: IndexSet<TransportTag>,
}

impl Default for ParticipantSummary {
    fn default() -> Self {
        Self {
            distance: 0.0,
            speed: INITIAL_SPEED,
            transport: IndexSet::new(),
        }
    }
}

impl ParticipantSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one leg into this summary.
    ///
    /// Fails with `ZeroOrNegativeSpeed` when `speed` is not a positive finite
    /// number and with `InvalidDistance` when `distance` is negative or not
    /// finite. A rejected leg leaves the summary untouched.
    pub fn add_leg(
        &mut self,
        distance: f64,
        speed: f64,
        transport: &Transport,
    ) -> Result<(), TallyError> {
        self.fold(distance, speed, transport.as_slice())
    }

    /// Fold a decoded leg record into this summary.
    pub fn add_record(&mut self, record: &LegRecord) -> Result<(), TallyError> {
        self.add_leg(record.distance, record.speed, &record.transport)
    }

    /// Fold another participant summary (typically from another batch) into this one.
    ///
    /// Produces the same distance and speed as replaying the other summary's legs.
    pub fn merge(&mut self, other: &ParticipantSummary) -> Result<(), TallyError> {
        self.fold(other.distance, other.speed, &other.transport)
    }

    /// Transport tags in first-seen order.
    pub fn transport_tags(&self) -> Vec<&str> {
        self.transport.iter().map(String::as_str).collect()
    }

    fn fold<'a, I>(&mut self, distance: f64, speed: f64, tags: I) -> Result<(), TallyError>
    where
        I: IntoIterator<Item = &'a TransportTag>,
    {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(TallyError::ZeroOrNegativeSpeed { speed });
        }
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(TallyError::InvalidDistance { distance });
        }

        // Speed must be combined against the distance held before this leg.
        if self.distance == 0.0 {
            self.speed = speed;
        } else if distance > 0.0 {
            self.speed = self.speed * speed * (self.distance + distance)
                / (self.distance * speed + distance * self.speed);
        }
        self.distance += distance;

        for tag in tags {
            if !self.transport.contains(tag) {
                self.transport.insert(tag.clone());
            }
        }
        Ok(())
    }
}
