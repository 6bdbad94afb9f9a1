//! Deterministic combination of per-batch partial mappings.
//!
//! Distance and speed do not depend on the order batches are combined in;
//! transport tag order does, so batches are always folded by ascending batch
//! index regardless of the order workers finished in.

use indexmap::map::Entry;
use tracing::debug;

use crate::aggregate::{BatchOutput, PartialMapping};
use crate::errors::TallyError;

/// Fold `other` into `base` and return `base`.
///
/// Participants missing from `base` are moved over unchanged (appended after
/// existing ones); shared participants are combined with `ParticipantSummary::merge`.
pub fn combine(mut base: PartialMapping, other: PartialMapping) -> Result<PartialMapping, TallyError> {
    for (participant, summary) in other {
        match base.entry(participant) {
            Entry::Vacant(slot) => {
                slot.insert(summary);
            }
            Entry::Occupied(mut slot) => slot.get_mut().merge(&summary)?,
        }
    }
    Ok(base)
}

/// Fold all batch outputs left to right in batch-index order.
pub fn combine_all(mut outputs: Vec<BatchOutput>) -> Result<PartialMapping, TallyError> {
    outputs.sort_by_key(|output| output.index);
    let batches = outputs.len();
    let combined = outputs
        .into_iter()
        .try_fold(PartialMapping::new(), |acc, output| combine(acc, output.summaries))?;
    debug!(batches, participants = combined.len(), "combined batch outputs");
    Ok(combined)
}
