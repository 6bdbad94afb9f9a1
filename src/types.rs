/// Participant name as it appears in leg records.
/// Examples: `Alice`, `Bob`
pub type ParticipantId = String;
/// Transport mode tag attached to a leg.
/// Examples: `car`, `bike`, `train`
pub type TransportTag = String;
/// Opaque identifier of one input unit (one day of legs).
/// Examples: `day_0001.json`, `day_0042.json`
pub type UnitId = String;
/// Position of a batch among all batches of a run (0-based).
pub type BatchIndex = usize;
/// Participant name list as reported by a race index.
/// Example: `["Alice", "Bob", "Carol"]`
pub type FriendList = Vec<ParticipantId>;
