use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::types::{ParticipantId, TransportTag};

/// Transport mode(s) used on one leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transport {
    /// Leg travelled with one mode.
    Single(TransportTag),
    /// Leg spanning several modes, in the order they were used.
    Multiple(Vec<TransportTag>),
}

impl Transport {
    /// View the tags of this leg in order.
    pub fn as_slice(&self) -> &[TransportTag] {
        match self {
            Transport::Single(tag) => std::slice::from_ref(tag),
            Transport::Multiple(tags) => tags,
        }
    }
}

impl From<&str> for Transport {
    fn from(tag: &str) -> Self {
        Transport::Single(tag.to_string())
    }
}

impl From<Vec<&str>> for Transport {
    fn from(tags: Vec<&str>) -> Self {
        Transport::Multiple(tags.into_iter().map(str::to_string).collect())
    }
}

/// One leg of the race for one participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegRecord {
    /// Participant that travelled this leg.
    pub participant: ParticipantId,
    /// Distance travelled, in km.
    pub distance: f64,
    /// Average speed over the leg, in km/h.
    pub speed: f64,
    /// Mode(s) of transport used.
    pub transport: Transport,
}

impl LegRecord {
    /// Build a leg record from borrowed parts.
    pub fn new(
        participant: impl Into<ParticipantId>,
        distance: f64,
        speed: f64,
        transport: impl Into<Transport>,
    ) -> Self {
        Self {
            participant: participant.into(),
            distance,
            speed,
            transport: transport.into(),
        }
    }

    /// Decode one leg object as found in day files.
    ///
    /// `distance` and `speed` accept JSON numbers or numeric strings. The returned
    /// error is a human readable reason; callers attach the record location.
    /// Speed sign is not checked here: `ParticipantSummary::add_leg` owns that rule.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("expected a leg object, found {}", json_kind(value)))?;
        let field = |name: &str| {
            object
                .get(name)
                .ok_or_else(|| format!("missing required field '{name}'"))
        };

        let participant = match field("participant")? {
            Value::String(name) => name.clone(),
            other => {
                return Err(format!(
                    "field 'participant' must be a string, found {}",
                    json_kind(other)
                ));
            }
        };
        let distance = numeric_field("distance", field("distance")?)?;
        if distance < 0.0 {
            return Err(format!("field 'distance' must be non-negative, got {distance}"));
        }
        let speed = numeric_field("speed", field("speed")?)?;
        let transport = transport_field(field("transport")?)?;

        Ok(Self {
            participant,
            distance,
            speed,
            transport,
        })
    }
}

fn numeric_field(name: &str, value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(format!("field '{name}' is not numeric: {value}")),
    }
}

fn transport_field(value: &Value) -> Result<Transport, String> {
    match value {
        Value::String(tag) => Ok(Transport::Single(tag.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag.clone()),
                other => Err(format!(
                    "field 'transport' entries must be strings, found {}",
                    json_kind(other)
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Transport::Multiple),
        other => Err(format!(
            "field 'transport' must be a string or a list of strings, found {}",
            json_kind(other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_single_and_multiple_transport() {
        let single = LegRecord::from_value(&json!({
            "participant": "Alice",
            "distance": 12.5,
            "speed": 40,
            "transport": "car"
        }))
        .expect("single transport leg");
        assert_eq!(single, LegRecord::new("Alice", 12.5, 40.0, "car"));

        let multiple = LegRecord::from_value(&json!({
            "participant": "Bob",
            "distance": 3.0,
            "speed": 9.5,
            "transport": ["walk", "ferry"]
        }))
        .expect("multi transport leg");
        assert_eq!(multiple.transport.as_slice(), ["walk", "ferry"]);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let leg = LegRecord::from_value(&json!({
            "participant": "Carol",
            "distance": " 7.25 ",
            "speed": "30",
            "transport": "bike"
        }))
        .expect("numeric strings");
        assert_eq!(leg.distance, 7.25);
        assert_eq!(leg.speed, 30.0);
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let err = LegRecord::from_value(&json!({
            "participant": "Alice",
            "speed": 40,
            "transport": "car"
        }))
        .unwrap_err();
        assert!(err.contains("'distance'"), "unexpected reason: {err}");
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        for bad in [json!("fast"), json!(null), json!([1]), json!("NaN")] {
            let err = LegRecord::from_value(&json!({
                "participant": "Alice",
                "distance": 1.0,
                "speed": bad,
                "transport": "car"
            }))
            .unwrap_err();
            assert!(err.contains("'speed' is not numeric"), "unexpected reason: {err}");
        }
    }

    #[test]
    fn negative_distance_and_bad_transport_are_rejected() {
        let negative = LegRecord::from_value(&json!({
            "participant": "Alice",
            "distance": -1.0,
            "speed": 10.0,
            "transport": "car"
        }));
        assert!(negative.is_err());

        let bad_transport = LegRecord::from_value(&json!({
            "participant": "Alice",
            "distance": 1.0,
            "speed": 10.0,
            "transport": ["car", 3]
        }));
        assert!(bad_transport.is_err());

        assert!(LegRecord::from_value(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn zero_speed_is_left_for_the_summary_to_reject() {
        let leg = LegRecord::from_value(&json!({
            "participant": "Alice",
            "distance": 1.0,
            "speed": 0,
            "transport": "car"
        }))
        .expect("decoding does not judge speed");
        assert_eq!(leg.speed, 0.0);
    }
}
