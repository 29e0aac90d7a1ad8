//! Packet classification for decoded records.
//!
//! Sensor nodes tag their JSON with a `node_type` marker. Classification is
//! a read-only side channel: the record has already been emitted by the time
//! it is classified, so nothing here may fail loudly. Unparseable or
//! unfamiliar records get a definite `Unclassified` instead of an error.

use serde_json::Value;

use crate::decode::DecodedRecord;

/// Marker value identifying the presence sensor node.
const PRESENCE_NODE_TYPE: &str = "HP";

/// A classified presence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Subject entered sensing range.
    Enter,
    /// Subject left sensing range.
    Exit,
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A presence transition from the presence sensor node.
    Presence(PresenceEvent),
    /// Heart-rate telemetry.
    HeartRate,
    /// Anything else, including parse failures and hex records.
    Unclassified,
}

/// Classify a decoded record.
///
/// Only `Text` records are considered; the text must parse as a JSON
/// object. Presence packets carry `"node_type": "HP"` plus an `"event"`
/// field; heart-rate packets carry an `"avg_bpm"` or `"ir_value"` field.
pub fn classify(record: &DecodedRecord) -> Classification {
    let text = match record {
        DecodedRecord::Text(text) => text,
        DecodedRecord::RawHex(_) => return Classification::Unclassified,
    };

    let parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Classification::Unclassified,
    };

    let obj = match parsed.as_object() {
        Some(obj) => obj,
        None => return Classification::Unclassified,
    };

    if obj.get("node_type").and_then(Value::as_str) == Some(PRESENCE_NODE_TYPE) {
        match obj.get("event").and_then(Value::as_str) {
            Some("ENTER") => return Classification::Presence(PresenceEvent::Enter),
            Some("EXIT") => return Classification::Presence(PresenceEvent::Exit),
            _ => return Classification::Unclassified,
        }
    }

    if obj.contains_key("avg_bpm") || obj.contains_key("ir_value") {
        return Classification::HeartRate;
    }

    Classification::Unclassified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> DecodedRecord {
        DecodedRecord::Text(s.to_string())
    }

    #[test]
    fn test_presence_exit() {
        let record = text(r#"{"node_type":"HP","event":"EXIT"}"#);
        assert_eq!(
            classify(&record),
            Classification::Presence(PresenceEvent::Exit)
        );
    }

    #[test]
    fn test_presence_enter() {
        let record = text(r#"{"node_type":"HP","event":"ENTER","rssi":-40}"#);
        assert_eq!(
            classify(&record),
            Classification::Presence(PresenceEvent::Enter)
        );
    }

    #[test]
    fn test_presence_unknown_event_value() {
        let record = text(r#"{"node_type":"HP","event":"LOITER"}"#);
        assert_eq!(classify(&record), Classification::Unclassified);
    }

    #[test]
    fn test_presence_missing_event_field() {
        let record = text(r#"{"node_type":"HP"}"#);
        assert_eq!(classify(&record), Classification::Unclassified);
    }

    #[test]
    fn test_heartrate_avg_bpm() {
        let record = text(r#"{"node_type":"HR","avg_bpm":72,"ir_value":10432}"#);
        assert_eq!(classify(&record), Classification::HeartRate);
    }

    #[test]
    fn test_heartrate_ir_value_only() {
        let record = text(r#"{"ir_value":9981}"#);
        assert_eq!(classify(&record), Classification::HeartRate);
    }

    #[test]
    fn test_wrong_node_type_is_not_presence() {
        let record = text(r#"{"node_type":"XX","event":"EXIT"}"#);
        assert_eq!(classify(&record), Classification::Unclassified);
    }

    #[test]
    fn test_parse_failure_is_silent() {
        assert_eq!(classify(&text("not json at all")), Classification::Unclassified);
        assert_eq!(classify(&text("{truncated")), Classification::Unclassified);
        assert_eq!(classify(&text("")), Classification::Unclassified);
    }

    #[test]
    fn test_non_object_json() {
        assert_eq!(classify(&text("[1,2,3]")), Classification::Unclassified);
        assert_eq!(classify(&text("42")), Classification::Unclassified);
    }

    #[test]
    fn test_hex_record_never_classified() {
        let record = DecodedRecord::RawHex("fffe".to_string());
        assert_eq!(classify(&record), Classification::Unclassified);
    }
}
