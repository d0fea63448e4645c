use serde::{
    Deserialize,
    Deserializer,
};

/// Media kinds a pipeline endpoint can carry. The wire form is the
/// upper-case enum the server expects in `operationParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum MediaType {
    #[strum(serialize = "AUDIO")]
    Audio,
    #[strum(serialize = "VIDEO")]
    Video,
}

impl MediaType {
    /// Lower-case label used in report fields and log events.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Active,
    Disconnected,
}

impl ConnectionState {
    /// Servers report a handful of states; everything that is not an
    /// explicit disconnect counts as active.
    pub fn from_wire(raw: &str) -> Self {
        if raw == "DISCONNECTED" {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Active
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum StatKind {
    #[serde(rename = "inboundrtp")]
    InboundRtp,
    #[serde(rename = "outboundrtp")]
    OutboundRtp,
    #[default]
    #[serde(other)]
    Other,
}

/// One raw statistics record as reported by `getStats`.
///
/// Counters the server did not report deserialize as zero / absent. A
/// negative `packetsLost` (some servers emit them transiently) is
/// normalized to absent so downstream sums stay non-negative.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatRecord {
    #[serde(rename = "type", default)]
    pub kind: StatKind,
    #[serde(rename = "bytesSent", default)]
    pub bytes_sent: u64,
    #[serde(rename = "bytesReceived", default)]
    pub bytes_received: u64,
    #[serde(rename = "packetsSent", default)]
    pub packets_sent: Option<u64>,
    #[serde(rename = "packetsReceived", default)]
    pub packets_received: Option<u64>,
    #[serde(rename = "packetsLost", default, deserialize_with = "non_negative")]
    pub packets_lost: Option<u64>,
    #[serde(rename = "jitter", default)]
    pub jitter: Option<f64>,
}

fn non_negative<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value.and_then(|v| u64::try_from(v).ok()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    #[serde(rename = "type", default)]
    pub server_type: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stat_record_reads_wire_fields() {
        let record: StatRecord = serde_json::from_str(
            r#"{
                "type": "inboundrtp",
                "bytesReceived": 100,
                "packetsReceived": 50,
                "packetsLost": 5,
                "jitter": 0.004
            }"#,
        )
        .unwrap();
        assert_eq!(record.kind, StatKind::InboundRtp);
        assert_eq!(record.bytes_received, 100);
        assert_eq!(record.bytes_sent, 0);
        assert_eq!(record.packets_received, Some(50));
        assert_eq!(record.packets_lost, Some(5));
        assert_eq!(record.jitter, Some(0.004));
    }

    #[test]
    fn negative_packets_lost_reads_as_absent() {
        let record: StatRecord =
            serde_json::from_str(r#"{ "type": "outboundrtp", "bytesSent": 10, "packetsLost": -3 }"#).unwrap();
        assert_eq!(record.packets_lost, None);
    }

    #[test]
    fn unknown_stat_types_fold_to_other() {
        let record: StatRecord = serde_json::from_str(r#"{ "type": "endpoint", "inputLatency": 12 }"#).unwrap();
        assert_eq!(record.kind, StatKind::Other);
    }

    #[test]
    fn connection_state_from_wire() {
        assert_eq!(ConnectionState::from_wire("DISCONNECTED"), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::from_wire("CONNECTED"), ConnectionState::Active);
        assert_eq!(ConnectionState::from_wire("CONNECTING"), ConnectionState::Active);
    }
}
