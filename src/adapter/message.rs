use crate::domain::LogRecord;
use serde::{Deserialize, Serialize};

/// JSON document sent to Logstash for every record.
///
/// Key names and presence are fixed; missing container metadata is sent
/// as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogstashMessage {
    pub message: String,
    #[serde(rename = "docker.name")]
    pub name: String,
    #[serde(rename = "docker.id")]
    pub id: String,
    #[serde(rename = "docker.image")]
    pub image: String,
    #[serde(rename = "docker.hostname")]
    pub hostname: String,
}

impl LogstashMessage {
    /// Encodes the message as a single JSON object without a trailing newline.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl From<LogRecord> for LogstashMessage {
    fn from(record: LogRecord) -> Self {
        let container = record.container;
        Self {
            message: record.data,
            name: container.name.unwrap_or_default(),
            id: container.id.unwrap_or_default(),
            image: container.image.unwrap_or_default(),
            hostname: container.hostname.unwrap_or_default(),
        }
    }
}

impl From<&LogRecord> for LogstashMessage {
    fn from(record: &LogRecord) -> Self {
        Self::from(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContainerMeta;
    use serde_json::Value;

    const KEYS: [&str; 5] = [
        "message",
        "docker.name",
        "docker.id",
        "docker.image",
        "docker.hostname",
    ];

    #[test]
    fn test_direct_field_mapping() {
        let record = LogRecord::new(
            "GET /health 200",
            ContainerMeta::new("f00dfeed", "/web", "nginx:1.27", "web-1"),
        );

        let message = LogstashMessage::from(record);
        assert_eq!(message.message, "GET /health 200");
        assert_eq!(message.name, "/web");
        assert_eq!(message.id, "f00dfeed");
        assert_eq!(message.image, "nginx:1.27");
        assert_eq!(message.hostname, "web-1");
    }

    #[test]
    fn test_payload_has_exactly_the_fixed_string_keys() {
        let record = LogRecord::new(
            "line",
            ContainerMeta::new("id", "/name", "image", "host"),
        );
        let payload = LogstashMessage::from(record).to_payload().unwrap();

        let value: Value = serde_json::from_slice(&payload).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), KEYS.len());
        for key in KEYS {
            assert!(object[key].is_string(), "{key} should be a string");
        }
    }

    #[test]
    fn test_missing_metadata_becomes_empty_strings() {
        let payload = LogstashMessage::from(LogRecord::bare("orphan line"))
            .to_payload()
            .unwrap();

        let value: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["message"], "orphan line");
        for key in &KEYS[1..] {
            assert_eq!(value[*key], "", "{key} should be present and empty");
        }
    }

    #[test]
    fn test_payload_is_single_line_and_escapes_content() {
        let record = LogRecord::bare("multi\nline \"quoted\" \u{1F600}");
        let payload = LogstashMessage::from(&record).to_payload().unwrap();

        assert!(!payload.contains(&b'\n'));
        let decoded: LogstashMessage = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded.message, record.data);
    }

    #[test]
    fn test_key_order_matches_wire_format() {
        let payload = LogstashMessage::from(LogRecord::new(
            "m",
            ContainerMeta::new("i", "n", "im", "h"),
        ))
        .to_payload()
        .unwrap();

        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"message":"m","docker.name":"n","docker.id":"i","docker.image":"im","docker.hostname":"h"}"#
        );
    }

    #[test]
    fn test_encoding_never_fails_on_hostile_content() {
        let lines = [
            "\u{0}nul and \u{7}bell".to_string(),
            "\u{FFFD} replacement \u{1b}[31mansi\u{1b}[0m".to_string(),
            "\\ backslash \t tab \r return".to_string(),
            "x".repeat(256 * 1024),
        ];

        for line in lines {
            let record = LogRecord::new(line.clone(), ContainerMeta::new("\u{0}", "", "\"", "\n"));
            let payload = LogstashMessage::from(record).to_payload().unwrap();
            let decoded: LogstashMessage = serde_json::from_slice(&payload).unwrap();
            assert_eq!(decoded.message, line);
            assert!(!payload.contains(&b'\n'));
        }
    }
}
