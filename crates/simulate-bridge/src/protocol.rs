//! Message envelope and bridge connection settings.
//!
//! A request is a JSON object carrying the command name under `type`. Its
//! keyword arguments may arrive in three shapes, all merged into one map:
//!
//! ```text
//! {"type": "Step", "contents": "{\"frame_skip\": 2}"}   JSON-encoded string
//! {"type": "Step", "contents": {"frame_skip": 2}}       nested object
//! {"type": "Step", "frame_skip": 2}                     flat
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CommandError;

/// Largest accepted frame payload (64 MiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Port a controller listens on by default.
pub const DEFAULT_PORT: u16 = 55001;

/// Response sent by commands that succeed without a payload.
pub const EMPTY_RESPONSE: &str = "{}";

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded request: command name plus keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: String,
    pub kwargs: Map<String, Value>,
}

impl Message {
    pub fn new(kind: impl Into<String>, kwargs: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            kwargs,
        }
    }

    /// Decode a request payload.
    ///
    /// Keys of `contents` take precedence over flat keys of the same name.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CommandError::argument("message", format!("invalid JSON: {e}")))?;
        let Value::Object(mut map) = value else {
            return Err(CommandError::MissingType);
        };
        let kind = match map.remove("type") {
            Some(Value::String(kind)) if !kind.is_empty() => kind,
            _ => return Err(CommandError::MissingType),
        };

        let contents = match map.remove("contents") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(contents)) => contents,
            Some(Value::String(text)) if text.trim().is_empty() => Map::new(),
            Some(Value::String(text)) => match serde_json::from_str(&text) {
                Ok(Value::Object(contents)) => contents,
                Ok(_) => {
                    return Err(CommandError::argument(&kind, "contents is not a JSON object"))
                }
                Err(e) => {
                    return Err(CommandError::argument(&kind, format!("invalid contents: {e}")))
                }
            },
            Some(_) => {
                return Err(CommandError::argument(&kind, "contents is not a JSON object"));
            }
        };

        let mut kwargs = map;
        kwargs.extend(contents);
        Ok(Self { kind, kwargs })
    }

    /// Encode as a flat request, the way a controller sends it.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut map = self.kwargs.clone();
        map.insert("type".into(), Value::String(self.kind.clone()));
        serde_json::to_vec(&map)
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Connection manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long the bridge loop waits for a frame before polling pending
    /// commands again.
    #[serde(default = "default_poll_interval", with = "millis")]
    pub poll_interval: Duration,
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_host() -> String {
    "localhost".into()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_poll_interval() -> Duration {
    Duration::from_millis(5)
}

const fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            poll_interval: default_poll_interval(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
