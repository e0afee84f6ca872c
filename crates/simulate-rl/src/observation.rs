use serde::Serialize;
use simulate_core::types::Frame;

use crate::sensor::StateReading;

/// One agent's observation as sent over the wire.
///
/// `data` is the camera image, channel-then-row-major, matching
/// `shape = [3, height, width]`. An agent without a camera reports shape
/// `[3, 0, 0]` and no data. State sensor readings follow under `sensors`,
/// omitted when the agent has none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub agent: String,
    pub shape: [usize; 3],
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<StateReading>,
}

impl Observation {
    pub fn from_frame(agent: impl Into<String>, frame: &Frame) -> Self {
        Self {
            agent: agent.into(),
            shape: frame.shape(),
            data: frame.to_chw(),
            sensors: Vec::new(),
        }
    }

    pub fn empty(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            shape: [Frame::CHANNELS, 0, 0],
            data: Vec::new(),
            sensors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sensors(mut self, sensors: Vec<StateReading>) -> Self {
        self.sensors = sensors;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.sensors.is_empty()
    }
}
