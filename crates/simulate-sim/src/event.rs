use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use simulate_core::types::{Frame, NodeData};

/// Per-step result envelope.
///
/// Created fresh each step, populated by the simulator and plugin hooks,
/// and serialised once as the `Step` response. `extra` entries are
/// flattened into the top-level object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventData {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<String, NodeData>,
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        serialize_with = "serialize_frames"
    )]
    pub frames: BTreeMap<String, Frame>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Keyword arguments of the request that produced this step.
    #[serde(skip)]
    pub input_kwargs: Map<String, Value>,
}

impl EventData {
    #[must_use]
    pub fn new(input_kwargs: Map<String, Value>) -> Self {
        Self {
            input_kwargs,
            ..Default::default()
        }
    }

    pub fn insert_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Serialise to the JSON text sent back to the controller.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Serialize)]
struct FrameView {
    shape: [usize; 3],
    data: Vec<u8>,
}

// Frames go out in CHW order with their shape, matching observations.
fn serialize_frames<S>(frames: &BTreeMap<String, Frame>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(frames.len()))?;
    for (name, frame) in frames {
        map.serialize_entry(
            name,
            &FrameView {
                shape: frame.shape(),
                data: frame.to_chw(),
            },
        )?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use bevy_transform::components::Transform;
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_event_serializes_to_empty_object() {
        assert_eq!(EventData::default().to_json().unwrap(), "{}");
    }

    #[test]
    fn extras_are_flattened() {
        let mut event = EventData::default();
        event.insert_extra("agent_done", json!([false]));
        event.nodes.insert(
            "cube".into(),
            NodeData::from_transform(&Transform::from_xyz(1.0, 0.0, 0.0)),
        );
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["agent_done"], json!([false]));
        assert_eq!(value["nodes"]["cube"]["position"], json!([1.0, 0.0, 0.0]));
        assert!(value.get("frames").is_none());
    }

    #[test]
    fn frames_serialize_as_chw_with_shape() {
        let mut event = EventData::default();
        event
            .frames
            .insert("cam".into(), Frame::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap());
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["frames"]["cam"]["shape"], json!([3, 1, 2]));
        assert_eq!(value["frames"]["cam"]["data"], json!([1, 4, 2, 5, 3, 6]));
    }
}
