use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_time_step() -> f32 {
    0.02
}
const fn default_frame_skip() -> u32 {
    1
}
const fn default_true() -> bool {
    true
}
const fn default_ambient_color() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}
const fn default_gravity() -> [f32; 3] {
    [0.0, -9.81, 0.0]
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Process-wide simulation configuration.
///
/// Starts from defaults, is mutated by the `Initialize` command's keyword
/// arguments, and may be overridden for a single step (see
/// [`StepOverrides`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Physics advance per frame, in seconds (default: 0.02).
    #[serde(default = "default_time_step")]
    pub time_step: f32,

    /// Physics advances per externally visible step (default: 1).
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,

    /// Include node transform snapshots in step results.
    #[serde(default = "default_true")]
    pub return_nodes: bool,

    /// Include rendered camera frames in step results.
    #[serde(default = "default_true")]
    pub return_frames: bool,

    /// Nodes to snapshot. Empty means all nodes.
    #[serde(default)]
    pub node_filter: BTreeSet<String>,

    /// Cameras to render. Empty means all cameras.
    #[serde(default)]
    pub camera_filter: BTreeSet<String>,

    /// Ambient light colour, RGB in [0, 1].
    #[serde(default = "default_ambient_color")]
    pub ambient_color: [f32; 3],

    /// Gravity vector [x, y, z] in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            frame_skip: default_frame_skip(),
            return_nodes: true,
            return_frames: true,
            node_filter: BTreeSet::new(),
            camera_filter: BTreeSet::new(),
            ambient_color: default_ambient_color(),
            gravity: default_gravity(),
        }
    }
}

impl SimulationConfig {
    /// Keys recognized by [`apply_kwargs`](Self::apply_kwargs).
    pub const KEYS: [&'static str; 8] = [
        "time_step",
        "frame_skip",
        "return_nodes",
        "return_frames",
        "node_filter",
        "camera_filter",
        "ambient_color",
        "gravity",
    ];

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_step.is_nan() || self.time_step <= 0.0 {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }
        if self.frame_skip == 0 {
            return Err(ConfigError::ZeroFrameSkip);
        }
        if self
            .ambient_color
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(ConfigError::InvalidValue {
                field: "ambient_color".into(),
                message: "components must be in [0, 1]".into(),
            });
        }
        Ok(())
    }

    /// Apply recognized keys from a keyword-argument map.
    ///
    /// Unrecognized keys are ignored; they belong to other consumers such as
    /// plugins. The update is all-or-nothing: on error `self` is unchanged.
    pub fn apply_kwargs(&mut self, kwargs: &Map<String, Value>) -> Result<(), ConfigError> {
        let mut next = self.clone();
        if let Some(v) = parse_key(kwargs, "time_step")? {
            next.time_step = v;
        }
        if let Some(v) = parse_key(kwargs, "frame_skip")? {
            next.frame_skip = v;
        }
        if let Some(v) = parse_key(kwargs, "return_nodes")? {
            next.return_nodes = v;
        }
        if let Some(v) = parse_key(kwargs, "return_frames")? {
            next.return_frames = v;
        }
        if let Some(v) = parse_key::<Option<BTreeSet<String>>>(kwargs, "node_filter")? {
            next.node_filter = v.unwrap_or_default();
        }
        if let Some(v) = parse_key::<Option<BTreeSet<String>>>(kwargs, "camera_filter")? {
            next.camera_filter = v.unwrap_or_default();
        }
        if let Some(v) = parse_key(kwargs, "ambient_color")? {
            next.ambient_color = v;
        }
        if let Some(v) = parse_key(kwargs, "gravity")? {
            next.gravity = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Whether `node` passes the node filter.
    #[must_use]
    pub fn wants_node(&self, node: &str) -> bool {
        self.node_filter.is_empty() || self.node_filter.contains(node)
    }

    /// Whether `camera` passes the camera filter.
    #[must_use]
    pub fn wants_camera(&self, camera: &str) -> bool {
        self.camera_filter.is_empty() || self.camera_filter.contains(camera)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_key<T: DeserializeOwned>(
    kwargs: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    kwargs
        .get(key)
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// StepOverrides
// ---------------------------------------------------------------------------

/// Per-step overrides carried by a `Step` request.
///
/// [`apply`](Self::apply) returns the cached configuration so the caller can
/// restore it once the step has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOverrides {
    #[serde(default)]
    pub frame_skip: Option<u32>,
    #[serde(default)]
    pub time_step: Option<f32>,
    #[serde(default)]
    pub return_nodes: Option<bool>,
    #[serde(default)]
    pub return_frames: Option<bool>,
}

impl StepOverrides {
    /// Extract overrides from a keyword-argument map.
    pub fn from_kwargs(kwargs: &Map<String, Value>) -> Result<Self, ConfigError> {
        Ok(Self {
            frame_skip: parse_key(kwargs, "frame_skip")?,
            time_step: parse_key(kwargs, "time_step")?,
            return_nodes: parse_key(kwargs, "return_nodes")?,
            return_frames: parse_key(kwargs, "return_frames")?,
        })
    }

    /// Whether no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frame_skip.is_none()
            && self.time_step.is_none()
            && self.return_nodes.is_none()
            && self.return_frames.is_none()
    }

    /// Apply to `config`, returning the configuration to restore afterwards.
    ///
    /// On validation failure `config` is left unchanged.
    pub fn apply(&self, config: &mut SimulationConfig) -> Result<SimulationConfig, ConfigError> {
        let cached = config.clone();
        let mut next = config.clone();
        if let Some(v) = self.frame_skip {
            next.frame_skip = v;
        }
        if let Some(v) = self.time_step {
            next.time_step = v;
        }
        if let Some(v) = self.return_nodes {
            next.return_nodes = v;
        }
        if let Some(v) = self.return_frames {
            next.return_frames = v;
        }
        next.validate()?;
        *config = next;
        Ok(cached)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
