use bevy_math::{Quat, Vec3};
use bevy_transform::components::Transform;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ForceMode
// ---------------------------------------------------------------------------

/// How a force passed to [`SceneEngine::add_force`](crate::scene::SceneEngine::add_force)
/// is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// Continuous force, scaled by mass, applied over the next physics step.
    #[default]
    Force,
    /// Instant change in momentum.
    Impulse,
    /// Continuous acceleration, ignoring mass.
    Acceleration,
    /// Instant change in velocity, ignoring mass.
    VelocityChange,
}

impl ForceMode {
    /// Whether the force is consumed immediately rather than over a step.
    #[must_use]
    pub const fn is_instant(self) -> bool {
        matches!(self, Self::Impulse | Self::VelocityChange)
    }

    /// Whether mass scales the applied force.
    #[must_use]
    pub const fn uses_mass(self) -> bool {
        matches!(self, Self::Force | Self::Impulse)
    }
}

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Transform snapshot of a scene node, as reported in step results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub position: [f32; 3],
    /// Quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f32; 3]>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl NodeData {
    /// Snapshot a transform with no velocity.
    #[must_use]
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
            scale: transform.scale.to_array(),
            velocity: None,
            active: true,
        }
    }

    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = Some([velocity.x, velocity.y, velocity.z]);
        self
    }

    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Rebuild the transform this snapshot was taken from.
    #[must_use]
    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation),
            scale: Vec3::from_array(self.scale),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A rendered RGB8 image, stored interleaved (row-major, HWC).
///
/// # Example
///
/// ```
/// use simulate_core::types::Frame;
///
/// let frame = Frame::filled(2, 1, [10, 20, 30]);
/// assert_eq!(frame.data(), &[10, 20, 30, 10, 20, 30]);
/// assert_eq!(frame.to_chw(), vec![10, 10, 20, 20, 30, 30]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Bytes per pixel (RGB8).
    pub const CHANNELS: usize = 3;

    /// Create a zero-filled frame.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    /// Create a frame where every pixel is `rgb`.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * Self::CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw interleaved RGB8 bytes. Returns `None` on size mismatch.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved pixel bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Observation shape `[channels, height, width]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [Self::CHANNELS, self.height as usize, self.width as usize]
    }

    /// Repack into channel-then-row-major (CHW) order.
    #[must_use]
    pub fn to_chw(&self) -> Vec<u8> {
        let plane = self.width as usize * self.height as usize;
        let mut out = vec![0; self.data.len()];
        for (i, px) in self.data.chunks_exact(Self::CHANNELS).enumerate() {
            for (c, value) in px.iter().enumerate() {
                out[c * plane + i] = *value;
            }
        }
        out
    }
}

/// Convert an RGB colour in `[0, 1]` to RGB8.
#[must_use]
pub fn color_to_rgb8(color: [f32; 3]) -> [u8; 3] {
    // Clamped to [0, 255] before the cast.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
