//! Small value types shared by the config store and the text engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vector = Vector { x: 1.0, y: 1.0, z: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector {
    /// Formats as `(x, y, z)`, the syntax accepted by config vector values
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 255 };

    /// Build from 0-255 channel values, clamping out-of-range input.
    /// Alpha defaults to opaque.
    pub fn from_channels(r: f32, g: f32, b: f32, a: Option<f32>) -> Self {
        let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: a.map(channel).unwrap_or(255),
        }
    }

    /// Pack as `0xRRGGBBAA`
    pub fn packed(&self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Channels normalized to `0.0..=1.0`
    pub fn normalized(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}
