use std::{f32::consts::PI, path::Path};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transition: TransitionConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
    pub frame_rate: FrameRate,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Durations of the two halves of a character transition, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub fade_out_seconds: f32,
    pub fade_in_seconds: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_out_seconds: 0.5,
            fade_in_seconds: 0.5,
        }
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Radians applied per rotation key press.
    pub rotation_step: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rotation_step: PI / 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRate(pub u32);

impl FrameRate {
    /// Seconds between two frames, never below one millisecond.
    pub fn frame_seconds(self) -> f32 {
        1.0 / self.0.clamp(1, 1000) as f32
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(60)
    }
}
