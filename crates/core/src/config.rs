//! Harness configuration.
//!
//! Every field has a default, so an empty JSON object (or no config file
//! at all) yields the stock 800x800 window drawing `shaders/v.glsl` and
//! `shaders/f.glsl` at 60 Hz.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::render::shader::ShaderSources;

/// Runtime configuration for the window, shaders and frame pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Directory scanned for `.obj` files at startup.
    pub models_dir: PathBuf,
    /// Redraws per second.
    pub frame_rate: u32,
    /// RGBA clear color.
    pub clear_color: [f32; 4],
    /// Key that triggers a shader reload when released.
    pub reload_key: char,
    /// Line width set before the quad draw. `None` leaves the driver default.
    pub line_width: Option<f32>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            title: "shader-harness".to_string(),
            width: 800,
            height: 800,
            vertex_shader: PathBuf::from("shaders/v.glsl"),
            fragment_shader: PathBuf::from("shaders/f.glsl"),
            models_dir: PathBuf::from("models"),
            frame_rate: 60,
            clear_color: [0.2, 0.2, 0.2, 1.0],
            reload_key: 'r',
            line_width: None,
        }
    }
}

impl HarnessConfig {
    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if the file cannot be read and
    /// `HarnessError::Config` if it does not parse or fails validation.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Config` on malformed JSON or invalid values.
    pub fn from_json(text: &str) -> Result<Self, HarnessError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidDimensions` for a zero window size and
    /// `HarnessError::Config` for other out-of-range values.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.width == 0 || self.height == 0 {
            return Err(HarnessError::InvalidDimensions);
        }
        if self.frame_rate == 0 {
            return Err(HarnessError::Config("frame_rate must be positive".into()));
        }
        if let Some(w) = self.line_width {
            if !w.is_finite() || w <= 0.0 {
                return Err(HarnessError::Config(format!(
                    "line_width must be a positive number, got {w}"
                )));
            }
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(HarnessError::Config("clear_color must be finite".into()));
        }
        Ok(())
    }

    /// The vertex/fragment file pair to compile.
    pub fn shader_sources(&self) -> ShaderSources {
        ShaderSources {
            vertex: self.vertex_shader.clone(),
            fragment: self.fragment_shader.clone(),
        }
    }
}
