//! TrueType font metrics using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::FontMetrics;

/// TrueType font at a fixed pixel size
#[derive(Debug)]
pub struct GlyphFont {
    name: String,
    font: Font,
    size: f32,
    line_height: f32,
}

impl GlyphFont {
    /// Load a TrueType font from a file path
    pub fn from_path(name: &str, path: PathBuf, size: f32) -> Result<Self> {
        debug!(path = %path.display(), size = size, "Attempting to load font from path");

        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))?;

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.new_line_size)
            .unwrap_or(size);

        info!(path = %path.display(), name = %name, "Loaded font");
        Ok(Self {
            name: name.to_string(),
            font,
            size,
            line_height,
        })
    }

    /// Try to find and load a common system font
    pub fn from_system_font(size: f32) -> Result<Self> {
        // Compile-time font path first (FONT_PATH env var at build time)
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(build_font_path) = FONT_PATH {
            if let Ok(font) = Self::from_path("system", PathBuf::from(build_font_path), size) {
                return Ok(font);
            }
        }

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];

        for path in &font_paths {
            if let Ok(font) = Self::from_path("system", PathBuf::from(path), size) {
                return Ok(font);
            }
        }

        Err(anyhow::anyhow!(
            "Could not find any system fonts. Tried FONT_PATH ({:?}) and hardcoded paths: {:?}",
            FONT_PATH,
            font_paths
        ))
    }

    pub fn size(&self) -> f32 {
        self.size
    }
}

impl FontMetrics for GlyphFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_width(&self, ch: char) -> Option<f32> {
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }
        Some(self.font.metrics(ch, self.size).advance_width)
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}
