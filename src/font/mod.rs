//! Font metrics and font creation from config
//!
//! Layout only needs two numbers per font: the advance of a character and the
//! height of a line. Fonts are shared through [`FontHandle`]s; a font lives
//! as long as some text or marker holds a handle to it.

mod glyph;

pub use glyph::GlyphFont;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::constants::font::{
    CHARACTER_SIZE_KEY, DEFAULT_SIZE, FALLBACK_HEIGHT, FALLBACK_NAME, FALLBACK_WIDTH, PATH_KEY,
    SIZE_KEY,
};

/// Per-character metrics of a font
pub trait FontMetrics: fmt::Debug {
    fn name(&self) -> &str;

    /// Horizontal advance of `ch`, `None` when the font has no glyph for it
    fn advance_width(&self, ch: char) -> Option<f32>;

    fn line_height(&self) -> f32;
}

/// Shared, reference-counted font
pub type FontHandle = Rc<dyn FontMetrics>;

/// Font where every glyph has the same size
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFont {
    name: String,
    width: f32,
    height: f32,
}

impl FixedFont {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn handle(self) -> FontHandle {
        Rc::new(self)
    }
}

impl Default for FixedFont {
    fn default() -> Self {
        Self::new(FALLBACK_NAME, FALLBACK_WIDTH, FALLBACK_HEIGHT)
    }
}

impl FontMetrics for FixedFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_width(&self, _ch: char) -> Option<f32> {
        Some(self.width)
    }

    fn line_height(&self) -> f32 {
        self.height
    }
}

/// Source of fonts for texts and markup
pub trait FontService {
    /// Create (or share) the font described by a config section
    fn font_from_config(&mut self, config: &mut ConfigStore, section: &str) -> Option<FontHandle>;

    fn default_font(&mut self) -> FontHandle;
}

/// Fonts created from config sections, shared while in use.
///
/// A font section either names a TrueType file (`Path`, optional `Size`) or
/// gives fixed glyph metrics (`CharacterSize = (width, height)`).
#[derive(Debug, Default)]
pub struct FontLibrary {
    fonts: HashMap<String, Weak<dyn FontMetrics>>,
    default: Option<FontHandle>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library whose default font is `font` instead of a system font
    pub fn with_default(font: FontHandle) -> Self {
        Self {
            fonts: HashMap::new(),
            default: Some(font),
        }
    }

    fn create(config: &mut ConfigStore, section: &str) -> Option<FontHandle> {
        if !config.has_section(section) {
            warn!(section = %section, "Font section not found");
            return None;
        }
        if let Err(err) = config.push_section(section) {
            warn!(section = %section, error = %err, "Cannot select font section");
            return None;
        }

        let path = config.get_string(PATH_KEY);
        let font = if !path.is_empty() {
            let size = if config.has_value(SIZE_KEY) {
                config.get_float(SIZE_KEY)
            } else {
                DEFAULT_SIZE
            };
            match GlyphFont::from_path(section, PathBuf::from(&path), size) {
                Ok(font) => Some(Rc::new(font) as FontHandle),
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(section = %section, error = %error, "Failed to load font");
                    None
                }
            }
        } else if config.has_value(CHARACTER_SIZE_KEY) {
            let size = config.get_vector(CHARACTER_SIZE_KEY);
            if size.x > 0.0 && size.y > 0.0 {
                Some(FixedFont::new(section, size.x, size.y).handle())
            } else {
                warn!(section = %section, width = size.x, height = size.y, "Invalid character size");
                None
            }
        } else {
            warn!(section = %section, "Font section has neither Path nor CharacterSize");
            None
        };

        if let Err(err) = config.pop_section() {
            warn!(error = %err, "Font section selection was not restored");
        }
        font
    }
}

impl FontService for FontLibrary {
    fn font_from_config(&mut self, config: &mut ConfigStore, section: &str) -> Option<FontHandle> {
        if let Some(font) = self.fonts.get(section).and_then(Weak::upgrade) {
            return Some(font);
        }

        let font = Self::create(config, section)?;
        self.fonts.insert(section.to_string(), Rc::downgrade(&font));
        Some(font)
    }

    fn default_font(&mut self) -> FontHandle {
        if let Some(font) = &self.default {
            return font.clone();
        }

        let font: FontHandle = match GlyphFont::from_system_font(DEFAULT_SIZE) {
            Ok(font) => Rc::new(font),
            Err(err) => {
                debug!(error = %err, "No system font, using built-in metrics");
                FixedFont::default().handle()
            }
        };
        self.default = Some(font.clone());
        font
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigStore {
        let mut config = ConfigStore::with_seed(1);
        config
            .load_str(concat!(
                "[Mono]\nCharacterSize = (10, 20)\n",
                "[Broken]\nPath = /no/such/font.ttf\n",
                "[Empty]\nColor = red\n",
            ))
            .unwrap();
        config
    }

    #[test]
    fn test_fixed_font_metrics() {
        let font = FixedFont::new("mono", 6.0, 12.0);
        assert_eq!(font.advance_width('x'), Some(6.0));
        assert_eq!(font.advance_width('\u{1F600}'), Some(6.0));
        assert_eq!(font.line_height(), 12.0);
    }

    #[test]
    fn test_font_from_config_section() {
        let mut config = config();
        config.select_section("Empty").unwrap();
        let mut library = FontLibrary::new();

        let font = library.font_from_config(&mut config, "Mono").unwrap();
        assert_eq!(font.name(), "Mono");
        assert_eq!(font.advance_width('a'), Some(10.0));
        assert_eq!(font.line_height(), 20.0);
        // The caller's selection is left as it was
        assert_eq!(config.current_section(), Some("Empty"));
    }

    #[test]
    fn test_fonts_are_shared_while_alive() {
        let mut config = config();
        let mut library = FontLibrary::new();

        let first = library.font_from_config(&mut config, "Mono").unwrap();
        let second = library.font_from_config(&mut config, "Mono").unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        drop(first);
        drop(second);
        let third = library.font_from_config(&mut config, "Mono").unwrap();
        assert_eq!(Rc::strong_count(&third), 1);
    }

    #[test]
    fn test_bad_font_sections() {
        let mut config = config();
        let mut library = FontLibrary::new();
        assert!(library.font_from_config(&mut config, "Missing").is_none());
        assert!(library.font_from_config(&mut config, "Broken").is_none());
        assert!(library.font_from_config(&mut config, "Empty").is_none());
        assert!(!config.has_section("Missing"));
    }

    #[test]
    fn test_default_font_is_reused() {
        let fallback = FixedFont::new("fallback", 4.0, 8.0).handle();
        let mut library = FontLibrary::with_default(fallback.clone());
        assert!(Rc::ptr_eq(&library.default_font(), &fallback));

        let mut system = FontLibrary::new();
        let first = system.default_font();
        assert!(Rc::ptr_eq(&first, &system.default_font()));
    }
}
