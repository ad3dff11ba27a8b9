//! Styled texts
//!
//! A [`Text`] owns a marked-up string, the display string and markers its
//! markup produces, and the layout of that string in its font. Changing the
//! string, font or size rebuilds the layout from the unwrapped display string.

pub mod layout;
pub mod marker;
pub mod markup;

pub use layout::{Bounds, Layout, LineMetrics, layout};
pub use marker::{Marker, MarkerData, StyleKind};
pub use markup::{AliasTable, FontResolver, ParsedMarkup, parse_markup};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, ConfigStore};
use crate::constants::text::{ALIASES_KEY, FONT_KEY, LOCALE_MARKER, STRING_KEY};
use crate::font::{FontHandle, FontService};
use crate::locale::Locale;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("text section not found: {0}")]
    MissingSection(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Services a text draws on while being built from config
pub struct TextContext<'a> {
    pub config: &'a mut ConfigStore,
    pub fonts: &'a mut dyn FontService,
    pub locale: &'a dyn Locale,
}

impl<'a> TextContext<'a> {
    pub fn new(config: &'a mut ConfigStore, fonts: &'a mut dyn FontService, locale: &'a dyn Locale) -> Self {
        Self { config, fonts, locale }
    }

    /// `$key` resolves through the locale, `$$` escapes a literal `$`
    fn localize(&self, value: &str) -> String {
        match value.strip_prefix(LOCALE_MARKER) {
            Some(escaped) if escaped.starts_with(LOCALE_MARKER) => escaped.to_string(),
            Some(key) => self.locale.resolve(&*self.config, key).unwrap_or_else(|| {
                warn!(key = %key, "Locale key not found");
                String::new()
            }),
            None => value.to_string(),
        }
    }
}

impl FontResolver for TextContext<'_> {
    fn resolve_font(&mut self, section: &str) -> Option<FontHandle> {
        self.fonts.font_from_config(self.config, section)
    }
}

fn locale_key(value: &str) -> Option<String> {
    value
        .strip_prefix(LOCALE_MARKER)
        .filter(|key| !key.starts_with(LOCALE_MARKER))
        .map(str::to_string)
}

fn serialize_font_name<S: Serializer>(font: &Option<FontHandle>, serializer: S) -> Result<S::Ok, S::Error> {
    match font {
        Some(font) => serializer.serialize_some(font.name()),
        None => serializer.serialize_none(),
    }
}

/// Marked-up string laid out in a font
#[derive(Debug, Clone, Default, Serialize)]
pub struct Text {
    name: Option<String>,
    /// Display string as laid out
    string: String,
    #[serde(skip)]
    raw: String,
    /// Display string before wrapping and truncation
    #[serde(skip)]
    source: String,
    #[serde(skip)]
    style_markers: Vec<Marker>,
    markers: Vec<Marker>,
    lines: Vec<LineMetrics>,
    #[serde(skip)]
    aliases: AliasTable,
    #[serde(serialize_with = "serialize_font_name")]
    font: Option<FontHandle>,
    #[serde(skip)]
    font_internal: bool,
    #[serde(skip)]
    string_key: Option<String>,
    #[serde(skip)]
    font_key: Option<String>,
    width: f32,
    height: f32,
    #[serde(skip)]
    bounds: Bounds,
    #[serde(skip)]
    overflow_start: Option<usize>,
}

impl Text {
    /// Empty text without a font
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty text sharing `font`
    pub fn with_font(font: FontHandle) -> Self {
        Self {
            font: Some(font),
            ..Self::default()
        }
    }

    /// Build a text from the `String`, `Font` and `Aliases` keys of a section
    pub fn from_config(name: &str, ctx: &mut TextContext<'_>) -> Result<Self, TextError> {
        if !ctx.config.has_section(name) {
            return Err(TextError::MissingSection(name.to_string()));
        }

        ctx.config.push_section(name)?;
        let string = ctx.config.get_string(STRING_KEY);
        let font = ctx.config.get_string(FONT_KEY);
        let aliases = ctx.config.get_string(ALIASES_KEY);
        ctx.config.pop_section()?;

        let mut text = Self {
            name: Some(name.to_string()),
            string_key: locale_key(&string),
            font_key: locale_key(&font),
            ..Self::default()
        };

        let font_name = ctx.localize(&font);
        text.load_font(&font_name, ctx);
        if !aliases.is_empty() {
            text.aliases = AliasTable::from_config(ctx.config, &aliases);
        }

        let raw = ctx.localize(&string);
        text.set_string(&raw, ctx);
        debug!(text = %name, lines = text.line_count(), "Created text from config");
        Ok(text)
    }

    /// Use the font of config section `font_name`, or the default font
    fn load_font(&mut self, font_name: &str, ctx: &mut TextContext<'_>) {
        let created = if font_name.is_empty() {
            None
        } else {
            let font = ctx.resolve_font(font_name);
            if font.is_none() {
                warn!(text = ?self.name, font = %font_name, "Couldn't create font, using default");
            }
            font
        };

        self.font_internal = created.is_some();
        self.font = Some(created.unwrap_or_else(|| ctx.fonts.default_font()));
    }

    /// Re-resolve locale-bound string and font after the language changed
    pub fn refresh_locale(&mut self, ctx: &mut TextContext<'_>) {
        if let Some(key) = self.font_key.clone() {
            let font_name = ctx.localize(&format!("{LOCALE_MARKER}{key}"));
            if !font_name.is_empty() {
                self.load_font(&font_name, ctx);
            }
        }

        match self.string_key.clone() {
            Some(key) => {
                let raw = ctx.localize(&format!("{LOCALE_MARKER}{key}"));
                if raw.is_empty() {
                    self.update_size();
                } else {
                    self.set_string(&raw, ctx);
                }
            }
            None => self.update_size(),
        }
    }

    /// Aliases used by later calls to [`set_string`](Self::set_string)
    pub fn set_aliases(&mut self, aliases: AliasTable) {
        self.aliases = aliases;
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Parse `raw` markup and lay out the result
    pub fn set_string(&mut self, raw: &str, fonts: &mut dyn FontResolver) {
        let parsed = parse_markup(raw, &self.aliases, fonts);
        self.raw = raw.to_string();
        self.source = parsed.string;
        self.style_markers = parsed.markers;
        self.update_size();
    }

    /// Share `font`, or drop the font with `None`
    pub fn set_font(&mut self, font: Option<FontHandle>) {
        self.font = font;
        self.font_internal = false;
        self.update_size();
    }

    /// Constrain to `width` x `height`; a non-positive width lifts all
    /// constraints and a non-positive height leaves the height free.
    /// Returns the text cut by the height.
    pub fn set_size(&mut self, width: f32, height: f32) -> &str {
        self.bounds = Bounds::new(width, height);
        self.update_size();
        self.overflow()
    }

    /// Text cut by the height constraint, empty when everything fits
    pub fn overflow(&self) -> &str {
        match self.overflow_start {
            Some(start) => self.source.get(start..).unwrap_or_default(),
            None => "",
        }
    }

    fn update_size(&mut self) {
        let Some(font) = &self.font else {
            self.string = self.source.clone();
            self.markers = self.style_markers.clone();
            self.lines.clear();
            self.width = 0.0;
            self.height = 0.0;
            self.overflow_start = None;
            return;
        };

        let result = layout(&self.source, &self.style_markers, font, self.bounds);
        self.width = self.bounds.width.unwrap_or(result.width);
        self.height = self.bounds.height.unwrap_or(result.height);
        self.string = result.string;
        self.markers = result.markers;
        self.lines = result.lines;
        self.overflow_start = result.overflow_start;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn string(&self) -> &str {
        &self.string
    }

    /// Marked-up string as last set
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Unwrapped display string, while wrapping or truncation changed it
    pub fn original(&self) -> Option<&str> {
        (self.string != self.source).then_some(self.source.as_str())
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn font(&self) -> Option<&FontHandle> {
        self.font.as_ref()
    }

    /// Whether the font was created from config for this text
    pub fn is_font_internal(&self) -> bool {
        self.font_internal
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Width and height of line `index`
    pub fn line_size(&self, index: usize) -> Option<(f32, f32)> {
        self.lines.get(index).map(|line| (line.width, line.height))
    }

    pub fn lines(&self) -> &[LineMetrics] {
        &self.lines
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn is_fixed_size(&self) -> bool {
        self.bounds.is_constrained()
    }
}
