//! Crate-wide constants
//!
//! This module contains the syntax characters, limits and default names used
//! throughout the crate, providing a single source of truth for constant values.

/// Config file syntax characters
pub mod syntax {
    /// Starts a comment that runs to the end of the line
    pub const COMMENT: u8 = b';';

    /// Opens a section header
    pub const SECTION_START: u8 = b'[';

    /// Closes a section header
    pub const SECTION_END: u8 = b']';

    /// Separates a key from its value
    pub const ASSIGN: u8 = b'=';

    /// Delimits a multi-line block value
    pub const BLOCK: u8 = b'"';

    /// Inheritance marker for section parents and value references
    pub const INHERITANCE: char = '@';

    /// Delimits an include directive at the start of a line (`@file@`)
    pub const INCLUDE: u8 = b'@';

    /// Separates a section name from a key in a value reference
    pub const SECTION_SEPARATOR: char = '.';

    /// Separates list items
    pub const LIST_SEPARATOR: char = '#';

    /// Separates the bounds of a random range
    pub const RANDOM_SEPARATOR: char = '~';
}

/// Config store limits and well-known names
pub mod config {
    /// Maximum number of items recognized in a list value
    pub const MAX_LIST_ITEMS: usize = 255;

    /// Maximum inheritance hops followed while resolving a value
    pub const MAX_RESOLVE_DEPTH: usize = 64;

    /// Size of each chunk read from a config file
    pub const CHUNK_SIZE: usize = 4096;

    /// Section holding the store's own settings
    pub const CONFIG_SECTION: &str = "Config";

    /// Key enabling load history recording in [`CONFIG_SECTION`]
    pub const HISTORY_KEY: &str = "History";

    /// Extension appended to the base name
    pub const EXTENSION: &str = "ini";

    /// Default base name of the auto-loaded config file
    #[cfg(debug_assertions)]
    pub const DEFAULT_BASE_NAME: &str = "tomed";

    /// Default base name of the auto-loaded config file
    #[cfg(not(debug_assertions))]
    pub const DEFAULT_BASE_NAME: &str = "tome";

    /// Directory name under the user config dir searched by the CLI
    pub const APP_DIR: &str = "tome";
}

/// Config file encryption
pub mod encryption {
    /// Tag written in front of encrypted files
    pub const TAG: &[u8; 4] = b"OECF";

    /// Key used until another one is set
    pub const DEFAULT_KEY: &str = "Tome Default Encryption Key =)";
}

/// Inline markup syntax
pub mod markup {
    /// Opens a styled group
    pub const GROUP_START: char = '[';

    /// Closes a styled group
    pub const GROUP_END: char = ']';

    /// Separates the style list from the group's text
    pub const STYLE_END: char = ':';

    /// Separates style directives
    pub const STYLE_SEPARATOR: char = ',';

    /// Escapes the next bracket
    pub const ESCAPE: char = '\\';

    /// Font directive name
    pub const FONT: &str = "font";

    /// Color directive name
    pub const COLOR: &str = "color";

    /// Scale directive name
    pub const SCALE: &str = "scale";

    /// Directive emptying every style stack
    pub const CLEAR: &str = "*";

    /// Maximum alias-of-alias expansion depth
    pub const MAX_ALIAS_DEPTH: usize = 16;
}

/// Text config keys and locale markers
pub mod text {
    /// Key holding a text's marked-up string
    pub const STRING_KEY: &str = "String";

    /// Key holding a text's font section
    pub const FONT_KEY: &str = "Font";

    /// Key holding the section that defines a text's style aliases
    pub const ALIASES_KEY: &str = "Aliases";

    /// Prefix marking a value as a locale key
    pub const LOCALE_MARKER: char = '$';

    /// Section selecting the active language
    pub const LOCALE_SECTION: &str = "Locale";

    /// Key naming the active language section
    pub const LANGUAGE_KEY: &str = "Language";
}

/// Line layout
pub mod layout {
    /// Tolerance used when comparing accumulated sizes against bounds
    pub const EPSILON: f32 = 1e-4;
}

/// Font defaults
pub mod font {
    /// Pixel size used when a font section has no `Size`
    pub const DEFAULT_SIZE: f32 = 18.0;

    /// Key holding a TrueType file path
    pub const PATH_KEY: &str = "Path";

    /// Key holding the pixel size of a TrueType font
    pub const SIZE_KEY: &str = "Size";

    /// Key holding `(width, height)` of a fixed-metric font
    pub const CHARACTER_SIZE_KEY: &str = "CharacterSize";

    /// Glyph advance of the built-in fallback font
    pub const FALLBACK_WIDTH: f32 = 8.0;

    /// Line height of the built-in fallback font
    pub const FALLBACK_HEIGHT: f32 = 16.0;

    /// Name reported by the built-in fallback font
    pub const FALLBACK_NAME: &str = "builtin";
}
