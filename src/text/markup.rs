//! Inline style markup
//!
//! `[styles:text]` renders `text` with a comma separated list of styles:
//! `font(Section)`, `color(r, g, b[, a])`, `scale(x, y[, z])`, `*` or the name
//! of an alias whose value is itself a style list. Groups nest, and `\[` /
//! `\]` produce literal brackets.
//!
//! Parsing yields the display string with the markup removed and the markers
//! describing style changes at byte offsets of that string. When a group
//! closes, the styles it pushed are popped most recent first; each pop brings
//! back the previous style of the same kind, or its default. `*` empties every
//! stack at once and resets each kind that had a style to its default.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::marker::{Marker, MarkerData, StyleKind};
use crate::config::ConfigStore;
use crate::config::scalar::parse_components;
use crate::constants::markup::{
    CLEAR, COLOR, ESCAPE, FONT, GROUP_END, GROUP_START, MAX_ALIAS_DEPTH, SCALE, STYLE_END, STYLE_SEPARATOR,
};
use crate::font::FontHandle;
use crate::types::{Rgba, Vector};

/// Resolves `font(Section)` directives
pub trait FontResolver {
    fn resolve_font(&mut self, section: &str) -> Option<FontHandle>;
}

/// Named style lists usable inside markup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key of `section` becomes an alias for its value
    pub fn from_config(config: &ConfigStore, section: &str) -> Self {
        let mut table = Self::new();
        let Some(node) = config.section(section) else {
            warn!(section = %section, "Alias section not found");
            return table;
        };
        for key in node.keys() {
            if let Some(cell) = config.get_value(section, key) {
                table.insert(key, cell.literal());
            }
        }
        debug!(section = %section, aliases = table.len(), "Loaded style aliases");
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, styles: impl Into<String>) {
        self.aliases.insert(name.into(), styles.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Display string and style markers produced from marked-up text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedMarkup {
    pub string: String,
    pub markers: Vec<Marker>,
}

/// Parse marked-up text. Malformed styles are logged and skipped; an
/// unterminated group keeps its text and styles.
pub fn parse_markup(raw: &str, aliases: &AliasTable, fonts: &mut dyn FontResolver) -> ParsedMarkup {
    let mut parser = Parser {
        src: raw,
        pos: 0,
        output: String::with_capacity(raw.len()),
        markers: Vec::new(),
        stacks: StyleStacks::default(),
        aliases,
        fonts,
    };
    parser.run(0);
    ParsedMarkup {
        string: parser.output,
        markers: parser.markers,
    }
}

/// One stack per style kind. Every push takes the next value of a shared
/// tally, so the most recent push across all kinds is the highest tally.
#[derive(Debug, Default)]
struct StyleStacks {
    stacks: [Vec<(u64, MarkerData)>; 3],
    tally: u64,
}

impl StyleStacks {
    fn push(&mut self, kind: StyleKind, data: MarkerData) {
        self.tally += 1;
        self.stacks[kind.index()].push((self.tally, data));
    }

    /// Drop the most recent push and return what is now in effect for its kind
    fn pop(&mut self) -> Option<MarkerData> {
        let (index, _) = self
            .stacks
            .iter()
            .enumerate()
            .filter_map(|(index, stack)| stack.last().map(|(tally, _)| (index, *tally)))
            .max_by_key(|(_, tally)| *tally)?;

        let stack = &mut self.stacks[index];
        stack.pop();
        Some(match stack.last() {
            Some((_, data)) => data.clone(),
            None => MarkerData::Default(StyleKind::ALL[index]),
        })
    }

    /// Empty every stack, returning the kinds that had a style
    fn clear(&mut self) -> Vec<StyleKind> {
        StyleKind::ALL
            .into_iter()
            .zip(self.stacks.iter_mut())
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(kind, stack)| {
                stack.clear();
                kind
            })
            .collect()
    }
}

enum GroupEnd {
    Closed,
    EndOfInput,
}

/// Split a style list on commas outside parentheses
fn split_directives(styles: &str) -> Vec<&str> {
    let mut directives = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (at, ch) in styles.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            STYLE_SEPARATOR if depth == 0 => {
                directives.push(&styles[start..at]);
                start = at + ch.len_utf8();
            }
            _ => {}
        }
    }
    directives.push(&styles[start..]);
    directives
}

struct Parser<'a, 'f> {
    src: &'a str,
    pos: usize,
    output: String,
    markers: Vec<Marker>,
    stacks: StyleStacks,
    aliases: &'a AliasTable,
    fonts: &'f mut dyn FontResolver,
}

impl<'a> Parser<'a, '_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn emit(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        self.output.push(ch);
    }

    fn run(&mut self, depth: usize) -> GroupEnd {
        while let Some(ch) = self.peek() {
            match ch {
                ESCAPE => {
                    self.pos += ch.len_utf8();
                    match self.peek() {
                        Some(next @ (GROUP_START | GROUP_END | ESCAPE)) => self.emit(next),
                        _ => self.output.push(ESCAPE),
                    }
                }
                GROUP_START => match self.group_header() {
                    Some((body_start, styles)) => {
                        self.pos = body_start;
                        let pushed = self.apply_styles(styles, 0);
                        match self.run(depth + 1) {
                            GroupEnd::Closed => {
                                for _ in 0..pushed {
                                    self.pop_style();
                                }
                            }
                            GroupEnd::EndOfInput => {
                                warn!(styles = %styles, "Unterminated markup group");
                                return GroupEnd::EndOfInput;
                            }
                        }
                    }
                    None => self.emit(ch),
                },
                GROUP_END if depth > 0 => {
                    self.pos += ch.len_utf8();
                    return GroupEnd::Closed;
                }
                _ => self.emit(ch),
            }
        }
        GroupEnd::EndOfInput
    }

    /// Style list of a group opening at `pos`, with the offset where its text starts
    fn group_header(&self) -> Option<(usize, &'a str)> {
        let src = self.src;
        let start = self.pos + GROUP_START.len_utf8();
        let mut depth = 0usize;
        for (at, ch) in src[start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                STYLE_END if depth == 0 => {
                    return Some((start + at + ch.len_utf8(), &src[start..start + at]));
                }
                GROUP_START | GROUP_END if depth == 0 => return None,
                _ => {}
            }
        }
        None
    }

    /// Push every style of a list, returning how many were pushed
    fn apply_styles(&mut self, styles: &'a str, alias_depth: usize) -> usize {
        split_directives(styles)
            .into_iter()
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map(|directive| self.apply_directive(directive, alias_depth))
            .sum()
    }

    fn apply_directive(&mut self, directive: &'a str, alias_depth: usize) -> usize {
        if directive == CLEAR {
            self.clear_styles();
            return 0;
        }
        let Some(open) = directive.find('(') else {
            return self.apply_alias(directive, alias_depth);
        };

        let name = directive[..open].trim();
        let args = &directive[open..];
        if !args.ends_with(')') {
            warn!(directive = %directive, "Malformed style directive");
            return 0;
        }

        match name {
            FONT => {
                let section = args[1..args.len() - 1].trim();
                match self.fonts.resolve_font(section) {
                    Some(font) => {
                        self.push_style(StyleKind::Font, MarkerData::Font(font));
                        1
                    }
                    None => {
                        warn!(section = %section, "Markup font could not be created");
                        0
                    }
                }
            }
            COLOR => match parse_components(args) {
                Some((channels, rest)) if rest.trim().is_empty() => match channels.as_slice() {
                    [r, g, b] => self.push_color(Rgba::from_channels(*r, *g, *b, None)),
                    [r, g, b, a] => self.push_color(Rgba::from_channels(*r, *g, *b, Some(*a))),
                    _ => {
                        warn!(directive = %directive, "Color needs three or four channels");
                        0
                    }
                },
                _ => {
                    warn!(directive = %directive, "Malformed color");
                    0
                }
            },
            SCALE => match parse_components(args) {
                Some((factors, rest)) if rest.trim().is_empty() => match factors.as_slice() {
                    [x, y] => self.push_scale(Vector::new(*x, *y, 1.0)),
                    [x, y, z] => self.push_scale(Vector::new(*x, *y, *z)),
                    _ => {
                        warn!(directive = %directive, "Scale needs two or three factors");
                        0
                    }
                },
                _ => {
                    warn!(directive = %directive, "Malformed scale");
                    0
                }
            },
            _ => {
                warn!(directive = %directive, "Unknown style directive");
                0
            }
        }
    }

    fn apply_alias(&mut self, name: &'a str, alias_depth: usize) -> usize {
        if alias_depth >= MAX_ALIAS_DEPTH {
            warn!(alias = %name, depth = alias_depth, "Style alias nesting too deep, skipping");
            return 0;
        }
        let aliases = self.aliases;
        match aliases.get(name) {
            Some(styles) => self.apply_styles(styles, alias_depth + 1),
            None => {
                warn!(alias = %name, "Unknown style alias");
                0
            }
        }
    }

    fn push_color(&mut self, color: Rgba) -> usize {
        self.push_style(StyleKind::Color, MarkerData::Color(color));
        1
    }

    fn push_scale(&mut self, scale: Vector) -> usize {
        self.push_style(StyleKind::Scale, MarkerData::Scale(scale));
        1
    }

    fn push_style(&mut self, kind: StyleKind, data: MarkerData) {
        self.markers.push(Marker::new(self.output.len(), data.clone()));
        self.stacks.push(kind, data);
    }

    // Styles already removed by a clear have nothing left to pop
    fn pop_style(&mut self) {
        if let Some(data) = self.stacks.pop() {
            self.markers.push(Marker::new(self.output.len(), data));
        }
    }

    fn clear_styles(&mut self) {
        let offset = self.output.len();
        for kind in self.stacks.clear() {
            self.markers.push(Marker::new(offset, MarkerData::Default(kind)));
        }
    }
}
