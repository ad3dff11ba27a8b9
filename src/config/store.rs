//! Config store: section bank, current-section cursor and value accessors
//!
//! Reads are total: a missing or malformed value logs at debug level and
//! yields the type's zero value. Structural operations (selecting, clearing,
//! loading, saving) return a [`ConfigError`] the caller can branch on.
//!
//! Value resolution never moves the cursor. Inheritance is followed through an
//! explicit section argument, bounded by
//! [`MAX_RESOLVE_DEPTH`](crate::constants::config::MAX_RESOLVE_DEPTH).

use indexmap::IndexMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::ConfigError;
use super::scalar;
use super::section::Section;
use super::value::{Scalar, ValueCell};
use crate::constants::config::{
    CONFIG_SECTION, DEFAULT_BASE_NAME, EXTENSION, HISTORY_KEY, MAX_RESOLVE_DEPTH,
};
use crate::constants::encryption::DEFAULT_KEY;
use crate::constants::syntax::{INHERITANCE, LIST_SEPARATOR, SECTION_SEPARATOR};
use crate::types::Vector;

/// Serializable view of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub name: String,
    pub parent: Option<String>,
    pub entries: IndexMap<String, String>,
}

/// Hierarchical key/value store
#[derive(Debug)]
pub struct ConfigStore {
    sections: IndexMap<String, Section>,
    current: Option<String>,
    stack: Vec<Option<String>>,
    load_depth: usize,
    encryption_key: Option<String>,
    base_name: String,
    history: Option<Vec<PathBuf>>,
    rng: StdRng,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Empty store with the default encryption key and base name
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Empty store whose random reads are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            sections: IndexMap::new(),
            current: None,
            stack: Vec::new(),
            load_depth: 0,
            encryption_key: Some(DEFAULT_KEY.to_string()),
            base_name: DEFAULT_BASE_NAME.to_string(),
            history: None,
            rng,
        }
    }

    /// Create a store and load its base file.
    ///
    /// A missing base file is not an error. When the loaded config sets
    /// `[Config] History = true`, every later top-level load is recorded for
    /// [`reload_history`](Self::reload_history).
    pub fn init(base_name: Option<&str>) -> Self {
        let mut store = Self::new();
        store.set_base_name(base_name);
        store.load_base_file();

        let history = store
            .get_value(CONFIG_SECTION, HISTORY_KEY)
            .and_then(|cell| scalar::parse_bool(&cell.unescaped_item(0)).map(|(enabled, _)| enabled))
            .unwrap_or(false);
        if history {
            debug!("Config load history enabled");
            store.history = Some(Vec::new());
        }
        store
    }

    fn load_base_file(&mut self) {
        let path = self.base_file();
        match self.load(&path) {
            Ok(()) => {}
            Err(err) => debug!(path = %path.display(), error = %err, "Base config file not loaded"),
        }
    }

    /// Set the base name of the auto-loaded file; `None` restores the default
    pub fn set_base_name(&mut self, base_name: Option<&str>) {
        self.base_name = match base_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_BASE_NAME.to_string(),
        };
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// `<base>.ini`
    pub fn base_file(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.base_name, EXTENSION))
    }

    /// Set the key used for encrypted files; `None` or an empty key clears it
    pub fn set_encryption_key(&mut self, key: Option<&str>) {
        self.encryption_key = key.filter(|key| !key.is_empty()).map(str::to_string);
    }

    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key.as_deref()
    }

    pub fn history_enabled(&self) -> bool {
        self.history.is_some()
    }

    /// Files recorded since history was enabled, in load order
    pub fn history(&self) -> &[PathBuf] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Clear everything, then reload the base file and every recorded file in
    /// order, stopping at the first recorded file that fails to load. The
    /// history itself is kept either way.
    pub fn reload_history(&mut self) -> Result<(), ConfigError> {
        let Some(files) = self.history.take() else {
            return Err(ConfigError::HistoryDisabled);
        };

        info!(files = files.len(), "Reloading config history");
        self.clear();
        self.load_base_file();
        let result = files.iter().try_for_each(|file| {
            self.load(file).inspect_err(|err| {
                warn!(path = %file.display(), error = %err, "Failed to reload config file");
            })
        });
        self.history = Some(files);
        result
    }

    // Loader hooks

    pub(super) fn begin_load(&mut self) -> bool {
        self.load_depth += 1;
        self.load_depth == 1
    }

    pub(super) fn end_load(&mut self) {
        self.load_depth = self.load_depth.saturating_sub(1);
    }

    pub(super) fn record_history(&mut self, path: &Path) {
        if let Some(history) = &mut self.history {
            history.push(path.to_path_buf());
        }
    }

    pub(super) fn set_current(&mut self, current: Option<String>) {
        self.current = current.filter(|name| self.sections.contains_key(name));
    }

    pub(super) fn insert_value(&mut self, key: &str, cell: ValueCell) -> Result<(), ConfigError> {
        let name = self.current.as_deref().ok_or(ConfigError::NoSectionSelected)?;
        let section = self
            .sections
            .get_mut(name)
            .ok_or_else(|| ConfigError::SectionNotFound(name.to_string()))?;
        section.insert(key, cell);
        Ok(())
    }

    // Sections

    /// Select `Name` or `Name@Parent`, creating the section if needed.
    ///
    /// The parent of an existing section is only replaced while a file is
    /// being loaded.
    pub fn select_section(&mut self, name: &str) -> Result<(), ConfigError> {
        let (name, parent) = match name.split_once(INHERITANCE) {
            Some((name, parent)) => (name.trim(), Some(parent.trim())),
            None => (name.trim(), None),
        };
        if name.is_empty() {
            return Err(ConfigError::EmptySectionName);
        }
        let parent = parent.filter(|parent| !parent.is_empty()).map(str::to_string);

        match self.sections.get_mut(name) {
            Some(section) => {
                if self.load_depth > 0 && parent.is_some() {
                    section.set_parent(parent);
                }
            }
            None => {
                debug!(section = %name, parent = ?parent, "Creating config section");
                self.sections
                    .insert(name.to_string(), Section::new(name, parent));
            }
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_section(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Select `name`, remembering the previous selection for [`pop_section`](Self::pop_section)
    pub fn push_section(&mut self, name: &str) -> Result<(), ConfigError> {
        let previous = self.current.clone();
        self.select_section(name)?;
        self.stack.push(previous);
        Ok(())
    }

    /// Restore the selection saved by the matching [`push_section`](Self::push_section)
    pub fn pop_section(&mut self) -> Result<(), ConfigError> {
        let previous = self.stack.pop().ok_or(ConfigError::EmptySectionStack)?;
        self.set_current(previous);
        Ok(())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Sections in creation order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Own keys of a section in insertion order (inherited keys excluded)
    pub fn section_keys(&self, name: &str) -> Vec<String> {
        self.sections
            .get(name)
            .map(|section| section.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.sections.get(name).and_then(Section::parent)
    }

    pub fn clear_section(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.sections.shift_remove(name).is_none() {
            return Err(ConfigError::SectionNotFound(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        debug!(section = %name, "Cleared config section");
        Ok(())
    }

    /// Remove a key from the current section
    pub fn clear_value(&mut self, key: &str) -> Result<(), ConfigError> {
        let name = self.current.as_deref().ok_or(ConfigError::NoSectionSelected)?;
        let removed = self
            .sections
            .get_mut(name)
            .and_then(|section| section.remove(key));
        match removed {
            Some(_) => Ok(()),
            None => Err(ConfigError::ValueNotFound {
                section: name.to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Remove every section
    pub fn clear(&mut self) {
        self.sections.clear();
        self.current = None;
    }

    pub fn snapshot(&self) -> Vec<SectionSnapshot> {
        self.sections
            .values()
            .map(|section| SectionSnapshot {
                name: section.name().to_string(),
                parent: section.parent().map(str::to_string),
                entries: section
                    .entries()
                    .map(|(key, cell)| (key.to_string(), cell.literal().to_string()))
                    .collect(),
            })
            .collect()
    }

    // Resolution

    fn resolve(
        &self,
        section: &str,
        key: &str,
        depth: usize,
    ) -> Result<Option<(usize, usize)>, ConfigError> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(ConfigError::CyclicReference {
                section: section.to_string(),
                key: key.to_string(),
            });
        }

        let Some((section_index, _, node)) = self.sections.get_full(section) else {
            return Ok(None);
        };

        if let Some((entry_index, cell)) = node.get_full(key) {
            return match cell.inheritance_target() {
                Some(target) => {
                    let target = target.trim();
                    match target.split_once(SECTION_SEPARATOR) {
                        Some((target_section, target_key)) => {
                            // `@.Key` refers to the same section
                            let target_section = match target_section.trim() {
                                "" => section,
                                name => name,
                            };
                            self.resolve(target_section, target_key.trim(), depth + 1)
                        }
                        None => self.resolve(target, key, depth + 1),
                    }
                }
                None => Ok(Some((section_index, entry_index))),
            };
        }

        match node.parent() {
            Some(parent) => self.resolve(parent, key, depth + 1),
            None => Ok(None),
        }
    }

    fn locate(&self, section: &str, key: &str) -> Option<(usize, usize)> {
        match self.resolve(section, key, 0) {
            Ok(location) => location,
            Err(err) => {
                warn!(section = %section, key = %key, error = %err, "Config value resolution failed");
                None
            }
        }
    }

    fn locate_current(&self, key: &str) -> Option<(usize, usize)> {
        let Some(section) = self.current.as_deref() else {
            debug!(key = %key, "Config read without a selected section");
            return None;
        };
        let location = self.locate(section, key);
        if location.is_none() {
            debug!(section = %section, key = %key, "Config value not found");
        }
        location
    }

    fn cell(&self, (section, entry): (usize, usize)) -> Option<&ValueCell> {
        self.sections
            .get_index(section)
            .and_then(|(_, section)| section.get_index(entry))
    }

    /// Effective value of `key` in `section`, following inheritance
    pub fn get_value(&self, section: &str, key: &str) -> Option<&ValueCell> {
        self.locate(section, key).and_then(|location| self.cell(location))
    }

    fn read_current<R>(
        &mut self,
        key: &str,
        read: impl FnOnce(&mut ValueCell, &mut StdRng) -> R,
    ) -> Option<R> {
        let (section, entry) = self.locate_current(key)?;
        let rng = &mut self.rng;
        let (_, section) = self.sections.get_index_mut(section)?;
        let cell = section.get_index_mut(entry)?;
        Some(read(cell, rng))
    }

    fn read_scalar<T: Scalar>(&mut self, key: &str, index: Option<usize>) -> T {
        self.read_current(key, |cell, rng| cell.read::<T, _>(index, rng))
            .unwrap_or_default()
    }

    // Typed getters

    pub fn has_value(&self, key: &str) -> bool {
        self.locate_current(key).is_some()
    }

    /// Literal text of the effective value
    pub fn literal(&self, key: &str) -> Option<&str> {
        self.locate_current(key)
            .and_then(|location| self.cell(location))
            .map(ValueCell::literal)
    }

    pub fn is_list(&self, key: &str) -> bool {
        self.locate_current(key)
            .and_then(|location| self.cell(location))
            .is_some_and(ValueCell::is_list)
    }

    /// Number of list items; 1 for a plain value, 0 when missing
    pub fn list_count(&self, key: &str) -> usize {
        self.locate_current(key)
            .and_then(|location| self.cell(location))
            .map(ValueCell::list_count)
            .unwrap_or(0)
    }

    pub fn get_s32(&mut self, key: &str) -> i32 {
        self.read_scalar(key, None)
    }

    pub fn get_list_s32(&mut self, key: &str, index: usize) -> i32 {
        self.read_scalar(key, Some(index))
    }

    pub fn get_u32(&mut self, key: &str) -> u32 {
        self.read_scalar(key, None)
    }

    pub fn get_list_u32(&mut self, key: &str, index: usize) -> u32 {
        self.read_scalar(key, Some(index))
    }

    pub fn get_float(&mut self, key: &str) -> f32 {
        self.read_scalar(key, None)
    }

    pub fn get_list_float(&mut self, key: &str, index: usize) -> f32 {
        self.read_scalar(key, Some(index))
    }

    pub fn get_vector(&mut self, key: &str) -> Vector {
        self.read_scalar(key, None)
    }

    pub fn get_list_vector(&mut self, key: &str, index: usize) -> Vector {
        self.read_scalar(key, Some(index))
    }

    pub fn get_bool(&mut self, key: &str) -> bool {
        self.read_current(key, |cell, rng| cell.read_bool(None, rng))
            .unwrap_or(false)
    }

    pub fn get_list_bool(&mut self, key: &str, index: usize) -> bool {
        self.read_current(key, |cell, rng| cell.read_bool(Some(index), rng))
            .unwrap_or(false)
    }

    pub fn get_string(&mut self, key: &str) -> String {
        self.read_current(key, |cell, rng| cell.read_string(None, rng))
            .unwrap_or_default()
    }

    pub fn get_list_string(&mut self, key: &str, index: usize) -> String {
        self.read_current(key, |cell, rng| cell.read_string(Some(index), rng))
            .unwrap_or_default()
    }

    // Setters

    pub fn set_string(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.insert_value(key, ValueCell::new(value, false))
    }

    pub fn set_s32(&mut self, key: &str, value: i32) -> Result<(), ConfigError> {
        self.set_string(key, &value.to_string())
    }

    pub fn set_u32(&mut self, key: &str, value: u32) -> Result<(), ConfigError> {
        self.set_string(key, &value.to_string())
    }

    pub fn set_float(&mut self, key: &str, value: f32) -> Result<(), ConfigError> {
        self.set_string(key, &value.to_string())
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    /// Stored as `(x, y, z)`
    pub fn set_vector(&mut self, key: &str, value: Vector) -> Result<(), ConfigError> {
        self.set_string(key, &value.to_string())
    }

    /// Stored as items joined by `#`
    pub fn set_string_list<S: AsRef<str>>(&mut self, key: &str, items: &[S]) -> Result<(), ConfigError> {
        if items.is_empty() {
            return Err(ConfigError::EmptyList);
        }
        let separator = LIST_SEPARATOR.to_string();
        let literal = items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(separator.as_str());
        self.set_string(key, &literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn store_with(section: &str, entries: &[(&str, &str)]) -> ConfigStore {
        let mut store = ConfigStore::with_seed(11);
        store.select_section(section).unwrap();
        for (key, value) in entries {
            store.set_string(key, value).unwrap();
        }
        store
    }

    #[test]
    fn test_insertion_order_after_reassignment() {
        let mut store = store_with("S", &[("A", "1"), ("B", "2")]);
        store.set_s32("A", 3).unwrap();

        assert_eq!(store.section_keys("S"), vec!["B", "A"]);
        assert_eq!(store.get_s32("A"), 3);
    }

    #[test]
    fn test_sections_iterate_in_creation_order() {
        let mut store = ConfigStore::with_seed(1);
        for name in ["Zeta", "Alpha", "Mid", "Alpha"] {
            store.select_section(name).unwrap();
        }
        let names: Vec<&str> = store.section_names().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_list_access() {
        let mut store = store_with("S", &[("List", "1#2#3"), ("Single", "9")]);

        assert_eq!(store.list_count("List"), 3);
        assert!(store.is_list("List"));
        assert_eq!(store.get_list_s32("List", 1), 2);
        assert_eq!(store.list_count("Single"), 1);
        assert!(!store.is_list("Single"));
        assert_eq!(store.list_count("Missing"), 0);
    }

    #[test]
    fn test_random_list_pick_without_index() {
        let mut store = store_with("S", &[("List", "1#2#3")]);
        let seen: HashSet<i32> = (0..200).map(|_| store.get_s32("List")).collect();
        assert_eq!(seen, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn test_random_range_samples() {
        let mut store = store_with("S", &[("Roll", "5~10")]);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let value = store.get_s32("Roll");
            assert!((5..=10).contains(&value), "{value} out of range");
            seen.insert(value);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_section_parent_inheritance() {
        let mut store = store_with("A", &[("x", "1")]);
        store.select_section("B@A").unwrap();
        assert_eq!(store.parent_of("B"), Some("A"));

        store.select_section("B").unwrap();
        assert_eq!(store.get_s32("x"), 1);

        store.set_s32("x", 2).unwrap();
        assert_eq!(store.get_s32("x"), 2);

        store.select_section("A").unwrap();
        assert_eq!(store.get_s32("x"), 1);
    }

    #[test]
    fn test_value_reference_forms() {
        let mut store = store_with("Base", &[("Speed", "4.5"), ("Name", "base")]);
        store.select_section("Derived").unwrap();
        store.set_string("Speed", "@Base").unwrap();
        store.set_string("Label", "@Base.Name").unwrap();
        store.set_string("Alias", "@.Label").unwrap();

        assert_eq!(store.get_float("Speed"), 4.5);
        assert_eq!(store.get_string("Label"), "base");
        assert_eq!(store.get_string("Alias"), "base");
        // Resolution leaves the cursor alone
        assert_eq!(store.current_section(), Some("Derived"));
        assert_eq!(store.get_value("Derived", "Label").unwrap().literal(), "base");
    }

    #[test]
    fn test_escapes_read_back_literally() {
        let mut store = store_with("S", &[("At", "@@foo"), ("Tilde", "5~~10")]);
        assert_eq!(store.get_string("At"), "@foo");
        assert_eq!(store.get_string("Tilde"), "5~10");
        assert_eq!(store.get_s32("Tilde"), 5);
    }

    #[test]
    fn test_cyclic_references_resolve_to_default() {
        let mut store = store_with("Loop", &[("x", "@Loop")]);
        assert_eq!(store.get_s32("x"), 0);
        assert!(!store.has_value("x"));

        // Parent chains that loop are bounded too
        store.select_section("P@Q").unwrap();
        store.select_section("Q").unwrap();
        store.begin_load();
        store.select_section("Q@P").unwrap();
        store.end_load();
        assert_eq!(store.get_string("missing"), "");
    }

    #[test]
    fn test_parent_only_updated_while_loading() {
        let mut store = ConfigStore::with_seed(3);
        store.select_section("Child@First").unwrap();
        store.select_section("Child@Second").unwrap();
        assert_eq!(store.parent_of("Child"), Some("First"));

        store.begin_load();
        store.select_section("Child@Second").unwrap();
        store.end_load();
        assert_eq!(store.parent_of("Child"), Some("Second"));
    }

    #[test]
    fn test_empty_section_name_rejected() {
        let mut store = ConfigStore::with_seed(3);
        assert!(matches!(store.select_section(""), Err(ConfigError::EmptySectionName)));
        assert!(matches!(store.select_section("@Parent"), Err(ConfigError::EmptySectionName)));
        assert!(matches!(store.set_s32("k", 1), Err(ConfigError::NoSectionSelected)));
    }

    #[test]
    fn test_clear_operations() {
        let mut store = store_with("S", &[("A", "1"), ("B", "2")]);

        store.clear_value("A").unwrap();
        assert!(!store.has_value("A"));
        assert!(matches!(
            store.clear_value("A"),
            Err(ConfigError::ValueNotFound { .. })
        ));

        store.clear_section("S").unwrap();
        assert!(!store.has_section("S"));
        assert_eq!(store.current_section(), None);
        assert!(matches!(
            store.clear_section("S"),
            Err(ConfigError::SectionNotFound(_))
        ));

        store.select_section("T").unwrap();
        store.clear();
        assert_eq!(store.section_names().count(), 0);
    }

    #[test]
    fn test_push_and_pop_section() {
        let mut store = store_with("Outer", &[("k", "outer")]);
        store.push_section("Inner").unwrap();
        store.set_string("k", "inner").unwrap();
        assert_eq!(store.get_string("k"), "inner");

        store.pop_section().unwrap();
        assert_eq!(store.current_section(), Some("Outer"));
        assert_eq!(store.get_string("k"), "outer");
        assert!(matches!(store.pop_section(), Err(ConfigError::EmptySectionStack)));
    }

    #[test]
    fn test_typed_setters_format() {
        let mut store = store_with("S", &[]);
        store.set_vector("Pos", Vector::new(1.0, 2.5, 0.0)).unwrap();
        store.set_bool("Flag", true).unwrap();
        store.set_float("Half", 0.5).unwrap();
        store.set_u32("Big", 4_000_000_000).unwrap();

        assert_eq!(store.literal("Pos"), Some("(1, 2.5, 0)"));
        assert_eq!(store.get_vector("Pos"), Vector::new(1.0, 2.5, 0.0));
        assert!(store.get_bool("Flag"));
        assert_eq!(store.get_float("Half"), 0.5);
        assert_eq!(store.get_u32("Big"), 4_000_000_000);
    }

    #[test]
    fn test_string_list_setter() {
        let mut store = store_with("S", &[]);
        store.set_string_list("Names", &["a", "b", "c"]).unwrap();
        assert_eq!(store.literal("Names"), Some("a#b#c"));
        assert_eq!(store.get_list_string("Names", 2), "c");

        let empty: [&str; 0] = [];
        assert!(matches!(
            store.set_string_list("Names", &empty),
            Err(ConfigError::EmptyList)
        ));
    }

    #[test]
    fn test_missing_values_default() {
        let mut store = store_with("S", &[("Bad", "not a number")]);
        assert_eq!(store.get_s32("Missing"), 0);
        assert_eq!(store.get_float("Bad"), 0.0);
        assert_eq!(store.get_vector("Bad"), Vector::ZERO);
        assert!(!store.get_bool("Bad"));
        assert_eq!(store.get_string("Missing"), "");
    }

    #[test]
    fn test_encryption_key_and_base_name() {
        let mut store = ConfigStore::with_seed(3);
        assert_eq!(store.encryption_key(), Some(DEFAULT_KEY));
        store.set_encryption_key(None);
        assert_eq!(store.encryption_key(), None);

        store.set_base_name(Some("game"));
        assert_eq!(store.base_file(), PathBuf::from("game.ini"));
        store.set_base_name(None);
        assert_eq!(store.base_name(), DEFAULT_BASE_NAME);
    }

    #[test]
    fn test_reload_history_requires_history() {
        let mut store = ConfigStore::with_seed(3);
        assert!(matches!(store.reload_history(), Err(ConfigError::HistoryDisabled)));
    }

    #[test]
    fn test_extreme_float_ranges_read_without_failing() {
        let mut store = store_with(
            "S",
            &[("wide", "-3e38 ~ 3e38"), ("huge", "1 ~ 1e39"), ("vec", "(0,0,0) ~ (1e39, 1, 1)")],
        );
        for _ in 0..50 {
            let wide = store.get_float("wide");
            assert!((-3e38..=3e38).contains(&wide));
        }
        // An out of range bound is dropped, leaving the first value
        assert_eq!(store.get_float("huge"), 1.0);
        assert_eq!(store.get_vector("vec"), Vector::ZERO);
    }

    #[test]
    fn test_reload_history_stops_at_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        std::fs::write(dir.path().join("base.ini"), "[Config]\nHistory = true\n").unwrap();
        let first = dir.path().join("first.ini");
        let gone = dir.path().join("gone.ini");
        let last = dir.path().join("last.ini");
        std::fs::write(&first, "[First]\nk = 1\n").unwrap();
        std::fs::write(&gone, "[Gone]\nk = 2\n").unwrap();
        std::fs::write(&last, "[Last]\nk = 3\n").unwrap();

        let mut store = ConfigStore::init(base.to_str());
        for file in [&first, &gone, &last] {
            store.load(file).unwrap();
        }
        std::fs::remove_file(&gone).unwrap();

        assert!(matches!(store.reload_history(), Err(ConfigError::Io { .. })));
        assert!(store.has_section("First"));
        assert!(!store.has_section("Gone"));
        assert!(!store.has_section("Last"));
        assert_eq!(store.history(), &[first, gone, last]);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut store = store_with("S", &[("b", "1"), ("a", "2")]);
        store.select_section("T@S").unwrap();
        let snapshot = store.snapshot();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].entries.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(snapshot[1].parent.as_deref(), Some("S"));
    }
}
