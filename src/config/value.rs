//! Config value cells
//!
//! A [`ValueCell`] keeps the literal text of an entry exactly as it was
//! assigned, the list items decoded from it, and a cache of the last typed
//! interpretation. The literal is never rewritten; list decoding happens once
//! when the cell is built.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::scalar;
use crate::constants::config::MAX_LIST_ITEMS;
use crate::constants::syntax::{INHERITANCE, LIST_SEPARATOR, RANDOM_SEPARATOR};
use crate::types::Vector;

/// Last successfully parsed interpretation of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    String,
    Float,
    S32,
    U32,
    Bool,
    Vector,
}

/// Parsed value plus the upper bound of a random range, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Payload {
    S32(i32, Option<i32>),
    U32(u32, Option<u32>),
    Float(f32, Option<f32>),
    Bool(bool),
    Vector(Vector, Option<Vector>),
}

impl Payload {
    fn kind(&self) -> ValueKind {
        match self {
            Payload::S32(..) => ValueKind::S32,
            Payload::U32(..) => ValueKind::U32,
            Payload::Float(..) => ValueKind::Float,
            Payload::Bool(_) => ValueKind::Bool,
            Payload::Vector(..) => ValueKind::Vector,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Cache {
    index: usize,
    payload: Payload,
}

/// Scalar types readable from a cell, with optional `a~b` random ranges
pub(crate) trait Scalar: Copy + Default + std::fmt::Debug {
    const KIND: ValueKind;

    fn parse(s: &str) -> Option<(Self, &str)>;
    fn sample<R: Rng + ?Sized>(rng: &mut R, a: Self, b: Self) -> Self;
    fn store(value: Self, bound: Option<Self>) -> Payload;
    fn load(payload: &Payload) -> Option<(Self, Option<Self>)>;
}

/// Uniform draw in `[min(a, b), max(a, b)]`, computed in `f64` so spans wider
/// than `f32::MAX` do not overflow
fn sample_f32<R: Rng + ?Sized>(rng: &mut R, a: f32, b: f32) -> f32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if low == high {
        return low;
    }
    if !low.is_finite() || !high.is_finite() {
        debug!(low, high, "Random range bound is not finite, using lower bound");
        return low;
    }

    let t = f64::from(rng.gen_range(0.0f32..1.0));
    let span = f64::from(high) - f64::from(low);
    let value = (f64::from(low) + t * span) as f32;
    value.clamp(low, high)
}

impl Scalar for i32 {
    const KIND: ValueKind = ValueKind::S32;

    fn parse(s: &str) -> Option<(Self, &str)> {
        scalar::parse_s32(s)
    }

    fn sample<R: Rng + ?Sized>(rng: &mut R, a: Self, b: Self) -> Self {
        rng.gen_range(a.min(b)..=a.max(b))
    }

    fn store(value: Self, bound: Option<Self>) -> Payload {
        Payload::S32(value, bound)
    }

    fn load(payload: &Payload) -> Option<(Self, Option<Self>)> {
        match *payload {
            Payload::S32(value, bound) => Some((value, bound)),
            _ => None,
        }
    }
}

impl Scalar for u32 {
    const KIND: ValueKind = ValueKind::U32;

    fn parse(s: &str) -> Option<(Self, &str)> {
        scalar::parse_u32(s)
    }

    fn sample<R: Rng + ?Sized>(rng: &mut R, a: Self, b: Self) -> Self {
        rng.gen_range(a.min(b)..=a.max(b))
    }

    fn store(value: Self, bound: Option<Self>) -> Payload {
        Payload::U32(value, bound)
    }

    fn load(payload: &Payload) -> Option<(Self, Option<Self>)> {
        match *payload {
            Payload::U32(value, bound) => Some((value, bound)),
            _ => None,
        }
    }
}

impl Scalar for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn parse(s: &str) -> Option<(Self, &str)> {
        scalar::parse_float(s)
    }

    fn sample<R: Rng + ?Sized>(rng: &mut R, a: Self, b: Self) -> Self {
        sample_f32(rng, a, b)
    }

    fn store(value: Self, bound: Option<Self>) -> Payload {
        Payload::Float(value, bound)
    }

    fn load(payload: &Payload) -> Option<(Self, Option<Self>)> {
        match *payload {
            Payload::Float(value, bound) => Some((value, bound)),
            _ => None,
        }
    }
}

impl Scalar for Vector {
    const KIND: ValueKind = ValueKind::Vector;

    fn parse(s: &str) -> Option<(Self, &str)> {
        scalar::parse_vector(s)
    }

    // Each component is drawn independently
    fn sample<R: Rng + ?Sized>(rng: &mut R, a: Self, b: Self) -> Self {
        Vector::new(
            sample_f32(rng, a.x, b.x),
            sample_f32(rng, a.y, b.y),
            sample_f32(rng, a.z, b.z),
        )
    }

    fn store(value: Self, bound: Option<Self>) -> Payload {
        Payload::Vector(value, bound)
    }

    fn load(payload: &Payload) -> Option<(Self, Option<Self>)> {
        match *payload {
            Payload::Vector(value, bound) => Some((value, bound)),
            _ => None,
        }
    }
}

/// Text following the first unescaped `~` of a parsed prefix's remainder
fn range_operand(rest: &str) -> Option<&str> {
    let at = rest.find(RANDOM_SEPARATOR)?;
    let after = &rest[at + RANDOM_SEPARATOR.len_utf8()..];
    if after.starts_with(RANDOM_SEPARATOR) {
        None
    } else {
        Some(after)
    }
}

fn split_items(literal: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = literal;
    loop {
        if items.len() + 1 == MAX_LIST_ITEMS {
            if rest.contains(LIST_SEPARATOR) {
                warn!(
                    max = MAX_LIST_ITEMS,
                    literal = %literal,
                    "Too many list items, remaining separators kept as text"
                );
            }
            items.push(rest.trim().to_string());
            return items;
        }
        match rest.find(LIST_SEPARATOR) {
            Some(at) => {
                items.push(rest[..at].trim().to_string());
                rest = &rest[at + LIST_SEPARATOR.len_utf8()..];
            }
            None => {
                items.push(rest.trim().to_string());
                return items;
            }
        }
    }
}

/// One config value: literal text, decoded items, flags and typed cache
#[derive(Debug, Clone)]
pub struct ValueCell {
    literal: String,
    items: Vec<String>,
    block: bool,
    random: bool,
    inherits: bool,
    cache: Option<Cache>,
}

impl ValueCell {
    /// Build a cell from its literal. Block values are taken verbatim: no list,
    /// random range or inheritance interpretation applies to them.
    pub fn new(literal: impl Into<String>, block: bool) -> Self {
        let literal = literal.into();
        if block {
            return Self {
                items: vec![literal.clone()],
                literal,
                block,
                random: false,
                inherits: false,
                cache: None,
            };
        }

        let mut prefix = literal.chars();
        let inherits = prefix.next() == Some(INHERITANCE) && prefix.next() != Some(INHERITANCE);

        Self {
            items: split_items(&literal),
            random: literal.contains(RANDOM_SEPARATOR),
            inherits,
            block,
            literal,
            cache: None,
        }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_block(&self) -> bool {
        self.block
    }

    pub fn is_list(&self) -> bool {
        self.items.len() > 1
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Number of list items, 1 for a plain value
    pub fn list_count(&self) -> usize {
        self.items.len()
    }

    pub fn kind(&self) -> ValueKind {
        self.cache
            .as_ref()
            .map(|cache| cache.payload.kind())
            .unwrap_or(ValueKind::String)
    }

    /// Reference text after the leading `@` of an inheriting value
    pub fn inheritance_target(&self) -> Option<&str> {
        if self.inherits {
            self.literal.strip_prefix(INHERITANCE)
        } else {
            None
        }
    }

    fn pick_index<R: Rng + ?Sized>(&self, index: Option<usize>, rng: &mut R) -> Option<usize> {
        match index {
            Some(index) if index < self.items.len() => Some(index),
            Some(index) => {
                warn!(
                    index,
                    count = self.items.len(),
                    literal = %self.literal,
                    "List index out of range"
                );
                None
            }
            None if self.items.len() > 1 => Some(rng.gen_range(0..self.items.len())),
            None => Some(0),
        }
    }

    /// Item as display text with `@@` and `~~` escapes removed
    pub(crate) fn read_string<R: Rng + ?Sized>(&self, index: Option<usize>, rng: &mut R) -> String {
        match self.pick_index(index, rng) {
            Some(index) => self.unescaped_item(index),
            None => String::new(),
        }
    }

    /// Unescaped item at `index`, empty when out of range
    pub fn unescaped_item(&self, index: usize) -> String {
        let Some(item) = self.items.get(index) else {
            return String::new();
        };
        if self.block {
            return item.clone();
        }

        let item = if index == 0 && item.starts_with("@@") {
            &item[1..]
        } else {
            item.as_str()
        };
        item.replace("~~", "~")
    }

    pub(crate) fn read<T: Scalar, R: Rng + ?Sized>(&mut self, index: Option<usize>, rng: &mut R) -> T {
        let Some(index) = self.pick_index(index, rng) else {
            return T::default();
        };

        if let Some(cache) = &self.cache {
            if cache.index == index {
                if let Some((value, bound)) = T::load(&cache.payload) {
                    return match bound {
                        Some(bound) => T::sample(rng, value, bound),
                        None => value,
                    };
                }
            }
        }

        let item = &self.items[index];
        let Some((value, rest)) = T::parse(item) else {
            debug!(item = %item, kind = ?T::KIND, "Value could not be parsed, using default");
            self.cache = None;
            return T::default();
        };

        let bound = if self.random {
            range_operand(rest).and_then(|operand| match T::parse(operand) {
                Some((bound, _)) => Some(bound),
                None => {
                    debug!(item = %item, kind = ?T::KIND, "Random range bound could not be parsed");
                    None
                }
            })
        } else {
            None
        };

        self.cache = Some(Cache {
            index,
            payload: T::store(value, bound),
        });

        match bound {
            Some(bound) => T::sample(rng, value, bound),
            None => value,
        }
    }

    pub(crate) fn read_bool<R: Rng + ?Sized>(&mut self, index: Option<usize>, rng: &mut R) -> bool {
        let Some(index) = self.pick_index(index, rng) else {
            return false;
        };

        if let Some(Cache { index: cached, payload: Payload::Bool(value) }) = &self.cache {
            if *cached == index {
                return *value;
            }
        }

        match scalar::parse_bool(&self.items[index]) {
            Some((value, _)) => {
                self.cache = Some(Cache {
                    index,
                    payload: Payload::Bool(value),
                });
                value
            }
            None => {
                debug!(item = %self.items[index], "Value could not be parsed as bool");
                self.cache = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_flags_for_plain_value() {
        let cell = ValueCell::new("42", false);
        assert!(!cell.is_list());
        assert!(!cell.is_random());
        assert!(!cell.inherits());
        assert_eq!(cell.list_count(), 1);
        assert_eq!(cell.kind(), ValueKind::String);
    }

    #[test]
    fn test_list_items_are_decoded_once() {
        let cell = ValueCell::new("1 # 2 #3", false);
        assert!(cell.is_list());
        assert_eq!(cell.list_count(), 3);
        assert_eq!(cell.literal(), "1 # 2 #3");
        assert_eq!(cell.unescaped_item(1), "2");
    }

    #[test]
    fn test_list_recognition_is_capped() {
        let literal = vec!["x"; MAX_LIST_ITEMS + 5].join("#");
        let cell = ValueCell::new(literal, false);
        assert_eq!(cell.list_count(), MAX_LIST_ITEMS);
        // The last item keeps the separators that were not split
        assert!(cell.unescaped_item(MAX_LIST_ITEMS - 1).contains('#'));
    }

    #[test]
    fn test_inheritance_flag_and_escape() {
        let cell = ValueCell::new("@Parent.Key", false);
        assert!(cell.inherits());
        assert_eq!(cell.inheritance_target(), Some("Parent.Key"));

        let escaped = ValueCell::new("@@foo", false);
        assert!(!escaped.inherits());
        assert_eq!(escaped.read_string(None, &mut rng()), "@foo");
    }

    #[test]
    fn test_block_value_is_verbatim() {
        let cell = ValueCell::new("a#b~c @x", true);
        assert!(!cell.is_list());
        assert!(!cell.is_random());
        assert_eq!(cell.read_string(None, &mut rng()), "a#b~c @x");

        let reference = ValueCell::new("@Other", true);
        assert!(!reference.inherits());
    }

    #[test]
    fn test_typed_read_caches_kind() {
        let mut cell = ValueCell::new("12", false);
        assert_eq!(cell.read::<i32, _>(None, &mut rng()), 12);
        assert_eq!(cell.kind(), ValueKind::S32);
        assert_eq!(cell.read::<f32, _>(None, &mut rng()), 12.0);
        assert_eq!(cell.kind(), ValueKind::Float);
    }

    #[test]
    fn test_parse_failure_downgrades_to_string() {
        let mut cell = ValueCell::new("12", false);
        cell.read::<i32, _>(None, &mut rng());
        assert_eq!(cell.read::<Vector, _>(None, &mut rng()), Vector::ZERO);
        assert_eq!(cell.kind(), ValueKind::String);
        // A later successful read parses again
        assert!(cell.read_bool(Some(0), &mut rng()));
        assert_eq!(cell.kind(), ValueKind::Bool);
    }

    #[test]
    fn test_random_range_stays_within_bounds() {
        let mut cell = ValueCell::new("5~10", false);
        let mut rng = rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let value = cell.read::<i32, _>(None, &mut rng);
            assert!((5..=10).contains(&value));
            seen.insert(value);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_reversed_random_range() {
        let mut cell = ValueCell::new("1.0 ~ 0.5", false);
        let mut rng = rng();
        for _ in 0..100 {
            let value = cell.read::<f32, _>(None, &mut rng);
            assert!((0.5..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_float_range_wider_than_f32_max() {
        let mut cell = ValueCell::new("-3e38 ~ 3e38", false);
        let mut rng = rng();
        for _ in 0..100 {
            let value = cell.read::<f32, _>(None, &mut rng);
            assert!(value.is_finite());
            assert!((-3e38..=3e38).contains(&value));
        }
    }

    #[test]
    fn test_sample_f32_with_non_finite_bound_uses_low() {
        assert_eq!(sample_f32(&mut rng(), 1.0, f32::INFINITY), 1.0);
        assert_eq!(sample_f32(&mut rng(), f32::NEG_INFINITY, 2.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_escaped_tilde_is_not_a_range() {
        let mut cell = ValueCell::new("5~~10", false);
        for _ in 0..20 {
            assert_eq!(cell.read::<i32, _>(None, &mut rng()), 5);
        }
        assert_eq!(cell.read_string(None, &mut rng()), "5~10");
    }

    #[test]
    fn test_random_vector_components() {
        let mut cell = ValueCell::new("(0, 0, 0) ~ (1, 2, 0)", false);
        let mut rng = rng();
        for _ in 0..100 {
            let v = cell.read::<Vector, _>(None, &mut rng);
            assert!((0.0..=1.0).contains(&v.x));
            assert!((0.0..=2.0).contains(&v.y));
            assert_eq!(v.z, 0.0);
        }
    }

    #[test]
    fn test_out_of_range_index_returns_default() {
        let mut cell = ValueCell::new("1#2", false);
        assert_eq!(cell.read::<i32, _>(Some(5), &mut rng()), 0);
        assert_eq!(cell.read_string(Some(5), &mut rng()), "");
    }

    #[test]
    fn test_list_random_index_covers_items() {
        let cell = ValueCell::new("a#b#c", false);
        let mut rng = rng();
        let seen: std::collections::HashSet<String> =
            (0..200).map(|_| cell.read_string(None, &mut rng)).collect();
        assert_eq!(seen.len(), 3);
    }
}
