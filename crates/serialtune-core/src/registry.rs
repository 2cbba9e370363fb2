//! Variable registry
//!
//! A fixed-capacity, insertion-ordered map from labels to [`Slot`]s. Nothing
//! here allocates: labels live in inline buffers and the entry table is sized
//! by the `N` const parameter.
//!
//! Two backends are available and behave identically to callers:
//! - a linear array scanned on lookup (default)
//! - a djb2-hashed index map (`hash-index` feature); `N` must then be a power
//!   of two greater than one
//!
//! Registration never partially succeeds: a full registry, a duplicate label
//! or an oversized label leave the registry untouched and return a
//! [`RegistryError`].

use std::fmt;
use std::hash::Hasher;

use crate::error::RegistryError;
use crate::slot::Slot;

/// Default registry capacity
pub const DEFAULT_MAX_ITEMS: usize = 32;

/// Maximum label length in bytes
pub const MAX_LABEL_LEN: usize = 32;

/// Inline label storage
pub type Label = heapless::String<MAX_LABEL_LEN>;

/// Copy `label` into inline storage, rejecting anything that does not fit
fn make_label(label: &str) -> Result<Label, RegistryError> {
    if label.is_empty() {
        return Err(RegistryError::EmptyLabel);
    }
    let mut stored = Label::new();
    stored
        .push_str(label)
        .map_err(|_| RegistryError::LabelTooLong {
            label: label.to_string(),
            max: MAX_LABEL_LEN,
        })?;
    Ok(stored)
}

/// Bernstein's djb2 string hash (`hash * 33 + byte`, 32-bit)
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher(u32);

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self(5381)
    }
}

impl Hasher for Djb2Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 5).wrapping_add(self.0).wrapping_add(u32::from(b));
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.0)
    }
}

#[cfg(feature = "hash-index")]
impl hash32::Hasher for Djb2Hasher {
    fn finish32(&self) -> u32 {
        self.0
    }
}

#[cfg(not(feature = "hash-index"))]
mod backend {
    use super::Label;
    use crate::slot::Slot;

    pub(super) struct Entries<'a, const N: usize> {
        items: heapless::Vec<(Label, Slot<'a>), N>,
    }

    impl<'a, const N: usize> Entries<'a, N> {
        pub(super) const fn new() -> Self {
            Self {
                items: heapless::Vec::new(),
            }
        }

        pub(super) fn len(&self) -> usize {
            self.items.len()
        }

        pub(super) fn get(&self, label: &str) -> Option<&Slot<'a>> {
            self.items
                .iter()
                .find(|(stored, _)| stored.as_str() == label)
                .map(|(_, slot)| slot)
        }

        pub(super) fn push(&mut self, label: Label, slot: Slot<'a>) -> bool {
            self.items.push((label, slot)).is_ok()
        }

        pub(super) fn iter(&self) -> impl Iterator<Item = (&str, &Slot<'a>)> {
            self.items.iter().map(|(label, slot)| (label.as_str(), slot))
        }
    }
}

#[cfg(feature = "hash-index")]
mod backend {
    use hash32::BuildHasherDefault;

    use super::{Djb2Hasher, Label, MAX_LABEL_LEN};
    use crate::slot::Slot;

    pub(super) struct Entries<'a, const N: usize> {
        items: heapless::IndexMap<Label, Slot<'a>, BuildHasherDefault<Djb2Hasher>, N>,
    }

    impl<'a, const N: usize> Entries<'a, N> {
        pub(super) const fn new() -> Self {
            Self {
                items: heapless::IndexMap::new(),
            }
        }

        pub(super) fn len(&self) -> usize {
            self.items.len()
        }

        pub(super) fn get(&self, label: &str) -> Option<&Slot<'a>> {
            if label.len() > MAX_LABEL_LEN {
                return None;
            }
            let mut key = Label::new();
            key.push_str(label).ok()?;
            self.items.get(&key)
        }

        pub(super) fn push(&mut self, label: Label, slot: Slot<'a>) -> bool {
            self.items.insert(label, slot).is_ok()
        }

        pub(super) fn iter(&self) -> impl Iterator<Item = (&str, &Slot<'a>)> {
            self.items.iter().map(|(label, slot)| (label.as_str(), slot))
        }
    }
}

/// Fixed-capacity map from labels to slots
pub struct Registry<'a, const N: usize = DEFAULT_MAX_ITEMS> {
    entries: backend::Entries<'a, N>,
}

impl<'a, const N: usize> Registry<'a, N> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            entries: backend::Entries::new(),
        }
    }

    /// Register a variable under `label`.
    ///
    /// Accepts any storage with a typed slot constructor, e.g. `&Cell<f32>`
    /// or `&RefCell<String>`.
    pub fn add(&mut self, label: &str, variable: impl Into<Slot<'a>>) -> Result<(), RegistryError> {
        self.insert(label, variable.into())
    }

    /// Register a prebuilt slot under `label`
    pub fn insert(&mut self, label: &str, slot: Slot<'a>) -> Result<(), RegistryError> {
        let stored = make_label(label)?;

        if self.entries.get(label).is_some() {
            return Err(RegistryError::DuplicateLabel(label.to_string()));
        }

        if !self.entries.push(stored, slot) {
            tracing::warn!("Registry full ({} variables), dropping '{}'", N, label);
            return Err(RegistryError::Full {
                label: label.to_string(),
                capacity: N,
            });
        }

        tracing::debug!("Registered '{label}' as {}", slot.primitive_type());
        Ok(())
    }

    /// Find the slot registered under `label`
    pub fn lookup(&self, label: &str) -> Option<&Slot<'a>> {
        self.entries.get(label)
    }

    /// Check whether `label` is registered
    pub fn contains(&self, label: &str) -> bool {
        self.lookup(label).is_some()
    }

    /// Number of registered variables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no variable is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of variables
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether further registrations will be rejected
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Iterate over `(label, slot)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot<'a>)> {
        self.entries.iter()
    }

    /// Iterate over labels in registration order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(label, _)| label)
    }
}

impl<const N: usize> Default for Registry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Registry<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(label, slot)| (label, slot.primitive_type())))
            .finish()
    }
}

/// Register a variable under its own identifier.
///
/// ```rust
/// use std::cell::Cell;
/// use serialtune_core::{tune, Registry};
///
/// let throttle = Cell::new(0.0f32);
/// let mut registry: Registry = Registry::new();
/// tune!(registry, throttle).unwrap();
/// assert!(registry.contains("throttle"));
/// ```
#[macro_export]
macro_rules! tune {
    ($target:expr, $var:ident) => {
        $target.add(stringify!($var), &$var)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_insert_and_lookup() {
        let speed = Cell::new(3u16);
        let name = RefCell::new(String::from("probe"));
        let mut registry: Registry<4> = Registry::new();

        registry.add("speed", &speed).unwrap();
        registry.add("name", &name).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("speed").unwrap().aliases(&speed));
        assert!(registry.lookup("name").unwrap().aliases(&name));
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_capacity_keeps_first_entries() {
        let values: Vec<Cell<i32>> = (0..6).map(Cell::new).collect();
        let labels = ["a", "b", "c", "d", "e", "f"];
        let mut registry: Registry<4> = Registry::new();

        let results: Vec<_> = labels
            .iter()
            .zip(&values)
            .map(|(label, value)| registry.add(label, value))
            .collect();

        assert!(results[..4].iter().all(|r| r.is_ok()));
        assert_eq!(
            results[4],
            Err(RegistryError::Full {
                label: "e".to_string(),
                capacity: 4
            })
        );
        assert_eq!(registry.len(), 4);
        assert!(registry.is_full());
        assert!(registry.lookup("e").is_none());
        assert!(registry.lookup("f").is_none());
        for (label, value) in labels.iter().zip(&values).take(4) {
            assert!(registry.lookup(label).unwrap().aliases(value));
        }
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let first = Cell::new(1u8);
        let second = Cell::new(2u8);
        let mut registry: Registry<4> = Registry::new();

        registry.add("gain", &first).unwrap();
        assert_eq!(
            registry.add("gain", &second),
            Err(RegistryError::DuplicateLabel("gain".to_string()))
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("gain").unwrap().aliases(&first));
    }

    #[test]
    fn test_label_bounds() {
        let value = Cell::new(0u32);
        let mut registry: Registry<4> = Registry::new();

        let long = "x".repeat(MAX_LABEL_LEN + 1);
        assert!(matches!(
            registry.add(&long, &value),
            Err(RegistryError::LabelTooLong { max: MAX_LABEL_LEN, .. })
        ));
        assert_eq!(registry.add("", &value), Err(RegistryError::EmptyLabel));
        assert!(registry.is_empty());

        let exact = "y".repeat(MAX_LABEL_LEN);
        registry.add(&exact, &value).unwrap();
        assert!(registry.contains(&exact));
        assert!(registry.lookup(&long).is_none());
    }

    #[test]
    fn test_iteration_order() {
        let a = Cell::new(0i8);
        let b = Cell::new(0i16);
        let c = Cell::new(0f64);
        let mut registry: Registry<8> = Registry::new();

        registry.add("zeta", &a).unwrap();
        registry.add("alpha", &b).unwrap();
        registry.add("mid", &c).unwrap();

        let labels: Vec<&str> = registry.labels().collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_tune_macro() {
        let kp = Cell::new(0.0f32);
        let mut registry: Registry<2> = Registry::new();

        tune!(registry, kp).unwrap();
        assert!(registry.lookup("kp").unwrap().aliases(&kp));
    }

    #[test]
    fn test_djb2_known_values() {
        let mut hasher = Djb2Hasher::default();
        assert_eq!(hasher.finish(), 5381);

        hasher.write(b"a");
        assert_eq!(hasher.finish(), 5381 * 33 + 97);
    }

    #[test]
    fn test_debug_lists_types() {
        let kp = Cell::new(0.0f32);
        let mut registry: Registry<2> = Registry::new();
        registry.add("kp", &kp).unwrap();

        assert_eq!(format!("{:?}", registry), "{\"kp\": F32}");
    }

    #[cfg(feature = "hash-index")]
    #[test]
    fn test_hash_index_matches_linear_semantics() {
        let values: Vec<Cell<u16>> = (0..10).map(Cell::new).collect();
        let labels = ["rpm", "map", "tps", "clt", "iat", "afr", "egt", "vss", "ign", "inj"];
        let mut registry: Registry<8> = Registry::new();

        for (label, value) in labels.iter().zip(&values).take(8) {
            registry.add(label, value).unwrap();
        }
        assert_eq!(
            registry.add("ign", &values[8]),
            Err(RegistryError::Full {
                label: "ign".to_string(),
                capacity: 8
            })
        );
        assert_eq!(
            registry.add("rpm", &values[9]),
            Err(RegistryError::DuplicateLabel("rpm".to_string()))
        );

        let order: Vec<&str> = registry.labels().collect();
        assert_eq!(order, labels[..8].to_vec());
        for (label, value) in labels.iter().zip(&values).take(8) {
            assert!(registry.lookup(label).unwrap().aliases(value));
        }
        assert!(registry.lookup("ign").is_none());
        assert!(registry.lookup(&"r".repeat(MAX_LABEL_LEN + 1)).is_none());
    }
}
