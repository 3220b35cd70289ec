// 🗂️ Record Registry
// Ordered in-memory collection of polymorphic records
//
// Insertion order is kept for listing; lookups are linear scans by key.
// Keys are unique within one registry. Aggregates over an empty registry
// never produce NaN or infinities: sum/average are 0, min/max are None.

use crate::error::{RegistryError, RegistryResult, ValidationError};
use crate::ids::IdGenerator;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

// ============================================================================
// RECORD
// ============================================================================

/// A domain entity held by a [`Registry`].
///
/// The variant tag comes from matching on the record's payload, never from
/// runtime type inspection.
pub trait Record {
    /// Immutable identity, unique within a registry
    type Key: Clone + PartialEq + Debug + Display;

    /// Closed set of variant tags
    type Variant: Copy + PartialEq + Debug;

    /// Human-readable family name used in errors and logs
    const KIND: &'static str;

    fn key(&self) -> &Self::Key;

    fn variant(&self) -> Self::Variant;
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Sum,
    Average,
    Min,
    Max,
}

impl Aggregation {
    /// Fold the values.
    ///
    /// Empty input: `Sum` and `Average` give `Some(0.0)`, `Min` and `Max`
    /// give `None`.
    pub fn apply<I>(self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for value in values {
            count += 1;
            sum += value;
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
        }

        match self {
            Aggregation::Sum => Some(sum),
            Aggregation::Average if count == 0 => Some(0.0),
            Aggregation::Average => Some(sum / count as f64),
            Aggregation::Min => min,
            Aggregation::Max => max,
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Registry<R> {
    records: Vec<R>,
    #[serde(skip)]
    ids: IdGenerator,
}

impl<R: Record> Registry<R> {
    pub fn new() -> Self {
        Registry {
            records: Vec::new(),
            ids: IdGenerator::new(),
        }
    }

    /// Registry whose progressive ids start from an injected generator
    pub fn with_ids(ids: IdGenerator) -> Self {
        Registry {
            records: Vec::new(),
            ids,
        }
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Append a record, rejecting duplicate keys
    pub fn add(&mut self, record: R) -> RegistryResult<&R> {
        if self.contains(record.key()) {
            tracing::warn!(kind = R::KIND, key = %record.key(), "duplicate key rejected");
            return Err(RegistryError::duplicate(R::KIND, record.key()));
        }

        tracing::debug!(kind = R::KIND, key = %record.key(), "record added");
        self.records.push(record);
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Build a record with the next progressive id and add it.
    ///
    /// The id is only consumed when both construction and insertion succeed.
    pub fn add_with<F>(&mut self, build: F) -> RegistryResult<&R>
    where
        F: FnOnce(u64) -> Result<R, ValidationError>,
    {
        let record = build(self.ids.peek())?;
        if self.contains(record.key()) {
            return Err(RegistryError::duplicate(R::KIND, record.key()));
        }
        self.ids.commit();
        self.add(record)
    }

    /// Remove by key, returning the record if it was present
    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        let position = self.records.iter().position(|r| r.key() == key)?;
        tracing::debug!(kind = R::KIND, key = %key, "record removed");
        Some(self.records.remove(position))
    }

    pub fn find(&self, key: &R::Key) -> Option<&R> {
        self.records.iter().find(|r| r.key() == key)
    }

    pub fn find_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.key() == key)
    }

    /// Like [`Registry::find`] but absence is an error
    pub fn get(&self, key: &R::Key) -> RegistryResult<&R> {
        self.find(key)
            .ok_or_else(|| RegistryError::not_found(R::KIND, key))
    }

    pub fn get_mut(&mut self, key: &R::Key) -> RegistryResult<&mut R> {
        self.records
            .iter_mut()
            .find(|r| r.key() == key)
            .ok_or_else(|| RegistryError::not_found(R::KIND, key))
    }

    /// First record matching the predicate
    pub fn find_by<P>(&self, predicate: P) -> Option<&R>
    where
        P: Fn(&R) -> bool,
    {
        self.records.iter().find(|r| predicate(r))
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.records.iter().any(|r| r.key() == key)
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&R>
    where
        P: Fn(&R) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    pub fn by_variant(&self, variant: R::Variant) -> Vec<&R> {
        self.filter(|r| r.variant() == variant)
    }

    pub fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&R) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).count()
    }

    pub fn count_variant(&self, variant: R::Variant) -> usize {
        self.count_where(|r| r.variant() == variant)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn all(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ------------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------------

    pub fn aggregate<E>(&self, extractor: E, aggregation: Aggregation) -> Option<f64>
    where
        E: Fn(&R) -> f64,
    {
        aggregation.apply(self.records.iter().map(|r| extractor(r)))
    }

    pub fn sum<E>(&self, extractor: E) -> f64
    where
        E: Fn(&R) -> f64,
    {
        self.aggregate(extractor, Aggregation::Sum).unwrap_or(0.0)
    }

    pub fn average<E>(&self, extractor: E) -> f64
    where
        E: Fn(&R) -> f64,
    {
        self.aggregate(extractor, Aggregation::Average).unwrap_or(0.0)
    }

    pub fn min<E>(&self, extractor: E) -> Option<f64>
    where
        E: Fn(&R) -> f64,
    {
        self.aggregate(extractor, Aggregation::Min)
    }

    pub fn max<E>(&self, extractor: E) -> Option<f64>
    where
        E: Fn(&R) -> f64,
    {
        self.aggregate(extractor, Aggregation::Max)
    }

    /// Record with the highest extracted value (first one wins ties)
    pub fn max_by<E>(&self, extractor: E) -> Option<&R>
    where
        E: Fn(&R) -> f64,
    {
        extreme_by(self.records.iter(), extractor, |candidate, best| candidate > best)
    }

    /// Record with the lowest extracted value (first one wins ties)
    pub fn min_by<E>(&self, extractor: E) -> Option<&R>
    where
        E: Fn(&R) -> f64,
    {
        extreme_by(self.records.iter(), extractor, |candidate, best| candidate < best)
    }

    // ------------------------------------------------------------------------
    // Grouping
    // ------------------------------------------------------------------------

    /// Partition records by key, groups ordered by first appearance
    pub fn group_by<G, K>(&self, key_fn: K) -> Vec<(G, Vec<&R>)>
    where
        G: PartialEq,
        K: Fn(&R) -> G,
    {
        let mut groups: Vec<(G, Vec<&R>)> = Vec::new();

        for record in &self.records {
            let group = key_fn(record);
            match groups.iter_mut().find(|(g, _)| *g == group) {
                Some((_, members)) => members.push(record),
                None => groups.push((group, vec![record])),
            }
        }

        groups
    }

    /// Aggregate a value per group, groups ordered by first appearance
    pub fn group_aggregate<G, K, V>(
        &self,
        key_fn: K,
        value_fn: V,
        aggregation: Aggregation,
    ) -> Vec<(G, f64)>
    where
        G: PartialEq,
        K: Fn(&R) -> G,
        V: Fn(&R) -> f64,
    {
        self.group_by(key_fn)
            .into_iter()
            .filter_map(|(group, members)| {
                aggregation
                    .apply(members.into_iter().map(|r| value_fn(r)))
                    .map(|value| (group, value))
            })
            .collect()
    }

    /// Group key whose aggregate is highest; first-encountered group wins ties
    pub fn group_max_by<G, K, V>(&self, key_fn: K, value_fn: V, aggregation: Aggregation) -> Option<G>
    where
        G: PartialEq,
        K: Fn(&R) -> G,
        V: Fn(&R) -> f64,
    {
        pick_group(self.group_aggregate(key_fn, value_fn, aggregation), |a, b| a > b)
    }

    /// Group key whose aggregate is lowest; first-encountered group wins ties
    pub fn group_min_by<G, K, V>(&self, key_fn: K, value_fn: V, aggregation: Aggregation) -> Option<G>
    where
        G: PartialEq,
        K: Fn(&R) -> G,
        V: Fn(&R) -> f64,
    {
        pick_group(self.group_aggregate(key_fn, value_fn, aggregation), |a, b| a < b)
    }
}

impl<R: Record> Default for Registry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R> IntoIterator for &'a Registry<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn extreme_by<'a, R, E, B>(records: impl Iterator<Item = &'a R>, extractor: E, better: B) -> Option<&'a R>
where
    E: Fn(&R) -> f64,
    B: Fn(f64, f64) -> bool,
{
    let mut best: Option<(&'a R, f64)> = None;

    for record in records {
        let value = extractor(record);
        match best {
            Some((_, best_value)) if !better(value, best_value) => {}
            _ => best = Some((record, value)),
        }
    }

    best.map(|(record, _)| record)
}

fn pick_group<G, B>(groups: Vec<(G, f64)>, better: B) -> Option<G>
where
    B: Fn(f64, f64) -> bool,
{
    let mut best: Option<(G, f64)> = None;

    for (group, value) in groups {
        let replace = match &best {
            Some((_, best_value)) => better(value, *best_value),
            None => true,
        };
        if replace {
            best = Some((group, value));
        }
    }

    best.map(|(group, _)| group)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Shape {
        Round,
        Square,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        code: String,
        shape: Shape,
        group: &'static str,
        price: f64,
    }

    impl Record for Item {
        type Key = String;
        type Variant = Shape;
        const KIND: &'static str = "item";

        fn key(&self) -> &String {
            &self.code
        }

        fn variant(&self) -> Shape {
            self.shape
        }
    }

    fn item(code: &str, shape: Shape, group: &'static str, price: f64) -> Item {
        Item {
            code: code.to_string(),
            shape,
            group,
            price,
        }
    }

    fn sample() -> Registry<Item> {
        let mut registry = Registry::new();
        registry.add(item("a", Shape::Round, "x", 10.0)).unwrap();
        registry.add(item("b", Shape::Square, "y", 30.0)).unwrap();
        registry.add(item("c", Shape::Round, "x", 20.0)).unwrap();
        registry.add(item("d", Shape::Square, "z", 5.0)).unwrap();
        registry
    }

    #[test]
    fn test_add_then_find() {
        let mut registry = Registry::new();
        let original = item("a", Shape::Round, "x", 1.0);
        registry.add(original.clone()).unwrap();

        assert_eq!(registry.find(&"a".to_string()), Some(&original));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = Registry::new();
        registry.add(item("a", Shape::Round, "x", 1.0)).unwrap();

        let err = registry.add(item("a", Shape::Square, "y", 2.0)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_then_find_is_absent() {
        let mut registry = sample();
        let removed = registry.remove(&"b".to_string());

        assert_eq!(removed.map(|r| r.code), Some("b".to_string()));
        assert!(registry.find(&"b".to_string()).is_none());
        assert!(registry.remove(&"b".to_string()).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_get_reports_not_found() {
        let mut registry = sample();
        let err = registry.get(&"zzz".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "item not found: zzz");
        let err = registry.get_mut(&"zzz".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "item not found: zzz");
    }

    #[test]
    fn test_filter_preserves_order() {
        let registry = sample();
        let round: Vec<&str> = registry
            .by_variant(Shape::Round)
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(round, vec!["a", "c"]);

        let cheap: Vec<&str> = registry
            .filter(|r| r.price < 25.0)
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(cheap, vec!["a", "c", "d"]);
        assert_eq!(registry.count_variant(Shape::Square), 2);
    }

    #[test]
    fn test_aggregates() {
        let registry = sample();
        assert_eq!(registry.sum(|r| r.price), 65.0);
        assert_eq!(registry.average(|r| r.price), 16.25);
        assert_eq!(registry.min(|r| r.price), Some(5.0));
        assert_eq!(registry.max(|r| r.price), Some(30.0));
        assert_eq!(registry.max_by(|r| r.price).map(|r| r.code.as_str()), Some("b"));
        assert_eq!(registry.min_by(|r| r.price).map(|r| r.code.as_str()), Some("d"));
    }

    #[test]
    fn test_empty_aggregates_are_defined() {
        let registry: Registry<Item> = Registry::new();
        let total = registry.sum(|r| r.price);
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
        assert_eq!(format!("{:.2}", total), "0.00");
        assert_eq!(registry.aggregate(|r| r.price, Aggregation::Sum), Some(0.0));
        assert_eq!(registry.average(|r| r.price), 0.0);
        assert_eq!(registry.min(|r| r.price), None);
        assert_eq!(registry.max(|r| r.price), None);
        assert!(registry.max_by(|r| r.price).is_none());
        assert_eq!(
            registry.group_max_by(|r| r.group, |r| r.price, Aggregation::Average),
            None
        );
    }

    #[test]
    fn test_group_by_first_appearance() {
        let registry = sample();
        let groups: Vec<(&str, usize)> = registry
            .group_by(|r| r.group)
            .into_iter()
            .map(|(g, members)| (g, members.len()))
            .collect();
        assert_eq!(groups, vec![("x", 2), ("y", 1), ("z", 1)]);
    }

    #[test]
    fn test_group_max_and_min_by_average() {
        let registry = sample();
        // x: 15, y: 30, z: 5
        assert_eq!(
            registry.group_max_by(|r| r.group, |r| r.price, Aggregation::Average),
            Some("y")
        );
        assert_eq!(
            registry.group_min_by(|r| r.group, |r| r.price, Aggregation::Average),
            Some("z")
        );
    }

    #[test]
    fn test_group_max_tie_keeps_first_group() {
        let mut registry = Registry::new();
        registry.add(item("a", Shape::Round, "first", 10.0)).unwrap();
        registry.add(item("b", Shape::Round, "second", 10.0)).unwrap();

        assert_eq!(
            registry.group_max_by(|r| r.group, |r| r.price, Aggregation::Average),
            Some("first")
        );
        assert_eq!(
            registry.group_min_by(|r| r.group, |r| r.price, Aggregation::Sum),
            Some("first")
        );
    }

    #[test]
    fn test_max_by_tie_keeps_first() {
        let mut registry = Registry::new();
        registry.add(item("a", Shape::Round, "x", 10.0)).unwrap();
        registry.add(item("b", Shape::Round, "x", 10.0)).unwrap();
        assert_eq!(registry.max_by(|r| r.price).map(|r| r.code.as_str()), Some("a"));
        assert_eq!(registry.min_by(|r| r.price).map(|r| r.code.as_str()), Some("a"));
    }

    #[test]
    fn test_add_with_consumes_id_only_on_success() {
        let mut registry: Registry<Item> = Registry::new();

        let failed = registry.add_with(|_| Err(ValidationError::empty_field("code")));
        assert!(failed.is_err());
        assert_eq!(registry.ids().peek(), 1);

        registry
            .add_with(|id| Ok(item(&format!("#{}", id), Shape::Round, "x", 1.0)))
            .unwrap();
        registry
            .add_with(|id| Ok(item(&format!("#{}", id), Shape::Round, "x", 1.0)))
            .unwrap();

        let codes: Vec<&str> = registry.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["#1", "#2"]);
    }

    #[test]
    fn test_injected_ids_and_reset() {
        let mut registry: Registry<Item> = Registry::with_ids(IdGenerator::starting_at(100));
        registry
            .add_with(|id| Ok(item(&format!("#{}", id), Shape::Round, "x", 1.0)))
            .unwrap();
        assert_eq!(registry.ids().peek(), 101);

        registry.ids_mut().reset();
        registry
            .add_with(|id| Ok(item(&format!("#{}", id), Shape::Square, "y", 2.0)))
            .unwrap();

        let codes: Vec<&str> = registry.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["#100", "#1"]);
    }

    #[test]
    fn test_find_mut_updates_in_place() {
        let mut registry = sample();
        if let Some(record) = registry.find_mut(&"c".to_string()) {
            record.price = 99.0;
        }

        assert_eq!(registry.find(&"c".to_string()).map(|r| r.price), Some(99.0));
        assert_eq!(registry.max_by(|r| r.price).map(|r| r.code.as_str()), Some("c"));
        assert!(registry.find_mut(&"zzz".to_string()).is_none());
    }

    proptest! {
        #[test]
        fn prop_sum_matches_iterator_sum(prices in proptest::collection::vec(0.0f64..1000.0, 0..20)) {
            let mut registry = Registry::new();
            for (i, price) in prices.iter().enumerate() {
                registry.add(item(&i.to_string(), Shape::Round, "x", *price)).unwrap();
            }
            let expected: f64 = prices.iter().sum();
            prop_assert!((registry.sum(|r| r.price) - expected).abs() < 1e-9);
            prop_assert!(registry.average(|r| r.price).is_finite());
        }
    }
}
