//! Injection records exchanged between the driver and handlers.
//!
//! Each simulation step, the driver collects the array produced by every
//! real-time handler into one [`InjectionRecord`] keyed by quantity name
//! (e.g. `load_p`, `prod_v`). The same container carries the previous
//! forecast step when handlers cooperate on a multi-horizon forecast.
use crate::error::ChronicsError;
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// A container mapping quantity names to per-element value arrays.
#[derive(Debug, Clone, Default)]
pub struct InjectionRecord(HashMap<String, Vec<f32>>);

impl InjectionRecord {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, Vec<f32>)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts an array under the given quantity name.
    pub fn insert(&mut self, k: impl Into<String>, v: Vec<f32>) {
        self.0.insert(k.into(), v);
    }

    /// Returns the array stored under the given name, if any.
    pub fn get(&self, k: &str) -> Option<&[f32]> {
        self.0.get(k).map(|v| v.as_slice())
    }

    /// Returns a copy of the array stored under the given name.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicsError::RecordKeyError`] if the key does not exist.
    pub fn get_array(&self, k: &str) -> Result<Vec<f32>, ChronicsError> {
        self.0
            .get(k)
            .cloned()
            .ok_or_else(|| ChronicsError::RecordKeyError(k.to_string()))
    }

    /// Returns an iterator over the quantity names in the record.
    pub fn keys(&self) -> Keys<'_, String, Vec<f32>> {
        self.0.keys()
    }

    /// Returns an iterator over the name-array pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, Vec<f32>> {
        self.0.iter()
    }

    /// Merges two records, consuming both.
    ///
    /// On a duplicate key the value of `record` wins.
    pub fn merge(self, record: InjectionRecord) -> Self {
        Self(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: &InjectionRecord) {
        for (k, v) in record.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of arrays in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::InjectionRecord;
    use crate::error::ChronicsError;

    #[test]
    fn test_insert_get() {
        let mut record = InjectionRecord::empty();
        assert!(record.is_empty());
        record.insert("load_p", vec![1.0, 2.0, 3.0]);
        assert_eq!(record.get("load_p"), Some(&[1.0f32, 2.0, 3.0][..]));
        assert_eq!(record.get("load_q"), None);
        assert!(matches!(
            record.get_array("load_q"),
            Err(ChronicsError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_overwrites() {
        let record = InjectionRecord::from_slice(&[("load_p", vec![1.0]), ("load_q", vec![2.0])]);
        let other = InjectionRecord::from_slice(&[("load_q", vec![9.0])]);
        let merged = record.merge(other);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("load_q"), Some(&[9.0f32][..]));
    }

    #[test]
    fn test_merge_inplace() {
        let mut record = InjectionRecord::from_slice(&[("prod_p", vec![1.0])]);
        let other = InjectionRecord::from_slice(&[("prod_v", vec![4.0, 5.0])]);
        record.merge_inplace(&other);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("prod_v"), Some(&[4.0f32, 5.0][..]));
    }
}
