use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

/// Side-loaded members of one resolution pass, de-duplicated by collection key and identifier.
#[derive(Debug, Default)]
pub struct SideloadCollector {
  collections: BTreeMap<String, Vec<Value>>,
  seen: HashSet<(String, String)>,
}

impl SideloadCollector {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserves `identifier` in `collection_key`; `false` when it was already reserved.
  ///
  /// Reserving before the member is serialized keeps cyclic associations finite.
  pub fn reserve(&mut self, collection_key: &str, identifier: &Value) -> bool {
    self
      .seen
      .insert((collection_key.to_string(), identifier.to_string()))
  }

  pub fn push(&mut self, collection_key: &str, value: Value) {
    self
      .collections
      .entry(collection_key.to_string())
      .or_default()
      .push(value);
  }

  pub fn contains(&self, collection_key: &str, identifier: &Value) -> bool {
    self
      .seen
      .contains(&(collection_key.to_string(), identifier.to_string()))
  }

  pub fn is_empty(&self) -> bool {
    self.collections.is_empty()
  }

  pub fn len(&self) -> usize {
    self.collections.values().map(Vec::len).sum()
  }

  /// Collections keyed by collection key, in key order.
  pub fn into_map(self) -> Map<String, Value> {
    self
      .collections
      .into_iter()
      .map(|(key, values)| (key, Value::Array(values)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn reserves_each_identifier_once_per_collection() {
    let mut collector = SideloadCollector::new();
    assert!(collector.reserve("comments", &json!(1)));
    assert!(!collector.reserve("comments", &json!(1)));
    assert!(collector.reserve("users", &json!(1)));
    assert!(collector.reserve("comments", &json!("1")));
    assert!(collector.contains("users", &json!(1)));
  }

  #[test]
  fn emits_collections_in_key_order() {
    let mut collector = SideloadCollector::new();
    collector.push("users", json!({"id": 9}));
    collector.push("comments", json!({"id": 1}));
    collector.push("comments", json!({"id": 2}));
    assert_eq!(collector.len(), 3);
    let map = collector.into_map();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["comments", "users"]);
    assert_eq!(map["comments"], json!([{"id": 1}, {"id": 2}]));
  }
}
