//! Mock search index over a fixed list of fruit

use crate::config::SearchConfig;
use crate::error::FeedError;
use crate::source::SearchSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const FRUIT: [&str; 10] = [
    "Apple",
    "Apricot",
    "Avocado",
    "Banana",
    "Blueberry",
    "Cherry",
    "Cranberry",
    "Date",
    "Grape",
    "Grapefruit",
];

/// A searchable fruit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    /// 1-based id
    pub id: u32,
    /// Display name
    pub name: String,
}

/// Case-insensitive substring search with latency
#[derive(Debug, Clone)]
pub struct MockFruitIndex {
    fruit: Vec<Fruit>,
    latency: Duration,
}

impl MockFruitIndex {
    /// Create the index with the given latency
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        let fruit = (1u32..)
            .zip(FRUIT)
            .map(|(id, name)| Fruit {
                id,
                name: name.to_string(),
            })
            .collect();
        Self { fruit, latency }
    }

    /// Create the index with the configured latency
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.latency())
    }

    fn matching(&self, query: &str) -> Vec<Fruit> {
        let needle = query.to_lowercase();
        self.fruit
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl Default for MockFruitIndex {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl SearchSource for MockFruitIndex {
    type Item = Fruit;

    async fn search(&self, query: &str) -> Result<Vec<Fruit>, FeedError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.matching(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(results: &[Fruit]) -> Vec<&str> {
        results.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn substring_match_ignores_case() {
        let index = MockFruitIndex::default();
        assert_eq!(
            names(&index.matching("AP")),
            vec!["Apple", "Apricot", "Grape", "Grapefruit"]
        );
    }

    #[test]
    fn apple_is_first() {
        let index = MockFruitIndex::default();
        let results = index.matching("apple");
        assert_eq!(results[0].id, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn no_match() {
        assert!(MockFruitIndex::default().matching("xyz").is_empty());
    }
}
