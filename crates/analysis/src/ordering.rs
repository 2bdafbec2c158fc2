// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario display order.
//!
//! When every scenario present is a known one, the curated canonical order is
//! used. A single unknown name switches the whole set to plain lexicographic
//! order.

use allocscope_core::config::CANONICAL_SCENARIOS;
use allocscope_core::AnalysisConfig;
use std::collections::BTreeSet;

/// Orders scenario names for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOrdering {
    canonical: Vec<String>,
}

impl Default for ScenarioOrdering {
    fn default() -> Self {
        Self::new(CANONICAL_SCENARIOS)
    }
}

impl ScenarioOrdering {
    /// Create a policy with the given preferred order.
    pub fn new<I, S>(canonical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a policy from the configured canonical list.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.canonical_scenarios.iter().cloned())
    }

    /// Whether `name` is one of the known scenarios.
    pub fn is_canonical(&self, name: &str) -> bool {
        self.canonical.iter().any(|c| c == name)
    }

    /// Distinct scenario names in display order.
    pub fn order<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: BTreeSet<&str> = names.into_iter().collect();

        if present.iter().all(|name| self.is_canonical(name)) {
            self.canonical
                .iter()
                .filter(|c| present.contains(c.as_str()))
                .cloned()
                .collect()
        } else {
            present.into_iter().map(str::to_string).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_order() {
        let order = ScenarioOrdering::default().order(["Stress", "Sequential", "Random", "Mixed"]);
        assert_eq!(order, vec!["Sequential", "Random", "Mixed", "Stress"]);
    }

    #[test]
    fn test_canonical_subset_with_duplicates() {
        let order = ScenarioOrdering::default().order(["Stress", "Random", "Stress"]);
        assert_eq!(order, vec!["Random", "Stress"]);
    }

    #[test]
    fn test_unknown_name_falls_back_to_lexicographic() {
        let order = ScenarioOrdering::default().order(["Warmup", "Stress"]);
        assert_eq!(order, vec!["Stress", "Warmup"]);

        let order = ScenarioOrdering::default().order(["Sequential", "Random", "custom", "Mixed"]);
        assert_eq!(order, vec!["Mixed", "Random", "Sequential", "custom"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(ScenarioOrdering::default().order(Vec::<&str>::new()).is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = AnalysisConfig {
            canonical_scenarios: vec!["Warmup".to_string(), "Stress".to_string()],
            ..AnalysisConfig::default()
        };
        let ordering = ScenarioOrdering::from_config(&config);
        assert!(ordering.is_canonical("Warmup"));
        assert!(!ordering.is_canonical("Sequential"));
        assert_eq!(ordering.order(["Stress", "Warmup"]), vec!["Warmup", "Stress"]);
    }

    proptest! {
        #[test]
        fn test_order_is_permutation_invariant(mut names in prop::collection::vec("[A-Za-z]{1,8}", 0..12)) {
            let ordering = ScenarioOrdering::default();
            let forward = ordering.order(names.iter().map(String::as_str));
            names.reverse();
            let backward = ordering.order(names.iter().map(String::as_str));
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn test_order_yields_each_distinct_name_once(names in prop::collection::vec("[A-Za-z]{1,8}", 0..12)) {
            let ordered = ScenarioOrdering::default().order(names.iter().map(String::as_str));
            let distinct: BTreeSet<&str> = names.iter().map(String::as_str).collect();
            prop_assert_eq!(ordered.len(), distinct.len());
            for name in &ordered {
                prop_assert!(distinct.contains(name.as_str()));
            }
        }

        #[test]
        fn test_canonical_subsets_keep_canonical_order(mask in prop::collection::vec(any::<bool>(), 4)) {
            let picked: Vec<&str> = CANONICAL_SCENARIOS
                .iter()
                .zip(&mask)
                .filter(|(_, keep)| **keep)
                .map(|(name, _)| *name)
                .rev()
                .collect();
            let ordered = ScenarioOrdering::default().order(picked.iter().copied());
            let expected: Vec<&str> = CANONICAL_SCENARIOS
                .iter()
                .zip(&mask)
                .filter(|(_, keep)| **keep)
                .map(|(name, _)| *name)
                .collect();
            prop_assert_eq!(ordered, expected);
        }
    }
}
