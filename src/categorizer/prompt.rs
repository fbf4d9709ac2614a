//! Prompt construction and output matching.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::category::Category;

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s-]").expect("valid output filter regex"));

/// Build the categorization prompt for a summary.
pub fn build_prompt(category_names: &[&str], summary: &str) -> String {
    format!(
        "You are a news categorization assistant. \
         Respond with exactly one category (maximum two words) chosen from this list: \
         {}. Summary: {summary}\nCategory:",
        category_names.join(", ")
    )
}

/// Reduce model output to a lookup key: strip punctuation, trim, lowercase.
pub fn normalize_output(raw: &str) -> String {
    DISALLOWED_CHARS
        .replace_all(raw, "")
        .trim()
        .to_lowercase()
}

/// Category vocabulary loaded for one batch.
#[derive(Debug, Clone, Default)]
pub struct CategoryVocabulary {
    names: Vec<String>,
    by_name: HashMap<String, String>,
}

impl CategoryVocabulary {
    /// Build from stored categories.
    pub fn new(categories: &[Category]) -> Self {
        let names = categories.iter().map(|c| c.name.clone()).collect();
        let by_name = categories
            .iter()
            .map(|c| (c.name.to_lowercase(), c.id.clone()))
            .collect();
        Self { names, by_name }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Category names in load order.
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// Match raw model output to a category ID.
    pub fn resolve(&self, raw_output: &str) -> Option<&str> {
        let key = normalize_output(raw_output);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).map(String::as_str)
    }
}
