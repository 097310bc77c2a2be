pub mod loader;

use std::collections::BTreeMap;

use anyhow::{Context, Result};

/// Category name to its ordered candidate values.
///
/// A `BTreeMap` keeps category order stable between runs, which is what makes
/// a fixed sampler seed reproduce the same stream of combinations.
pub type CategoryDictionary = BTreeMap<String, Vec<String>>;

/// Parse a single dictionary document: `{ "Category": ["a", "b"], ... }`.
pub fn parse(json: &str) -> Result<CategoryDictionary> {
    serde_json::from_str(json).context("dictionary is not an object of string lists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_value_order() {
        let dict = parse(r#"{"Color": ["Red", "Green", "Blue"]}"#).unwrap();
        assert_eq!(dict["Color"], vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn test_parse_rejects_non_string_values() {
        assert!(parse(r#"{"Count": [1, 2, 3]}"#).is_err());
        assert!(parse(r#"["Red"]"#).is_err());
    }
}
