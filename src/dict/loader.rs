use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::dict::{self, CategoryDictionary};
use crate::paths;

/// Load and merge every dictionary found under `paths`.
///
/// Each path is either a JSON file or a directory searched recursively for
/// `*.json`. Values of the same category across files are concatenated in
/// path order, then deduplicated keeping the first occurrence.
pub fn load(paths: &[impl AsRef<Path>]) -> Result<CategoryDictionary> {
    let files = paths::expand(paths, "json")?;
    if files.is_empty() {
        bail!("no dictionary files found");
    }

    let mut decoded = Vec::with_capacity(files.len());
    for file in &files {
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read dictionary {}", file.display()))?;
        let dict = dict::parse(&content)
            .with_context(|| format!("failed to parse dictionary {}", file.display()))?;
        debug!(path = %file.display(), categories = dict.len(), "decoded dictionary file");
        decoded.push(dict);
    }

    let merged = merge_and_dedup(decoded);
    info!(
        files = files.len(),
        categories = merged.len(),
        "loaded category dictionary"
    );
    Ok(merged)
}

/// Union several dictionaries, category by category.
pub fn merge_and_dedup(dicts: Vec<CategoryDictionary>) -> CategoryDictionary {
    let mut merged = CategoryDictionary::new();
    for dict in dicts {
        for (category, values) in dict {
            merged.entry(category).or_default().extend(values);
        }
    }
    for values in merged.values_mut() {
        *values = dedup(std::mem::take(values));
    }
    merged
}

pub fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
