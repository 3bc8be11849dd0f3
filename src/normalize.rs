use std::collections::{BTreeMap, HashMap};

/// Canonicalizes free-text category labels before any counting.
///
/// Labels are trimmed and runs of whitespace collapsed. Aliases are matched
/// case-insensitively, so "Lace up", "LACE UP" and "Lace Up Trainers" can all
/// land on one canonical "Lace Up".
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    aliases: HashMap<String, String>,
}

impl LabelNormalizer {
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let aliases = aliases
            .iter()
            .map(|(from, to)| (fold(from), collapse_whitespace(to)))
            .collect();
        Self { aliases }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = collapse_whitespace(raw);
        match self.aliases.get(&cleaned.to_lowercase()) {
            Some(canonical) => canonical.clone(),
            None => cleaned,
        }
    }
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new(&default_aliases())
    }
}

/// Product-type aliases that the catalogs are known to mix
pub fn default_aliases() -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    aliases.insert("Lace Up".to_string(), "Lace Up".to_string());
    aliases.insert("Lace Up Trainers".to_string(), "Lace Up".to_string());
    aliases
}

fn fold(label: &str) -> String {
    collapse_whitespace(label).to_lowercase()
}

fn collapse_whitespace(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}
