use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static ABBREVIATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(ssp|spp)\b\.?").expect("valid abbreviation regex"));

/// Cleans a raw taxon label taken from a folder name or a spreadsheet cell.
///
/// Leading/trailing underscores (the marker for in-progress taxa) and
/// whitespace are stripped, and bare `ssp`/`spp` tokens gain a trailing period.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_taxon_name(taxon_name: &str) -> String {
    let trimmed = taxon_name.trim_matches(|c: char| c == '_' || c.is_whitespace());
    ABBREVIATION_REGEX
        .replace_all(trimmed, "$1.")
        .into_owned()
}

/// Normalizes the leaf name of a path. `None` when the leaf is missing,
/// not valid UTF-8, or empty after cleanup.
pub fn normalize_path_name(path: &Path) -> Option<String> {
    let leaf = path.file_name()?.to_str()?;
    let normalized = normalize_taxon_name(leaf);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
