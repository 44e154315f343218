//! Deduplicated taxon → section table and the ordered list of sections.
use crate::grouping::TaxonGroupRecord;
use crate::taxon::normalizer::normalize_taxon_name;
use log::{info, warn};
use std::collections::{HashMap, HashSet};

/// Weights 0-9 are left for hand-written introductory pages.
pub const DEFAULT_WEIGHT_OFFSET: u32 = 10;

/// Order in which sections receive their display weight.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderStrategy {
    /// Case-insensitive by title, then by folder slug.
    #[default]
    #[value(name = "alphabetical")]
    Alphabetical,
    /// Order in which sections first appear in the group table.
    #[value(name = "first-seen")]
    FirstSeen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub title: String,
    pub folder_slug: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyTable {
    pub records: Vec<TaxonGroupRecord>,
    pub folders: Vec<FolderEntry>,
}

/// Builds the hierarchy table from resolved records. Duplicate records are
/// dropped (first one wins) and each distinct (title, folder) pair gets a
/// weight starting at `weight_offset`.
pub fn build_hierarchy(
    records: Vec<TaxonGroupRecord>,
    order: OrderStrategy,
    weight_offset: u32,
) -> HierarchyTable {
    let mut seen = HashSet::new();
    let total = records.len();
    let records: Vec<TaxonGroupRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();
    if records.len() < total {
        info!("Dropped {} duplicate hierarchy rows.", total - records.len());
    }

    let mut seen_pairs = HashSet::new();
    let mut pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.title.as_str(), r.folder_slug.as_str()))
        .filter(|pair| seen_pairs.insert(*pair))
        .collect();

    if order == OrderStrategy::Alphabetical {
        pairs.sort_by(|a, b| {
            a.0.to_lowercase()
                .cmp(&b.0.to_lowercase())
                .then_with(|| a.1.cmp(b.1))
        });
    }

    let mut titles_by_slug: HashMap<&str, &str> = HashMap::new();
    for &(title, slug) in &pairs {
        if let Some(existing) = titles_by_slug.insert(slug, title) {
            warn!(
                "Folder {:?} is shared by sections {:?} and {:?}; the later index page overwrites the earlier one",
                slug, existing, title
            );
        }
    }

    if !pairs.is_empty() && weight_at(weight_offset, pairs.len() - 1) == u32::MAX {
        warn!(
            "Weight offset {} leaves no room for {} sections; the last weights are capped at {}",
            weight_offset,
            pairs.len(),
            u32::MAX
        );
    }
    let folders = pairs
        .iter()
        .enumerate()
        .map(|(i, (title, slug))| FolderEntry {
            title: title.to_string(),
            folder_slug: slug.to_string(),
            weight: weight_at(weight_offset, i),
        })
        .collect();

    HierarchyTable { records, folders }
}

fn weight_at(offset: u32, index: usize) -> u32 {
    u32::try_from(index)
        .ok()
        .and_then(|i| offset.checked_add(i))
        .unwrap_or(u32::MAX)
}

/// Maps each normalized taxon name to its folder. The first record wins when
/// a taxon appears under several groups.
pub fn folder_lookup(records: &[TaxonGroupRecord]) -> HashMap<String, String> {
    let mut lookup = HashMap::new();
    for record in records {
        let key = normalize_taxon_name(&record.original_name);
        if let Some(existing) = lookup.get(&key) {
            if existing != &record.folder_slug {
                warn!(
                    "Taxon {:?} is listed under both {:?} and {:?}; keeping {:?}",
                    key, existing, record.folder_slug, existing
                );
            }
            continue;
        }
        lookup.insert(key, record.folder_slug.clone());
    }
    lookup
}
