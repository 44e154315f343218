//! Maps taxa to section titles and filesystem-safe folder slugs.
use crate::config::{Rewrite, RulesConfig};
use crate::taxon::normalizer::normalize_taxon_name;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Folder used when neither the group nor the taxon name yields a slug.
pub const UNASSIGNED_FOLDER: &str = "unassigned";

static SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s&-]").expect("valid separator regex"));
static DISALLOWED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("valid slug character regex"));
static UNDERSCORE_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("valid underscore regex"));

/// One taxon placed into a section of the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonGroupRecord {
    pub original_name: String,
    pub title: String,
    pub folder_slug: String,
}

/// How a folder was found for a taxon missing from the group table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderSource {
    Hierarchy,
    FallbackRule,
    Override,
    OwnName,
}

impl fmt::Display for FolderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FolderSource::Hierarchy => "hierarchy",
            FolderSource::FallbackRule => "fallback_rule",
            FolderSource::Override => "override",
            FolderSource::OwnName => "own_name",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderResolution {
    pub folder_slug: String,
    pub source: FolderSource,
}

pub struct GroupResolver<'a> {
    rules: &'a RulesConfig,
}

impl<'a> GroupResolver<'a> {
    pub fn new(rules: &'a RulesConfig) -> Self {
        Self { rules }
    }

    /// Resolves the title and folder slug for a taxon listed under
    /// `raw_group_label` in the group table.
    pub fn resolve(&self, raw_group_label: &str, taxon_label: &str) -> TaxonGroupRecord {
        let taxon = normalize_taxon_name(taxon_label);
        let label = match self.title_override(&taxon) {
            Some(title) => {
                debug!("Title for {:?} overridden to {:?}", taxon, title);
                title
            }
            None => raw_group_label,
        };

        let title = replace_many(label.trim(), &self.rules.title_rewrites)
            .trim()
            .to_string();
        let mut folder_slug = self.folder_slug(&title);
        if folder_slug.is_empty() {
            warn!(
                "Group {:?} of taxon {:?} yields no folder name; using the taxon name instead",
                raw_group_label, taxon
            );
            folder_slug = own_name_slug(&taxon);
        }

        TaxonGroupRecord {
            original_name: taxon,
            title,
            folder_slug,
        }
    }

    /// Derives a folder slug from an already canonical title.
    pub fn folder_slug(&self, title: &str) -> String {
        let mut shortened = replace_many(title, &self.rules.folder_rewrites);
        for word in &self.rules.folder_strip_words {
            shortened = shortened.replace(word.as_str(), "");
        }
        slugify(&shortened.replace('.', ""))
    }

    /// Finds a folder for a taxon missing from the hierarchy table.
    pub fn resolve_unmatched(&self, taxon_label: &str) -> FolderResolution {
        let taxon = normalize_taxon_name(taxon_label);

        if let Some(rule) = self
            .rules
            .fallback_rules
            .iter()
            .find(|rule| rule.contains.iter().any(|p| taxon.contains(p.as_str())))
        {
            debug!("{:?} routed to {:?} by fallback rule", taxon, rule.folder);
            return FolderResolution {
                folder_slug: rule.folder.clone(),
                source: FolderSource::FallbackRule,
            };
        }

        if let Some(o) = self
            .rules
            .folder_overrides
            .iter()
            .find(|o| normalize_taxon_name(&o.taxon) == taxon)
        {
            debug!("{:?} routed to {:?} by override", taxon, o.folder);
            return FolderResolution {
                folder_slug: o.folder.clone(),
                source: FolderSource::Override,
            };
        }

        let folder_slug = own_name_slug(&taxon);
        warn!(
            "Taxon {:?} is missing from the group table; filed under its own name {:?}",
            taxon, folder_slug
        );
        FolderResolution {
            folder_slug,
            source: FolderSource::OwnName,
        }
    }

    fn title_override(&self, taxon: &str) -> Option<&'a str> {
        self.rules
            .title_overrides
            .iter()
            .find(|o| normalize_taxon_name(&o.taxon) == taxon)
            .map(|o| o.title.as_str())
    }
}

/// Single left-to-right pass of exact substring replacement. At each position
/// the first rewrite (in table order) that matches is applied and scanning
/// resumes after the matched text, so replacements never overlap or chain.
pub fn replace_many(input: &str, rewrites: &[Rewrite]) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        match rewrites
            .iter()
            .find(|r| !r.pattern.is_empty() && rest.starts_with(r.pattern.as_str()))
        {
            Some(r) => {
                output.push_str(&r.replacement);
                rest = &rest[r.pattern.len()..];
            }
            None => {
                output.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    output
}

/// Lowercases and reduces `text` to `[a-z0-9_]`, with single underscores
/// between words and none at either end.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let separated = SEPARATOR_REGEX.replace_all(&lowered, "_");
    let allowed = DISALLOWED_REGEX.replace_all(&separated, "");
    let collapsed = UNDERSCORE_RUN_REGEX.replace_all(&allowed, "_");
    collapsed.trim_matches('_').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains("__")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn own_name_slug(taxon: &str) -> String {
    let slug = slugify(&taxon.replace('.', ""));
    if slug.is_empty() {
        warn!("Taxon {:?} yields no folder name; using {:?}", taxon, UNASSIGNED_FOLDER);
        UNASSIGNED_FOLDER.to_string()
    } else {
        slug
    }
}
