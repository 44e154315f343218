//! Rewrite tables and fallback rules used to place taxa into site sections.
//!
//! Every table is ordered: earlier entries win. The built-in defaults describe
//! the lichen guide's master reference sheet; a JSON file with the same shape
//! can replace any of them (missing keys keep their defaults).
use crate::error::{CrateError, Result};
use crate::grouping::is_valid_slug;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Exact substring replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    pub pattern: String,
    pub replacement: String,
}

/// Forces the title of one taxon regardless of its group in the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleOverride {
    pub taxon: String,
    pub title: String,
}

/// Routes an unmatched taxon to `folder` when its name contains any of
/// `contains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub contains: Vec<String>,
    pub folder: String,
}

/// Names one unmatched taxon and the folder it belongs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderOverride {
    pub taxon: String,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub title_overrides: Vec<TitleOverride>,
    pub title_rewrites: Vec<Rewrite>,
    pub folder_rewrites: Vec<Rewrite>,
    /// Removed verbatim from titles before slugging; surrounding spaces count.
    pub folder_strip_words: Vec<String>,
    pub fallback_rules: Vec<FallbackRule>,
    pub folder_overrides: Vec<FolderOverride>,
}

fn rewrite(pattern: &str, replacement: &str) -> Rewrite {
    Rewrite {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    }
}

fn fallback(contains: &[&str], folder: &str) -> FallbackRule {
    FallbackRule {
        contains: contains.iter().map(|s| s.to_string()).collect(),
        folder: folder.to_string(),
    }
}

fn folder_override(taxon: &str, folder: &str) -> FolderOverride {
    FolderOverride {
        taxon: taxon.to_string(),
        folder: folder.to_string(),
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            title_overrides: vec![TitleOverride {
                taxon: "Squamarina lentigera".to_string(),
                title: "Lobed Crusts, Select Crusts, Minutely Fruticose Species".to_string(),
            }],
            title_rewrites: vec![
                // both Caliciaceae groups share one section
                rewrite("gray crustose Caliciaceae", "Caliciaceae"),
                rewrite("yellow crustose Caliciaceae", "Caliciaceae"),
                rewrite(
                    "[Non-Shrub or Hair-Like] Fruticose Parmelioids",
                    "Non-Shrub or Hair-Like Fruticose Parmelioids",
                ),
                rewrite(
                    "P. aphthosa-leucophlebia complex & similar",
                    "P. aphthosa-leucophlebia Complex & Similar",
                ),
                rewrite(
                    "Lobed-Crusts, Select Crusts, Minutely Fruticose Species",
                    "Lobed Crusts, Select Crusts, Minutely Fruticose Species",
                ),
                rewrite(" spp.", ""),
            ],
            folder_rewrites: vec![
                rewrite(
                    "Mushroom-Forming Lichens & Basidiolichens",
                    "Mushroom-Forming",
                ),
                rewrite(
                    "Lobed Crusts, Select Crusts, Minutely Fruticose Species",
                    "Crusts & Fruticose",
                ),
                rewrite("Pseudocyphellaria & Parmostictina", "Pseudo & Parmo"),
                rewrite(
                    "Non-Shrub or Hair-Like Fruticose Parmelioids",
                    "Non-Shrub Hair",
                ),
                rewrite(
                    "P. aphthosa-leucophlebia Complex & Similar",
                    "Pelaph Complex",
                ),
                rewrite(" Genera", ""),
            ],
            folder_strip_words: vec![" Lichens".to_string()],
            fallback_rules: vec![
                fallback(&["Cladonia"], "cladoniaceae"),
                fallback(&["Thamnolia", "Siphula", "Lepra"], "icmadophilaceae"),
                fallback(&["Dactylina", "Allocetraria"], "non_shrub_hair"),
            ],
            folder_overrides: vec![
                folder_override("Glypholecia scabra", "scales_squamule_like"),
                folder_override("Lobaria linita & Lobaria tenuior", "lungworts"),
                folder_override(
                    "Rusavskia elegans & Rusavskia sorediata",
                    "teloschistaceae",
                ),
                folder_override(
                    "Sporastatia polyspora & Sporastatia testudinea",
                    "crusts_fruticose",
                ),
                folder_override("Xanthoparmelia spp", "shield_like_parmelioids"),
            ],
        }
    }
}

impl RulesConfig {
    /// Reads a JSON rules file and validates it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let rules: RulesConfig =
            serde_json::from_str(&contents).map_err(|source| CrateError::RulesParseError {
                path: path.to_path_buf(),
                source,
            })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        check_rewrites("title_rewrites", &self.title_rewrites)?;
        check_rewrites("folder_rewrites", &self.folder_rewrites)?;

        if self.folder_strip_words.iter().any(|w| w.is_empty()) {
            return Err(invalid("folder_strip_words", "empty word".to_string()));
        }
        for o in &self.title_overrides {
            if o.taxon.trim().is_empty() {
                return Err(invalid("title_overrides", "empty taxon name".to_string()));
            }
        }
        for rule in &self.fallback_rules {
            if rule.contains.is_empty() || rule.contains.iter().any(|p| p.is_empty()) {
                return Err(invalid(
                    "fallback_rules",
                    format!("rule for '{}' has an empty pattern", rule.folder),
                ));
            }
            if !is_valid_slug(&rule.folder) {
                return Err(invalid(
                    "fallback_rules",
                    format!("'{}' is not a valid folder slug", rule.folder),
                ));
            }
        }
        for o in &self.folder_overrides {
            if !is_valid_slug(&o.folder) {
                return Err(invalid(
                    "folder_overrides",
                    format!("'{}' is not a valid folder slug", o.folder),
                ));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(CrateError::RulesSerializeError)
    }
}

/// Loads rules from `path`, or the built-in defaults when no file is given.
pub fn load_rules(path: Option<&Path>) -> Result<RulesConfig> {
    match path {
        Some(path) => {
            info!("Loading rules from {:?}", path);
            RulesConfig::from_path(path)
        }
        None => Ok(RulesConfig::default()),
    }
}

fn check_rewrites(table: &str, rewrites: &[Rewrite]) -> Result<()> {
    match rewrites.iter().position(|r| r.pattern.is_empty()) {
        Some(idx) => Err(invalid(table, format!("entry {} has an empty pattern", idx))),
        None => Ok(()),
    }
}

fn invalid(table: &str, reason: String) -> CrateError {
    CrateError::InvalidRule {
        table: table.to_string(),
        reason,
    }
}
