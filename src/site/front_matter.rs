//! Front matter headers read by the site generator.
use crate::error::Result;
use crate::hierarchy::FolderEntry;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const SECTION_INDEX_FILE: &str = "_index.md";
const PAGE_TYPE: &str = "docs";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter<'a> {
    title: &'a str,
    #[serde(rename = "type")]
    page_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    book_flat_section: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    book_collapse_section: Option<bool>,
}

impl FrontMatter<'_> {
    fn render(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{}---\n\n\n", yaml))
    }
}

/// Header for a section's `_index.md`.
pub fn section_front_matter(title: &str, weight: u32) -> Result<String> {
    FrontMatter {
        title,
        page_type: PAGE_TYPE,
        weight: Some(weight),
        book_flat_section: Some(true),
        book_collapse_section: Some(true),
    }
    .render()
}

/// Header for a single taxon page.
pub fn page_front_matter(title: &str) -> Result<String> {
    FrontMatter {
        title,
        page_type: PAGE_TYPE,
        weight: None,
        book_flat_section: None,
        book_collapse_section: None,
    }
    .render()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub failed: usize,
}

/// Creates `<content_dir>/<folder>/_index.md` for every section. A failure on
/// one section is logged and the rest are still written.
pub fn write_section_indexes(content_dir: &Path, folders: &[FolderEntry]) -> WriteSummary {
    let mut summary = WriteSummary::default();
    let pb = ProgressBar::new(folders.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    for folder in folders {
        pb.set_message(folder.folder_slug.clone());
        let folder_path = content_dir.join(&folder.folder_slug);
        let index_path = folder_path.join(SECTION_INDEX_FILE);
        let result = section_front_matter(&folder.title, folder.weight).and_then(|header| {
            fs::create_dir_all(&folder_path)?;
            fs::write(&index_path, header)?;
            Ok(())
        });
        match result {
            Ok(()) => {
                debug!("Wrote {:?}", index_path);
                summary.written += 1;
            }
            Err(e) => {
                pb.println(format!("Error writing {}: {}", index_path.display(), e));
                error!("Failed to write {:?}: {}", index_path, e);
                summary.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Section indexes written.");
    summary
}
