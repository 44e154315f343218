//! Taxon description pages: where each one goes and how its text is laid out.
use crate::collect::{DocumentEntry, ImageEntry};
use crate::error::Result;
use crate::grouping::{FolderSource, GroupResolver};
use crate::site::front_matter::page_front_matter;
use crate::taxon::normalizer::normalize_taxon_name;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Site path under which published images are served.
pub const IMAGE_URL_PREFIX: &str = "/images/taxa";

/// Extension of the extracted description text kept next to each document.
pub const PARAGRAPH_EXTENSION: &str = "txt";

/// Paragraphs without a heading shorter than this are stray labels.
const MIN_PARAGRAPH_CHARS: usize = 15;

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s(.*)").expect("valid heading regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub taxon_name: String,
    pub input_docx: PathBuf,
    pub folder_slug: String,
    pub folder_source: FolderSource,
    pub output_path: PathBuf,
    pub first_image: Option<String>,
}

/// Works out the output location and lead image of every document.
///
/// `hierarchy` maps normalized taxon names to folders; taxa missing from it go
/// through the resolver's fallback chain.
pub fn plan_pages(
    documents: &[DocumentEntry],
    hierarchy: &HashMap<String, String>,
    resolver: &GroupResolver<'_>,
    images: &[ImageEntry],
    output_dir: &Path,
) -> Vec<PagePlan> {
    let lead_images: HashMap<String, &str> = images
        .iter()
        .filter(|i| i.sequence_number == 1)
        .map(|i| (normalize_taxon_name(&i.taxon_name), i.output_name.as_str()))
        .collect();

    let mut seen_outputs = HashSet::new();
    let mut plans = Vec::with_capacity(documents.len());
    for doc in documents {
        let taxon = normalize_taxon_name(&doc.taxon_name);
        let (folder_slug, folder_source) = match hierarchy.get(&taxon) {
            Some(folder) => (folder.clone(), FolderSource::Hierarchy),
            None => {
                let resolution = resolver.resolve_unmatched(&taxon);
                (resolution.folder_slug, resolution.source)
            }
        };

        let output_path = output_dir
            .join(&folder_slug)
            .join(format!("{}.md", doc.short_code));
        if !seen_outputs.insert(output_path.clone()) {
            warn!(
                "{:?} and another document both map to {:?}",
                doc.path, output_path
            );
        }

        let first_image = lead_images
            .get(&taxon)
            .map(|name| format!("{}/{}", IMAGE_URL_PREFIX, name));
        if first_image.is_none() {
            debug!("No lead image for {:?}", taxon);
        }

        plans.push(PagePlan {
            taxon_name: taxon,
            input_docx: doc.path.clone(),
            folder_slug,
            folder_source,
            output_path,
            first_image,
        });
    }
    plans
}

/// Renders a taxon page from the paragraphs of its description.
///
/// `Heading: text` paragraphs become second-level sections (the `Name`
/// heading repeats the title and is dropped). Other paragraphs shorter than
/// 15 characters are skipped.
pub fn render_page(
    taxon_name: &str,
    first_image: Option<&str>,
    paragraphs: &[String],
) -> Result<String> {
    let mut page = page_front_matter(taxon_name)?;
    page.push_str(&format!("# {}\n\n", taxon_name));
    if let Some(image) = first_image {
        page.push_str(&format!("![{}]({})\n\n", taxon_name, image));
    }

    for text in paragraphs {
        match HEADING_REGEX.captures(text) {
            Some(caps) => {
                let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let heading = text[..whole.start()].trim();
                if heading == "Name" {
                    continue;
                }
                page.push_str(&format!("## {}\n{}\n\n", heading, body.as_str().trim()));
            }
            None if text.chars().count() < MIN_PARAGRAPH_CHARS => {
                debug!("Skipping short paragraph {:?}", text);
            }
            None => {
                page.push_str(text);
                page.push('\n');
            }
        }
    }
    Ok(page)
}

/// Reads the description text extracted from `document`, stored beside it as
/// `<stem>.txt` with one paragraph per line. Blank lines are dropped.
/// Returns `None` when no text has been extracted yet.
pub fn read_paragraphs(document: &Path) -> Result<Option<Vec<String>>> {
    let path = document.with_extension(PARAGRAPH_EXTENSION);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    let paragraphs = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(paragraphs))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Pages rendered from extracted text.
    pub rendered: usize,
    /// Heading-only pages for documents without text.
    pub stubs: usize,
    /// Documents without text that were left alone.
    pub without_text: usize,
    pub failed: usize,
}

/// Writes every planned page. Documents with extracted text get a full page;
/// the rest get a heading-only page when `stubs` is set. A failure on one page
/// is logged and the rest are still written.
pub fn write_pages(plans: &[PagePlan], stubs: bool) -> PageSummary {
    let mut summary = PageSummary::default();
    let pb = ProgressBar::new(plans.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    for plan in plans {
        pb.set_message(plan.taxon_name.clone());
        let result = read_paragraphs(&plan.input_docx).and_then(|paragraphs| {
            let is_stub = paragraphs.is_none();
            if is_stub && !stubs {
                return Ok(None);
            }
            let page = render_page(
                &plan.taxon_name,
                plan.first_image.as_deref(),
                paragraphs.as_deref().unwrap_or_default(),
            )?;
            if let Some(parent) = plan.output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&plan.output_path, page)?;
            Ok(Some(is_stub))
        });
        match result {
            Ok(Some(false)) => summary.rendered += 1,
            Ok(Some(true)) => summary.stubs += 1,
            Ok(None) => {
                debug!("No extracted text for {:?}", plan.input_docx);
                summary.without_text += 1;
            }
            Err(e) => {
                pb.println(format!("Error writing {}: {}", plan.output_path.display(), e));
                error!("Failed to write {:?}: {}", plan.output_path, e);
                summary.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Pages written.");
    summary
}
