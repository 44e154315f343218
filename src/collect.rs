//! Enumerates taxon folders and the documents and images inside them.
//!
//! Only directories whose name starts with `_` are published; the prefix marks
//! a taxon as ready. Anything else under the taxa directory is ignored.
use crate::error::{CrateError, Result};
use crate::taxon::normalizer::normalize_path_name;
use crate::taxon::short_code::{
    SequenceAssigner, generate_short_code, is_short_code_error, sequenced_name,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const DOCUMENT_EXTENSION: &str = "docx";
const LOCK_FILE_PREFIX: &str = "~$";
const READY_PREFIX: char = '_';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonFolder {
    pub path: PathBuf,
    pub taxon_name: String,
    pub short_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub taxon_name: String,
    pub short_code: String,
    pub path: PathBuf,
}

/// One image and the name it is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub taxon_name: String,
    pub short_code: String,
    pub sequence_number: u32,
    pub output_name: String,
    pub input_path: PathBuf,
}

#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Entries that could not be read while walking.
    pub unreadable: usize,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            unreadable: 0,
        }
    }
}

/// Lists the ready taxon folders directly under `taxa_dir`, sorted by name.
/// Folders whose name produces no short code are logged and skipped, as are
/// directory entries that cannot be read.
pub fn taxon_folders(taxa_dir: &Path) -> Result<Collected<TaxonFolder>> {
    if !taxa_dir.is_dir() {
        return Err(CrateError::MissingDirectory(taxa_dir.to_path_buf()));
    }
    let entries = fs::read_dir(taxa_dir)?.map(|entry| entry.map(|e| e.path()));
    Ok(ready_folders(taxa_dir, entries))
}

fn ready_folders<I>(taxa_dir: &Path, entries: I) -> Collected<TaxonFolder>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut collected = Collected::default();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", taxa_dir, e);
                collected.unreadable += 1;
                continue;
            }
        };
        let is_ready = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(READY_PREFIX));
        if !path.is_dir() || !is_ready {
            continue;
        }

        let Some(taxon_name) = normalize_path_name(&path) else {
            warn!("Folder {:?} has no usable taxon name; skipped", path);
            continue;
        };
        let short_code = generate_short_code(&taxon_name);
        if is_short_code_error(&short_code) {
            warn!(
                "Folder {:?} yields no short code for {:?}; skipped",
                path, taxon_name
            );
            continue;
        }

        collected.items.push(TaxonFolder {
            path,
            taxon_name,
            short_code,
        });
    }
    collected.items.sort_by(|a, b| a.path.cmp(&b.path));
    collected
}

/// Finds every description document below each folder, skipping the lock
/// files left behind by open documents.
pub fn collect_documents(folders: &[TaxonFolder]) -> Collected<DocumentEntry> {
    let mut collected = Collected::default();
    for folder in folders {
        let files = walk_files(&folder.path, &mut collected.unreadable);
        for path in files {
            let is_lock_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOCK_FILE_PREFIX));
            if is_lock_file || extension_of(&path).as_deref() != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            collected.items.push(DocumentEntry {
                taxon_name: folder.taxon_name.clone(),
                short_code: folder.short_code.clone(),
                path,
            });
        }
    }
    collected
}

/// Finds every image below each folder and numbers them per short code.
pub fn collect_images(folders: &[TaxonFolder]) -> Collected<ImageEntry> {
    let mut collected = Collected::default();
    let mut sequences = SequenceAssigner::new();

    for folder in folders {
        let files = walk_files(&folder.path, &mut collected.unreadable);
        let images: Vec<(PathBuf, String)> = files
            .into_iter()
            .filter_map(|path| {
                let ext = extension_of(&path)?;
                IMAGE_EXTENSIONS
                    .contains(&ext.as_str())
                    .then_some((path, ext))
            })
            .collect();

        if images.is_empty() {
            debug!("'{}': No images found.", folder.taxon_name);
            continue;
        }

        for (path, ext) in images {
            let sequence_number = sequences.assign(&folder.short_code);
            collected.items.push(ImageEntry {
                taxon_name: folder.taxon_name.clone(),
                short_code: folder.short_code.clone(),
                sequence_number,
                output_name: sequenced_name(&folder.short_code, sequence_number, &format!(".{ext}")),
                input_path: path,
            });
        }
    }
    collected
}

fn walk_files(root: &Path, unreadable: &mut usize) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                // Manifests store paths as text.
                if entry.path().to_str().is_none() {
                    warn!("Skipping non-UTF-8 path {:?}", entry.path());
                    *unreadable += 1;
                    continue;
                }
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", root, e);
                *unreadable += 1;
            }
        }
    }
    files
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
