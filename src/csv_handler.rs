use crate::collect::ImageEntry;
use crate::error::{CrateError, Result};
use crate::grouping::TaxonGroupRecord;
use crate::site::page::PagePlan;
use csv::WriterBuilder;
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// Column names of the group table export.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub group: String,
    pub taxon: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            group: "Organization (variable)".to_string(),
            taxon: "Taxa Folder Name".to_string(),
        }
    }
}

// One usable row of the group table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub row: usize,
    pub group_label: String,
    pub taxon_folder: String,
}

#[derive(Debug, Default)]
pub struct GroupTable {
    pub rows: Vec<GroupRow>,
    pub skipped: usize,
}

const HIERARCHY_HEADERS: [&str; 3] = ["original_folder", "title_name", "taxon_folder"];

#[derive(Debug, Deserialize)]
struct HierarchyRow {
    original_folder: String,
    title_name: String,
    taxon_folder: String,
}

/// Loads the group table. Missing columns are fatal; rows with a blank group
/// or taxon cell are logged and skipped.
pub fn load_group_table(file_path: &Path, columns: &ColumnConfig) -> Result<GroupTable> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let headers = reader.headers()?.clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| CrateError::MissingHeader(name.to_string()))
    };
    let group_idx = find(&columns.group)?;
    let taxon_idx = find(&columns.taxon)?;

    let mut table = GroupTable::default();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 2; // +1 for header, +1 for 0-based index
        let group_label = record.get(group_idx).unwrap_or("").trim();
        let taxon_folder = record.get(taxon_idx).unwrap_or("").trim();

        if group_label.is_empty() || taxon_folder.is_empty() {
            warn!(
                "Row {}: blank '{}' or '{}' cell; row skipped",
                row, columns.group, columns.taxon
            );
            table.skipped += 1;
            continue;
        }

        table.rows.push(GroupRow {
            row,
            group_label: group_label.to_string(),
            taxon_folder: taxon_folder.to_string(),
        });
    }

    Ok(table)
}

pub fn write_hierarchy(path: &Path, records: &[TaxonGroupRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HIERARCHY_HEADERS)?;
    for record in records {
        writer.write_record([
            record.original_name.as_str(),
            record.title.as_str(),
            record.folder_slug.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a hierarchy table written by [`write_hierarchy`]. Every row must
/// carry a folder.
pub fn load_hierarchy(path: &Path) -> Result<Vec<TaxonGroupRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for required in HIERARCHY_HEADERS.iter() {
        if !headers.iter().any(|h| h == *required) {
            return Err(CrateError::MissingHeader(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let row: HierarchyRow = result?;
        let row_num = i + 2;
        if row.original_folder.trim().is_empty() {
            return Err(CrateError::MissingValue {
                column: "original_folder".to_string(),
                row: row_num,
            });
        }
        if row.taxon_folder.trim().is_empty() {
            return Err(CrateError::MissingValue {
                column: "taxon_folder".to_string(),
                row: row_num,
            });
        }
        records.push(TaxonGroupRecord {
            original_name: row.original_folder,
            title: row.title_name,
            folder_slug: row.taxon_folder,
        });
    }
    Ok(records)
}

const IMAGE_HEADERS: [&str; 5] = [
    "taxon_name",
    "short_code",
    "sequence_number",
    "output_name",
    "input_path",
];

/// Writes the image manifest. The header row is written even when there are
/// no images so later steps can still read the file.
pub fn write_image_manifest(path: &Path, images: &[ImageEntry]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(IMAGE_HEADERS)?;
    for image in images {
        writer.serialize(image)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_image_manifest(path: &Path) -> Result<Vec<ImageEntry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut images = Vec::new();
    for result in reader.deserialize() {
        images.push(result?);
    }
    Ok(images)
}

pub fn write_page_manifest(path: &Path, plans: &[PagePlan]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "taxon_name",
        "input_docx",
        "folder_slug",
        "folder_source",
        "output_path",
        "first_image",
    ])?;
    for plan in plans {
        let input = plan.input_docx.to_string_lossy();
        let output = plan.output_path.to_string_lossy();
        let source = plan.folder_source.to_string();
        writer.write_record([
            plan.taxon_name.as_str(),
            &*input,
            plan.folder_slug.as_str(),
            source.as_str(),
            &*output,
            plan.first_image.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{NamedTempFile, tempdir};

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_group_table() {
        let content = "Taxa Folder Name,Organization (variable),Notes\n\
            Calicium viride,gray crustose Caliciaceae,x\n\
            \"Lobaria linita & Lobaria tenuior\",Lungworts,";
        let file = create_test_csv(content);
        let table = load_group_table(file.path(), &ColumnConfig::default()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.skipped, 0);
        assert_eq!(table.rows[0].group_label, "gray crustose Caliciaceae");
        assert_eq!(table.rows[1].taxon_folder, "Lobaria linita & Lobaria tenuior");
        assert_eq!(table.rows[1].row, 3);
    }

    #[test]
    fn test_group_table_custom_columns() {
        let content = "group,folder\nFoliose,Parmelia sulcata";
        let file = create_test_csv(content);
        let columns = ColumnConfig {
            group: "group".to_string(),
            taxon: "folder".to_string(),
        };
        let table = load_group_table(file.path(), &columns).unwrap();
        assert_eq!(table.rows[0].taxon_folder, "Parmelia sulcata");
    }

    #[test]
    fn test_group_table_missing_header() {
        let content = "Organization (variable),Taxon\nFoliose,Parmelia sulcata";
        let file = create_test_csv(content);
        let result = load_group_table(file.path(), &ColumnConfig::default());
        assert!(matches!(result, Err(CrateError::MissingHeader(h)) if h == "Taxa Folder Name"));
    }

    #[test]
    fn test_group_table_skips_blank_cells() {
        let content = "Organization (variable),Taxa Folder Name\n\
            Foliose,Parmelia sulcata\n\
            ,Usnea\n\
            Foliose,  ";
        let file = create_test_csv(content);
        let table = load_group_table(file.path(), &ColumnConfig::default()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.skipped, 2);
    }

    #[test]
    fn test_group_table_malformed() {
        let content = "Organization (variable),Taxa Folder Name\nFoliose,Parmelia,extra";
        let file = create_test_csv(content);
        let result = load_group_table(file.path(), &ColumnConfig::default());
        assert!(matches!(result, Err(CrateError::CsvError(_))));
    }

    #[test]
    fn test_hierarchy_written_then_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxon_hierarchy.csv");
        let records = vec![TaxonGroupRecord {
            original_name: "Pseudocyphellaria crocata".to_string(),
            title: "Pseudocyphellaria & Parmostictina".to_string(),
            folder_slug: "pseudo_parmo".to_string(),
        }];
        write_hierarchy(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("original_folder,title_name,taxon_folder\n"));
        assert_eq!(load_hierarchy(&path).unwrap(), records);
    }

    #[test]
    fn test_hierarchy_missing_folder() {
        let content = "original_folder,title_name,taxon_folder\nUsnea,Shrubby,";
        let file = create_test_csv(content);
        let result = load_hierarchy(file.path());
        assert!(matches!(result, Err(CrateError::MissingValue { column, row }) if column == "taxon_folder" && row == 2));
    }

    #[test]
    fn test_hierarchy_missing_header() {
        let content = "original_folder,taxon_folder\nUsnea,shrubby";
        let file = create_test_csv(content);
        let result = load_hierarchy(file.path());
        assert!(matches!(result, Err(CrateError::MissingHeader(h)) if h == "title_name"));
    }

    #[test]
    fn test_image_manifest_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumbnail_files.csv");
        let images = vec![ImageEntry {
            taxon_name: "Parmelia pseudosulcata".to_string(),
            short_code: "parme_pseud".to_string(),
            sequence_number: 1,
            output_name: "parme_pseud01.jpg".to_string(),
            input_path: PathBuf::from("taxa/_Parmelia pseudosulcata/a.JPG"),
        }];
        write_image_manifest(&path, &images).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "taxon_name,short_code,sequence_number,output_name,input_path\n"
        ));
        assert_eq!(load_image_manifest(&path).unwrap(), images);
    }

    #[test]
    fn test_empty_image_manifest_keeps_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumbnail_files.csv");
        write_image_manifest(&path, &[]).unwrap();
        assert!(load_image_manifest(&path).unwrap().is_empty());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
