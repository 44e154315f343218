pub mod cli;
pub mod collect;
pub mod config;
pub mod csv_handler;
pub mod error;
pub mod grouping;
pub mod hierarchy;
pub mod site;
pub mod taxon;

use clap::Parser;
use cli::{Cli, Command};
use collect::{ImageEntry, collect_documents, collect_images, taxon_folders};
use config::{RulesConfig, load_rules};
use csv_handler::{
    ColumnConfig, load_group_table, load_hierarchy, load_image_manifest, write_hierarchy,
    write_image_manifest, write_page_manifest,
};
use error::Result;
use grouping::{FolderSource, GroupResolver};
use hierarchy::{OrderStrategy, build_hierarchy, folder_lookup};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use site::front_matter::write_section_indexes;
use site::page::{PagePlan, plan_pages, write_pages};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if let Err(e) = env_logger::Builder::from_default_env()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(level)
        .try_init()
    {
        eprintln!("Logger already initialized: {}", e);
    }

    let rules = match load_rules(cli.rules.as_deref()) {
        Ok(rules) => rules,
        Err(e) => {
            error!("Failed to load rules: {}", e);
            return Err(e);
        }
    };

    let start_time = Instant::now();
    match cli.command {
        Command::Toc {
            input_file,
            content_dir,
            hierarchy_file,
            column_group,
            column_taxon,
            order,
            weight_offset,
            dry_run,
        } => {
            let columns = ColumnConfig {
                group: column_group,
                taxon: column_taxon,
            };
            run_toc(
                &rules,
                &TocOptions {
                    input_file,
                    content_dir,
                    hierarchy_file,
                    columns,
                    order,
                    weight_offset,
                    dry_run,
                },
            )?;
        }
        Command::Images {
            taxa_dir,
            output_file,
            copy_to,
        } => run_images(&taxa_dir, &output_file, copy_to.as_deref())?,
        Command::Pages {
            taxa_dir,
            hierarchy_file,
            images_file,
            output_dir,
            manifest_file,
            stubs,
        } => run_pages(
            &rules,
            &PagesOptions {
                taxa_dir,
                hierarchy_file,
                images_file,
                output_dir,
                manifest_file,
                stubs,
            },
        )?,
        Command::Rules => {
            println!("{}", rules.to_json()?);
            return Ok(());
        }
    }

    println!("Execution time: {:.2?}", start_time.elapsed());
    Ok(())
}

struct TocOptions {
    input_file: PathBuf,
    content_dir: PathBuf,
    hierarchy_file: Option<PathBuf>,
    columns: ColumnConfig,
    order: OrderStrategy,
    weight_offset: u32,
    dry_run: bool,
}

fn run_toc(rules: &RulesConfig, options: &TocOptions) -> Result<()> {
    info!("Loading group table {:?}...", options.input_file);
    let group_table = match load_group_table(&options.input_file, &options.columns) {
        Ok(table) => {
            info!("Loaded {} group rows.", table.rows.len());
            table
        }
        Err(e) => {
            error!("Failed to load group table: {}", e);
            return Err(e);
        }
    };

    let resolver = GroupResolver::new(rules);
    let records = group_table
        .rows
        .iter()
        .map(|row| {
            let record = resolver.resolve(&row.group_label, &row.taxon_folder);
            debug!("Row {}: {:?} -> {}", row.row, record.original_name, record.folder_slug);
            record
        })
        .collect();
    let table = build_hierarchy(records, options.order, options.weight_offset);

    if let Some(path) = &options.hierarchy_file {
        write_hierarchy(path, &table.records)?;
        info!("Hierarchy table saved to {:?}", path);
    }

    let summary = if options.dry_run {
        info!("Dry run: not writing into {:?}", options.content_dir);
        None
    } else {
        Some(write_section_indexes(&options.content_dir, &table.folders))
    };

    println!("\n--- Summary Report ---");
    println!("Group rows read: {}", group_table.rows.len());
    println!("Rows skipped (blank cells): {}", group_table.skipped);
    println!("Taxa in hierarchy: {}", table.records.len());
    println!("Sections: {}", table.folders.len());
    for folder in &table.folders {
        println!("  {:>3}  {:<28} {}", folder.weight, folder.folder_slug, folder.title);
    }
    if let Some(summary) = summary {
        println!("Section indexes written: {}", summary.written);
        if summary.failed > 0 {
            println!("Section indexes failed: {} (see log)", summary.failed);
        }
    }
    Ok(())
}

fn run_images(taxa_dir: &Path, output_file: &Path, copy_to: Option<&Path>) -> Result<()> {
    info!("Collecting images under {:?}...", taxa_dir);
    let folders = taxon_folders(taxa_dir)?;
    let images = collect_images(&folders.items);
    write_image_manifest(output_file, &images.items)?;
    info!("Image manifest saved to {:?}", output_file);

    let failed = match copy_to {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(copy_images(&images.items, dir))
        }
        None => None,
    };

    println!("\n--- Summary Report ---");
    println!("Taxon folders: {}", folders.items.len());
    println!("Images found: {}", images.items.len());
    let unreadable = folders.unreadable + images.unreadable;
    if unreadable > 0 {
        println!("Unreadable entries skipped: {}", unreadable);
    }
    if let Some(failed) = failed {
        println!("Images copied: {}", images.items.len() - failed);
        if failed > 0 {
            println!("Images failed to copy: {} (see log)", failed);
        }
    }
    Ok(())
}

/// Copies each image under its new name, returning how many failed.
fn copy_images(images: &[ImageEntry], dir: &Path) -> usize {
    let pb = progress_bar(images.len());
    let mut failed = 0;
    for image in images {
        pb.set_message(image.output_name.clone());
        let target = dir.join(&image.output_name);
        if let Err(e) = fs::copy(&image.input_path, &target) {
            pb.println(format!("Error copying {}: {}", image.input_path.display(), e));
            error!("Failed to copy {:?} to {:?}: {}", image.input_path, target, e);
            failed += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Image copy complete.");
    failed
}

struct PagesOptions {
    taxa_dir: PathBuf,
    hierarchy_file: PathBuf,
    images_file: Option<PathBuf>,
    output_dir: PathBuf,
    manifest_file: PathBuf,
    stubs: bool,
}

fn run_pages(rules: &RulesConfig, options: &PagesOptions) -> Result<()> {
    let hierarchy = match load_hierarchy(&options.hierarchy_file) {
        Ok(records) => folder_lookup(&records),
        Err(e) => {
            error!("Failed to load hierarchy table: {}", e);
            return Err(e);
        }
    };
    let images = match &options.images_file {
        Some(path) => load_image_manifest(path)?,
        None => Vec::new(),
    };

    let folders = taxon_folders(&options.taxa_dir)?;
    let documents = collect_documents(&folders.items);
    let resolver = GroupResolver::new(rules);
    let plans = plan_pages(
        &documents.items,
        &hierarchy,
        &resolver,
        &images,
        &options.output_dir,
    );
    write_page_manifest(&options.manifest_file, &plans)?;
    info!("Page manifest saved to {:?}", options.manifest_file);

    let written = write_pages(&plans, options.stubs);

    let count = |source: FolderSource| plans.iter().filter(|p| p.folder_source == source).count();
    let unresolved: Vec<&PagePlan> = plans
        .iter()
        .filter(|p| p.folder_source == FolderSource::OwnName)
        .collect();

    println!("\n--- Summary Report ---");
    println!("Documents found: {}", plans.len());
    let unreadable = folders.unreadable + documents.unreadable;
    if unreadable > 0 {
        println!("Unreadable entries skipped: {}", unreadable);
    }
    println!("Placed by hierarchy table: {}", count(FolderSource::Hierarchy));
    println!("Placed by fallback rule: {}", count(FolderSource::FallbackRule));
    println!("Placed by override: {}", count(FolderSource::Override));
    println!("Pages without a lead image: {}", plans.iter().filter(|p| p.first_image.is_none()).count());
    if !unresolved.is_empty() {
        println!(
            "Taxa missing from the group table, filed under their own name: {}",
            unresolved.len()
        );
        for plan in unresolved {
            println!("- {} -> {}", plan.taxon_name, plan.folder_slug);
        }
    }
    println!("Pages rendered from extracted text: {}", written.rendered);
    if options.stubs {
        println!("Stub pages written: {}", written.stubs);
    } else if written.without_text > 0 {
        println!(
            "Documents without extracted text: {} (use --stubs to write heading-only pages)",
            written.without_text
        );
    }
    if written.failed > 0 {
        println!("Pages failed: {} (see log)", written.failed);
    }
    Ok(())
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}
