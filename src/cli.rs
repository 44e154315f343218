use crate::hierarchy::{DEFAULT_WEIGHT_OFFSET, OrderStrategy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file replacing the built-in rewrite and fallback rules.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Build the hierarchy table and write one section folder per group.
    Toc {
        /// Path to the group table CSV (export of the master reference sheet).
        #[arg(short, long, value_name = "FILE")]
        input_file: PathBuf,

        /// Directory receiving one folder and `_index.md` per section.
        #[arg(short, long, value_name = "DIR")]
        content_dir: PathBuf,

        /// Where to save the hierarchy table for the `pages` step.
        #[arg(long, value_name = "FILE")]
        hierarchy_file: Option<PathBuf>,

        /// Column holding the grouping label.
        #[arg(long, default_value = "Organization (variable)")]
        column_group: String,

        /// Column holding the taxon folder name.
        #[arg(long, default_value = "Taxa Folder Name")]
        column_taxon: String,

        /// Order in which sections receive their weight.
        #[arg(long, value_enum, default_value = "alphabetical")]
        order: OrderStrategy,

        /// Weight of the first section.
        #[arg(long, default_value_t = DEFAULT_WEIGHT_OFFSET)]
        weight_offset: u32,

        /// Resolve and report without touching the content directory.
        #[arg(long)]
        dry_run: bool,
    },

    /// Number the images of every ready taxon folder and write a rename manifest.
    Images {
        /// Directory holding the `_`-prefixed taxon folders.
        #[arg(short, long, value_name = "DIR")]
        taxa_dir: PathBuf,

        /// Path to the image manifest CSV.
        #[arg(short, long, value_name = "FILE")]
        output_file: PathBuf,

        /// Copy each image here under its new name.
        #[arg(long, value_name = "DIR")]
        copy_to: Option<PathBuf>,
    },

    /// Place each taxon description page and write it from the text
    /// extracted next to its document (`<stem>.txt`, one paragraph per line).
    Pages {
        /// Directory holding the `_`-prefixed taxon folders.
        #[arg(short, long, value_name = "DIR")]
        taxa_dir: PathBuf,

        /// Hierarchy table written by `toc`.
        #[arg(long, value_name = "FILE")]
        hierarchy_file: PathBuf,

        /// Image manifest written by `images`, used for each page's lead image.
        #[arg(long, value_name = "FILE")]
        images_file: Option<PathBuf>,

        /// Directory the pages are placed under.
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Path to the page manifest CSV.
        #[arg(short, long, value_name = "FILE")]
        manifest_file: PathBuf,

        /// Also write a heading-only page for documents with no extracted text.
        #[arg(long)]
        stubs: bool,
    },

    /// Print the effective rules as JSON.
    Rules,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_toc_defaults() {
        let args = vec!["taxa-pages", "toc", "-i", "groups.csv", "-c", "content/pages/taxa"];
        let cli = Cli::parse_from(args);
        assert!(!cli.verbose);
        assert!(cli.rules.is_none());
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
                assert_eq!(input_file, PathBuf::from("groups.csv"));
                assert_eq!(content_dir, PathBuf::from("content/pages/taxa"));
                assert!(hierarchy_file.is_none());
                assert_eq!(column_group, "Organization (variable)");
                assert_eq!(column_taxon, "Taxa Folder Name");
                assert_eq!(order, OrderStrategy::Alphabetical);
                assert_eq!(weight_offset, 10);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = vec![
            "taxa-pages",
            "toc",
            "-i",
            "groups.csv",
            "-c",
            "out",
            "--order",
            "first-seen",
            "-v",
            "--rules",
            "rules.json",
        ];
        let cli = Cli::parse_from(args);
        assert!(cli.verbose);
        assert_eq!(cli.rules, Some(PathBuf::from("rules.json")));
        assert!(matches!(
            cli.command,
            Command::Toc { order: OrderStrategy::FirstSeen, .. }
        ));
    }

    #[test]
    fn test_cli_images() {
        let args = vec!["taxa-pages", "images", "-t", "taxa", "-o", "thumbs.csv", "--copy-to", "static"];
        let cli = Cli::parse_from(args);
        assert_eq!(
            cli.command,
            Command::Images {
                taxa_dir: PathBuf::from("taxa"),
                output_file: PathBuf::from("thumbs.csv"),
                copy_to: Some(PathBuf::from("static")),
            }
        );
    }

    #[test]
    fn test_cli_rules() {
        let cli = Cli::parse_from(vec!["taxa-pages", "rules"]);
        assert_eq!(cli.command, Command::Rules);
    }

    #[test]
    fn test_cli_pages_missing_hierarchy() {
        let args = vec!["taxa-pages", "pages", "-t", "taxa", "-o", "out", "-m", "pages.csv"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_pages() {
        let args = vec![
            "taxa-pages",
            "pages",
            "-t",
            "taxa",
            "--hierarchy-file",
            "taxon_hierarchy.csv",
            "-o",
            "out",
            "-m",
            "pages.csv",
            "--stubs",
        ];
        let cli = Cli::parse_from(args);
        match cli.command {
            Command::Pages {
                hierarchy_file,
                images_file,
                stubs,
                ..
            } => {
                assert_eq!(hierarchy_file, PathBuf::from("taxon_hierarchy.csv"));
                assert!(images_file.is_none());
                assert!(stubs);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
