//! Command-line surface over [`generate_with_config`].
//!
//! [`generate_with_config`]: crate::pipeline::processor::generate_with_config

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{self, GeneratorConfig};
use crate::pipeline::assembly::{write_outputs, WrittenOutputs};
use crate::pipeline::processor::{generate_with_config, GenerationWarning};
use crate::pipeline::source::SourceVariant;

/// Turn an NDIS intake form into a Service Agreement and a client export row.
#[derive(Parser, Debug)]
#[command(name = "intake-agreement", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the agreement PDF and export CSV for one intake form.
    Generate {
        /// Intake form: fillable PDF, text PDF, or single-row CSV.
        source: PathBuf,

        /// Support-item price list.
        #[arg(long, env = "INTAKE_SUPPORT_TABLE", default_value_os_t = config::default_support_table())]
        support_items: PathBuf,

        /// Staff directory.
        #[arg(long, env = "INTAKE_STAFF_TABLE", default_value_os_t = config::default_staff_table())]
        staff: PathBuf,

        /// Directory the two artifacts are written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Price column of the support-item table.
        #[arg(long, env = "INTAKE_PRICE_REGION")]
        region: Option<String>,

        /// Data row of a CSV source to read (0 is the first client).
        #[arg(long, env = "INTAKE_CSV_ROW")]
        csv_row: Option<usize>,

        /// Extra CSV sources tried when the form yields too little.
        #[arg(long)]
        fallback_csv: Vec<PathBuf>,
    },
}

/// What `generate` prints on success.
#[derive(Debug, Serialize)]
struct GenerateSummary<'a> {
    generation_id: String,
    source_variant: SourceVariant,
    source: &'a Path,
    outputs: &'a WrittenOutputs,
    warnings: &'a [GenerationWarning],
}

/// Execute a parsed command. Errors come back as display strings for the caller to report.
pub fn execute(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Generate {
            source,
            support_items,
            staff,
            out_dir,
            region,
            csv_row,
            fallback_csv,
        } => {
            let mut generator_config = GeneratorConfig::from_env();
            if let Some(region) = region {
                generator_config.price_column = region;
            }
            if let Some(row) = csv_row {
                generator_config.csv_row = row;
            }
            generator_config.fallback_csv.extend(fallback_csv);

            let output =
                generate_with_config(&source, &support_items, &staff, &generator_config)
                    .map_err(|e| e.to_string())?;

            let written = write_outputs(
                &out_dir,
                &output.client_label(),
                &output.agreement_pdf,
                &output.export_csv,
            )
            .map_err(|e| format!("Writing outputs to {} failed: {e}", out_dir.display()))?;

            let summary = GenerateSummary {
                generation_id: output.generation_id.to_string(),
                source_variant: output.source_variant,
                source: &output.source_path,
                outputs: &written,
                warnings: &output.warnings,
            };
            let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_flags() {
        let cli = Cli::try_parse_from([
            "intake-agreement",
            "generate",
            "intake.pdf",
            "--support-items",
            "items.csv",
            "--staff",
            "staff.csv",
            "--out-dir",
            "out",
            "--region",
            "NSW",
            "--csv-row",
            "2",
            "--fallback-csv",
            "a.csv",
            "--fallback-csv",
            "b.csv",
        ])
        .unwrap();

        let Command::Generate {
            source,
            support_items,
            region,
            csv_row,
            fallback_csv,
            ..
        } = cli.command;
        assert_eq!(source, PathBuf::from("intake.pdf"));
        assert_eq!(support_items, PathBuf::from("items.csv"));
        assert_eq!(region.as_deref(), Some("NSW"));
        assert_eq!(csv_row, Some(2));
        assert_eq!(fallback_csv.len(), 2);
    }

    #[test]
    fn source_is_required() {
        assert!(Cli::try_parse_from(["intake-agreement", "generate"]).is_err());
    }

    #[test]
    fn generate_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items.csv");
        std::fs::write(
            &items,
            "Support Item Name,Support Item Number,Unit,WA\nDomestic Cleaning,01_020_0120_1_1,Hour,$58.03\n",
        )
        .unwrap();
        let staff = dir.path().join("staff.csv");
        std::fs::write(&staff, "name,mobile,email\nJohn Smith,0412345678,j@example.com\n").unwrap();
        let source = dir.path().join("intake.csv");
        std::fs::write(&source, "First name,Surname,Respondent\nJane,Doe,John Smith\n").unwrap();
        let out = dir.path().join("out");

        let cli = Cli {
            command: Command::Generate {
                source,
                support_items: items,
                staff,
                out_dir: out.clone(),
                region: Some("WA".into()),
                csv_row: None,
                fallback_csv: vec![],
            },
        };
        execute(cli).unwrap();

        assert!(out.join("Service Agreement - Jane Doe.pdf").is_file());
        assert!(out.join("Client Export - Jane Doe.csv").is_file());
    }

    #[test]
    fn missing_table_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            command: Command::Generate {
                source: dir.path().join("intake.csv"),
                support_items: dir.path().join("none.csv"),
                staff: dir.path().join("none.csv"),
                out_dir: dir.path().join("out"),
                region: None,
                csv_row: None,
                fallback_csv: vec![],
            },
        };
        let err = execute(cli).unwrap_err();
        assert!(err.contains("support_item"));
        assert!(!dir.path().join("out").exists());
    }
}
