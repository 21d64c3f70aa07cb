//! Generation orchestrator.
//!
//! Single entry point that drives the full pipeline for one intake form:
//! load → normalize → match → assemble → render.
//!
//! Every stage is injected so the orchestrator stays testable with
//! in-memory reference tables and mock strategies. Writing the artifacts
//! to disk is left to the caller (see [`write_outputs`]).
//!
//! [`write_outputs`]: crate::pipeline::assembly::write_outputs

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::models::{ClientRecord, ReferenceKind};
use crate::pipeline::assembly::{
    assemble_agreement, AgreementFields, DocumentRenderer, ExportRow, PrintPdfRenderer,
    RenderError,
};
use crate::pipeline::matching::{
    load_staff, load_support_items, ReferenceMatcher, ReferenceTableError, ReferenceTables,
    ResolvedReferences,
};
use crate::pipeline::normalize::{missing_minimum, FieldNormalizer};
use crate::pipeline::source::{SourceError, SourceLoader, SourceVariant};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Hard failures: no output is produced.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("No client data source found (tried: {})", display_paths(.attempted))]
    SourceUnavailable { attempted: Vec<PathBuf> },

    #[error("{table} reference table unusable at {}: {reason}", .path.display())]
    ReferenceTableMissing {
        table: ReferenceKind,
        path: PathBuf,
        reason: String,
    },

    #[error("Source read failed: {0}")]
    Source(SourceError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl From<SourceError> for GenerationError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable { attempted } => Self::SourceUnavailable { attempted },
            other => Self::Source(other),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Soft conditions reported alongside a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// The source yielded fewer than the minimum viable fields.
    PartialExtraction { missing: Vec<String> },
    /// A lookup found nothing; placeholders were rendered.
    UnresolvedReference { kind: ReferenceKind, query: String },
    /// A lookup resolved only at the Partial tier.
    BestEffortMatch {
        kind: ReferenceKind,
        query: String,
        matched: String,
    },
}

/// Everything one generation produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub generation_id: Uuid,
    pub source_variant: SourceVariant,
    pub source_path: PathBuf,
    pub record: ClientRecord,
    pub references: ResolvedReferences,
    pub agreement_fields: AgreementFields,
    #[serde(skip)]
    pub agreement_pdf: Vec<u8>,
    pub export_row: ExportRow,
    #[serde(skip)]
    pub export_csv: Vec<u8>,
    pub warnings: Vec<GenerationWarning>,
}

impl GenerationOutput {
    /// Display name of the client, or the source file stem when the form had none.
    pub fn client_label(&self) -> String {
        self.record.display_name().unwrap_or_else(|| {
            self.source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "client".to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one intake form through every stage.
///
/// Holds no mutable state; the reference indexes inside the matcher are
/// shared read-only, so one generator can serve concurrent requests.
pub struct Generator {
    loader: SourceLoader,
    normalizer: FieldNormalizer,
    matcher: ReferenceMatcher,
    renderer: Box<dyn DocumentRenderer + Send + Sync>,
}

impl Generator {
    pub fn new(
        loader: SourceLoader,
        normalizer: FieldNormalizer,
        matcher: ReferenceMatcher,
        renderer: Box<dyn DocumentRenderer + Send + Sync>,
    ) -> Self {
        Self {
            loader,
            normalizer,
            matcher,
            renderer,
        }
    }

    /// Default strategies and renderer over already-loaded tables.
    pub fn from_config(tables: &ReferenceTables, config: &GeneratorConfig) -> Self {
        Self::new(
            SourceLoader::default()
                .with_fallback_csv(config.fallback_csv.clone())
                .with_csv_row(config.csv_row),
            FieldNormalizer::new(config.max_support_items),
            ReferenceMatcher::from_tables(tables),
            Box::new(PrintPdfRenderer::new()),
        )
    }

    /// Full pipeline for the intake form at `source`.
    ///
    /// 1. Load the raw record (form fields → text → CSV)
    /// 2. Normalize onto the canonical record
    /// 3. Resolve respondent and support items against the reference tables
    /// 4. Assemble agreement slots and the export row
    /// 5. Render the agreement PDF and the export CSV
    pub fn generate_from(&self, source: &Path) -> Result<GenerationOutput, GenerationError> {
        let generation_id = Uuid::new_v4();
        tracing::info!(%generation_id, file = %source.display(), "Generation started");

        let mut warnings = Vec::new();

        // Step 1: Load
        let loaded = self.loader.load(source)?;
        if !loaded.viable {
            let missing: Vec<String> = missing_minimum(&loaded.fields)
                .iter()
                .map(|f| f.label())
                .collect();
            tracing::warn!(
                %generation_id,
                missing = ?missing,
                "Source below minimum viable set, continuing with placeholders"
            );
            warnings.push(GenerationWarning::PartialExtraction { missing });
        }

        // Step 2: Normalize
        let record = self.normalizer.normalize(&loaded.fields);

        // Step 3: Match
        let references = self.matcher.resolve(&record);
        for (kind, query, matched) in references.inexact() {
            let warning = match matched {
                Some(matched) => GenerationWarning::BestEffortMatch {
                    kind,
                    query: query.to_string(),
                    matched: matched.to_string(),
                },
                None => GenerationWarning::UnresolvedReference {
                    kind,
                    query: query.to_string(),
                },
            };
            tracing::warn!(%generation_id, %kind, resolved = matched.is_some(), "Inexact reference lookup");
            warnings.push(warning);
        }

        // Step 4: Assemble
        let agreement_fields = assemble_agreement(&record, &references);
        let export_row = ExportRow::from_fields(&agreement_fields);

        // Step 5: Render both artifacts before handing anything back
        let agreement_pdf = self.renderer.render(&agreement_fields)?;
        let export_csv = export_row.to_csv_bytes()?;

        tracing::info!(
            %generation_id,
            variant = loaded.variant.as_str(),
            support_items = references.support_items.len(),
            placeholders = agreement_fields.placeholder_count(),
            warnings = warnings.len(),
            "Generation complete"
        );

        Ok(GenerationOutput {
            generation_id,
            source_variant: loaded.variant,
            source_path: loaded.path,
            record,
            references,
            agreement_fields,
            agreement_pdf,
            export_row,
            export_csv,
            warnings,
        })
    }
}

/// Load both reference tables, mapping failures to `ReferenceTableMissing`.
pub fn load_reference_tables(
    support_table_path: &Path,
    staff_table_path: &Path,
    price_column: &str,
) -> Result<ReferenceTables, GenerationError> {
    let support_items = load_support_items(support_table_path, price_column)
        .map_err(table_missing(ReferenceKind::SupportItem, support_table_path))?;
    let staff = load_staff(staff_table_path)
        .map_err(table_missing(ReferenceKind::Staff, staff_table_path))?;

    Ok(ReferenceTables {
        support_items: support_items.into(),
        staff: staff.into(),
    })
}

fn table_missing(
    table: ReferenceKind,
    path: &Path,
) -> impl FnOnce(ReferenceTableError) -> GenerationError + '_ {
    move |err| GenerationError::ReferenceTableMissing {
        table,
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Generate with settings from the environment.
pub fn generate(
    client_source_path: &Path,
    support_table_path: &Path,
    staff_table_path: &Path,
) -> Result<GenerationOutput, GenerationError> {
    generate_with_config(
        client_source_path,
        support_table_path,
        staff_table_path,
        &GeneratorConfig::from_env(),
    )
}

/// Reference tables are loaded first: a missing table aborts before the
/// client source is touched.
pub fn generate_with_config(
    client_source_path: &Path,
    support_table_path: &Path,
    staff_table_path: &Path,
    config: &GeneratorConfig,
) -> Result<GenerationOutput, GenerationError> {
    let tables = load_reference_tables(support_table_path, staff_table_path, &config.price_column)?;
    Generator::from_config(&tables, config).generate_from(client_source_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BEST_EFFORT_MARKER, MISSING_PLACEHOLDER, NOT_FOUND_PLACEHOLDER};
    use crate::models::{StaffReference, SupportItemReference};
    use crate::pipeline::extraction::pdf::test_pdf::{make_form_pdf, make_text_pdf};
    use crate::pipeline::matching::MatchResult;

    const SELF_CARE: &str = "Assistance With Self-Care Activities - Standard - Weekday Daytime";

    fn tables() -> ReferenceTables {
        ReferenceTables::from_rows(
            vec![SupportItemReference {
                name: SELF_CARE.into(),
                number: "01_001_0107_1_1".into(),
                unit: "Hour".into(),
                price: Some(65.47),
            }],
            vec![StaffReference {
                name: "John Smith".into(),
                mobile: "0412345678".into(),
                email: "john.smith@example.com".into(),
                team: Some("Wanneroo".into()),
            }],
        )
    }

    fn generator() -> Generator {
        Generator::from_config(&tables(), &GeneratorConfig::default())
    }

    fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_reference_tables(dir: &Path) -> (PathBuf, PathBuf) {
        let support = write(
            dir,
            "support_items.csv",
            format!(
                "Support Item Name,Support Item Number,Unit,WA\n\"{SELF_CARE}\",01_001_0107_1_1,Hour,$65.47\n"
            )
            .as_bytes(),
        );
        let staff = write(
            dir,
            "staff.csv",
            b"name,mobile,email,area\nJohn Smith,0412345678,john.smith@example.com,Wanneroo\n",
        );
        (support, staff)
    }

    #[test]
    fn exact_support_item_fills_export_row() {
        let dir = tempfile::tempdir().unwrap();
        let (support, staff) = write_reference_tables(dir.path());
        let source = write(
            dir.path(),
            "intake.csv",
            format!("First name,Surname,Respondent,Support item (1)\nJane,Doe,John Smith,{SELF_CARE}\n")
                .as_bytes(),
        );

        let output =
            generate_with_config(&source, &support, &staff, &GeneratorConfig::default()).unwrap();

        assert_eq!(output.source_variant, SourceVariant::Csv);
        assert_eq!(output.export_row.get("Support Item 1 Number"), Some("01_001_0107_1_1"));
        assert_eq!(output.export_row.get("Support Item 1 Unit"), Some("Hour"));
        assert_eq!(output.export_row.get("Support Item 1 Price"), Some("65.47"));
        assert!(output.warnings.is_empty());
        assert!(output.agreement_pdf.starts_with(b"%PDF"));
        assert!(!output.export_csv.is_empty());
    }

    #[test]
    fn lowercase_respondent_matches_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(
            dir.path(),
            "intake.csv",
            b"First name,Surname,Respondent\nJane,Doe,john smith\n",
        );

        let output = generator().generate_from(&source).unwrap();

        let respondent = output.references.respondent.as_ref().unwrap();
        match &respondent.result {
            MatchResult::Exact(staff) => assert_eq!(staff.mobile, "0412345678"),
            other => panic!("expected exact, got {other:?}"),
        }
        assert_eq!(output.export_row.get("Key Contact Phone"), Some("0412345678"));
        assert_eq!(output.export_row.get("Team"), Some("Wanneroo"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn empty_pdf_falls_back_to_sibling_csv() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write(dir.path(), "intake.pdf", &make_text_pdf(&[]));
        write(dir.path(), "intake.csv", b"name\nJane Doe\n");

        let output = generator().generate_from(&pdf).unwrap();

        assert_eq!(output.source_variant, SourceVariant::Csv);
        assert!(output.source_path.ends_with("intake.csv"));
        assert_eq!(output.export_row.get("First Name"), Some("Jane"));
        assert_eq!(output.export_row.get("Family Name"), Some("Doe"));
        assert_eq!(output.export_row.get("Display Name"), Some("Jane Doe"));
        assert_eq!(output.client_label(), "Jane Doe");
        assert_eq!(
            output.warnings,
            vec![GenerationWarning::PartialExtraction {
                missing: vec!["respondent".to_string()]
            }]
        );
    }

    #[test]
    fn configured_csv_row_selects_client() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write(
            dir.path(),
            "clients.csv",
            b"Respondent,First name,Surname\nJohn Smith,Jane,Doe\nJohn Smith,Ann,Lee\n",
        );
        let config = GeneratorConfig {
            csv_row: 1,
            ..GeneratorConfig::default()
        };

        let output = Generator::from_config(&tables(), &config)
            .generate_from(&csv)
            .unwrap();

        assert_eq!(output.client_label(), "Ann Lee");
        assert!(output.warnings.is_empty());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn generator_and_tables_are_shareable_across_threads() {
        assert_send_sync::<Generator>();
        assert_send_sync::<ReferenceTables>();
    }

    #[test]
    fn one_generator_serves_concurrent_requests() {
        let dir = tempfile::tempdir().unwrap();
        let clients = [("Jane", "Doe"), ("Ann", "Lee"), ("Sam", "Roe"), ("Kim", "Poe")];
        let sources: Vec<PathBuf> = clients
            .iter()
            .map(|(first, surname)| {
                write(
                    dir.path(),
                    &format!("{first}.csv"),
                    format!(
                        "Respondent,First name,Surname,Support item (1)\n\
                         john smith,{first},{surname},\"{SELF_CARE}\"\n"
                    )
                    .as_bytes(),
                )
            })
            .collect();

        let generator = generator();
        let sequential: Vec<ExportRow> = sources
            .iter()
            .map(|path| generator.generate_from(path).unwrap().export_row)
            .collect();

        let concurrent: Vec<ExportRow> = std::thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|path| {
                    let generator = &generator;
                    scope.spawn(move || generator.generate_from(path).unwrap().export_row)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(concurrent, sequential);
        for (row, (first, _)) in concurrent.iter().zip(clients) {
            assert_eq!(row.get("First Name"), Some(first));
            assert_eq!(row.get("Key Contact"), Some("John Smith"));
            assert_eq!(row.get("Support Item 1 Match"), Some("exact"));
        }
    }

    #[test]
    fn no_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("intake.pdf");

        let err = generator().generate_from(&missing).unwrap_err();

        match err {
            GenerationError::SourceUnavailable { attempted } => {
                assert!(attempted.contains(&missing));
                assert!(attempted.contains(&dir.path().join("intake.csv")));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unresolved_lookups_render_placeholders_and_warn() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(
            dir.path(),
            "intake.csv",
            b"First name,Surname,Respondent,Support item (1)\nJane,Doe,Nobody Known,Unicorn grooming\n",
        );

        let output = generator().generate_from(&source).unwrap();

        assert_eq!(output.export_row.get("Key Contact"), Some(NOT_FOUND_PLACEHOLDER));
        assert_eq!(output.export_row.get("Support Item 1 Number"), Some(NOT_FOUND_PLACEHOLDER));
        assert_eq!(output.export_row.get("Support Item 1 Match"), Some("not_found"));
        assert_eq!(
            output.warnings,
            vec![
                GenerationWarning::UnresolvedReference {
                    kind: ReferenceKind::Staff,
                    query: "Nobody Known".into(),
                },
                GenerationWarning::UnresolvedReference {
                    kind: ReferenceKind::SupportItem,
                    query: "Unicorn grooming".into(),
                },
            ]
        );
    }

    #[test]
    fn partial_match_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(
            dir.path(),
            "intake.csv",
            b"First name,Surname,Respondent\nJane,Doe,Smith\n",
        );

        let output = generator().generate_from(&source).unwrap();

        let key_contact = output.agreement_fields.value("key_contact.name");
        assert!(key_contact.starts_with(BEST_EFFORT_MARKER));
        assert_eq!(output.export_row.get("Key Contact Match"), Some("partial"));
        assert_eq!(
            output.warnings,
            vec![GenerationWarning::BestEffortMatch {
                kind: ReferenceKind::Staff,
                query: "Smith".into(),
                matched: "John Smith".into(),
            }]
        );
    }

    #[test]
    fn form_pdf_and_csv_give_identical_export_rows() {
        let dir = tempfile::tempdir().unwrap();
        let values = [
            ("First name", "Jane"),
            ("Surname", "Doe"),
            ("Date of birth", "07/03/1990"),
            ("Home phone", "08 9000 0000"),
            ("Email address", "jane@example.com"),
            ("Respondent", "John Smith"),
            ("Support item (1)", SELF_CARE),
        ];

        let form: Vec<(&str, Option<&str>)> = values.iter().map(|(k, v)| (*k, Some(*v))).collect();
        let pdf = write(dir.path(), "form.pdf", &make_form_pdf(&form));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(values.iter().map(|(k, _)| *k)).unwrap();
        writer.write_record(values.iter().map(|(_, v)| *v)).unwrap();
        let csv_path = write(dir.path(), "export.csv", &writer.into_inner().unwrap());

        let generator = generator();
        let from_pdf = generator.generate_from(&pdf).unwrap();
        let from_csv = generator.generate_from(&csv_path).unwrap();

        assert_eq!(from_pdf.source_variant, SourceVariant::FormFieldPdf);
        assert_eq!(from_csv.source_variant, SourceVariant::Csv);
        assert_eq!(from_pdf.export_row, from_csv.export_row);
        assert_eq!(from_pdf.export_row.get("Date of Birth"), Some("07/03/1990"));
    }

    #[test]
    fn missing_reference_table_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (support, _) = write_reference_tables(dir.path());
        let source = write(dir.path(), "intake.csv", b"name\nJane Doe\n");
        let staff = dir.path().join("no_staff.csv");

        let err = generate_with_config(&source, &support, &staff, &GeneratorConfig::default())
            .unwrap_err();

        match err {
            GenerationError::ReferenceTableMissing { table, path, .. } => {
                assert_eq!(table, ReferenceKind::Staff);
                assert_eq!(path, staff);
            }
            other => panic!("expected ReferenceTableMissing, got {other:?}"),
        }
    }

    #[test]
    fn header_only_reference_table_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (_, staff) = write_reference_tables(dir.path());
        let support = write(
            dir.path(),
            "empty_items.csv",
            b"Support Item Name,Support Item Number,Unit,WA\n",
        );
        let source = write(dir.path(), "intake.csv", b"name\nJane Doe\n");

        let err = generate_with_config(&source, &support, &staff, &GeneratorConfig::default())
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ReferenceTableMissing {
                table: ReferenceKind::SupportItem,
                ..
            }
        ));
    }

    #[test]
    fn empty_record_still_renders_complete_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "intake.csv", b"Gender\nFemale\n");

        let output = generator().generate_from(&source).unwrap();

        assert_eq!(output.export_row.get("First Name"), Some(MISSING_PLACEHOLDER));
        assert_eq!(output.export_row.get("Gender"), Some("Female"));
        assert!(output.agreement_fields.iter().all(|(_, v)| !v.is_empty()));
        assert!(matches!(
            output.warnings.first(),
            Some(GenerationWarning::PartialExtraction { .. })
        ));
    }

    #[test]
    fn warnings_serialize_with_tag() {
        let warning = GenerationWarning::UnresolvedReference {
            kind: ReferenceKind::SupportItem,
            query: "Therapy".into(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["warning"], "unresolved_reference");
        assert_eq!(json["kind"], "support_item");
    }
}
