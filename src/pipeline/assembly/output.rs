use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::pipeline::source::sanitize_filename;

/// Where a generation's two artifacts landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenOutputs {
    pub agreement_path: PathBuf,
    pub export_path: PathBuf,
}

/// Output file names for a client, e.g. `Service Agreement - Jane Doe.pdf`.
pub fn output_paths(out_dir: &Path, client_label: &str) -> WrittenOutputs {
    let label = sanitize_filename(client_label);
    WrittenOutputs {
        agreement_path: out_dir.join(format!("Service Agreement - {label}.pdf")),
        export_path: out_dir.join(format!("Client Export - {label}.csv")),
    }
}

/// Write both artifacts into `out_dir`.
///
/// Both are staged as temp files in the destination directory first and
/// only persisted once both writes succeeded. If the export cannot be put
/// in place, the agreement path is returned to what it held before the call.
pub fn write_outputs(
    out_dir: &Path,
    client_label: &str,
    agreement_pdf: &[u8],
    export_csv: &[u8],
) -> std::io::Result<WrittenOutputs> {
    std::fs::create_dir_all(out_dir)?;
    let paths = output_paths(out_dir, client_label);

    let agreement = stage(out_dir, agreement_pdf)?;
    let export = stage(out_dir, export_csv)?;
    let previous = match std::fs::read(&paths.agreement_path) {
        Ok(bytes) => Some(stage(out_dir, &bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    agreement
        .persist(&paths.agreement_path)
        .map_err(|e| e.error)?;
    if let Err(e) = export.persist(&paths.export_path) {
        let restored = match previous {
            Some(previous) => previous
                .persist(&paths.agreement_path)
                .map(|_| ())
                .map_err(|e| e.error),
            None => std::fs::remove_file(&paths.agreement_path),
        };
        if let Err(restore_err) = restored {
            tracing::error!(
                agreement = %paths.agreement_path.display(),
                error = %restore_err,
                "Could not restore agreement after failed export write"
            );
        }
        return Err(e.error);
    }

    tracing::info!(
        agreement = %paths.agreement_path.display(),
        export = %paths.export_path.display(),
        "Outputs written"
    );
    Ok(paths)
}

fn stage(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_outputs(dir.path(), "Jane Doe", b"%PDF-1.4", b"a,b\n1,2\n").unwrap();

        assert!(written.agreement_path.ends_with("Service Agreement - Jane Doe.pdf"));
        assert_eq!(std::fs::read(&written.agreement_path).unwrap(), b"%PDF-1.4");
        assert_eq!(std::fs::read(&written.export_path).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_outputs(dir.path(), "Jane Doe", b"pdf", b"csv").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn failed_export_keeps_earlier_agreement() {
        let dir = tempfile::tempdir().unwrap();
        let paths = output_paths(dir.path(), "Jane Doe");
        std::fs::write(&paths.agreement_path, b"earlier run").unwrap();
        // A non-empty directory in the export's place makes the rename fail.
        std::fs::create_dir(&paths.export_path).unwrap();
        std::fs::write(paths.export_path.join("keep"), b"x").unwrap();

        assert!(write_outputs(dir.path(), "Jane Doe", b"new pdf", b"csv").is_err());

        assert_eq!(std::fs::read(&paths.agreement_path).unwrap(), b"earlier run");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn failed_export_removes_new_agreement() {
        let dir = tempfile::tempdir().unwrap();
        let paths = output_paths(dir.path(), "Jane Doe");
        std::fs::create_dir(&paths.export_path).unwrap();
        std::fs::write(paths.export_path.join("keep"), b"x").unwrap();

        assert!(write_outputs(dir.path(), "Jane Doe", b"new pdf", b"csv").is_err());
        assert!(!paths.agreement_path.exists());
    }

    #[test]
    fn overwrites_earlier_outputs() {
        let dir = tempfile::tempdir().unwrap();
        write_outputs(dir.path(), "Jane Doe", b"old pdf", b"old csv").unwrap();
        let written = write_outputs(dir.path(), "Jane Doe", b"new pdf", b"new csv").unwrap();

        assert_eq!(std::fs::read(&written.agreement_path).unwrap(), b"new pdf");
        assert_eq!(std::fs::read(&written.export_path).unwrap(), b"new csv");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let written = write_outputs(&out, "Jane Doe", b"pdf", b"csv").unwrap();
        assert!(written.export_path.exists());
    }

    #[test]
    fn client_label_cannot_escape_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = output_paths(dir.path(), "../../etc/passwd");
        assert!(paths.agreement_path.starts_with(dir.path()));
        assert!(paths.agreement_path.ends_with("Service Agreement - passwd.pdf"));
    }
}
