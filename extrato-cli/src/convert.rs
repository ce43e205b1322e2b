use anyhow::{Context, Result, anyhow};
use extrato_export::{write_sheet, SheetOptions};
use extrato_ingest::{pdf, Diagnostic, ExtractError, Extraction, StatementParser, Summary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One input document and where its sheet goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub input: PathBuf,
    /// `None` when only JSON was requested
    pub output: Option<PathBuf>,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<Extraction>,
}

/// Work out output paths. With several inputs, or when `out` is an existing
/// directory, each sheet goes into `out` under the input's file stem, with
/// `extension` (`xlsx` or `csv`).
pub fn plan_jobs(inputs: &[PathBuf], out: Option<&Path>, extension: &str) -> Vec<Job> {
    let into_dir = out.is_some_and(|o| o.is_dir() || inputs.len() > 1);
    inputs
        .iter()
        .map(|input| {
            let output = match out {
                Some(o) if into_dir => {
                    let name = input
                        .file_stem()
                        .map(|s| s.to_os_string())
                        .unwrap_or_else(|| "extrato".into());
                    o.join(name).with_extension(extension)
                }
                Some(o) => o.to_path_buf(),
                None => input.with_extension(extension),
            };
            Job {
                input: input.clone(),
                output,
            }
        })
        .collect()
}

/// Map a document-level failure to something a user can act on.
fn explain(err: ExtractError, input: &Path) -> anyhow::Error {
    match err {
        ExtractError::UnrecognizedLayout { lines } => anyhow!(
            "{}: statement layout not recognized ({lines} lines, none looked like a transaction); \
             is this a supported bank statement?",
            input.display()
        ),
        ExtractError::EmptyExtraction { lines: 0, .. } => anyhow!(
            "{}: no text found; scanned (image-only) PDFs are not supported",
            input.display()
        ),
        ExtractError::EmptyExtraction { lines, diagnostics } => {
            for d in &diagnostics {
                warn!(input = %input.display(), "{d}");
            }
            anyhow!(
                "{}: no valid transactions in {lines} lines ({} candidates dropped, see log)",
                input.display(),
                diagnostics.len()
            )
        }
        other => anyhow::Error::new(other),
    }
}

/// Extract one document and, unless `json_only`, write its sheet.
pub fn convert_one(
    parser: &StatementParser,
    sheet: &SheetOptions,
    job: &Job,
    json_only: bool,
) -> Result<Report> {
    let lines = pdf::read_statement_lines(&job.input)?;
    let extraction = parser
        .extract(lines)
        .map_err(|e| explain(e, &job.input))?;

    for d in &extraction.diagnostics {
        warn!(input = %job.input.display(), "{d}");
    }
    info!(input = %job.input.display(), "{}", extraction.summary());

    let output = if json_only {
        None
    } else {
        write_sheet(&job.output, &extraction.records, sheet)?;
        Some(job.output.clone())
    };

    Ok(Report {
        input: job.input.clone(),
        output,
        summary: extraction.summary().clone(),
        diagnostics: extraction.diagnostics.clone(),
        extraction: json_only.then_some(extraction),
    })
}

/// Convert every job on the blocking pool. Documents share nothing but the
/// compiled parser, so they run concurrently. Results keep input order.
pub async fn convert_all(
    parser: Arc<StatementParser>,
    sheet: Arc<SheetOptions>,
    jobs: Vec<Job>,
    json_only: bool,
) -> Vec<(Job, Result<Report>)> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let parser = Arc::clone(&parser);
            let sheet = Arc::clone(&sheet);
            let task_job = job.clone();
            let handle = tokio::task::spawn_blocking(move || {
                convert_one(&parser, &sheet, &task_job, json_only)
            });
            (job, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        let result = handle
            .await
            .with_context(|| format!("conversion task for {} failed", job.input.display()))
            .and_then(|r| r);
        results.push((job, result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrato_export::SheetFormat;
    use extrato_ingest::ParserOptions;
    use std::fs;

    const STATEMENT: &str = "\
EXTRATO DE CONTA CORRENTE
DETALHE DOS MOVIMENTOS
Data Descrição ID da operação Valor Saldo
10-01-2024 PIX RECEIVED 12345678901 R$ 1.234,56 R$ 5.000,00
Data de geração: 2024-01-15
";

    fn csv() -> SheetOptions {
        SheetOptions {
            format: SheetFormat::Csv,
            ..SheetOptions::default()
        }
    }

    fn parser() -> Arc<StatementParser> {
        Arc::new(StatementParser::new(&ParserOptions::default()).unwrap())
    }

    #[test]
    fn test_plan_jobs_paths() {
        let inputs = vec![PathBuf::from("a/jan.pdf")];
        assert_eq!(plan_jobs(&inputs, None, "xlsx")[0].output, PathBuf::from("a/jan.xlsx"));
        assert_eq!(
            plan_jobs(&inputs, Some(Path::new("out.csv")), "csv")[0].output,
            PathBuf::from("out.csv")
        );

        let many = vec![PathBuf::from("a/jan.pdf"), PathBuf::from("b/feb.txt")];
        let jobs = plan_jobs(&many, Some(Path::new("sheets")), "csv");
        assert_eq!(jobs[0].output, PathBuf::from("sheets/jan.csv"));
        assert_eq!(jobs[1].output, PathBuf::from("sheets/feb.csv"));
    }

    #[tokio::test]
    async fn test_convert_all_writes_good_and_reports_bad() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("jan.txt");
        let bad = dir.path().join("junk.txt");
        fs::write(&good, STATEMENT).unwrap();
        fs::write(&bad, "nada aqui\nnem aqui\n").unwrap();

        let jobs = plan_jobs(&[good.clone(), bad.clone()], Some(dir.path()), "csv");
        let results = convert_all(parser(), Arc::new(csv()), jobs, false).await;

        assert_eq!(results.len(), 2);
        let report = results[0].1.as_ref().unwrap();
        assert_eq!(report.summary.records, 1);
        let sheet = fs::read_to_string(dir.path().join("jan.csv")).unwrap();
        assert!(sheet.contains("10-01-2024;PIX RECEIVED;12345678901;R$ 1.234,56;R$ 5.000,00"));

        let err = results[1].1.as_ref().unwrap_err();
        assert!(err.to_string().contains("layout not recognized"));
        assert!(!dir.path().join("junk.csv").exists());
    }

    #[test]
    fn test_json_only_skips_the_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("jan.txt");
        fs::write(&input, STATEMENT).unwrap();
        let job = plan_jobs(&[input], None, "xlsx").remove(0);

        let report = convert_one(&parser(), &SheetOptions::default(), &job, true).unwrap();
        assert!(report.output.is_none());
        assert_eq!(report.extraction.unwrap().records.len(), 1);
        assert!(!job.output.exists());
    }

    #[test]
    fn test_default_output_is_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("jan.txt");
        fs::write(&input, STATEMENT).unwrap();
        let options = SheetOptions::default();
        let job = plan_jobs(&[input], None, options.format.extension()).remove(0);

        let report = convert_one(&parser(), &options, &job, false).unwrap();
        assert_eq!(report.output, Some(dir.path().join("jan.xlsx")));
        // xlsx is a zip container
        let bytes = fs::read(dir.path().join("jan.xlsx")).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
