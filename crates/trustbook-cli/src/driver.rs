//! Directory driver: every workbook in a directory is randomized, analysed and
//! given its own histogram folder under the stats directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use trustbook_analysis::{insert_random_values, run_analysis, AnalysisConfig, AnalysisReport, HistogramRenderer};

/// Candidate workbooks in `dir`, sorted by name.
///
/// Subdirectories (including the stats directory) and `.csv` files are skipped.
pub fn discover_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    let mut workbooks = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("read directory {}", dir.display()))?
            .path();
        if path.is_dir() {
            continue;
        }
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            log::debug!("skipping {}", path.display());
            continue;
        }
        workbooks.push(path);
    }
    workbooks.sort();
    Ok(workbooks)
}

/// Output folder for a workbook's histograms: `<stats>/<file stem>`.
pub fn output_dir_for(stats_dir: &Path, workbook: &Path) -> PathBuf {
    let stem = workbook
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stats_dir.join(stem)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Ok,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub workbook: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
}

impl FileOutcome {
    fn ok(workbook: PathBuf, analysis: AnalysisReport) -> Self {
        Self {
            workbook,
            status: FileStatus::Ok,
            error: None,
            analysis: Some(analysis),
        }
    }

    fn failed(workbook: PathBuf, err: &anyhow::Error) -> Self {
        Self {
            workbook,
            status: FileStatus::Failed,
            error: Some(format!("{err:#}")),
            analysis: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FileStatus::Ok
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub directory: PathBuf,
    pub stats_dir: PathBuf,
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            match (&file.analysis, &file.error) {
                (Some(analysis), _) => write!(f, "{analysis}")?,
                (None, err) => writeln!(
                    f,
                    "{}: FAILED: {}",
                    file.workbook.display(),
                    err.as_deref().unwrap_or("unknown error")
                )?,
            }
        }
        writeln!(
            f,
            "Processed {} workbook(s) in {}: {} failed",
            self.files.len(),
            self.directory.display(),
            self.failed()
        )
    }
}

fn process_workbook(
    path: &Path,
    output_dir: &Path,
    rng: &mut impl Rng,
    renderer: &mut impl HistogramRenderer,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    insert_random_values(path, rng, config).context("insert random trust values")?;
    let report = run_analysis(path, output_dir, renderer, config).context("analyse workbook")?;
    Ok(report)
}

/// Randomize and analyse every workbook in `dir`.
///
/// A failing workbook is logged and recorded; processing continues with the next one.
pub fn process_directory(
    dir: &Path,
    rng: &mut impl Rng,
    renderer: &mut impl HistogramRenderer,
    config: &AnalysisConfig,
) -> Result<RunReport> {
    let stats_dir = dir.join(&config.stats_dir);
    fs::create_dir_all(&stats_dir)
        .with_context(|| format!("create stats directory {}", stats_dir.display()))?;

    let workbooks = discover_workbooks(dir)?;
    log::info!("found {} workbook(s) in {}", workbooks.len(), dir.display());

    let mut files = Vec::with_capacity(workbooks.len());
    for path in workbooks {
        let output_dir = output_dir_for(&stats_dir, &path);
        match process_workbook(&path, &output_dir, rng, renderer, config) {
            Ok(report) => files.push(FileOutcome::ok(path, report)),
            Err(err) => {
                log::error!("{}: {err:#}", path.display());
                files.push(FileOutcome::failed(path, &err));
            }
        }
    }

    Ok(RunReport {
        directory: dir.to_path_buf(),
        stats_dir,
        files,
    })
}
