// CSV import of mission steps.
//
// Expected header: title,description,points,deadline,boss_type,boss_name.
// Rows go through the same checks as steps typed into the form.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::mission::authoring::{AuthoringError, MissionDraft, StepDraft};
use crate::mission::{parse_deadline, BossType};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("line {line}: {message}")]
    Row { line: u64, message: String },

    #[error("line {line}: {source}")]
    Step { line: u64, source: AuthoringError },
}

#[derive(Debug, Deserialize)]
struct RawStep {
    title: String,
    #[serde(default)]
    description: String,
    points: u32,
    deadline: String,
    #[serde(default)]
    boss_type: String,
    #[serde(default)]
    boss_name: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn read_steps_from_reader<R: Read>(rdr: R) -> Result<Vec<StepDraft>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let headers = reader.headers().map_err(|e| csv_error("<input>", e))?.clone();
    let mut draft = MissionDraft::default();

    for result in reader.records() {
        let record = result.map_err(|e| csv_error("<input>", e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw: RawStep = record
            .deserialize(Some(&headers))
            .map_err(|e| ImportError::Row { line, message: e.to_string() })?;

        let boss_type = BossType::parse(&raw.boss_type).ok_or_else(|| ImportError::Row {
            line,
            message: format!("unknown boss type '{}'", raw.boss_type),
        })?;

        // A present but unreadable deadline is a format problem; an empty one
        // is left for the step rules to report.
        let deadline = parse_deadline(&raw.deadline);
        if deadline.is_none() && !raw.deadline.trim().is_empty() {
            return Err(ImportError::Row {
                line,
                message: format!("unreadable deadline '{}'", raw.deadline),
            });
        }

        draft
            .add_step(StepDraft {
                title: raw.title,
                description: raw.description,
                points: raw.points,
                deadline,
                boss_type,
                boss_name: raw.boss_name,
            })
            .map_err(|source| ImportError::Step { line, source })?;
    }

    debug!("imported {} steps", draft.steps().len());
    Ok(draft.steps().to_vec())
}

fn csv_error(path: &str, source: csv::Error) -> ImportError {
    ImportError::Csv {
        path: path.to_string(),
        source,
    }
}

/// Load step drafts from a CSV file. The first bad row fails the import.
pub fn read_steps(path: &Path) -> Result<Vec<StepDraft>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_steps_from_reader(file).map_err(|e| match e {
        ImportError::Csv { source, .. } => csv_error(&path.display().to_string(), source),
        other => other,
    })
}
