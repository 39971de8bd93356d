use std::fmt;

use anyhow::Result;
use lexi_core::{ImportJob, LanguageEntry, PipelineError};
use serde_json::{json, Value};

use crate::cli::LexiCli;

/// Result of one executed subcommand.
pub struct Outcome {
    pub message: String,
    pub details: Value,
}

impl Outcome {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Outcome {
            message: message.into(),
            details,
        }
    }
}

/// An operator mistake rather than a system failure; exits 1 instead of 2.
#[derive(Debug)]
pub struct UserError(pub String);

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UserError {}

/// Prints the envelope (or human text) and returns the exit code.
///
/// # Errors
///
/// Fails only if the JSON envelope cannot be serialized.
pub fn emit(cli: &LexiCli, outcome: Result<Outcome>) -> Result<i32> {
    match outcome {
        Ok(outcome) => {
            if cli.json {
                let payload = json!({
                    "status": "ok",
                    "message": outcome.message,
                    "details": outcome.details,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if !cli.quiet {
                println!("{}", outcome.message);
            }
            Ok(0)
        }
        Err(err) => {
            let (code, label) = classify(&err);
            if cli.json {
                let payload = json!({
                    "status": "error",
                    "message": err.to_string(),
                    "details": { "code": label },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                eprintln!("error[{label}]: {err}");
            }
            Ok(code)
        }
    }
}

/// Exit 1 for validation and operational refusals, 2 for everything else.
fn classify(err: &anyhow::Error) -> (i32, String) {
    if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
        return (1, pipeline.code().to_string());
    }
    if err.downcast_ref::<UserError>().is_some() {
        return (1, "USER_ERROR".to_string());
    }
    (2, "INTERNAL".to_string())
}

pub fn language_table(languages: &[LanguageEntry]) -> String {
    let mut lines = vec![format!(
        "{:<8} {:<12} {:<8} {:<9} {:<4} DICTIONARY",
        "ID", "LABEL", "ENABLED", "SOURCE", "MIN"
    )];
    for entry in languages {
        lines.push(format!(
            "{:<8} {:<12} {:<8} {:<9} {:<4} {}",
            entry.id,
            entry.label,
            if entry.enabled { "yes" } else { "no" },
            format!("{:?}", entry.source).to_lowercase(),
            entry.min_length,
            entry.dictionary_file.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

pub fn job_table(jobs: &[ImportJob]) -> String {
    let mut lines = vec![format!(
        "{:<5} {:<8} {:<10} {:<8} ERROR",
        "ID", "VARIANT", "COMMIT", "STATUS"
    )];
    for job in jobs {
        let short_commit = &job.commit.as_str()[..10.min(job.commit.as_str().len())];
        lines.push(format!(
            "{:<5} {:<8} {:<10} {:<8} {}",
            job.id,
            job.variant.as_str(),
            short_commit,
            job.status.as_str(),
            job.error.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}
