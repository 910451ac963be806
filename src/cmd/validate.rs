//! Validate command - check a rule config without running a diagnostic

use clap::Args;
use estatec::rules::{config, RuleConfig};
use estatec::{EngineError, RuleViolation};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON rule config to check
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Serialize)]
struct ValidationIssue {
    version: Option<String>,
    message: String,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    file: String,
    digest: String,
    version_count: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl From<&RuleViolation> for ValidationIssue {
    fn from(v: &RuleViolation) -> Self {
        ValidationIssue {
            version: v.version_id.clone(),
            message: v.kind.to_string(),
        }
    }
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let bytes = std::fs::read(&self.file)?;
        let parsed = RuleConfig::from_slice(&bytes)?;
        let version_count = parsed.versions.len();

        let issues: Vec<ValidationIssue> = match parsed.into_catalog() {
            Ok(_) => Vec::new(),
            Err(EngineError::Configuration(violations)) => {
                violations.iter().map(ValidationIssue::from).collect()
            }
            Err(other) => return Err(other.into()),
        };

        let output = ValidationOutput {
            file: self.file.display().to_string(),
            digest: config::digest(&bytes),
            version_count,
            issue_count: issues.len(),
            issues,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&output);
        }

        // Exit with code 1 if issues found
        if output.issue_count > 0 {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(output: &ValidationOutput) {
    println!();
    println!("RULE CONFIG {} ({} version(s))", output.file, output.version_count);
    println!("  Digest: {}", output.digest);
    println!();

    if output.issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", output.issue_count);
    println!();
    for (i, issue) in output.issues.iter().enumerate() {
        match &issue.version {
            Some(version) => println!("  {}. [{}] {}", i + 1, version, issue.message),
            None => println!("  {}. {}", i + 1, issue.message),
        }
    }
}
