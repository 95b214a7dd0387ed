//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Question, QuestionBank, QuestionKind};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions: parsed.questions,
    })
}

/// Recursively load all `.toml` bank files from a directory. Files that fail
/// to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank under a directory merged into one.
pub fn load_banks(path: &Path) -> Result<QuestionBank> {
    if !path.is_dir() {
        return parse_bank(path);
    }

    let banks = load_bank_directory(path)?;
    if banks.is_empty() {
        anyhow::bail!("no question banks found in {}", path.display());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "questions".to_string());
    Ok(QuestionBank {
        id: name.clone(),
        name,
        description: format!("{} banks", banks.len()),
        questions: banks.into_iter().flat_map(|b| b.questions).collect(),
    })
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common authoring issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message,
            })
        };

        if !seen_ids.insert(&q.id) {
            warn(format!("duplicate question ID: {}", q.id));
        }
        if q.prompt.trim().is_empty() {
            warn("prompt is empty".into());
        }

        match &q.kind {
            QuestionKind::MultipleChoice { options, correct } => {
                if options.is_empty() {
                    warn("multiple-choice question has no options".into());
                }
                match correct {
                    None => warn("no correct answer; every answer will be graded incorrect".into()),
                    Some(c) if !options.is_empty() && !options.contains(c) => {
                        warn(format!("correct answer '{c}' is not one of the options"))
                    }
                    Some(_) => {}
                }
            }
            QuestionKind::MultipleSelect { options, correct } => {
                if options.is_empty() {
                    warn("multiple-select question has no options".into());
                }
                if correct.is_empty() {
                    warn("no correct answers; every answer will be graded incorrect".into());
                }
                for c in correct.iter().filter(|c| !options.is_empty() && !options.contains(*c)) {
                    warn(format!("correct answer '{c}' is not one of the options"));
                }
            }
            QuestionKind::TrueFalse { correct: None } => {
                warn("true-false question has no boolean correct answer".into())
            }
            QuestionKind::ShortAnswer { accepted } if accepted.is_empty() => {
                warn("no accepted answers; every answer will be graded incorrect".into())
            }
            QuestionKind::Slider { min, max, target } => {
                if min >= max {
                    warn(format!("slider min ({min}) must be below max ({max})"));
                }
                match target {
                    None => warn("slider has no numeric target".into()),
                    Some(t) if t < min || t > max => {
                        warn(format!("slider target {t} is outside [{min}, {max}]"))
                    }
                    Some(_) => {}
                }
            }
            QuestionKind::FillBlank { blanks, answers } => {
                if answers.is_empty() {
                    warn("no blank answers; every answer will be graded incorrect".into());
                } else if !blanks.is_empty() && blanks.len() != answers.len() {
                    warn(format!(
                        "{} blanks but {} answers",
                        blanks.len(),
                        answers.len()
                    ));
                }
            }
            QuestionKind::Unsupported { type_name } => {
                warn(format!("unsupported question type '{type_name}' will never be graded correct"))
            }
            _ => {}
        }

        if q.time_limit_seconds == Some(0) {
            warn("time_limit_seconds of 0 is ignored".into());
        }
    }

    warnings
}
