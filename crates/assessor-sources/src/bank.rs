//! TOML question bank source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use assessor_core::error::SourceError;
use assessor_core::model::{Mode, Question, QuestionBank};
use assessor_core::parser::load_banks;
use assessor_core::selector::select_questions;
use assessor_core::traits::{describe_request, QuestionSource};

enum Origin {
    /// Read from disk on every fetch, so edits show up in the next session.
    Path(PathBuf),
    Loaded(QuestionBank),
}

/// Serves questions from a bank file, a directory of bank files, or an
/// already loaded bank.
pub struct BankSource {
    origin: Origin,
    limit: Option<usize>,
}

impl BankSource {
    pub fn open(path: &Path) -> Self {
        Self {
            origin: Origin::Path(path.to_path_buf()),
            limit: None,
        }
    }

    pub fn from_bank(bank: QuestionBank) -> Self {
        Self {
            origin: Origin::Loaded(bank),
            limit: None,
        }
    }

    /// Cap the number of questions per session.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    async fn load(&self) -> Result<QuestionBank, SourceError> {
        match &self.origin {
            Origin::Loaded(bank) => Ok(bank.clone()),
            Origin::Path(path) => {
                if !path.exists() {
                    return Err(SourceError::Unavailable(format!(
                        "question bank not found: {}",
                        path.display()
                    )));
                }
                let path = path.clone();
                tokio::task::spawn_blocking(move || load_banks(&path))
                    .await
                    .map_err(|e| SourceError::Unavailable(e.to_string()))?
                    .map_err(|e| SourceError::Malformed(format!("{e:#}")))
            }
        }
    }
}

#[async_trait]
impl QuestionSource for BankSource {
    fn name(&self) -> &str {
        "bank"
    }

    #[instrument(skip(self), fields(limit = ?self.limit))]
    async fn fetch(&self, mode: Mode, topic: Option<&str>) -> Result<Vec<Question>, SourceError> {
        let bank = self.load().await?;
        let selected = select_questions(&bank.questions, mode, topic, self.limit);
        tracing::debug!(
            bank = %bank.id,
            available = bank.questions.len(),
            selected = selected.len(),
            "selected questions"
        );
        if selected.is_empty() {
            return Err(SourceError::Empty(describe_request(mode, topic)));
        }
        Ok(selected)
    }
}
