use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::classify::{ExecutionStatus, classify};
use crate::client::{JudgeClient, SubmissionDetails};
use crate::config::WatcherConfig;
use crate::create_timestamp;
use crate::error::{EngineError, EngineResult};
use crate::history::{ExecutionHistory, HistoryRecord};
use crate::language::LanguageTable;
use crate::push::PushChannel;
use crate::watcher::{CompletionWatcher, WatchOutcome};

/// Caller-facing outcome of one execution.
///
/// `output` and `error_text` are never both populated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub message: String,
    pub output: String,
    pub error_text: String,
    pub compile_info: String,
    pub execution_time_ms: u64,
    pub memory_used_kb: u64,
    pub timestamp: String,
    pub language: String,
}

/// Drives one code execution: submit, await completion, classify, shape.
pub struct Runner {
    client: Arc<dyn JudgeClient>,
    push: Option<Arc<dyn PushChannel>>,
    languages: LanguageTable,
    watcher: WatcherConfig,
    history: Arc<ExecutionHistory>,
}

impl Runner {
    pub fn new(client: Arc<dyn JudgeClient>, history: Arc<ExecutionHistory>) -> Self {
        Self {
            client,
            push: None,
            languages: LanguageTable::new(),
            watcher: WatcherConfig::default(),
            history,
        }
    }

    pub fn with_push(mut self, push: Arc<dyn PushChannel>) -> Self {
        self.push = Some(push);
        self
    }

    pub fn with_languages(mut self, languages: LanguageTable) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_watcher_config(mut self, watcher: WatcherConfig) -> Self {
        self.watcher = watcher;
        self
    }

    pub fn history(&self) -> &Arc<ExecutionHistory> {
        &self.history
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        self.watcher
    }

    pub fn resolve_language(&self, language: &str) -> EngineResult<u32> {
        self.languages
            .resolve(language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(language.to_string()))
    }

    /// Runs `code` once and records the result in the history
    pub async fn run(
        &self,
        code: &str,
        language: &str,
        stdin: &str,
        token: &CancellationToken,
    ) -> EngineResult<ExecutionResult> {
        let result = self
            .execute(code, language, stdin, self.watcher.run_timeout(), token)
            .await?;
        self.history.push(HistoryRecord::Run(result.clone()));
        Ok(result)
    }

    /// Runs `code` once without touching the history
    pub(crate) async fn execute(
        &self,
        code: &str,
        language: &str,
        stdin: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> EngineResult<ExecutionResult> {
        let language_id = self.resolve_language(language)?;

        let created = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(EngineError::Cancelled),
            created = self.client.create_submission(code, language_id, stdin) => created,
        };
        let handle = created?;
        log::info!("Created submission {handle} ({language} -> {language_id})");

        let mut watcher = CompletionWatcher::new(
            self.client.clone(),
            self.push.clone(),
            self.watcher.poll_interval(),
        );

        match watcher.watch(&handle, timeout, token).await? {
            WatchOutcome::Completed(details) => Ok(shape_result(details, language)),
            WatchOutcome::TimedOut => Ok(timed_out(language, timeout)),
            WatchOutcome::Cancelled => Err(EngineError::Cancelled),
        }
    }
}

fn first_non_empty<'a>(candidates: &[&'a str], fallback: &'a str) -> &'a str {
    candidates
        .iter()
        .map(|s| s.trim_end())
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
}

/// Builds the caller-facing record from the judge's details
fn shape_result(details: SubmissionDetails, language: &str) -> ExecutionResult {
    let classification = classify(details.result_code);
    let message = classification.message;

    let stdout = details.stdout.as_str();
    let stderr = details.stderr.as_str();
    let compile_info = details.compile_info.as_str();

    let (output, error_text) = match classification.status {
        ExecutionStatus::Success => (stdout.trim_end().to_string(), String::new()),
        ExecutionStatus::CompileError => (
            String::new(),
            first_non_empty(&[compile_info, stderr], message).to_string(),
        ),
        ExecutionStatus::RuntimeError => (
            String::new(),
            first_non_empty(&[stderr, stdout], message).to_string(),
        ),
        ExecutionStatus::Timeout | ExecutionStatus::MemoryLimit => (
            String::new(),
            first_non_empty(&[stderr], message).to_string(),
        ),
        ExecutionStatus::InternalError => {
            log::warn!("Unmapped judge result code {}", details.result_code);
            (stdout.trim_end().to_string(), String::new())
        }
    };

    let message = match classification.status {
        ExecutionStatus::InternalError => {
            format!("{message} (judge result code {})", details.result_code)
        }
        _ => message.to_string(),
    };

    ExecutionResult {
        status: classification.status,
        message,
        output,
        error_text,
        compile_info: details.compile_info.trim_end().to_string(),
        execution_time_ms: details.cpu_time_ms,
        memory_used_kb: details.memory_kb,
        timestamp: create_timestamp(),
        language: language.to_string(),
    }
}

fn timed_out(language: &str, timeout: Duration) -> ExecutionResult {
    ExecutionResult {
        status: ExecutionStatus::Timeout,
        message: "Time limit exceeded".to_string(),
        output: String::new(),
        error_text: format!("No result from the judge within {}s", timeout.as_secs_f64()),
        compile_info: String::new(),
        execution_time_ms: 0,
        memory_used_kb: 0,
        timestamp: create_timestamp(),
        language: language.to_string(),
    }
}
