/// Failures that escape the engine as errors.
///
/// Outcomes of running user code (compile errors, timeouts, wrong answers, ...) are
/// never represented here; they are status fields on the returned records.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Network, HTTP or decode failure while talking to the remote judge.
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("no test cases supplied")]
    NoTestCases,

    /// Another run or judging sweep is still in flight on the same session.
    #[error("an operation is already in flight on this session")]
    Busy,

    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
