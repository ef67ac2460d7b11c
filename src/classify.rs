use serde::{Deserialize, Serialize};

/// Semantic status of one execution
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    CompileError,
    RuntimeError,
    Timeout,
    MemoryLimit,
    InternalError,
}

impl ExecutionStatus {
    /// Whether the output of the run must be discarded in favour of error text
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::CompileError | Self::RuntimeError | Self::Timeout | Self::MemoryLimit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: ExecutionStatus,
    pub message: &'static str,
}

/// Maps a remote result code to a status. Total over all integers.
///
/// Codes 15 (wrong answer) and 19 (illegal system call) are reported as `Success` here;
/// deciding whether the output is right is left to output comparison.
pub fn classify(result_code: i64) -> Classification {
    let (status, message) = match result_code {
        0 => (ExecutionStatus::Success, "Compiled, still running"),
        11 => (ExecutionStatus::CompileError, "Compilation error"),
        12 => (ExecutionStatus::RuntimeError, "Runtime error"),
        13 => (ExecutionStatus::Timeout, "Time limit exceeded"),
        15 => (ExecutionStatus::Success, "Success"),
        17 => (ExecutionStatus::MemoryLimit, "Memory limit exceeded"),
        19 => (ExecutionStatus::Success, "Illegal system call"),
        _ => (ExecutionStatus::InternalError, "Internal error"),
    };

    Classification { status, message }
}
