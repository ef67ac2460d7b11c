mod history;
mod sessions;
mod solutions;
mod webhook;

pub use history::{clear_history_handler, get_history_handler};
pub use sessions::{RunRequest, cancel_session_handler, judge_handler, run_handler};
pub use solutions::get_user_stats_handler;
pub use webhook::webhook_handler;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::EngineError;

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}

#[derive(Serialize)]
struct ErrorResponseWithMessage {
    reason: &'static str,
    code: u32,
    message: String,
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
    });
    InternalError::from_response(err, response).into()
}

/// Maps an engine failure onto the JSON error shape of the API
fn engine_error_response(err: &EngineError) -> HttpResponse {
    let message = err.to_string();
    match err {
        EngineError::UnsupportedLanguage(_) => {
            HttpResponse::NotFound().json(ErrorResponseWithMessage {
                reason: "ERR_NOT_FOUND",
                code: 3,
                message,
            })
        }
        EngineError::NoTestCases => HttpResponse::BadRequest().json(ErrorResponseWithMessage {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
            message,
        }),
        EngineError::Busy => HttpResponse::BadRequest().json(ErrorResponseWithMessage {
            reason: "ERR_INVALID_STATE",
            code: 2,
            message,
        }),
        EngineError::Cancelled => HttpResponse::Conflict().json(ErrorResponseWithMessage {
            reason: "ERR_CANCELED",
            code: 4,
            message,
        }),
        EngineError::Transport { .. } => {
            log::error!("Judge unreachable: {err}");
            HttpResponse::InternalServerError().json(ErrorResponseWithMessage {
                reason: "ERR_EXTERNAL",
                code: 5,
                message,
            })
        }
    }
}
