use actix_web::{HttpResponse, Responder, delete, post, web};
use serde::Deserialize;

use super::engine_error_response;
use crate::judge::JudgeRequest;
use crate::session::SessionRegistry;

#[derive(Deserialize, Debug)]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    pub stdin: Option<String>,
}

#[post("/sessions/{session}/run")]
pub async fn run_handler(
    sessions: web::Data<SessionRegistry>,
    path: web::Path<(String,)>,
    body: web::Json<RunRequest>,
) -> impl Responder {
    let session_id = path.into_inner().0;
    let session = sessions.get_or_create(&session_id);

    match session
        .run(&body.code, &body.language, body.stdin.as_deref())
        .await
    {
        Ok(result) => {
            log::info!("Session {session_id} run finished: {:?}", result.status);
            HttpResponse::Ok().json(result)
        }
        Err(e) => engine_error_response(&e),
    }
}

#[post("/sessions/{session}/judge")]
pub async fn judge_handler(
    sessions: web::Data<SessionRegistry>,
    path: web::Path<(String,)>,
    body: web::Json<JudgeRequest>,
) -> impl Responder {
    let session_id = path.into_inner().0;
    let session = sessions.get_or_create(&session_id);

    match session.judge(&body).await {
        Ok(verdict) => {
            log::info!(
                "Session {session_id} judged: {:?} ({}/{})",
                verdict.status,
                verdict.passed_tests,
                verdict.total_tests
            );
            HttpResponse::Ok().json(verdict)
        }
        Err(e) => engine_error_response(&e),
    }
}

/// Cancels whatever the session is doing; always succeeds
#[delete("/sessions/{session}")]
pub async fn cancel_session_handler(
    sessions: web::Data<SessionRegistry>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let session_id = path.into_inner().0;
    let cancelled = sessions
        .get(&session_id)
        .is_some_and(|session| session.cancel());

    log::info!("Cancel requested for session {session_id}, in flight: {cancelled}");
    HttpResponse::Ok().json(serde_json::json!({ "cancelled": cancelled }))
}
