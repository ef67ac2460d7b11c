use actix_web::{HttpResponse, Responder, get, web};

use super::{ErrorResponse, ErrorResponseWithMessage};
use crate::store::SolutionStore;

#[get("/solutions/{user_id}/stats")]
pub async fn get_user_stats_handler(
    store: web::Data<SolutionStore>,
    path: web::Path<(u32,)>,
) -> impl Responder {
    let user_id = path.into_inner().0;

    match store.fetch_user_stats(user_id).await {
        Ok(Some(stats)) => HttpResponse::Ok().json(stats),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponseWithMessage {
            reason: "ERR_NOT_FOUND",
            code: 3,
            message: format!("User {user_id} has no accepted solutions."),
        }),
        Err(e) => {
            log::error!("Failed to retrieve statistics of user {user_id}: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}
