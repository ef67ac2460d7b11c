use actix_web::{HttpResponse, Responder, delete, get, web};

use crate::history::ExecutionHistory;

#[get("/history")]
pub async fn get_history_handler(history: web::Data<ExecutionHistory>) -> impl Responder {
    HttpResponse::Ok().json(history.list())
}

#[delete("/history")]
pub async fn clear_history_handler(history: web::Data<ExecutionHistory>) -> impl Responder {
    history.clear();
    log::info!("History cleared");
    HttpResponse::Ok().finish()
}
