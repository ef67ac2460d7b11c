use actix_web::{HttpResponse, Responder, post, web};

use crate::client::SubmissionHandle;
use crate::push::{NotificationHub, PushMessage};

/// Entry point for the judge's completion callbacks
#[post("/webhook/{link}")]
pub async fn webhook_handler(
    hub: web::Data<NotificationHub>,
    path: web::Path<(String,)>,
    body: web::Json<PushMessage>,
) -> impl Responder {
    let handle = SubmissionHandle::new(path.into_inner().0);
    let delivered = hub.publish(&handle, body.into_inner());
    log::debug!("Webhook for {handle} delivered to {delivered} subscriber(s)");

    HttpResponse::Ok().json(serde_json::json!({ "delivered": delivered }))
}
