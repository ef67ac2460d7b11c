use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::client::HttpJudgeClient;
use crate::config::{Config, ServerConfig};
use crate::error::EngineResult;
use crate::history::ExecutionHistory;
use crate::judge::Judge;
use crate::language::LanguageTable;
use crate::push::NotificationHub;
use crate::routes::{
    cancel_session_handler, clear_history_handler, get_history_handler, get_user_stats_handler,
    json_error_handler, judge_handler, run_handler, webhook_handler,
};
use crate::runner::Runner;
use crate::session::SessionRegistry;
use crate::store::SolutionStore;

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub history: Arc<ExecutionHistory>,
    pub hub: Arc<NotificationHub>,
    pub store: SolutionStore,
}

impl AppState {
    /// Wires the remote judge client, the webhook-fed push hub and the store together
    pub fn from_config(config: &Config, store: SolutionStore) -> EngineResult<Self> {
        let client = Arc::new(HttpJudgeClient::new(&config.judge)?);
        let history = Arc::new(ExecutionHistory::new(config.history_capacity()));
        let hub = Arc::new(NotificationHub::new());

        let runner = Runner::new(client, history.clone())
            .with_push(hub.clone())
            .with_languages(LanguageTable::with_overrides(config.languages.clone()))
            .with_watcher_config(config.watcher);
        let judge = Judge::new(Arc::new(runner)).with_sink(Arc::new(store.clone()));

        Ok(Self {
            sessions: Arc::new(SessionRegistry::new(Arc::new(judge))),
            history,
            hub,
            store,
        })
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.sessions.clone()))
            .app_data(web::Data::from(self.history.clone()))
            .app_data(web::Data::from(self.hub.clone()))
            .app_data(web::Data::new(self.store.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(run_handler)
            .service(judge_handler)
            .service(cancel_session_handler)
            .service(get_history_handler)
            .service(clear_history_handler)
            .service(webhook_handler)
            .service(get_user_stats_handler);
    }
}

pub fn build_server(server_config: ServerConfig, state: AppState) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(move |cfg| state.register(cfg))
    })
    .bind((
        server_config
            .bind_address
            .unwrap_or("127.0.0.1".to_string()),
        server_config.bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
