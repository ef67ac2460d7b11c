use clap::Parser;

use judge_relay::config::CliArgs;
use judge_relay::store::{self, SolutionStore};
use judge_relay::web_server::{AppState, build_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = cli.to_config()?;
    let db_path = store::get_db_path()?;

    if cli.flush_data {
        store::remove_db(&db_path);
    }

    let db_pool = store::init_db(&db_path).await?;
    let state = AppState::from_config(&config, SolutionStore::new(db_pool))?;

    log::info!("Relaying executions to {}", config.judge.base_url);

    let server = build_server(config.server, state)?;
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    server_handle.stop(true).await;

    log::info!("Shutdown complete");
    Ok(())
}
