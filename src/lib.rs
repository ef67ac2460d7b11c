pub mod cancel;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod judge;
pub mod language;
pub mod push;
pub mod routes;
pub mod runner;
pub mod session;
pub mod store;
pub mod watcher;
pub mod web_server;

#[cfg(test)]
mod testing;

pub fn create_timestamp() -> String {
    use chrono::{SecondsFormat, Utc};
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
