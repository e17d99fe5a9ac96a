use log::error;
use std::process::ExitCode;

use timetable_engine::config::ServerConfig;
use timetable_engine::server;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();

    match server::run_server(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server on {} stopped: {}", config.bind_addr, e);
            ExitCode::FAILURE
        }
    }
}
