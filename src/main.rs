use ozkw_server::core::{Config, Server};
use ozkw_server::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let logs_dir = config.logs_dir();
    let _ = std::fs::create_dir_all(&logs_dir);
    logger::init_logger_with_file(None, logs_dir.to_str());

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Starting {} server",
        config.store_name
    );

    Server::new(config).run().await?;
    Ok(())
}
