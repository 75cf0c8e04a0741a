use labsight::{config::Config, init_tracing, server};

#[tokio::main]
async fn main() {
    // .env is optional; real deployments set the environment directly.
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "{} starting v{}",
        labsight::config::APP_NAME,
        labsight::config::APP_VERSION
    );

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run(config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
