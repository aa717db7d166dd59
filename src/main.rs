use review_coverage::config::AppConfig;
use review_coverage::error::exit_code_for;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    let log_json = config.as_ref().is_ok_and(|config| config.log_json);
    init_tracing(log_json);

    let result = match config {
        Ok(config) => {
            tracing::info!(
                org = %config.github_org,
                token = %config.masked_token(),
                "Loaded configuration"
            );
            review_coverage::generate_report(&config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(exit_code_for(&e));
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "review_coverage=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
