use envelope::config::Config;
use envelope::server::{build_app, serve};
use envelope::VERSION;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "envelope=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(version = VERSION, "Starting envelope on {}", config.address());

    let host = config.host.clone();
    let port = config.port;
    let (_state, app) = build_app(config).expect("Failed to initialize application");

    let (actual_port, handle) = serve(app, &host, port)
        .await
        .expect("Failed to bind address");
    tracing::info!("Listening on http://{}:{}", host, actual_port);

    if let Err(e) = handle.await {
        tracing::error!("Server task failed: {}", e);
    }
}
