use cert_notifier::{
    config::Config, routes, services::event_dispatcher::CertificateSignal, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_json);

    info!(
        url = %config.certificate_api.url,
        enabled = config.certificate_api.enabled,
        timeout_secs = config.certificate_api.timeout.as_secs(),
        api_key_configured = config.certificate_api.bearer_token.is_some(),
        "External certificate API configured"
    );
    info!(
        url = %config.event_webhook.url,
        enabled = config.event_webhook.enabled,
        timeout_secs = config.event_webhook.timeout.as_secs(),
        token_configured = config.event_webhook.bearer_token.is_some(),
        "Certificate event webhook configured"
    );

    let app_state = AppState::new(&config)?;
    for signal in CertificateSignal::ALL {
        info!(%signal, event_type = signal.event_type(), "Certificate event handler wired");
    }

    let app = routes::router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
