use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let settings = mt_api::Settings::load()?;

    if settings.tenancy.tenants.is_empty() {
        tracing::warn!("no tenants configured; every gated request will be refused");
    }
    tracing::info!(
        tenants = settings.tenancy.tenants.len(),
        header = settings.tenancy.effective_header_name(),
        bypass = ?settings.tenancy.bypass_prefixes,
        "tenancy loaded"
    );

    mt_api::build(&settings.tenancy).listen(settings.addr()).await
}
