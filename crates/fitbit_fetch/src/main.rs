use anyhow::Context;
use fitbit_client::config::Config;
use fitbit_client::credentials::CredentialStore;
use fitbit_client::http_client::ReqwestFitbitClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_env = fitbit_fetch::log_level_with(|k| std::env::var(k).ok());
    fitbit_fetch::init_tracing(&log_env);
    tracing::info!("fitbit_fetch: log filter: {}", log_env);

    let config = Config::from_env().context("reading configuration")?;
    let store = CredentialStore::load(&config.conf_path)
        .await
        .with_context(|| format!("loading credentials from {}", config.conf_path.display()))?;
    let mut client = ReqwestFitbitClient::from_config(&config, store)?;

    let mut stdout = std::io::stdout().lock();
    let records = fitbit_fetch::run(
        &mut client,
        config.heart_date,
        config.heart_period,
        &mut stdout,
    )
    .await?;

    tracing::info!("fitbit_fetch: saved {} records", records.len());
    Ok(())
}
