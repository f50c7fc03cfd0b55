use anyhow::{Context as _, Result};
use loadreport::{run, Config};
use loadreport_core::{Context, OsEnv};
use loadreport_file_read_tokio::TokioFileRead;
use loadreport_http_send_reqwest::ReqwestHttpSend;
use log::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
    let config = Config::from_env(&ctx)?;
    debug!("loaded config: {config:?}");

    let client = build_client(&ctx, &config).await?;
    let ctx = ctx.with_http_send(ReqwestHttpSend::new(client));

    let summary = run(ctx, &config).await?;
    println!("{summary}");
    Ok(())
}

/// Build the shared HTTP client, trusting the cluster CA when it is mounted.
async fn build_client(ctx: &Context, config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().use_rustls_tls();

    let ca_path = format!(
        "{}/ca.crt",
        config.service_account_dir.trim_end_matches('/')
    );
    match ctx.file_read(&ca_path).await {
        Ok(pem) => {
            let cert = reqwest::Certificate::from_pem(&pem)
                .with_context(|| format!("invalid CA certificate at {ca_path}"))?;
            builder = builder.add_root_certificate(cert);
        }
        Err(err) => warn!("no cluster CA certificate loaded, using default roots: {err}"),
    }

    builder.build().context("failed to build http client")
}
