#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let config = patterns_server::config::Config::from_env()?;
    patterns_server::web::start_web_server(config).await
}
