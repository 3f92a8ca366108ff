use clap::Parser;
use docserve::config::{AppState, Args, Config};
use docserve::{logger, server};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args)?;
    logger::init(&config.logging)?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(workers) = config.server.workers {
        runtime.worker_threads(workers);
    }
    let runtime = runtime.build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;

    // The deployment identifier seeds the weak fallback validator; read it
    // once here so the rest of the server never touches ambient state.
    let deployment_id = std::env::var("DOCSERVE_DEPLOYMENT_ID").ok();
    let state = Arc::new(AppState::new(config, deployment_id.as_deref())?);

    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &state.config);

    server::run(listener, state).await?;
    Ok(())
}
