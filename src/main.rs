use clap::Parser;
use reporting_gateway::{
    config::{Args, Config, ConfigError},
    handlers::routes,
    logging, AppState,
};
use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_logging();

    let args = Args::parse();
    let config = Config::from_args(&args).inspect_err(|e| {
        error!(error = %e, "refusing to start");
    })?;
    let ip: IpAddr = args
        .host
        .parse()
        .map_err(|_| ConfigError::InvalidBind(args.host.clone()))?;
    let addr = SocketAddr::new(ip, args.port);

    let state = Arc::new(AppState::new(config)?);
    let upstream = state.config.upstream_base.clone();

    let (addr, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })?;

    info!(%addr, %upstream, "reporting gateway listening");
    server.await;
    info!("reporting gateway stopped");
    Ok(())
}
