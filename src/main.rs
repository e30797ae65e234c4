use std::error::Error;

use stackcollector::{
    cli::model::Cli,
    collector::{scheduler::Scheduler, Collector},
    config::CollectorConfig,
    endpoint::HttpEndpoint,
    logging,
    store::Store,
};
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    let cfg = CollectorConfig::load(Cli::parse_args())?;

    let _log_guard = tracing::subscriber::set_default(logging::subscriber(&cfg.log_level)?);

    // single thread of control: cycles never interleave
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(cfg))
}

async fn run(cfg: CollectorConfig) -> Result<(), Box<dyn Error>> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting stackcollector");

    let endpoint = HttpEndpoint::new(cfg.fetch_timeout)?;
    let scheduler = Scheduler::new(
        Collector::new(endpoint, Store::new(&cfg.dbpath, cfg.lock.clone())),
        cfg.targets(),
        cfg.interval,
    );

    tokio::select! {
        res = scheduler.run() => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
    }

    Ok(())
}
