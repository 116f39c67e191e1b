//! `run` and `ping` subcommand handlers.

use std::sync::Arc;

use tracing::{info, warn};

use packpilot_adapter::ActionAdapter;
use packpilot_config::Config;
use packpilot_runloop::{RunLoop, StopReason};

use crate::cli::TargetArgs;
use crate::session;

/// Open packs until the target is reached, the page gets stuck or Ctrl-C.
pub(crate) async fn run(
    config: Config,
    runs: Option<u32>,
    target: TargetArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let attached = session::attach(&config, &target).await?;
    let runs = runs.unwrap_or(config.run.runs);

    let adapter: Arc<dyn ActionAdapter> = Arc::new(attached.adapter.clone());
    let run_loop = Arc::new(
        RunLoop::new(config.run.run_loop.clone(), adapter, attached.bridge.clone())
            .with_thresholds(config.classifier.clone())
            .with_counter(Arc::new(|opened: u32, total: u32| {
                info!("Progress: {}/{}", opened, total);
            })),
    );

    let stopper = run_loop.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; finishing the current step");
            stopper.stop();
        }
    });

    let summary = run_loop.start(runs).await;
    ctrl_c.abort();
    let summary = summary?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.reason == StopReason::Stuck {
        warn!("Stopped early: no open control and nothing to recover");
    }
    Ok(())
}

/// Liveness check through the page adapter.
pub(crate) async fn ping(config: Config, target: TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let attached = session::attach(&config, &target).await?;
    let outcome = attached.adapter.ping().await;
    if !outcome.ok {
        return Err(format!(
            "ping failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        )
        .into());
    }
    println!("{}", outcome.detail.data);
    Ok(())
}
