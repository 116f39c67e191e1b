//! `watch` and `classify` subcommand handlers.

use std::path::Path;

use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use packpilot_adapter::ActionAdapter;
use packpilot_config::Config;
use packpilot_core::{compute_histogram, compute_stats, decide_mode, has_x10_criteria, ClassifierThresholds};

use crate::cli::TargetArgs;
use crate::session;

/// Hook the page and log every purchased-items payload until Ctrl-C.
pub(crate) async fn watch(config: Config, target: TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let attached = session::attach(&config, &target).await?;
    let hooked = attached.adapter.hook_purchased_items().await;
    if !hooked.ok {
        return Err(format!(
            "hook failed: {}",
            hooked.error.as_deref().unwrap_or("unknown error")
        )
        .into());
    }
    info!("Watching purchased items; Ctrl-C to quit");

    let mut rx = attached.bridge.subscribe();
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(response) => {
                    let report = classify(&response.data, &config.classifier);
                    info!("Payload from {}: {}", response.url, report);
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} payloads", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let bridge = &attached.bridge;
    match bridge.store().latest() {
        Some(last) => info!(
            "Stopped watching after {} payload(s); last from {}",
            bridge.delivered_count(),
            last.url
        ),
        None => info!("Stopped watching; no payload captured"),
    }
    Ok(())
}

/// Print the classification of a saved payload.
pub(crate) fn classify_file(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content)?;
    let report = classify(&data, &config.classifier);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn classify(data: &Value, thresholds: &ClassifierThresholds) -> Value {
    let stats = compute_stats(Some(data));
    let histogram = compute_histogram(Some(data));
    json!({
        "stats": stats,
        "histogram": histogram,
        "mode": decide_mode(&histogram, thresholds),
        "x10": has_x10_criteria(&histogram, thresholds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_report() {
        let data = json!({
            "items": [{"id": 1, "rating": 91}, {"id": 2, "rating": 84}],
            "duplicateItemIdList": [1, 2]
        });
        let report = classify(&data, &ClassifierThresholds::default());
        assert_eq!(report["stats"]["allDuplicates"], true);
        assert_eq!(report["stats"]["totalItems"], 2);
        assert_eq!(report["histogram"]["91"], 1);
        assert_eq!(report["mode"], "OVR89");
        assert_eq!(report["x10"], false);
    }

    #[test]
    fn test_classify_unavailable_payload() {
        let report = classify(&json!({"error": "busy"}), &ClassifierThresholds::default());
        assert_eq!(report["stats"]["available"], false);
        assert_eq!(report["mode"], "None");
    }
}
