// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic background retraining.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::FilewiseEngine;

impl FilewiseEngine {
    /// Retrains every `engine.retrain_interval_secs` until `cancel` fires.
    ///
    /// The first pass runs one interval after the call.
    pub fn spawn_retraining(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let period = engine.config().engine.retrain_interval();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = period.as_secs(), "background retraining started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = engine.retrain().await {
                            warn!(error = %e, "background retraining failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("background retraining stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use filewise_config::FilewiseConfig;
    use filewise_core::{EventKind, InteractionEvent};

    #[tokio::test(start_paused = true)]
    async fn retraining_runs_on_schedule_and_stops_on_cancel() {
        let mut config = FilewiseConfig::default();
        config.engine.retrain_interval_secs = 60;
        let engine = Arc::new(FilewiseEngine::builder(config).build().unwrap());

        // Six distinct next accesses give the frequency model enough trials.
        for path in ["a", "b", "a", "b", "a", "b", "a"] {
            engine
                .record_interaction(InteractionEvent::new("u1", path, EventKind::Open))
                .await
                .unwrap();
        }
        assert_eq!(engine.predictors().get("frequency").unwrap().accuracy(), None);

        let cancel = CancellationToken::new();
        let handle = engine.spawn_retraining(cancel.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(engine.predictors().get("frequency").unwrap().accuracy().is_some());

        cancel.cancel();
        handle.await.unwrap();
    }
}
