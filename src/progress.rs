//! The progress estimator: a periodic sampler over the engine's mutable
//! counters, restricted to the selected files.
//!
//! The engine tracks its own global view of the bundle; everything in
//! here is scoped to the selection instead, so a 2 GiB bundle with a
//! 40 MiB selection reports completion when those 40 MiB are in, not
//! when the engine is done.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::alert::{Alert, AlertSender};
use crate::avg::SlidingAvg;
use crate::engine::TransferEngine;
use crate::selection::SelectionSet;

/// One snapshot of selection-scoped progress, recomputed every tick and
/// never persisted.
#[derive(Debug, Clone)]
pub struct ProgressSample {
    /// Bytes downloaded across exactly the selected files.
    pub selected_downloaded: u64,
    /// The nominal byte length of the selection.
    pub selected_total: u64,
    /// Selection-scoped rate over the last interval, in bytes per second.
    pub instant_rate_bps: f64,
    /// The sliding-window mean of the instantaneous rates.
    pub smoothed_rate_bps: f64,
    /// The engine's own whole-bundle rate, advisory.
    pub engine_rate_bps: u64,
    /// Estimated time until the selection completes. `None` whenever the
    /// smoothed rate is zero or nothing remains.
    pub eta: Option<Duration>,
    /// The number of connected peers.
    pub peer_count: usize,
}

impl ProgressSample {
    /// Completion percentage, clamped to 100: the engine's last-chunk
    /// accounting can transiently overshoot the nominal total by up to
    /// one piece.
    pub fn percent(&self) -> f64 {
        if self.selected_total == 0 {
            return 100.0;
        }
        let percent =
            self.selected_downloaded as f64 / self.selected_total as f64 * 100.0;
        percent.min(100.0)
    }

    /// Bytes of the selection still missing.
    pub fn remaining(&self) -> u64 {
        self.selected_total.saturating_sub(self.selected_downloaded)
    }

    /// True once every selected byte is in.
    pub fn is_complete(&self) -> bool {
        self.selected_downloaded >= self.selected_total
    }
}

/// The periodic sampler over the engine's counters.
///
/// The previous byte counter and the rate window are private to the
/// sampler and only ever touched by [`Sampler::sample`], so the type
/// needs no synchronization: the spawned task is its single owner.
pub struct Sampler<E> {
    engine: Arc<E>,
    selection: SelectionSet,
    selected_total: u64,
    interval: Duration,
    prev_downloaded: u64,
    rates: SlidingAvg,
}

impl<E> Sampler<E>
where
    E: TransferEngine,
{
    pub fn new(
        engine: Arc<E>,
        selection: SelectionSet,
        selected_total: u64,
        interval: Duration,
        rate_window: usize,
    ) -> Self {
        Self {
            engine,
            selection,
            selected_total,
            interval,
            prev_downloaded: 0,
            rates: SlidingAvg::new(rate_window),
        }
    }

    /// Performs one sampling tick.
    ///
    /// Sums the downloaded bytes of exactly the selected files, derives
    /// the instantaneous rate from the delta to the previous tick, pushes
    /// it into the smoothing window and estimates the remaining time.
    /// The ETA is only reported when bytes remain and the smoothed rate
    /// is positive, it can never be negative, infinite or divide by zero.
    pub fn sample(&mut self) -> ProgressSample {
        let selected_downloaded: u64 = self
            .selection
            .iter()
            .map(|index| self.engine.downloaded_bytes(*index))
            .sum();

        let delta = selected_downloaded.saturating_sub(self.prev_downloaded);
        let instant_rate_bps = delta as f64 / self.interval.as_secs_f64();
        self.prev_downloaded = selected_downloaded;

        self.rates.push(instant_rate_bps);
        let smoothed_rate_bps = self.rates.mean();

        let remaining = self.selected_total.saturating_sub(selected_downloaded);
        let eta = if remaining > 0 && smoothed_rate_bps > 0.0 {
            Some(Duration::from_secs_f64(remaining as f64 / smoothed_rate_bps))
        } else {
            None
        };

        ProgressSample {
            selected_downloaded,
            selected_total: self.selected_total,
            instant_rate_bps,
            smoothed_rate_bps,
            engine_rate_bps: self.engine.aggregate_rate_bps(),
            eta,
            peer_count: self.engine.peer_count(),
        }
    }
}

/// Spawns the periodic sampling task.
///
/// Each tick polls the engine for a runtime failure first, then posts a
/// [`Alert::Stats`] sample. Once the selection is complete the task posts
/// exactly one [`Alert::Complete`] and stops. The task halts only itself;
/// the session may still abort the returned handle on interrupt.
pub fn spawn<E>(mut sampler: Sampler<E>, alert_tx: AlertSender) -> JoinHandle<()>
where
    E: TransferEngine + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sampler.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick of a tokio interval resolves immediately; the
        // rate math wants a full interval between samples.
        interval.tick().await;

        loop {
            interval.tick().await;

            if let Some(error) = sampler.engine.failure() {
                log::error!("Transfer engine failed: {}", error);
                let _ = alert_tx.send(Alert::Error(error));
                break;
            }

            let sample = sampler.sample();
            let complete = sample.is_complete();
            log::debug!(
                "Sampled {}/{} bytes at {:.0} B/s",
                sample.selected_downloaded,
                sample.selected_total,
                sample.smoothed_rate_bps
            );

            if alert_tx.send(Alert::Stats(sample)).is_err() {
                // session hung up, no one left to report to.
                break;
            }

            if complete {
                let _ = alert_tx.send(Alert::Complete);
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::alert;
    use crate::testing::{metainfo_with_files, FakeEngine};

    const INTERVAL: Duration = Duration::from_secs(1);

    fn sampler_over(engine: Arc<FakeEngine>, selection: &[usize], total: u64) -> Sampler<FakeEngine> {
        Sampler::new(
            engine,
            selection.iter().copied().collect(),
            total,
            INTERVAL,
            10,
        )
    }

    #[test]
    fn sums_only_selected_files() {
        let engine = Arc::new(FakeEngine::default());
        engine.set_downloaded(&[100, 1000, 10_000]);
        engine.set_rate(123);

        let mut sampler = sampler_over(engine, &[0, 2], 20_000);
        let sample = sampler.sample();

        assert_eq!(sample.selected_downloaded, 10_100);
        assert_eq!(sample.instant_rate_bps, 10_100.0);
        // the engine's whole-bundle rate is carried through untouched.
        assert_eq!(sample.engine_rate_bps, 123);
    }

    #[test]
    fn instant_rate_is_the_delta_over_the_interval() {
        let engine = Arc::new(FakeEngine::default());
        let mut sampler = sampler_over(Arc::clone(&engine), &[0], 10_000);

        engine.set_downloaded(&[1_000]);
        assert_eq!(sampler.sample().instant_rate_bps, 1_000.0);

        engine.set_downloaded(&[1_500]);
        let sample = sampler.sample();
        assert_eq!(sample.instant_rate_bps, 500.0);
        // window mean over the two samples so far.
        assert_eq!(sample.smoothed_rate_bps, 750.0);
    }

    #[test]
    fn eta_uses_smoothed_rate_and_is_never_negative() {
        let engine = Arc::new(FakeEngine::default());
        let mut sampler = sampler_over(Arc::clone(&engine), &[0], 10_000);

        engine.set_downloaded(&[4_000]);
        let sample = sampler.sample();
        // 6000 bytes remain at a smoothed 4000 B/s.
        assert_eq!(sample.eta, Some(Duration::from_secs_f64(1.5)));
    }

    #[test]
    fn eta_is_unknown_at_zero_rate() {
        let engine = Arc::new(FakeEngine::default());
        let mut sampler = sampler_over(engine, &[0], 10_000);

        // no bytes moved: rate 0, eta must be unknown rather than inf.
        let sample = sampler.sample();
        assert_eq!(sample.eta, None);
        assert_eq!(sample.smoothed_rate_bps, 0.0);
    }

    #[test]
    fn eta_is_unknown_once_nothing_remains() {
        let engine = Arc::new(FakeEngine::default());
        let mut sampler = sampler_over(Arc::clone(&engine), &[0], 10_000);

        engine.set_downloaded(&[10_000]);
        let sample = sampler.sample();
        assert!(sample.is_complete());
        assert_eq!(sample.eta, None);
    }

    #[test]
    fn percent_clamps_engine_overshoot() {
        let engine = Arc::new(FakeEngine::default());
        let mut sampler = sampler_over(Arc::clone(&engine), &[0], 10_000);

        // last-chunk accounting may overshoot by up to a piece.
        engine.set_downloaded(&[10_900]);
        let sample = sampler.sample();
        assert_eq!(sample.percent(), 100.0);
        assert_eq!(sample.remaining(), 0);
        assert!(sample.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn task_emits_complete_exactly_once_and_stops() {
        let metainfo = metainfo_with_files(1024, &[4096]);
        let engine = Arc::new(FakeEngine::with_metainfo(metainfo));
        engine.set_downloaded(&[4096]);

        let sampler = sampler_over(Arc::clone(&engine), &[0], 4096);
        let (alert_tx, mut alert_rx) = alert::alert_channel();

        let handle = spawn(sampler, alert_tx);
        handle.await.unwrap();

        let mut stats = 0;
        let mut completes = 0;
        while let Some(alert) = alert_rx.recv().await {
            match alert {
                Alert::Stats(_) => stats += 1,
                Alert::Complete => completes += 1,
                Alert::Error(e) => panic!("unexpected error alert: {}", e),
            }
        }
        assert_eq!(stats, 1);
        assert_eq!(completes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn task_reports_engine_failure_and_stops() {
        use crate::error::engine::EngineError;

        let engine = Arc::new(FakeEngine::default());
        engine.set_downloaded(&[0]);
        engine.set_failure(EngineError::Transfer("tracker revoked".into()));

        let sampler = sampler_over(Arc::clone(&engine), &[0], 4096);
        let (alert_tx, mut alert_rx) = alert::alert_channel();

        let handle = spawn(sampler, alert_tx);
        handle.await.unwrap();

        assert!(matches!(
            alert_rx.recv().await,
            Some(Alert::Error(EngineError::Transfer(_)))
        ));
        assert!(alert_rx.recv().await.is_none());
    }
}
