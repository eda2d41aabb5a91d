use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use trackcore::prelude::TrackResult;
use trackcore::service::{ServiceHost, ShutdownSignal, Tracker};
use trackcore::Sighting;

/// Feeds `sightings` into the tracker, spacing them by their timestamp gaps
/// divided by `speedup`. A non-positive `speedup` feeds everything at once.
/// Returns how many sightings were added before shutdown.
pub async fn feed(
    tracker: &Tracker,
    sightings: &[Sighting],
    speedup: f64,
    signal: &mut ShutdownSignal,
) -> TrackResult<usize> {
    let paced = speedup.is_finite() && speedup > 0.0;
    let mut previous: Option<f64> = None;
    let mut fed = 0;

    for sighting in sightings {
        if let (true, Some(prev)) = (paced, previous) {
            let gap = (sighting.timestamp - prev) / speedup;
            if gap > 0.0 {
                // a gap beyond Duration's range only ends with shutdown
                let stopped = match Duration::try_from_secs_f64(gap) {
                    Ok(wait) => timeout(wait, signal.wait()).await.is_ok(),
                    Err(_) => {
                        signal.wait().await;
                        true
                    }
                };
                if stopped {
                    break;
                }
            }
        }
        if signal.is_raised() {
            break;
        }
        tracker.add_sighting(*sighting)?;
        fed += 1;
        previous = Some(sighting.timestamp);
    }
    Ok(fed)
}

fn log_targets(tracker: &Tracker) {
    let targets = tracker.list_targets();
    info!("{} targets published", targets.len());
    for (idx, target) in targets.iter().enumerate() {
        let (from, to) = (target.start_location(), target.end_location());
        info!(
            "target {}: t={:.0}..{:.0}s speed={:.1} m/s ({:.4}, {:.4}) -> ({:.4}, {:.4})",
            idx,
            target.start_time(),
            target.end_time(),
            target.speed(),
            from.latitude,
            from.longitude,
            to.latitude,
            to.longitude
        );
    }
}

/// Registers the one-shot replay feeder and a periodic target report on
/// `host`. Both stop with the host.
pub fn start_replay(
    host: &mut ServiceHost,
    tracker: Arc<Tracker>,
    sightings: Vec<Sighting>,
    speedup: f64,
    report_period: Duration,
) {
    let signal = host.shutdown_signal();
    let sightings = Arc::new(sightings);
    let feeder = Arc::clone(&tracker);
    host.run_service("replay", None, move || {
        let tracker = Arc::clone(&feeder);
        let sightings = Arc::clone(&sightings);
        let mut signal = signal.clone();
        async move {
            let fed = feed(&tracker, &sightings, speedup, &mut signal).await?;
            info!("replayed {} of {} sightings", fed, sightings.len());
            Ok(())
        }
    });

    host.run_service("report", Some(report_period), move || {
        let tracker = Arc::clone(&tracker);
        async move {
            log_targets(&tracker);
            Ok(())
        }
    });
}
