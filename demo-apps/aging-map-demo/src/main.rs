use aging_map_core::{AgingMap, AgingMapConfig, SWEEP_INTERVAL_ENV_VAR, TTL_ENV_VAR};
use anyhow::{ensure, Result};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// TTL used when `AGING_MAP_TTL_SECS` is unset, short enough to watch entries expire
const DEMO_TTL: Duration = Duration::from_millis(200);

/// Sweep interval used when `AGING_MAP_SWEEP_INTERVAL_SECS` is unset
const DEMO_SWEEP_INTERVAL: Duration = Duration::from_millis(50);

/// Number of distinct events in the simulated burst
const EVENT_COUNT: usize = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aging_map_demo=info,aging_map_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;

    tracing::info!("🧪 Aging map demo");
    tracing::info!("   TTL: {:?}", config.ttl);
    tracing::info!("   Sweep interval: {:?}", config.sweep_interval);

    dedup_redelivered_completions(&config).await?;
    redelivery_after_ttl_is_accepted(&config).await?;
    correlate_requests_with_completions(&config).await?;
    sweeper_releases_unread_entries(&config).await?;

    tracing::info!("✅ All scenarios passed!");

    Ok(())
}

/// Reads the map configuration, falling back to demo-sized timings
fn load_config() -> Result<AgingMapConfig> {
    let mut config = AgingMapConfig::from_env()?;

    if std::env::var_os(TTL_ENV_VAR).is_none() {
        config = config.with_ttl(DEMO_TTL);
    }
    if std::env::var_os(SWEEP_INTERVAL_ENV_VAR).is_none() {
        config = config.with_sweep_interval(DEMO_SWEEP_INTERVAL);
    }

    Ok(config)
}

/// Completions delivered one to three times each must be processed exactly once
async fn dedup_redelivered_completions(config: &AgingMapConfig) -> Result<()> {
    tracing::info!("Scenario: Deduplicate redelivered completions");

    let seen: AgingMap<Uuid, usize> = AgingMap::with_config(config.clone())?;
    let processed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let events: Vec<Uuid> = (0..EVENT_COUNT).map(|_| Uuid::new_v4()).collect();
    let deliveries: Vec<(usize, Uuid)> = events
        .iter()
        .enumerate()
        .flat_map(|(i, id)| std::iter::repeat((i, *id)).take(i % 3 + 1))
        .collect();
    let delivery_count = deliveries.len();

    let handles: Vec<_> = deliveries
        .into_iter()
        .map(|(index, id)| {
            let seen = seen.clone();
            let processed = Arc::clone(&processed);
            tokio::spawn(async move {
                if seen.set_if_absent(id, index) {
                    processed.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let processed = processed.load(Ordering::SeqCst);
    tracing::info!(
        "   {} deliveries, {} processed in {:?}",
        delivery_count,
        processed,
        start.elapsed()
    );

    ensure!(
        processed == EVENT_COUNT,
        "expected {} unique completions, processed {}",
        EVENT_COUNT,
        processed
    );

    tracing::info!("   ✓ Every event processed once");
    Ok(())
}

/// Once the TTL passes, the same event id counts as new again
async fn redelivery_after_ttl_is_accepted(config: &AgingMapConfig) -> Result<()> {
    tracing::info!("Scenario: Redelivery after TTL");

    let seen: AgingMap<Uuid, ()> = AgingMap::with_config(config.clone())?;
    let id = Uuid::new_v4();

    ensure!(seen.set_if_absent(id, ()), "first delivery should be accepted");
    ensure!(!seen.set_if_absent(id, ()), "immediate redelivery should be dropped");

    tokio::time::sleep(config.ttl + Duration::from_millis(20)).await;

    ensure!(!seen.contains_key(&id), "entry should have expired");
    ensure!(seen.set_if_absent(id, ()), "redelivery after TTL should be accepted");

    tracing::info!("   ✓ Expired event accepted again");
    Ok(())
}

/// Requests register a pending entry; each completion claims it exactly once
async fn correlate_requests_with_completions(config: &AgingMapConfig) -> Result<()> {
    tracing::info!("Scenario: Correlate requests with completions");

    let mut pending: AgingMap<Uuid, String> = AgingMap::with_config(config.clone())?;

    let requests: Vec<(Uuid, String)> = (0..50)
        .map(|i| (Uuid::new_v4(), format!("request-{}", i)))
        .collect();
    pending.extend(requests.iter().cloned());

    let completions = requests.iter().map(|(id, expected)| {
        let pending = pending.clone();
        let id = *id;
        let expected = expected.clone();
        async move {
            let label = pending.get(&id);
            pending.remove(&id);
            ensure!(
                label.as_deref() == Some(expected.as_str()),
                "completion {} matched {:?}",
                id,
                label
            );
            Ok::<_, anyhow::Error>(())
        }
    });

    join_all(completions)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    ensure!(pending.is_empty(), "all pending requests should be claimed");

    tracing::info!("   ✓ {} completions matched their requests", requests.len());
    Ok(())
}

/// Entries nobody reads are released by the background sweep
async fn sweeper_releases_unread_entries(config: &AgingMapConfig) -> Result<()> {
    let Some(interval) = config.sweep_interval else {
        tracing::info!("Scenario: Background sweep (skipped, no sweep interval)");
        return Ok(());
    };
    tracing::info!("Scenario: Background sweep");

    let map: AgingMap<usize, usize> = AgingMap::with_config(config.clone())?;
    for i in 0..100 {
        map.set(i, i);
    }

    tokio::time::sleep(config.ttl + interval * 2).await;

    ensure!(map.is_empty(), "no entry should be live after the TTL");
    ensure!(map.purge_expired() == 0, "sweeper should already have purged everything");

    tracing::info!("   ✓ Unread entries swept");
    Ok(())
}
