//! # Example: Cross-Thread Delivery
//!
//! A dedicated delivery thread, writers on other threads, a lifecycle-bound
//! observer and an async writer.
//!
//! Run with: `cargo run --example cross_thread --features logging`

use std::sync::Arc;
use std::thread;

use event_live_data::{
    DeliveryLoop, EventLiveData, LifecycleRegistry, LifecycleState, LiveDataConfig, LogWriter,
    Observer, StickyMode,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let delivery = DeliveryLoop::spawn()?;
    let data: EventLiveData<u64> = EventLiveData::builder(delivery.clone())
        .config(LiveDataConfig::new(StickyMode::StickyForever, false))
        .on_active(|| tracing::info!("first observer active"))
        .on_inactive(|| tracing::info!("no active observers left"))
        .build();

    let screen = LifecycleRegistry::new(LifecycleState::Created);
    let view: Arc<dyn Observer<u64>> = Arc::new(LogWriter::labeled("screen"));
    data.observe(&screen.as_owner(), view)?;
    data.observe_forever(Arc::new(LogWriter::labeled("audit")))?;

    // Bursts from several threads; each burst may collapse to its latest value.
    let writers: Vec<_> = (0..3u64)
        .map(|t| {
            let data = data.clone();
            thread::spawn(move || {
                for i in 0..5 {
                    if let Err(e) = data.post(t * 10 + i) {
                        eprintln!("post failed: {e}");
                    }
                }
            })
        })
        .collect();
    for w in writers {
        let _ = w.join();
    }

    // The screen only starts now; it receives the latest value on activation.
    screen.set_state(LifecycleState::Started);
    data.set_async(100).await?;

    screen.mark_destroyed();
    data.set_async(200).await?;
    println!("observers attached: {}", data.has_observers());

    delivery.shutdown();
    Ok(())
}
