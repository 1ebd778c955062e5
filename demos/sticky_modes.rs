//! # Example: Sticky Modes
//!
//! Shows what a late subscriber sees under each replay policy.
//!
//! Everything runs on the main thread: a [`ManualScheduler`] owned by it is
//! the delivery thread, so every call applies immediately.

use std::sync::Arc;

use event_live_data::{EventLiveData, LiveDataConfig, ManualScheduler, Observer, ObserverFn, StickyMode};

fn printer(mode: &'static str, name: &'static str) -> Arc<dyn Observer<&'static str>> {
    ObserverFn::arc(name, move |v: &&'static str| println!("[{mode}] {name} <- {v}"))
}

fn run(label: &'static str, mode: StickyMode) -> anyhow::Result<()> {
    let data: EventLiveData<&'static str> =
        EventLiveData::with_config(ManualScheduler::new(), LiveDataConfig::new(mode, true));

    data.observe_forever(printer(label, "early"))?;
    data.set("first")?;

    for name in ["late-1", "late-2", "late-3"] {
        data.observe_forever(printer(label, name))?;
    }
    println!(
        "[{label}] after attaches: value={:?} version={}",
        data.value().as_deref(),
        data.version()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    run("no-sticky", StickyMode::NoSticky)?;
    run("forever", StickyMode::StickyForever)?;
    run("send-once", StickyMode::SendOnce)?;
    run("count-2", StickyMode::count(2))?;

    // Classic integer encoding.
    let cfg = LiveDataConfig::from_raw(-2, true)?;
    println!("raw -2 decodes to {:?}", cfg.sticky);
    Ok(())
}
