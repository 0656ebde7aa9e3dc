//! Wall-clock tick source.
//!
//! Sleeps to each interval boundary of the local day and hands the
//! dispatcher the aligned day-seconds plus a release callback. Every tick
//! takes a [`WakeHold`] that stays outstanding until its release fires.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, Timelike};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::bells::{DaySeconds, SECONDS_PER_DAY};
use crate::dispatcher::AlertDispatcher;

/// Count of ticks whose release has not yet fired.
#[derive(Debug, Default)]
pub struct WakeHold {
    outstanding: AtomicUsize,
}

/// One outstanding hold. Releasing consumes it, so it can only happen once.
#[derive(Debug)]
pub struct Hold {
    owner: Arc<WakeHold>,
}

impl WakeHold {
    pub fn acquire(self: &Arc<Self>) -> Hold {
        let n = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Wake hold acquired ({n} outstanding)");
        Hold {
            owner: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl Hold {
    pub fn release(self) {
        let n = self.owner.outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!("Wake hold released ({n} outstanding)");
    }
}

const MS_PER_DAY: i64 = SECONDS_PER_DAY as i64 * 1_000;

fn millis_of_day(t: NaiveTime) -> i64 {
    // leap-second nanos (>= 1e9) are folded into the last millisecond
    let sub_ms = i64::from(t.nanosecond().min(999_999_999) / 1_000_000);
    i64::from(t.num_seconds_from_midnight()) * 1_000 + sub_ms
}

/// Day-seconds rounded to the nearest second, wrapped into `[0, 86400)`.
pub fn aligned_day_seconds(t: NaiveTime) -> i64 {
    i64::from(DaySeconds::wrapping((millis_of_day(t) + 500) / 1_000).get())
}

/// Time from `t` to the next multiple of `interval_secs` in the local day.
pub fn until_next_boundary(t: NaiveTime, interval_secs: u32) -> Duration {
    let step = i64::from(interval_secs.max(1)) * 1_000;
    let now = millis_of_day(t);
    let next = ((now / step) + 1) * step;
    Duration::from_millis(next.min(MS_PER_DAY).saturating_sub(now).max(1) as u64)
}

/// Deliver ticks until `stop` flips to true. `clock` is read before each
/// sleep and again on wakeup; the service passes `Local::now`.
pub async fn run_ticker<C>(
    dispatcher: Arc<AlertDispatcher>,
    interval_secs: u32,
    hold: Arc<WakeHold>,
    mut stop: watch::Receiver<bool>,
    clock: C,
) where
    C: Fn() -> DateTime<Local>,
{
    info!("Ticker started ({interval_secs}s boundaries)");
    let mut last_fired: Option<i64> = None;

    loop {
        if *stop.borrow() {
            break;
        }
        let delay = until_next_boundary(clock().time(), interval_secs);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let now = clock();
        let day_secs = aligned_day_seconds(now.time());

        // an early wakeup rounds onto the boundary we already handled
        if last_fired == Some(day_secs) {
            debug!("Skipping duplicate tick at {day_secs}");
            continue;
        }
        last_fired = Some(day_secs);

        let token = hold.acquire();
        // rejection is logged by the dispatcher, which still releases
        let _ = dispatcher.on_tick(now.timestamp_millis(), day_secs, move || token.release());

        let held = hold.outstanding();
        if held > 1 {
            debug!("{held} ticks still waiting on playback");
        }
    }

    info!("Ticker stopped ({} holds outstanding)", hold.outstanding());
}
