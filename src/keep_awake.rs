//! # Keep-Awake Module
//!
//! Background task that periodically emits a no-op input event so the host
//! does not blank the display or go to sleep during long play sessions with
//! a gamepad.
//!
//! The task shares no state with the protocol engine. Stopping it never
//! blocks: shutdown is signalled and the task is aborted in place.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, trace};

/// Host hook that emits one no-op input event
pub trait WakeNudge: Send + 'static {
    fn nudge(&mut self);
}

impl<F: FnMut() + Send + 'static> WakeNudge for F {
    fn nudge(&mut self) {
        self()
    }
}

/// Handle to a running keep-awake task
///
/// # Examples
///
/// ```no_run
/// use dualshock_bridge::keep_awake::KeepAwake;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let mut keep_awake = KeepAwake::start(|| { /* move the cursor by 0,0 */ }, Duration::from_secs(50));
///     // ...
///     keep_awake.stop();
/// }
/// ```
#[derive(Debug)]
pub struct KeepAwake {
    handle: Option<JoinHandle<()>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl KeepAwake {
    /// Spawn the keep-awake loop on the current tokio runtime
    ///
    /// The first nudge happens immediately, then once per `period`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<N: WakeNudge>(mut nudge: N, period: Duration) -> Self {
        let (shutdown, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        trace!("Keep-awake nudge");
                        nudge.nudge();
                    }
                    _ = &mut stop_rx => break,
                }
            }

            debug!("Keep-awake task finished");
        });

        debug!("Keep-awake started ({}s period)", period.as_secs());
        Self {
            handle: Some(handle),
            shutdown: Some(shutdown),
        }
    }

    /// Stop the task without waiting for it
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Keep-awake stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        self.stop();
    }
}
