// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pacing seam.
//!
//! All in-flight delays (retry backoff, fan-out pacing, sub-run polls)
//! go through a [`Pacer`] so tests never sleep on the wall clock.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Clone + Send + Sync + 'static {
    async fn pause(&self, d: Duration);
}

/// Production pacer backed by the tokio timer.
#[derive(Debug, Clone, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, d: Duration) {
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use loom_core::FakeClock;
    use parking_lot::Mutex;

    use super::Pacer;

    /// Test pacer: records every pause, advances the shared fake clock by
    /// the requested amount, and yields so concurrent run tasks progress.
    #[derive(Clone)]
    pub struct ManualPacer {
        clock: FakeClock,
        pauses: Arc<Mutex<Vec<Duration>>>,
    }

    impl ManualPacer {
        pub fn new(clock: FakeClock) -> Self {
            Self {
                clock,
                pauses: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn pauses(&self) -> Vec<Duration> {
            self.pauses.lock().clone()
        }
    }

    #[async_trait]
    impl Pacer for ManualPacer {
        async fn pause(&self, d: Duration) {
            self.pauses.lock().push(d);
            self.clock.advance(d);
            tokio::task::yield_now().await;
        }
    }
}
