use crate::domain::events::SimEvent;
use crate::domain::model::{Locatable, Location, ShipId};
use crate::domain::ports::{EventSink, RandomSource};
use crate::utils::error::{Result, SimError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

/// The single bottleneck every ship crosses. At most `capacity` ships hold a
/// [`TunnelPass`] at any time.
#[derive(Debug)]
pub struct Tunnel {
    location: Location,
    capacity: usize,
    gate: Semaphore,
    delay_min: Duration,
    delay_max: Duration,
    inside: AtomicUsize,
    peak: AtomicUsize,
}

/// Proof of admission. Dropping it releases the gate slot, so every exit path
/// (return, `?`, cancellation, task abort) gives the slot back.
#[derive(Debug)]
pub struct TunnelPass<'a> {
    tunnel: &'a Tunnel,
    inside: usize,
    _permit: SemaphorePermit<'a>,
}

impl TunnelPass<'_> {
    /// Ships inside the tunnel right after this one entered.
    pub fn inside_on_entry(&self) -> usize {
        self.inside
    }

    pub fn leave(self) {
        drop(self);
    }
}

impl Drop for TunnelPass<'_> {
    fn drop(&mut self) {
        // 計數先減，permit 之後才歸還
        self.tunnel.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Tunnel {
    pub fn new(location: Location, capacity: usize, delay_min: Duration, delay_max: Duration) -> Self {
        Self {
            location,
            capacity,
            gate: Semaphore::new(capacity),
            delay_min,
            delay_max,
            inside: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn inside(&self) -> usize {
        self.inside.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous holders seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn available(&self) -> usize {
        self.gate.available_permits()
    }

    /// Waits until a slot is free. Fails with [`SimError::Cancelled`] when
    /// `cancel` fires first; no slot is held in that case.
    pub async fn enter(&self, cancel: &CancellationToken) -> Result<TunnelPass<'_>> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SimError::Cancelled),
            permit = self.gate.acquire() => permit.map_err(|_| SimError::Cancelled)?,
        };

        let inside = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(inside, Ordering::SeqCst);

        Ok(TunnelPass {
            tunnel: self,
            inside,
            _permit: permit,
        })
    }

    /// Samples how long one ship stays inside, uniform in `[delay_min, delay_max)`.
    pub fn sample_dwell(&self, random: &dyn RandomSource) -> Duration {
        let low = self.delay_min.as_millis() as u64;
        let high = self.delay_max.as_millis() as u64;
        if high <= low {
            return self.delay_min;
        }
        Duration::from_millis(random.between(low, high))
    }

    /// Full crossing: wait for the gate, stay inside for a random dwell while
    /// holding the slot, then leave. Returns the dwell time.
    pub async fn traverse(
        &self,
        ship: ShipId,
        random: &dyn RandomSource,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        sink.emit(SimEvent::TunnelWaiting { ship });
        let pass = self.enter(cancel).await?;

        let dwell = self.sample_dwell(random);
        sink.emit(SimEvent::TunnelEntered {
            ship,
            dwell,
            inside: pass.inside_on_entry(),
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SimError::Cancelled),
            _ = tokio::time::sleep(dwell) => {}
        }

        sink.emit(SimEvent::TunnelExited { ship });
        pass.leave();
        Ok(dwell)
    }
}

impl Locatable for Tunnel {
    fn location(&self) -> Location {
        self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{RecordingSink, SeededRandom};
    use std::sync::Arc;

    fn tunnel(capacity: usize) -> Tunnel {
        Tunnel::new(
            Location::ORIGIN,
            capacity,
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_more_than_capacity_inside() {
        let tunnel = Arc::new(tunnel(5));
        let random = Arc::new(SeededRandom::from_seed_u64(3));
        let sink = Arc::new(RecordingSink::new());
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for id in 0..40 {
            let tunnel = tunnel.clone();
            let random = random.clone();
            let sink = sink.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                tunnel
                    .traverse(ShipId(id), random.as_ref(), sink.as_ref(), &cancel)
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tunnel.peak(), 5);
        assert_eq!(tunnel.inside(), 0);
        assert_eq!(tunnel.available(), 5);
        assert_eq!(sink.count(|e| matches!(e, SimEvent::TunnelExited { .. })), 40);
        assert!(sink.events().iter().all(|e| match e {
            SimEvent::TunnelEntered { inside, .. } => *inside <= 5,
            _ => true,
        }));
    }

    #[tokio::test]
    async fn test_enter_waits_while_full() {
        let tunnel = tunnel(1);
        let cancel = CancellationToken::new();

        let first = tunnel.enter(&cancel).await.unwrap();
        let mut second = tokio_test::task::spawn(tunnel.enter(&cancel));
        tokio_test::assert_pending!(second.poll());

        first.leave();
        assert!(second.is_woken());
        let pass = tokio_test::assert_ready_ok!(second.poll());
        assert_eq!(pass.inside_on_entry(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_within_bounds() {
        let tunnel = tunnel(5);
        let random = SeededRandom::from_seed_u64(9);
        for _ in 0..200 {
            let dwell = tunnel.sample_dwell(&random);
            assert!(dwell >= Duration::from_secs(2));
            assert!(dwell < Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_holds_nothing() {
        let tunnel = Arc::new(tunnel(2));
        let cancel = CancellationToken::new();

        let first = tunnel.enter(&cancel).await.unwrap();
        let second = tunnel.enter(&cancel).await.unwrap();
        assert_eq!(tunnel.available(), 0);

        let waiter = {
            let tunnel = tunnel.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { tunnel.enter(&cancel).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(SimError::Cancelled)));

        drop(first);
        second.leave();
        assert_eq!(tunnel.available(), 2);
        assert_eq!(tunnel.inside(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_inside_releases_slot() {
        let tunnel = Arc::new(tunnel(5));
        let random = Arc::new(SeededRandom::from_seed_u64(1));
        let sink = Arc::new(RecordingSink::new());
        let cancel = CancellationToken::new();

        let crossing = {
            let tunnel = tunnel.clone();
            let random = random.clone();
            let sink = sink.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tunnel
                    .traverse(ShipId(1), random.as_ref(), sink.as_ref(), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(tunnel.inside(), 1);
        cancel.cancel();

        assert!(matches!(crossing.await.unwrap(), Err(SimError::Cancelled)));
        assert_eq!(tunnel.available(), 5);
        assert_eq!(tunnel.inside(), 0);
        assert_eq!(sink.count(|e| matches!(e, SimEvent::TunnelExited { .. })), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_task_releases_slot() {
        let tunnel = Arc::new(tunnel(1));
        let random = Arc::new(SeededRandom::from_seed_u64(2));
        let sink = Arc::new(RecordingSink::new());
        let cancel = CancellationToken::new();

        let crossing = {
            let tunnel = tunnel.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tunnel
                    .traverse(ShipId(7), random.as_ref(), sink.as_ref(), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(tunnel.available(), 0);
        crossing.abort();
        let _ = crossing.await;

        assert_eq!(tunnel.available(), 1);
        assert_eq!(tunnel.inside(), 0);
    }
}
