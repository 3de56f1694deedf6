use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use teeforge_events::{EventBus, Subscription};

const POLL_TICK: Duration = Duration::from_millis(100);

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request shutdown and wait for the worker thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(worker = self.name, "projection worker panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Projection worker loop.
///
/// Subscribes to the bus at spawn time and hands every message to
/// `handler`. Handler errors are logged and the loop keeps going; the
/// handler must tolerate redelivery.
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    pub fn spawn<M, B, H, E>(name: &'static str, bus: &B, mut handler: H) -> io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M> + ?Sized,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut handler))?;

        debug!(worker = name, "projection worker started");
        Ok(WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(name: &'static str, sub: Subscription<M>, shutdown_rx: mpsc::Receiver<()>, handler: &mut H)
where
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        match sub.recv_timeout(POLL_TICK) {
            Ok(msg) => {
                if let Err(err) = handler(msg) {
                    warn!(worker = name, error = ?err, "projection worker handler failed");
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(worker = name, "projection worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use teeforge_events::InMemoryEventBus;

    #[test]
    fn handles_published_messages_until_shutdown() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_worker = Arc::clone(&seen);

        let handle = ProjectionWorker::spawn("test-worker", &bus, move |n: u32| {
            seen_in_worker.fetch_add(n as usize, Ordering::SeqCst);
            Ok::<(), ()>(())
        })
        .unwrap();

        bus.publish(2).unwrap();
        bus.publish(3).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while seen.load(Ordering::SeqCst) < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(handle.name(), "test-worker");
        handle.shutdown();
    }

    #[test]
    fn handler_errors_do_not_stop_the_loop() {
        let bus: InMemoryEventBus<bool> = InMemoryEventBus::new();
        let ok = Arc::new(AtomicUsize::new(0));
        let ok_in_worker = Arc::clone(&ok);

        let handle = ProjectionWorker::spawn("flaky", &bus, move |good: bool| {
            if good {
                ok_in_worker.fetch_add(1, Ordering::SeqCst);
                Ok(())
            } else {
                Err("bad message")
            }
        })
        .unwrap();

        bus.publish(false).unwrap();
        bus.publish(true).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while ok.load(Ordering::SeqCst) < 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(ok.load(Ordering::SeqCst), 1);
        drop(handle);
    }
}
