//! Status reporting over a local socket.
//!
//! The simulation loop pushes one JSON status line per report interval to
//! whoever is listening. Telemetry is best-effort: a dead or absent
//! listener must never stall or kill the control loop, so send failures
//! come back as errors for the caller to log and drop.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::Pose;

/// One status snapshot from the simulation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Simulation step the snapshot was taken at.
    pub step: u64,
    /// Robot pose in world units.
    pub pose: Pose,
    /// Latest steering command, degrees.
    pub steering_deg: f32,
    /// Front / left / right range readings, miss = -1.
    pub ranges: Vec<f32>,
    /// Battery level in [0, 1]; `None` when the platform reports none.
    pub battery: Option<f32>,
    /// Belief cell counts: free, unknown, occupied.
    pub cells_free: usize,
    pub cells_unknown: usize,
    pub cells_occupied: usize,
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[from] std::io::Error),

    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fire-and-forget JSON status sender.
///
/// Each report opens a short-timeout connection, writes one JSON line and
/// closes. One connection per report keeps the sender stateless across
/// listener restarts.
#[derive(Debug, Clone)]
pub struct StatusSender {
    addr: SocketAddr,
    timeout: Duration,
}

impl StatusSender {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: Duration::from_millis(200),
        }
    }

    pub fn send(&self, report: &StatusReport) -> Result<(), TelemetryError> {
        let mut stream =
            TcpStream::connect_timeout(&self.addr, self.timeout).map_err(|source| {
                TelemetryError::Connect {
                    addr: self.addr,
                    source,
                }
            })?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut line = serde_json::to_vec(report)?;
        line.push(b'\n');
        stream.write_all(&line)?;
        debug!(step = report.step, "status report sent");
        Ok(())
    }
}

/// Background thread that owns the socket I/O for a [`StatusSender`].
///
/// [`StatusWorker::report`] only does a bounded `try_send`, so a slow or
/// black-holed listener costs the control loop nothing; a report that
/// arrives while the previous one is still in flight is dropped.
pub struct StatusWorker {
    tx: Option<SyncSender<StatusReport>>,
    handle: Option<JoinHandle<()>>,
}

impl StatusWorker {
    pub fn spawn(sender: StatusSender) -> Self {
        let (tx, rx) = mpsc::sync_channel::<StatusReport>(1);
        let handle = std::thread::spawn(move || {
            while let Ok(report) = rx.recv() {
                if let Err(e) = sender.send(&report) {
                    debug!(error = %e, "status report dropped");
                }
            }
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queue a report without blocking. Returns whether it was accepted.
    pub fn report(&self, report: StatusReport) -> bool {
        let Some(tx) = &self.tx else { return false };
        match tx.try_send(report) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("status report dropped, previous send still in flight");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl Drop for StatusWorker {
    fn drop(&mut self) {
        // Closing the channel ends the thread after the in-flight send
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Background listener keeping only the most recent report.
pub struct StatusListener {
    latest: Arc<Mutex<Option<StatusReport>>>,
    running: Arc<AtomicBool>,
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl StatusListener {
    /// Bind `addr` and start accepting reports on a background thread.
    pub fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        // Polling accept so shutdown is observed promptly
        listener.set_nonblocking(true)?;

        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let thread_latest = Arc::clone(&latest);
        let thread_running = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            while thread_running.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        if let Err(e) = Self::read_report(stream, &thread_latest) {
                            warn!(error = %e, "malformed status report dropped");
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(20));
                    }
                    Err(e) => {
                        warn!(error = %e, "status listener accept failed");
                    }
                }
            }
        });

        Ok(Self {
            latest,
            running,
            addr,
            handle: Some(handle),
        })
    }

    fn read_report(
        stream: TcpStream,
        latest: &Mutex<Option<StatusReport>>,
    ) -> Result<(), TelemetryError> {
        // The accepted stream may inherit the listener's nonblocking mode
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_millis(500)))?;
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line)?;
        let report: StatusReport = serde_json::from_str(line.trim_end())?;
        *latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
        Ok(())
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The most recently received report, if any.
    pub fn latest(&self) -> Option<StatusReport> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stop the background thread and join it.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(step: u64) -> StatusReport {
        StatusReport {
            step,
            pose: Pose::new(1.0, 2.0, 0.5),
            steering_deg: -10.0,
            ranges: vec![2.5, 1.5, -1.0],
            battery: Some(0.8),
            cells_free: 100,
            cells_unknown: 3800,
            cells_occupied: 100,
        }
    }

    #[test]
    fn test_report_round_trips_as_json() {
        let r = report(7);
        let json = serde_json::to_string(&r).unwrap();
        let back: StatusReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_sender_delivers_to_listener() {
        let listener = StatusListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let sender = StatusSender::new(listener.local_addr());

        sender.send(&report(1)).unwrap();
        sender.send(&report(2)).unwrap();

        // Give the background thread time to drain both connections
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(r) = listener.latest() {
                if r.step == 2 {
                    break;
                }
            }
            assert!(
                std::time::Instant::now() < deadline,
                "listener never observed the second report"
            );
            std::thread::sleep(Duration::from_millis(10));
        }

        listener.shutdown();
    }

    #[test]
    fn test_send_without_listener_is_an_error_not_a_panic() {
        // Port 1 is essentially never listening
        let sender = StatusSender::new("127.0.0.1:1".parse().unwrap());
        assert!(sender.send(&report(0)).is_err());
    }

    #[test]
    fn test_worker_delivers_in_background() {
        let listener = StatusListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let worker = StatusWorker::spawn(StatusSender::new(listener.local_addr()));

        assert!(worker.report(report(5)));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            if listener.latest().map(|r| r.step) == Some(5) {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "worker never delivered the report"
            );
            std::thread::sleep(Duration::from_millis(10));
        }

        drop(worker);
        listener.shutdown();
    }

    #[test]
    fn test_worker_never_blocks_the_caller() {
        // No listener: every send fails, yet queuing must stay cheap
        let worker = StatusWorker::spawn(StatusSender::new("127.0.0.1:1".parse().unwrap()));

        let start = std::time::Instant::now();
        for step in 0..200 {
            worker.report(report(step));
        }
        // Well under a single sender timeout even with all sends failing
        assert!(
            start.elapsed() < Duration::from_millis(150),
            "queuing reports stalled the caller: {:?}",
            start.elapsed()
        );
    }
}
