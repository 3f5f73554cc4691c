//! Background periodic tasks.
//!
//! One worker thread per task, woken on a fixed interval independent of
//! request traffic, with graceful shutdown through a channel. The two tasks
//! shipped here are the overdue-order sweep and the low-stock report.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use orderdesk_customers::CustomerStore;
use orderdesk_inventory::StockAlertBus;
use orderdesk_orders::{OrderService, OrderStore};
use orderdesk_products::{CatalogService, ProductStore};

/// A unit of scheduled work; `run` reports how many records it touched.
pub trait PeriodicTask: Send + 'static {
    fn name(&self) -> &'static str;

    fn run(&self) -> anyhow::Result<usize>;
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to wait between runs.
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

impl WorkerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct WorkerStats {
    pub ticks: u64,
    pub records_touched: u64,
    pub failures: u64,
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct PeriodicWorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl PeriodicWorkerHandle {
    /// Request graceful shutdown and wait for the thread to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    /// Get current worker statistics.
    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Spawn a worker running `task` every `config.interval`.
pub fn spawn<T: PeriodicTask>(task: T, config: WorkerConfig) -> PeriodicWorkerHandle {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let stats = Arc::new(Mutex::new(WorkerStats::default()));
    let stats_clone = stats.clone();

    let join = thread::Builder::new()
        .name(task.name().to_string())
        .spawn(move || {
            worker_loop(task, config, shutdown_rx, stats_clone);
        })
        .expect("failed to spawn periodic worker thread");

    PeriodicWorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
        stats,
    }
}

fn worker_loop<T: PeriodicTask>(
    task: T,
    config: WorkerConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<WorkerStats>>,
) {
    info!(worker = task.name(), "periodic worker started");

    loop {
        match shutdown_rx.recv_timeout(config.interval) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        let outcome = task.run();

        let mut s = stats.lock().unwrap();
        s.ticks += 1;
        match outcome {
            Ok(touched) => {
                s.records_touched += touched as u64;
                info!(worker = task.name(), records = touched, "tick completed");
            }
            Err(e) => {
                s.failures += 1;
                error!(worker = task.name(), error = %e, "tick failed");
            }
        }
    }

    info!(worker = task.name(), "periodic worker stopped");
}

/// Sweeps orders stuck in `created` past the late threshold.
pub struct OverdueSweepTask<O, P, C, A> {
    service: Arc<OrderService<O, P, C, A>>,
}

impl<O, P, C, A> OverdueSweepTask<O, P, C, A> {
    pub fn new(service: Arc<OrderService<O, P, C, A>>) -> Self {
        Self { service }
    }
}

impl<O, P, C, A> PeriodicTask for OverdueSweepTask<O, P, C, A>
where
    O: OrderStore + 'static,
    P: ProductStore + 'static,
    C: CustomerStore + 'static,
    A: StockAlertBus + 'static,
{
    fn name(&self) -> &'static str {
        "overdue-sweep"
    }

    fn run(&self) -> anyhow::Result<usize> {
        Ok(self.service.run_overdue_sweep()?)
    }
}

/// Logs every product sitting at or below its minimum stock threshold.
pub struct LowStockReportTask<S> {
    catalog: CatalogService<S>,
}

impl<S> LowStockReportTask<S> {
    pub fn new(catalog: CatalogService<S>) -> Self {
        Self { catalog }
    }
}

impl<S> PeriodicTask for LowStockReportTask<S>
where
    S: ProductStore + 'static,
{
    fn name(&self) -> &'static str {
        "low-stock-report"
    }

    fn run(&self) -> anyhow::Result<usize> {
        let low = self.catalog.list_low_stock()?;

        for product in &low {
            warn!(
                product_id = %product.id_typed(),
                sku = product.sku(),
                stock = product.stock(),
                min_stock = product.min_stock(),
                "product below minimum stock"
            );
        }

        Ok(low.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingTask {
        runs: Arc<AtomicUsize>,
    }

    impl PeriodicTask for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&self) -> anyhow::Result<usize> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    struct FailingTask;

    impl PeriodicTask for FailingTask {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(&self) -> anyhow::Result<usize> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    #[test]
    fn worker_runs_on_the_interval_and_stops_on_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            CountingTask { runs: runs.clone() },
            WorkerConfig::default().with_interval(Duration::from_millis(10)),
        );

        thread::sleep(Duration::from_millis(120));
        handle.shutdown();

        let observed = runs.load(Ordering::SeqCst);
        assert!(observed >= 1, "expected at least one tick, got {observed}");
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let handle = spawn(
            FailingTask,
            WorkerConfig::default().with_interval(Duration::from_millis(10)),
        );

        thread::sleep(Duration::from_millis(120));
        let stats = handle.stats();
        handle.shutdown();

        assert!(stats.failures >= 1);
        assert_eq!(stats.records_touched, 0);
    }
}
