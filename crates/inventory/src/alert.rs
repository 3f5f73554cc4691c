//! Low-stock alerting.
//!
//! Publishing is best-effort fan-out: an alert must never block or fail the
//! stock operation that triggered it, and subscribers that went away are
//! dropped on the next publish. Consumers should treat delivery as
//! at-least-once and be idempotent.

use std::sync::{Mutex, mpsc};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_products::ProductId;

/// Emitted after a successful stock mutation lands at or below the product's
/// minimum threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub product_id: ProductId,
    pub sku: String,
    pub stock: i64,
    pub min_stock: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Receiving side of an alert subscription.
#[derive(Debug)]
pub struct AlertSubscription {
    receiver: mpsc::Receiver<StockAlert>,
}

impl AlertSubscription {
    pub fn new(receiver: mpsc::Receiver<StockAlert>) -> Self {
        Self { receiver }
    }

    /// Block until the next alert is available.
    pub fn recv(&self) -> Result<StockAlert, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an alert without blocking.
    pub fn try_recv(&self) -> Result<StockAlert, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for an alert.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<StockAlert, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Publish/subscribe sink for low-stock alerts.
pub trait StockAlertBus: Send + Sync {
    fn publish(&self, alert: StockAlert);

    fn subscribe(&self) -> AlertSubscription;
}

impl<B> StockAlertBus for std::sync::Arc<B>
where
    B: StockAlertBus + ?Sized,
{
    fn publish(&self, alert: StockAlert) {
        (**self).publish(alert)
    }

    fn subscribe(&self) -> AlertSubscription {
        (**self).subscribe()
    }
}

/// In-memory fan-out bus; each subscriber gets a copy of every alert.
#[derive(Debug, Default)]
pub struct InMemoryAlertBus {
    subscribers: Mutex<Vec<mpsc::Sender<StockAlert>>>,
}

impl InMemoryAlertBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockAlertBus for InMemoryAlertBus {
    fn publish(&self, alert: StockAlert) {
        // If the lock is poisoned we drop the alert rather than fail the
        // stock operation that emitted it.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(alert.clone()).is_ok());
        }
    }

    fn subscribe(&self) -> AlertSubscription {
        let (tx, rx) = mpsc::channel();

        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        AlertSubscription::new(rx)
    }
}
