use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::payments::{PaymentError, PaymentGateway, TransferReceipt, TransferRequest};

/// Settled transfer kept by [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Transfer as requested.
    pub request: TransferRequest,
    /// Receipt handed back to the caller.
    pub receipt: TransferReceipt,
}

/// In-memory [`PaymentGateway`] that settles every transfer unless told to refuse.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<LedgerInner>,
}

#[derive(Default)]
struct LedgerInner {
    refusing: AtomicBool,
    refuse_after: Mutex<Option<usize>>,
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every transfer while `refusing` is set.
    pub fn set_refusing(&self, refusing: bool) {
        self.inner.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Accept the next `count` transfers, then refuse the rest.
    pub async fn refuse_after(&self, count: usize) {
        *self.inner.refuse_after.lock().await = Some(count);
    }

    /// Every settled transfer in order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.inner.entries.lock().await.clone()
    }
}

impl PaymentGateway for MemoryLedger {
    fn transfer(
        &self,
        request: TransferRequest,
    ) -> BoxFuture<'static, Result<TransferReceipt, PaymentError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let refuse = |reason: &str| PaymentError::Rejected {
                to: request.to.clone(),
                amount_cents: request.amount_cents,
                reason: reason.to_owned(),
            };

            if inner.refusing.load(Ordering::SeqCst) {
                return Err(refuse("ledger is refusing transfers"));
            }
            {
                let mut budget = inner.refuse_after.lock().await;
                if let Some(remaining) = budget.as_mut() {
                    if *remaining == 0 {
                        return Err(refuse("transfer budget exhausted"));
                    }
                    *remaining -= 1;
                }
            }

            let receipt = TransferReceipt {
                tx_hash: format!("0x{}", Uuid::new_v4().simple()),
                to: request.to.clone(),
                amount_cents: request.amount_cents,
            };
            info!(
                from = %request.from,
                to = %request.to,
                amount_cents = request.amount_cents,
                tx_hash = %receipt.tx_hash,
                "transfer settled"
            );
            inner.entries.lock().await.push(LedgerEntry {
                request,
                receipt: receipt.clone(),
            });
            Ok(receipt)
        })
    }
}
