pub mod ledger;

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Movement of funds between two wallet addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Paying address.
    pub from: String,
    /// Receiving address.
    pub to: String,
    /// Amount in cents.
    pub amount_cents: u64,
}

/// Proof that a transfer settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    /// Transaction identifier assigned by the gateway.
    pub tx_hash: String,
    /// Receiving address.
    pub to: String,
    /// Amount in cents.
    pub amount_cents: u64,
}

/// Failure reported by a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The transfer was refused, e.g. insufficient funds or a user rejection.
    #[error("transfer of {amount_cents} cents to `{to}` rejected: {reason}")]
    Rejected {
        /// Receiving address.
        to: String,
        /// Amount in cents.
        amount_cents: u64,
        /// Reason given by the gateway.
        reason: String,
    },
    /// The gateway could not be reached.
    #[error("payment gateway unreachable: {0}")]
    Unreachable(String),
}

/// Abstraction over the wallet/chain used for entry fees, purchases and payouts.
pub trait PaymentGateway: Send + Sync {
    fn transfer(&self, request: TransferRequest)
    -> BoxFuture<'static, Result<TransferReceipt, PaymentError>>;
}
