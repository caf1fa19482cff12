//! Wallet ledger
//!
//! Append-only transaction ledger plus a per-user aggregate moved only
//! by atomic increments. The no-overdraft invariant is enforced by a
//! conditional debit, backstopped by a database CHECK.

pub mod model;
mod service;

pub use model::{
    DepositRequest, TransactionKind, TransactionStatus, UserWallet, WalletTransaction,
    WithdrawRequest, WithdrawalReceipt, WithdrawalSpeed,
};
pub use service::{WalletError, WalletService};
