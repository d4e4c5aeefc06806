//! Wallet ledger
//!
//! Deposits and withdrawals are two-step: a player files a pending
//! transaction, an operator approves or rejects it. Approval applies the
//! balance delta and flips the status together, so a recorded movement
//! never exists without its matching balance change.

use crate::errors::{TambolaError, TambolaResult};
use crate::game::types::{TransactionKind, TransactionStatus, WalletTransaction};
use crate::storage::GameStore;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct WalletLedger {
    store: Arc<dyn GameStore>,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl WalletLedger {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// The serialization point for one user's balance and pending
    /// transactions.
    fn user_lock(&self, user_id: u64) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// File a deposit request. Money moves only on operator approval.
    pub async fn request_deposit(
        &self,
        user_id: u64,
        amount: f64,
        details: Option<String>,
    ) -> TambolaResult<WalletTransaction> {
        if amount <= 0.0 {
            return Err(TambolaError::InvalidAmount(amount));
        }
        self.require_user(user_id).await?;
        self.store
            .record_transaction(
                user_id,
                amount,
                TransactionKind::Deposit,
                TransactionStatus::Pending,
                details,
            )
            .await
    }

    /// File a withdrawal request. The available balance is checked up
    /// front so obviously unfundable requests never reach the operator.
    pub async fn request_withdraw(
        &self,
        user_id: u64,
        amount: f64,
        details: Option<String>,
    ) -> TambolaResult<WalletTransaction> {
        if amount <= 0.0 {
            return Err(TambolaError::InvalidAmount(amount));
        }
        let user = self.require_user(user_id).await?;
        if user.balance < amount {
            return Err(TambolaError::InsufficientBalance {
                required: amount,
                available: user.balance,
            });
        }
        self.store
            .record_transaction(
                user_id,
                amount,
                TransactionKind::Withdraw,
                TransactionStatus::Pending,
                details,
            )
            .await
    }

    /// Approve a pending transaction: credit for deposits, debit for
    /// withdrawals, then mark approved. A withdrawal whose funding has
    /// evaporated since the request fails and stays pending. The whole
    /// check-and-apply runs under the user's lock so two operators cannot
    /// both approve the same transaction.
    pub async fn approve_transaction(&self, tx_id: u64) -> TambolaResult<WalletTransaction> {
        let tx = self
            .store
            .load_transaction(tx_id)
            .await?
            .ok_or(TambolaError::TransactionNotFound(tx_id))?;

        let lock = self.user_lock(tx.user_id);
        let _guard = lock.lock().await;

        // Re-read under the lock; another operator may have raced us.
        let mut tx = self.require_pending(tx_id).await?;

        match tx.kind {
            TransactionKind::Deposit => {
                self.store.credit_balance(tx.user_id, tx.amount).await?;
            }
            TransactionKind::Withdraw => {
                self.store.debit_balance(tx.user_id, tx.amount).await?;
            }
            // buy_ticket and win records are created completed and can
            // never be pending; the guard above already rejected them.
            TransactionKind::BuyTicket | TransactionKind::Win => {
                return Err(TambolaError::TransactionAlreadyProcessed {
                    tx_id,
                    status: tx.status,
                });
            }
        }

        self.store
            .update_transaction_status(tx_id, TransactionStatus::Approved)
            .await?;
        tx.status = TransactionStatus::Approved;
        info!(tx_id, user_id = tx.user_id, amount = tx.amount, kind = %tx.kind, "💰 transaction approved");
        Ok(tx)
    }

    /// Reject a pending transaction. Terminal, no balance change.
    pub async fn reject_transaction(&self, tx_id: u64) -> TambolaResult<WalletTransaction> {
        let tx = self
            .store
            .load_transaction(tx_id)
            .await?
            .ok_or(TambolaError::TransactionNotFound(tx_id))?;

        let lock = self.user_lock(tx.user_id);
        let _guard = lock.lock().await;

        let mut tx = self.require_pending(tx_id).await?;
        self.store
            .update_transaction_status(tx_id, TransactionStatus::Rejected)
            .await?;
        tx.status = TransactionStatus::Rejected;
        info!(tx_id, user_id = tx.user_id, "transaction rejected");
        Ok(tx)
    }

    pub async fn history(&self, user_id: u64) -> TambolaResult<Vec<WalletTransaction>> {
        self.store.list_transactions(user_id).await
    }

    async fn require_user(&self, user_id: u64) -> TambolaResult<crate::game::types::UserProfile> {
        self.store
            .load_user(user_id)
            .await?
            .ok_or(TambolaError::UserNotFound(user_id))
    }

    async fn require_pending(&self, tx_id: u64) -> TambolaResult<WalletTransaction> {
        let tx = self
            .store
            .load_transaction(tx_id)
            .await?
            .ok_or(TambolaError::TransactionNotFound(tx_id))?;
        if tx.status != TransactionStatus::Pending {
            return Err(TambolaError::TransactionAlreadyProcessed {
                tx_id,
                status: tx.status,
            });
        }
        Ok(tx)
    }
}
