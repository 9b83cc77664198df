use sqlx::SqlitePool;

use crate::config::LedgerConfig;
use crate::domain::{
    Account, AccountId, Amount, Cents, OwnerId, Page, Transaction, TransactionId, TransactionKind,
    first_broken_link, normalize_account_number, replay_balance,
};
use crate::storage::{self, AccountRegistry, CreateOutcome, TransactionLedger};

use super::AppError;

/// Application service binding the registry and the ledger to an authenticated caller.
///
/// Every account-scoped operation first resolves the account and checks that
/// the caller owns it; a foreign account looks exactly like a missing one.
/// This is the primary interface for any transport (CLI, HTTP, ...).
#[derive(Clone)]
pub struct LedgerService {
    registry: AccountRegistry,
    ledger: TransactionLedger,
}

/// Outcome of replaying an account's history against its stored balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub account: Account,
    pub replayed_balance: Cents,
    pub transaction_count: usize,
    /// First entry whose `balance_after` does not follow from its predecessors
    pub first_broken_entry: Option<TransactionId>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.replayed_balance == self.account.balance_cents && self.first_broken_entry.is_none()
    }
}

impl LedgerService {
    /// Create a new ledger service on top of an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            registry: AccountRegistry::new(pool.clone()),
            ledger: TransactionLedger::new(pool),
        }
    }

    /// Open (creating if configured) the database and bring the schema up to date.
    pub async fn init(config: &LedgerConfig) -> Result<Self, AppError> {
        let pool = storage::connect(config).await?;
        storage::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Connect to an existing, already migrated database.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, AppError> {
        let pool = storage::connect(&config.clone().existing_only()).await?;
        Ok(Self::new(pool))
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account for the caller, optionally with a chosen number.
    pub async fn create_account(
        &self,
        owner_id: OwnerId,
        account_number: Option<&str>,
    ) -> Result<Account, AppError> {
        let desired = normalize_account_number(account_number)?;

        match self.registry.create(owner_id, desired.as_deref()).await? {
            CreateOutcome::Created(account) => Ok(account),
            CreateOutcome::NumberTaken(number) => Err(AppError::AccountNumberTaken(number)),
        }
    }

    /// List the caller's accounts in creation order.
    pub async fn list_accounts(&self, owner_id: OwnerId) -> Result<Vec<Account>, AppError> {
        Ok(self.registry.list_by_owner(owner_id).await?)
    }

    /// Get one of the caller's accounts.
    pub async fn get_account(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<Account, AppError> {
        self.registry
            .get_by_id(account_id)
            .await?
            .filter(|account| account.is_owned_by(owner_id))
            .ok_or(AppError::AccountNotFound(account_id))
    }

    /// Current balance of one of the caller's accounts.
    pub async fn account_balance(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<Cents, AppError> {
        Ok(self.get_account(owner_id, account_id).await?.balance_cents)
    }

    /// Delete one of the caller's accounts. Only a zero balance may be deleted.
    pub async fn delete_account(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<(), AppError> {
        let account = self.get_account(owner_id, account_id).await?;
        if !account.has_zero_balance() {
            return Err(AppError::NonZeroBalance {
                account_id,
                balance: account.balance_cents,
            });
        }

        if self
            .registry
            .delete_if_zero_balance(account_id, owner_id)
            .await?
        {
            return Ok(());
        }

        // Lost a race; re-read to tell the caller why.
        let account = self.get_account(owner_id, account_id).await?;
        if account.has_zero_balance() {
            Err(AppError::AccountChanged(account_id))
        } else {
            Err(AppError::NonZeroBalance {
                account_id,
                balance: account.balance_cents,
            })
        }
    }

    // ========================
    // Ledger operations
    // ========================

    /// Deposit a caller-supplied amount string such as `"50.00"`.
    pub async fn deposit(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        amount: &str,
    ) -> Result<Transaction, AppError> {
        let amount = Amount::parse(amount)?;
        self.deposit_amount(owner_id, account_id, amount).await
    }

    /// Withdraw a caller-supplied amount string such as `"20.00"`.
    pub async fn withdraw(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        amount: &str,
    ) -> Result<Transaction, AppError> {
        let amount = Amount::parse(amount)?;
        self.withdraw_amount(owner_id, account_id, amount).await
    }

    /// Record a transaction whose type arrives as text (`"deposit"`, `"WITHDRAW"`, ...).
    pub async fn transact(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        kind: &str,
        amount: &str,
    ) -> Result<Transaction, AppError> {
        let kind = TransactionKind::parse(kind)
            .ok_or_else(|| AppError::InvalidTransactionKind(kind.trim().to_string()))?;
        let amount = Amount::parse(amount)?;

        match kind {
            TransactionKind::Deposit => self.deposit_amount(owner_id, account_id, amount).await,
            TransactionKind::Withdraw => self.withdraw_amount(owner_id, account_id, amount).await,
        }
    }

    pub async fn deposit_amount(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Transaction, AppError> {
        self.get_account(owner_id, account_id).await?;

        match self.ledger.deposit(account_id, amount).await? {
            Some(transaction) => Ok(transaction),
            // The only way an unguarded update misses is a concurrent delete.
            None => Err(AppError::AccountNotFound(account_id)),
        }
    }

    pub async fn withdraw_amount(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Transaction, AppError> {
        self.get_account(owner_id, account_id).await?;

        if let Some(transaction) = self.ledger.withdraw(account_id, amount).await? {
            return Ok(transaction);
        }

        // Zero rows: either gone or short of funds. Re-read to say which.
        let account = self.get_account(owner_id, account_id).await?;
        if account.balance_cents < amount.cents() {
            Err(AppError::InsufficientFunds {
                account_id,
                balance: account.balance_cents,
                required: amount.cents(),
            })
        } else {
            Err(AppError::AccountChanged(account_id))
        }
    }

    /// One page of the account's history, newest first. Limit and offset are clamped.
    pub async fn list_transactions(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>, AppError> {
        self.get_account(owner_id, account_id).await?;
        Ok(self
            .ledger
            .list_by_account(account_id, Page::new(limit, offset))
            .await?)
    }

    /// Full history of the account, oldest first.
    pub async fn statement(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<(Account, Vec<Transaction>), AppError> {
        let account = self.get_account(owner_id, account_id).await?;
        let history = self.ledger.history(account_id).await?;
        Ok((account, history))
    }

    // ========================
    // Integrity operations
    // ========================

    /// Replay the account's history and compare it with the stored balance.
    ///
    /// Both reads happen outside a single snapshot, so a ledger write landing
    /// in between can produce a transient mismatch.
    pub async fn verify_account(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<Reconciliation, AppError> {
        let (account, history) = self.statement(owner_id, account_id).await?;

        let reconciliation = Reconciliation {
            replayed_balance: replay_balance(&history),
            transaction_count: history.len(),
            first_broken_entry: first_broken_link(&history),
            account,
        };

        if !reconciliation.is_consistent() {
            tracing::warn!(
                account_id,
                stored = reconciliation.account.balance_cents,
                replayed = reconciliation.replayed_balance,
                "account history does not reconcile"
            );
        }
        Ok(reconciliation)
    }
}
