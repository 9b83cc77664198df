//! Concurrent ledger access
//!
//! Many tasks hit the same account at once. The conditional update is the
//! only thing keeping the balance right, so these catch lost updates and
//! overdrafts.

mod common;

use std::collections::HashSet;

use anyhow::Result;
use bankledger::application::{AppError, ErrorKind};
use common::{ALICE, funded_account, test_service};

const DEPOSITS: usize = 25;
const WITHDRAWALS: usize = 10;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_lose_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account_id = service.create_account(ALICE, None).await?.id;

    let mut handles = Vec::with_capacity(DEPOSITS);
    for _ in 0..DEPOSITS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.deposit(ALICE, account_id, "1.00").await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let expected = DEPOSITS as i64 * 100;
    assert_eq!(service.account_balance(ALICE, account_id).await?, expected);

    let history = service
        .list_transactions(ALICE, account_id, Some(200), None)
        .await?;
    assert_eq!(history.len(), DEPOSITS);

    // Every intermediate balance was observed exactly once
    let snapshots: HashSet<i64> = history.iter().map(|t| t.balance_after_cents).collect();
    let expected_snapshots: HashSet<i64> = (1..=DEPOSITS as i64).map(|n| n * 100).collect();
    assert_eq!(snapshots, expected_snapshots);

    // Ordered by id, the snapshots climb one deposit at a time
    assert_eq!(history[0].balance_after_cents, expected);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account_id = funded_account(&service, ALICE, "10.00").await?.id;

    let mut handles = Vec::with_capacity(WITHDRAWALS);
    for _ in 0..WITHDRAWALS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.withdraw(ALICE, account_id, "3.00").await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await? {
            Ok(tx) => {
                assert!(tx.balance_after_cents >= 0);
                succeeded += 1;
            }
            Err(err @ AppError::InsufficientFunds { .. }) => {
                assert_eq!(err.kind(), ErrorKind::Conflict);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(service.account_balance(ALICE, account_id).await?, 100);

    let report = service.verify_account(ALICE, account_id).await?;
    assert!(report.is_consistent());
    assert_eq!(report.transaction_count, 1 + 3);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_traffic_reconciles() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account_id = funded_account(&service, ALICE, "5.00").await?.id;

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let is_deposit = i % 2 == 0;
            let result = if is_deposit {
                service.deposit(ALICE, account_id, "2.00").await
            } else {
                service.withdraw(ALICE, account_id, "3.00").await
            };
            (is_deposit, result)
        }));
    }
    for handle in handles {
        match handle.await? {
            (_, Ok(tx)) => assert!(tx.balance_after_cents >= 0),
            // A withdrawal may bounce, or see a deposit land right after it bounced
            (false, Err(AppError::InsufficientFunds { .. } | AppError::AccountChanged(_))) => {}
            (is_deposit, Err(other)) => {
                panic!("unexpected error (deposit: {is_deposit}): {other}")
            }
        }
    }

    let report = service.verify_account(ALICE, account_id).await?;
    assert!(report.is_consistent());
    assert!(report.account.balance_cents >= 0);

    Ok(())
}
