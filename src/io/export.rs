use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, AccountId, OwnerId, Transaction, format_cents};

/// Full statement of one account, for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub account: Account,
    pub transactions: Vec<Transaction>,
}

/// Exporter for writing an account's history to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the account's transactions (oldest first) as CSV
    pub async fn export_statement_csv<W: Write>(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let (account, transactions) = self.service.statement(owner_id, account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "account_number",
            "type",
            "amount",
            "balance_after",
            "created_at",
        ])?;

        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                account.account_number.clone(),
                tx.kind.as_str().to_string(),
                format_cents(tx.amount_cents),
                format_cents(tx.balance_after_cents),
                tx.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export the account and its history as a pretty-printed JSON document
    pub async fn export_statement_json<W: Write>(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<Statement> {
        let (account, transactions) = self.service.statement(owner_id, account_id).await?;

        let statement = Statement {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            account,
            transactions,
        };

        let json = serde_json::to_string_pretty(&statement)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(statement)
    }
}
