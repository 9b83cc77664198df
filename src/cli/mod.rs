use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;

use crate::application::LedgerService;
use crate::config::{DEFAULT_DATABASE_PATH, LedgerConfig};
use crate::domain::{Account, AccountId, OwnerId, Transaction, format_cents};

/// bankledger - per-user bank accounts with an atomic deposit/withdraw ledger
#[derive(Parser)]
#[command(name = "bankledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BANK_DATABASE", default_value = DEFAULT_DATABASE_PATH)]
    pub database: String,

    /// Authenticated caller id (identity comes from the surrounding auth layer)
    #[arg(short, long, env = "BANK_USER", global = true)]
    pub user: Option<OwnerId>,

    /// Maximum pooled database connections
    #[arg(long, env = "BANK_MAX_CONNECTIONS", default_value_t = 8)]
    pub max_connections: u32,

    /// Milliseconds a writer waits for the database lock
    #[arg(long, env = "BANK_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "bankledger=debug")
    #[arg(long, env = "BANK_LOG", default_value = "warn")]
    pub log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Account ID
        account: AccountId,

        /// Amount with at most 2 decimals (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account ID
        account: AccountId,

        /// Amount with at most 2 decimals (e.g., "20.00" or "20")
        amount: String,
    },

    /// Record a transaction given its type
    Tx {
        /// Account ID
        account: AccountId,

        /// Transaction type: deposit or withdraw
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Amount with at most 2 decimals
        amount: String,
    },

    /// List an account's transactions, newest first
    History {
        /// Account ID
        account: AccountId,

        /// Maximum number of transactions (1-200, default 100)
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Number of newest transactions to skip
        #[arg(short, long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// Export an account statement to CSV or JSON
    Export {
        /// Account ID
        account: AccountId,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Desired account number (generated when omitted)
        #[arg(short, long)]
        number: Option<String>,
    },

    /// List your accounts
    List,

    /// Show one account
    Show {
        /// Account ID
        id: AccountId,
    },

    /// Delete an account (balance must be zero)
    Delete {
        /// Account ID
        id: AccountId,
    },

    /// Replay the account's history and compare it with the stored balance
    Verify {
        /// Account ID
        id: AccountId,
    },
}

impl Cli {
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig::new(&self.database)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();
        let json = self.json;

        let command = match self.command {
            Commands::Init => {
                LedgerService::init(&config).await?;
                println!("Database initialized: {}", self.database);
                return Ok(());
            }
            command => command,
        };

        let owner_id = self
            .user
            .context("No caller identity: pass --user <id> or set BANK_USER")?;
        let service = LedgerService::connect(&config).await?;

        match command {
            Commands::Init => {}

            Commands::Account(cmd) => {
                run_account_command(&service, owner_id, cmd, json).await?;
            }

            Commands::Deposit { account, amount } => {
                let tx = service.deposit(owner_id, account, &amount).await?;
                print_transaction(&tx, json)?;
            }

            Commands::Withdraw { account, amount } => {
                let tx = service.withdraw(owner_id, account, &amount).await?;
                print_transaction(&tx, json)?;
            }

            Commands::Tx {
                account,
                kind,
                amount,
            } => {
                let tx = service.transact(owner_id, account, &kind, &amount).await?;
                print_transaction(&tx, json)?;
            }

            Commands::History {
                account,
                limit,
                offset,
            } => {
                let transactions = service
                    .list_transactions(owner_id, account, limit, offset)
                    .await?;
                print_transactions(&transactions, json)?;
            }

            Commands::Export {
                account,
                output,
                format,
            } => {
                run_export_command(&service, owner_id, account, output.as_deref(), &format)
                    .await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService,
    owner_id: OwnerId,
    cmd: AccountCommands,
    json: bool,
) -> Result<()> {
    match cmd {
        AccountCommands::Create { number } => {
            let account = service.create_account(owner_id, number.as_deref()).await?;
            if json {
                print_json(&account)?;
            } else {
                println!(
                    "Created account {} ({})",
                    account.id, account.account_number
                );
            }
        }

        AccountCommands::List => {
            let accounts = service.list_accounts(owner_id).await?;
            if json {
                print_json(&accounts)?;
            } else if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<8} {:<24} {:>14}", "ID", "NUMBER", "BALANCE");
                println!("{}", "-".repeat(48));
                for account in &accounts {
                    println!(
                        "{:<8} {:<24} {:>14}",
                        account.id,
                        account.account_number,
                        format_cents(account.balance_cents)
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(owner_id, id).await?;
            print_account(&account, json)?;
        }

        AccountCommands::Delete { id } => {
            service.delete_account(owner_id, id).await?;
            if json {
                print_json(&serde_json::json!({ "deleted": id }))?;
            } else {
                println!("Deleted account {}", id);
            }
        }

        AccountCommands::Verify { id } => {
            let report = service.verify_account(owner_id, id).await?;
            if json {
                print_json(&serde_json::json!({
                    "account_id": report.account.id,
                    "stored_balance": format_cents(report.account.balance_cents),
                    "replayed_balance": format_cents(report.replayed_balance),
                    "transactions": report.transaction_count,
                    "first_broken_entry": report.first_broken_entry,
                    "consistent": report.is_consistent(),
                }))?;
            } else {
                println!("Account {}", report.account.id);
                println!("  Stored balance:   {}", format_cents(report.account.balance_cents));
                println!("  Replayed balance: {}", format_cents(report.replayed_balance));
                println!("  Transactions:     {}", report.transaction_count);
                if let Some(entry) = report.first_broken_entry {
                    println!("  First bad entry:  {}", entry);
                }
                println!();
                if report.is_consistent() {
                    println!("History is consistent.");
                } else {
                    println!("History does NOT match the stored balance.");
                }
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    owner_id: OwnerId,
    account_id: AccountId,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        "csv" => {
            let count = exporter
                .export_statement_csv(owner_id, account_id, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "json" => {
            let statement = exporter
                .export_statement_json(owner_id, account_id, writer)
                .await?;
            if output.is_some() {
                eprintln!(
                    "Exported account {} with {} transactions",
                    statement.account.id,
                    statement.transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_account(account: &Account, json: bool) -> Result<()> {
    if json {
        return print_json(account);
    }
    println!("Account: {}", account.id);
    println!("  Number:  {}", account.account_number);
    println!("  Balance: {}", format_cents(account.balance_cents));
    println!(
        "  Opened:  {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

fn print_transaction(tx: &Transaction, json: bool) -> Result<()> {
    if json {
        return print_json(tx);
    }
    println!(
        "{} {} on account {} (balance after: {}, id {})",
        tx.kind,
        format_cents(tx.amount_cents),
        tx.account_id,
        format_cents(tx.balance_after_cents),
        tx.id
    );
    Ok(())
}

fn print_transactions(transactions: &[Transaction], json: bool) -> Result<()> {
    if json {
        return print_json(transactions);
    }
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    println!(
        "{:<8} {:<20} {:<10} {:>12} {:>14}",
        "ID", "DATE", "TYPE", "AMOUNT", "BALANCE AFTER"
    );
    println!("{}", "-".repeat(68));
    for tx in transactions {
        println!(
            "{:<8} {:<20} {:<10} {:>12} {:>14}",
            tx.id,
            tx.created_at.format("%Y-%m-%d %H:%M:%S"),
            tx.kind.as_str(),
            format_cents(tx.amount_cents),
            format_cents(tx.balance_after_cents)
        );
    }
    Ok(())
}
