use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::application::{BcryptHasher, BrokerageService};
use crate::domain::{format_usd, parse_cents, UserId};
use crate::quotes::YahooQuoteClient;

/// Papertrade - Stock Trading Simulator
#[derive(Parser)]
#[command(name = "papertrade")]
#[command(about = "A stock-trading simulator backed by a cash and holdings ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "papertrade.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials for commands that operate on an account.
#[derive(Args)]
pub struct AuthArgs {
    /// Account username
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Register a new account (grants the $10,000.00 signup bonus)
    Register {
        /// Username (must be unique)
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Password confirmation
        #[arg(short, long)]
        confirmation: String,
    },

    /// Deposit cash into an account
    Deposit {
        /// Amount to deposit (e.g., "500" or "500.00")
        amount: String,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Withdraw cash from an account
    Withdraw {
        /// Amount to withdraw (e.g., "500" or "500.00")
        amount: String,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Look up the current price for a symbol
    Quote {
        /// Ticker symbol (e.g., AAPL)
        symbol: String,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Buy shares at the current quoted price
    Buy {
        /// Ticker symbol (e.g., AAPL)
        symbol: String,

        /// Number of shares
        shares: i64,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Sell shares at the current quoted price
    Sell {
        /// Ticker symbol (e.g., AAPL)
        symbol: String,

        /// Number of shares
        shares: i64,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Show portfolio valuation
    Portfolio {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Show trade and cash history
    History {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Verify ledger integrity for an account
    Check {
        #[command(flatten)]
        auth: AuthArgs,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                new_service(&self.database, true).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Register {
                username,
                password,
                confirmation,
            } => {
                let service = new_service(&self.database, false).await?;
                let (user, _token) = service.register(&username, &password, &confirmation).await?;
                println!(
                    "Registered {} with a starting balance of {}",
                    user.username,
                    format_usd(user.cash_cents)
                );
            }

            Commands::Deposit { amount, auth } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '500' or '500.00'")?;
                let receipt = service.deposit(user_id, amount_cents).await?;
                println!(
                    "{} deposit successful, current balance: {}",
                    format_usd(receipt.amount_cents),
                    format_usd(receipt.cash_cents)
                );
            }

            Commands::Withdraw { amount, auth } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '500' or '500.00'")?;
                let receipt = service.withdraw(user_id, amount_cents).await?;
                println!(
                    "{} withdrawal successful, current balance: {}",
                    format_usd(receipt.amount_cents),
                    format_usd(receipt.cash_cents)
                );
            }

            Commands::Quote { symbol, auth } => {
                let service = new_service(&self.database, false).await?;
                sign_in(&service, &auth).await?;
                let quote = service.quote(&symbol).await?;
                println!("{}: {}", quote.ticker, format_usd(quote.price_cents));
            }

            Commands::Buy {
                symbol,
                shares,
                auth,
            } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let receipt = service.buy(user_id, &symbol, shares).await?;
                println!(
                    "Bought {} share(s) of {} for {} ({}/share), remaining cash: {}",
                    receipt.shares,
                    receipt.ticker,
                    format_usd(receipt.total_cents),
                    format_usd(receipt.price_cents),
                    format_usd(receipt.cash_cents)
                );
            }

            Commands::Sell {
                symbol,
                shares,
                auth,
            } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let receipt = service.sell(user_id, &symbol, shares).await?;
                println!(
                    "Sold {} share(s) of {} for {} ({}/share), current cash: {}",
                    receipt.shares,
                    receipt.ticker,
                    format_usd(receipt.total_cents),
                    format_usd(receipt.price_cents),
                    format_usd(receipt.cash_cents)
                );
            }

            Commands::Portfolio { auth } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let report = service.portfolio(user_id).await?;

                println!("Portfolio for {}", report.username);
                for position in &report.positions {
                    match (position.price_cents, position.worth_cents) {
                        (Some(price), Some(worth)) => println!(
                            "  {:<8} {:>8} share(s) @ {:>12} = {:>14}",
                            position.ticker,
                            position.shares,
                            format_usd(price),
                            format_usd(worth)
                        ),
                        _ => println!(
                            "  {:<8} {:>8} share(s)   (quote unavailable)",
                            position.ticker, position.shares
                        ),
                    }
                }
                println!("  Cash:        {}", format_usd(report.cash_cents));
                println!("  Holdings:    {}", format_usd(report.holdings_worth_cents));
                println!("  Total worth: {}", format_usd(report.total_worth_cents));
                println!("  Gain:        {}", format_usd(report.gain_cents));
            }

            Commands::History { auth } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let report = service.history(user_id).await?;

                println!("Trades:");
                for trade in &report.trades {
                    println!(
                        "  #{:<4} {:<7} {:>8} x {:<8} @ {} ({})",
                        trade.rank,
                        trade.kind,
                        trade.shares,
                        trade.ticker,
                        format_usd(trade.price_cents),
                        trade.executed_at.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("Cash:");
                for entry in &report.cash {
                    println!(
                        "  #{:<4} {:<10} {:>14}  total {:>14} ({})",
                        entry.rank,
                        entry.kind,
                        format_usd(entry.amount_cents),
                        format_usd(entry.running_total_cents),
                        entry.occurred_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }

            Commands::Check { auth } => {
                let service = new_service(&self.database, false).await?;
                let user_id = sign_in(&service, &auth).await?;
                let report = service.check_integrity(user_id).await?;

                println!(
                    "Cash: stored {} / replayed {} - {}",
                    format_usd(report.stored_cash_cents),
                    format_usd(report.replayed_cash_cents),
                    if report.cash_consistent { "OK" } else { "MISMATCH" }
                );
                for position in &report.positions {
                    println!(
                        "  {:<8} stored {} / replayed {} - {}",
                        position.ticker,
                        position.stored_amount,
                        position.replayed_amount,
                        if position.consistent && !position.negative {
                            "OK"
                        } else {
                            "MISMATCH"
                        }
                    );
                }
                if report.is_consistent() {
                    println!("Ledger is consistent.");
                } else {
                    println!("Ledger is INCONSISTENT.");
                }
            }
        }

        Ok(())
    }
}

async fn new_service(database: &str, init: bool) -> Result<BrokerageService> {
    let quotes = Arc::new(YahooQuoteClient::new()?);
    let hasher = Box::new(BcryptHasher);
    let service = if init {
        BrokerageService::init(database, quotes, hasher).await?
    } else {
        BrokerageService::connect(database, quotes, hasher).await?
    };
    Ok(service)
}

/// Authenticate and resolve the session to a user ID - the guard every
/// account-bound command goes through.
async fn sign_in(service: &BrokerageService, auth: &AuthArgs) -> Result<UserId> {
    let (_user, token) = service.login(&auth.username, &auth.password).await?;
    Ok(service.require_session(token)?)
}
