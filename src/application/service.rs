use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    build_integrity_report, normalize_ticker, CashKind, Cents, IntegrityReport, TradeKind, User,
    UserId, SIGNUP_BONUS_CENTS,
};
use crate::quotes::{Quote, QuoteProvider};
use crate::storage::Repository;

use super::reporting::{HistoryReport, PortfolioReport, Position};
use super::{AppError, PasswordHasher, SessionStore, SessionToken};

/// Application service providing the account, trading, and reporting
/// operations. This is the primary interface for any client (CLI, web
/// frontend, TUI).
///
/// Every mutation runs its read-validate-write sequence inside a single
/// ledger transaction; all validation happens before the first write, so
/// a failed operation leaves the ledger exactly as it found it.
pub struct BrokerageService {
    repo: Repository,
    quotes: Arc<dyn QuoteProvider>,
    hasher: Box<dyn PasswordHasher>,
    sessions: SessionStore,
}

/// Result of a deposit or withdrawal.
#[derive(Debug)]
pub struct CashReceipt {
    pub kind: CashKind,
    pub amount_cents: Cents,
    /// Cash balance after the operation.
    pub cash_cents: Cents,
}

/// Result of a buy or sell.
#[derive(Debug)]
pub struct TradeReceipt {
    pub ticker: String,
    pub kind: TradeKind,
    pub shares: i64,
    /// Price per share the trade executed at.
    pub price_cents: Cents,
    pub total_cents: Cents,
    /// Cash balance after the trade.
    pub cash_cents: Cents,
}

impl BrokerageService {
    /// Create a new service over an already-connected repository.
    pub fn new(
        repo: Repository,
        quotes: Arc<dyn QuoteProvider>,
        hasher: Box<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repo,
            quotes,
            hasher,
            sessions: SessionStore::new(),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(
        database_path: &str,
        quotes: Arc<dyn QuoteProvider>,
        hasher: Box<dyn PasswordHasher>,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, quotes, hasher))
    }

    /// Connect to an existing database.
    pub async fn connect(
        database_path: &str,
        quotes: Arc<dyn QuoteProvider>,
        hasher: Box<dyn PasswordHasher>,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, quotes, hasher))
    }

    /// Direct access to the underlying ledger store, for read-side
    /// inspection and integrity tooling.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Session guard
    // ========================

    /// Resolve a session token to its user ID. This is the guard every
    /// client goes through before invoking an authenticated operation.
    pub fn require_session(&self, token: SessionToken) -> Result<UserId, AppError> {
        self.sessions.require(token)
    }

    /// Drop a session.
    pub fn logout(&self, token: SessionToken) {
        self.sessions.clear(token);
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account, grant the signup bonus, and establish a
    /// session.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(User, SessionToken), AppError> {
        if username.is_empty() {
            return Err(AppError::Validation("must provide username".into()));
        }
        if password.is_empty() || confirmation.is_empty() {
            return Err(AppError::Validation("must provide password 2 times".into()));
        }
        if password != confirmation {
            return Err(AppError::Validation(
                "confirmation must match password".into(),
            ));
        }

        let hash = self.hasher.hash(password)?;

        let mut tx = self.repo.begin().await?;
        if tx.get_user_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let mut user = User::new(username, hash);
        tx.create_user(&user).await?;
        tx.append_cash_transaction(user.id, SIGNUP_BONUS_CENTS, Utc::now())
            .await?;
        tx.update_cash(user.id, SIGNUP_BONUS_CENTS).await?;
        tx.commit().await?;
        user.cash_cents = SIGNUP_BONUS_CENTS;

        info!(username, "registered account");
        let token = self.sessions.create(user.id);
        Ok((user, token))
    }

    /// Authenticate an existing account and establish a session. No
    /// mutation.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, SessionToken), AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "must provide username and password".into(),
            ));
        }

        let user = self
            .repo
            .get_user_by_username(username)
            .await?
            .ok_or(AppError::Auth)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(AppError::Auth);
        }

        debug!(username, "login");
        let token = self.sessions.create(user.id);
        Ok((user, token))
    }

    /// Fetch the account behind a user ID. A session that outlives its
    /// user row is treated as unauthenticated.
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or(AppError::AuthRequired)
    }

    /// Add cash to an account.
    pub async fn deposit(&self, user_id: UserId, amount_cents: Cents) -> Result<CashReceipt, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::Validation(
                "must provide a positive amount to deposit".into(),
            ));
        }

        let mut tx = self.repo.begin().await?;
        let user = tx.get_user(user_id).await?.ok_or(AppError::AuthRequired)?;
        let new_balance = user
            .cash_cents
            .checked_add(amount_cents)
            .ok_or(AppError::Overflow)?;
        tx.update_cash(user_id, new_balance).await?;
        tx.append_cash_transaction(user_id, amount_cents, Utc::now())
            .await?;
        tx.commit().await?;

        debug!(%user_id, amount_cents, new_balance, "deposit");
        Ok(CashReceipt {
            kind: CashKind::Deposit,
            amount_cents,
            cash_cents: new_balance,
        })
    }

    /// Remove cash from an account. Rejected before any write if the
    /// balance does not cover it.
    pub async fn withdraw(&self, user_id: UserId, amount_cents: Cents) -> Result<CashReceipt, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::Validation(
                "must provide a positive amount to withdraw".into(),
            ));
        }

        let mut tx = self.repo.begin().await?;
        let user = tx.get_user(user_id).await?.ok_or(AppError::AuthRequired)?;
        if amount_cents > user.cash_cents {
            return Err(AppError::InsufficientFunds {
                balance: user.cash_cents,
                required: amount_cents,
            });
        }
        let new_balance = user.cash_cents - amount_cents;
        tx.update_cash(user_id, new_balance).await?;
        tx.append_cash_transaction(user_id, -amount_cents, Utc::now())
            .await?;
        tx.commit().await?;

        debug!(%user_id, amount_cents, new_balance, "withdrawal");
        Ok(CashReceipt {
            kind: CashKind::Withdrawal,
            amount_cents,
            cash_cents: new_balance,
        })
    }

    // ========================
    // Trading operations
    // ========================

    /// Look up the current price for a ticker. No mutation.
    pub async fn quote(&self, ticker: &str) -> Result<Quote, AppError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(AppError::Validation("must provide symbol".into()));
        }
        self.quotes
            .lookup(&ticker)
            .await
            .ok_or(AppError::UnknownSymbol(ticker))
    }

    /// Buy shares at the current quoted price.
    ///
    /// The quote is fetched exactly once; the same price is validated
    /// against and recorded, so the trade cannot race a price move
    /// between its own validation and its own log entry.
    pub async fn buy(
        &self,
        user_id: UserId,
        ticker: &str,
        shares: i64,
    ) -> Result<TradeReceipt, AppError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(AppError::Validation("must provide symbol".into()));
        }
        if shares <= 0 {
            return Err(AppError::Validation(
                "must provide a positive number of shares to buy".into(),
            ));
        }

        let quote = self
            .quotes
            .lookup(&ticker)
            .await
            .ok_or_else(|| AppError::UnknownSymbol(ticker.clone()))?;
        let total = quote
            .price_cents
            .checked_mul(shares)
            .ok_or(AppError::Overflow)?;

        let mut tx = self.repo.begin().await?;
        let user = tx.get_user(user_id).await?.ok_or(AppError::AuthRequired)?;
        if total > user.cash_cents {
            return Err(AppError::InsufficientFunds {
                balance: user.cash_cents,
                required: total,
            });
        }

        let symbol = tx.get_or_create_symbol(&ticker).await?;
        let new_balance = user.cash_cents - total;
        tx.update_cash(user_id, new_balance).await?;
        tx.append_trade(user_id, symbol.id, shares, quote.price_cents, Utc::now())
            .await?;
        let held = tx.get_holding_amount(user_id, symbol.id).await?;
        tx.upsert_holding_amount(user_id, symbol.id, held + shares)
            .await?;
        tx.commit().await?;

        info!(%user_id, %ticker, shares, price_cents = quote.price_cents, "buy");
        Ok(TradeReceipt {
            ticker,
            kind: TradeKind::Bought,
            shares,
            price_cents: quote.price_cents,
            total_cents: total,
            cash_cents: new_balance,
        })
    }

    /// Sell shares at the current quoted price. The holding row is
    /// retained even when sold down to zero.
    pub async fn sell(
        &self,
        user_id: UserId,
        ticker: &str,
        shares: i64,
    ) -> Result<TradeReceipt, AppError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(AppError::Validation("must provide symbol".into()));
        }
        if shares <= 0 {
            return Err(AppError::Validation(
                "must provide a positive number of shares to sell".into(),
            ));
        }

        let quote = self
            .quotes
            .lookup(&ticker)
            .await
            .ok_or_else(|| AppError::UnknownSymbol(ticker.clone()))?;
        let total = quote
            .price_cents
            .checked_mul(shares)
            .ok_or(AppError::Overflow)?;

        let mut tx = self.repo.begin().await?;
        let user = tx.get_user(user_id).await?.ok_or(AppError::AuthRequired)?;

        // A symbol this user has never bought has no holding row either.
        let Some(symbol) = tx.get_symbol(&ticker).await? else {
            return Err(AppError::InsufficientShares {
                ticker,
                held: 0,
                requested: shares,
            });
        };
        let held = tx.get_holding_amount(user_id, symbol.id).await?;
        if shares > held {
            return Err(AppError::InsufficientShares {
                ticker,
                held,
                requested: shares,
            });
        }

        let new_balance = user
            .cash_cents
            .checked_add(total)
            .ok_or(AppError::Overflow)?;
        tx.update_cash(user_id, new_balance).await?;
        tx.append_trade(user_id, symbol.id, -shares, quote.price_cents, Utc::now())
            .await?;
        tx.upsert_holding_amount(user_id, symbol.id, held - shares)
            .await?;
        tx.commit().await?;

        info!(%user_id, %ticker, shares, price_cents = quote.price_cents, "sell");
        Ok(TradeReceipt {
            ticker,
            kind: TradeKind::Sold,
            shares,
            price_cents: quote.price_cents,
            total_cents: total,
            cash_cents: new_balance,
        })
    }

    // ========================
    // Reporting
    // ========================

    /// Value the account: cash plus every positive holding at its current
    /// quote. Holdings whose quote fails are listed unpriced and excluded
    /// from the totals.
    pub async fn portfolio(&self, user_id: UserId) -> Result<PortfolioReport, AppError> {
        let user = self.current_user(user_id).await?;
        let holdings = self.repo.list_holdings(user_id, true).await?;

        let mut positions = Vec::with_capacity(holdings.len());
        let mut holdings_worth: Cents = 0;
        for holding in holdings {
            let price_cents = self
                .quotes
                .lookup(&holding.ticker)
                .await
                .map(|q| q.price_cents);
            let worth_cents = price_cents.and_then(|p| p.checked_mul(holding.amount));
            if let Some(worth) = worth_cents {
                holdings_worth = holdings_worth.saturating_add(worth);
            }
            positions.push(Position {
                ticker: holding.ticker,
                shares: holding.amount,
                price_cents,
                worth_cents,
            });
        }

        let total_worth = user.cash_cents.saturating_add(holdings_worth);
        let deposited = self.repo.sum_cash_transactions(user_id).await?;

        Ok(PortfolioReport {
            username: user.username,
            cash_cents: user.cash_cents,
            positions,
            holdings_worth_cents: holdings_worth,
            total_worth_cents: total_worth,
            gain_cents: total_worth - deposited,
        })
    }

    /// Trade and cash history, newest first, with ranks and running
    /// totals assigned over ascending time order.
    pub async fn history(&self, user_id: UserId) -> Result<HistoryReport, AppError> {
        let trades = self.repo.list_trade_activity(user_id).await?;
        let cash = self.repo.list_cash_activity(user_id).await?;
        Ok(HistoryReport { trades, cash })
    }

    /// Replay the account's append-only logs and compare against its
    /// stored balances.
    pub async fn check_integrity(&self, user_id: UserId) -> Result<IntegrityReport, AppError> {
        let user = self.current_user(user_id).await?;
        let holdings = self.repo.list_holdings(user_id, false).await?;
        let transactions = self.repo.list_cash_transactions(user_id).await?;
        let trades = self.repo.list_trades(user_id).await?;
        Ok(build_integrity_report(&user, &holdings, &transactions, &trades))
    }
}
