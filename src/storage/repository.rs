use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    CashActivity, CashKind, CashTransaction, Cents, Holding, Symbol, SymbolId, TradeActivity,
    TradeKind, TradeRecord, User, UserId,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying the trading ledger.
///
/// The pool is capped at a single connection, so every `LedgerTx`
/// serializes against all other ledger access. That is stronger than the
/// required per-user isolation, and plenty for a single-process simulator.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Open an atomic unit of ledger writes. Dropping the returned value
    /// without committing rolls everything back.
    pub async fn begin(&self) -> Result<LedgerTx<'_>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin ledger transaction")?;
        Ok(LedgerTx { tx })
    }

    // ========================
    // User queries
    // ========================

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, hash, cash, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by username (case-sensitive).
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, hash, cash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    // ========================
    // Holding queries
    // ========================

    /// List a user's holdings, ordered by ticker. With `only_positive`,
    /// zero rows (positions sold down to nothing) are filtered out.
    pub async fn list_holdings(&self, user_id: UserId, only_positive: bool) -> Result<Vec<Holding>> {
        let query = if only_positive {
            r#"
            SELECT sb.user_id, sb.symbol_id, s.symbol, sb.amount
            FROM stock_balance sb
            JOIN symbols s ON sb.symbol_id = s.id
            WHERE sb.user_id = ? AND sb.amount > 0
            ORDER BY s.symbol
            "#
        } else {
            r#"
            SELECT sb.user_id, sb.symbol_id, s.symbol, sb.amount
            FROM stock_balance sb
            JOIN symbols s ON sb.symbol_id = s.id
            WHERE sb.user_id = ?
            ORDER BY s.symbol
            "#
        };

        let rows = sqlx::query(query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list holdings")?;

        rows.iter().map(Self::row_to_holding).collect()
    }

    // ========================
    // Log queries
    // ========================

    /// Sum of all cash transaction deltas for a user (signup grant,
    /// deposits, withdrawals).
    pub async fn sum_cash_transactions(&self, user_id: UserId) -> Result<Cents> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM cash_transactions WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum cash transactions")?;

        Ok(row.get("total"))
    }

    /// Raw trade log for a user in ascending time order.
    pub async fn list_trades(&self, user_id: UserId) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, symbol_id, amount, price, time
            FROM purchases
            WHERE user_id = ?
            ORDER BY time, rowid
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list trades")?;

        rows.iter().map(Self::row_to_trade).collect()
    }

    /// Raw cash transaction log for a user in ascending time order.
    pub async fn list_cash_transactions(&self, user_id: UserId) -> Result<Vec<CashTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, amount, time
            FROM cash_transactions
            WHERE user_id = ?
            ORDER BY time, rowid
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list cash transactions")?;

        rows.iter().map(Self::row_to_cash_transaction).collect()
    }

    /// Trade history view: newest first, zero-delta rows excluded, with a
    /// 1-based rank assigned over ascending execution time.
    pub async fn list_trade_activity(&self, user_id: UserId) -> Result<Vec<TradeActivity>> {
        let rows = sqlx::query(
            r#"
            SELECT
                RANK() OVER (ORDER BY p.time, p.rowid) AS seq,
                s.symbol AS symbol,
                p.amount AS delta,
                p.price AS price,
                p.time AS time
            FROM purchases p
            JOIN symbols s ON p.symbol_id = s.id
            WHERE p.user_id = ? AND p.amount != 0
            ORDER BY p.time DESC, p.rowid DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list trade activity")?;

        rows.iter()
            .map(|row| {
                let delta: i64 = row.get("delta");
                let kind = if delta > 0 {
                    TradeKind::Bought
                } else {
                    TradeKind::Sold
                };
                Ok(TradeActivity {
                    rank: row.get("seq"),
                    ticker: row.get("symbol"),
                    kind,
                    shares: delta.abs(),
                    price_cents: row.get("price"),
                    executed_at: Self::parse_time(&row.get::<String, _>("time"))?,
                })
            })
            .collect()
    }

    /// Cash history view: newest first, zero rows excluded, 1-based rank
    /// and running total computed over ascending time order.
    pub async fn list_cash_activity(&self, user_id: UserId) -> Result<Vec<CashActivity>> {
        let rows = sqlx::query(
            r#"
            SELECT
                RANK() OVER (ORDER BY time, rowid) AS seq,
                amount,
                SUM(amount) OVER (ORDER BY time, rowid ROWS UNBOUNDED PRECEDING) AS running_total,
                time
            FROM cash_transactions
            WHERE user_id = ? AND amount != 0
            ORDER BY time DESC, rowid DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list cash activity")?;

        rows.iter()
            .map(|row| {
                let amount: Cents = row.get("amount");
                let kind = if amount > 0 {
                    CashKind::Deposit
                } else {
                    CashKind::Withdrawal
                };
                Ok(CashActivity {
                    rank: row.get("seq"),
                    kind,
                    amount_cents: amount.abs(),
                    running_total_cents: row.get("running_total"),
                    occurred_at: Self::parse_time(&row.get::<String, _>("time"))?,
                })
            })
            .collect()
    }

    // ========================
    // Row mapping
    // ========================

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            username: row.get("username"),
            password_hash: row.get("hash"),
            cash_cents: row.get("cash"),
            created_at: Self::parse_time(&created_at_str)?,
        })
    }

    fn row_to_symbol(row: &SqliteRow) -> Result<Symbol> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Symbol {
            id: Uuid::parse_str(&id_str).context("Invalid symbol ID")?,
            ticker: row.get("symbol"),
            created_at: Self::parse_time(&created_at_str)?,
        })
    }

    fn row_to_holding(row: &SqliteRow) -> Result<Holding> {
        let user_id_str: String = row.get("user_id");
        let symbol_id_str: String = row.get("symbol_id");

        Ok(Holding {
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            symbol_id: Uuid::parse_str(&symbol_id_str).context("Invalid symbol ID")?,
            ticker: row.get("symbol"),
            amount: row.get("amount"),
        })
    }

    fn row_to_trade(row: &SqliteRow) -> Result<TradeRecord> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let symbol_id_str: String = row.get("symbol_id");
        let time_str: String = row.get("time");

        Ok(TradeRecord {
            id: Uuid::parse_str(&id_str).context("Invalid trade ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            symbol_id: Uuid::parse_str(&symbol_id_str).context("Invalid symbol ID")?,
            delta: row.get("amount"),
            price_cents: row.get("price"),
            executed_at: Self::parse_time(&time_str)?,
        })
    }

    fn row_to_cash_transaction(row: &SqliteRow) -> Result<CashTransaction> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let time_str: String = row.get("time");

        Ok(CashTransaction {
            id: Uuid::parse_str(&id_str).context("Invalid cash transaction ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            amount_cents: row.get("amount"),
            occurred_at: Self::parse_time(&time_str)?,
        })
    }

    fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(raw)
            .context("Invalid timestamp")?
            .with_timezone(&Utc))
    }
}

/// A sequence of ledger writes applied as one atomic unit.
///
/// Every mutating operation runs its read-validate-write sequence through
/// one of these, so two concurrent operations on the same user can never
/// interleave. Dropping an uncommitted `LedgerTx` rolls back.
pub struct LedgerTx<'a> {
    tx: Transaction<'a, Sqlite>,
}

impl LedgerTx<'_> {
    /// Get a user by ID, for update within this transaction.
    pub async fn get_user(&mut self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, hash, cash, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Repository::row_to_user).transpose()
    }

    /// Get a user by username (case-sensitive).
    pub async fn get_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, hash, cash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch user by username")?;

        row.as_ref().map(Repository::row_to_user).transpose()
    }

    /// Insert a new user row. The username column is UNIQUE, so a
    /// concurrent duplicate registration fails here even if it passed the
    /// caller's pre-check.
    pub async fn create_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, hash, cash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.cash_cents)
        .bind(user.created_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to create user")?;
        Ok(())
    }

    /// Overwrite a user's cached cash balance. The caller computes the new
    /// value from a read made under this same transaction.
    pub async fn update_cash(&mut self, user_id: UserId, new_balance: Cents) -> Result<()> {
        sqlx::query("UPDATE users SET cash = ? WHERE id = ?")
            .bind(new_balance)
            .bind(user_id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to update cash balance")?;
        Ok(())
    }

    /// Get a symbol row by its normalized ticker.
    pub async fn get_symbol(&mut self, ticker: &str) -> Result<Option<Symbol>> {
        let row = sqlx::query("SELECT id, symbol, created_at FROM symbols WHERE symbol = ?")
            .bind(ticker)
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch symbol")?;

        row.as_ref().map(Repository::row_to_symbol).transpose()
    }

    /// Resolve a ticker to its symbol row, creating it on first purchase.
    pub async fn get_or_create_symbol(&mut self, ticker: &str) -> Result<Symbol> {
        if let Some(symbol) = self.get_symbol(ticker).await? {
            return Ok(symbol);
        }

        let symbol = Symbol::new(ticker);
        sqlx::query("INSERT INTO symbols (id, symbol, created_at) VALUES (?, ?, ?)")
            .bind(symbol.id.to_string())
            .bind(&symbol.ticker)
            .bind(symbol.created_at.to_rfc3339())
            .execute(&mut *self.tx)
            .await
            .context("Failed to create symbol")?;
        Ok(symbol)
    }

    /// Current share count for a (user, symbol) pair; 0 when no row exists.
    pub async fn get_holding_amount(
        &mut self,
        user_id: UserId,
        symbol_id: SymbolId,
    ) -> Result<i64> {
        let row = sqlx::query(
            "SELECT amount FROM stock_balance WHERE user_id = ? AND symbol_id = ?",
        )
        .bind(user_id.to_string())
        .bind(symbol_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch holding")?;

        Ok(row.map(|r| r.get("amount")).unwrap_or(0))
    }

    /// Set the share count for a (user, symbol) pair, creating the row if
    /// absent. Rows are never deleted; zero amounts persist.
    pub async fn upsert_holding_amount(
        &mut self,
        user_id: UserId,
        symbol_id: SymbolId,
        new_amount: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_balance (user_id, symbol_id, amount)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, symbol_id) DO UPDATE SET amount = excluded.amount
            "#,
        )
        .bind(user_id.to_string())
        .bind(symbol_id.to_string())
        .bind(new_amount)
        .execute(&mut *self.tx)
        .await
        .context("Failed to upsert holding")?;
        Ok(())
    }

    /// Append one trade to the log. `delta` is signed: positive buys,
    /// negative sells.
    pub async fn append_trade(
        &mut self,
        user_id: UserId,
        symbol_id: SymbolId,
        delta: i64,
        price_cents: Cents,
        time: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO purchases (id, user_id, symbol_id, amount, price, time) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(symbol_id.to_string())
        .bind(delta)
        .bind(price_cents)
        .bind(time.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to append trade")?;
        Ok(())
    }

    /// Append one cash transaction to the log. `amount_cents` is signed:
    /// positive deposits, negative withdrawals.
    pub async fn append_cash_transaction(
        &mut self,
        user_id: UserId,
        amount_cents: Cents,
        time: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO cash_transactions (id, user_id, amount, time) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(amount_cents)
        .bind(time.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to append cash transaction")?;
        Ok(())
    }

    /// Commit every write made through this transaction.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit ledger transaction")
    }
}
