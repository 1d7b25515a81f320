use super::{CashTransaction, Cents, Holding, SymbolId, TradeRecord, User};

/// Cash balance implied by a user's cash transaction log alone
/// (deposits and withdrawals, signup grant included).
pub fn replay_cash_balance(transactions: &[CashTransaction]) -> Cents {
    transactions.iter().map(|t| t.amount_cents).sum()
}

/// Net cash movement caused by a list of trades: buys drain cash,
/// sells return it.
pub fn trade_cash_flow(trades: &[TradeRecord]) -> Cents {
    trades.iter().map(|t| t.cash_flow_cents()).sum()
}

/// Share count implied by replaying the trade deltas for one symbol.
pub fn replay_holding(symbol_id: SymbolId, trades: &[TradeRecord]) -> i64 {
    trades
        .iter()
        .filter(|t| t.symbol_id == symbol_id)
        .map(|t| t.delta)
        .sum()
}

/// Running totals over a cash transaction log in ascending time order.
pub fn running_totals(transactions: &[CashTransaction]) -> Vec<Cents> {
    transactions
        .iter()
        .scan(0, |total, t| {
            *total += t.amount_cents;
            Some(*total)
        })
        .collect()
}

/// Result of replaying a user's append-only logs against their stored
/// balances. Everything here must line up; a mismatch means a mutation
/// escaped its transaction.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub username: String,
    pub stored_cash_cents: Cents,
    pub replayed_cash_cents: Cents,
    pub cash_consistent: bool,
    pub positions: Vec<PositionCheck>,
}

#[derive(Debug, Clone)]
pub struct PositionCheck {
    pub ticker: String,
    pub stored_amount: i64,
    pub replayed_amount: i64,
    pub consistent: bool,
    pub negative: bool,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.cash_consistent
            && self
                .positions
                .iter()
                .all(|p| p.consistent && !p.negative)
    }
}

/// Replay the transaction and trade logs and compare against the stored
/// cash balance and holding amounts.
pub fn build_integrity_report(
    user: &User,
    holdings: &[Holding],
    transactions: &[CashTransaction],
    trades: &[TradeRecord],
) -> IntegrityReport {
    let replayed_cash = replay_cash_balance(transactions) + trade_cash_flow(trades);

    let positions = holdings
        .iter()
        .map(|holding| {
            let replayed = replay_holding(holding.symbol_id, trades);
            PositionCheck {
                ticker: holding.ticker.clone(),
                stored_amount: holding.amount,
                replayed_amount: replayed,
                consistent: holding.amount == replayed,
                negative: holding.amount < 0,
            }
        })
        .collect();

    IntegrityReport {
        username: user.username.clone(),
        stored_cash_cents: user.cash_cents,
        replayed_cash_cents: replayed_cash,
        cash_consistent: user.cash_cents == replayed_cash,
        positions,
    }
}
