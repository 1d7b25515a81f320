use thiserror::Error;

use crate::domain::Cents;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("invalid username and/or password")]
    Auth,

    #[error("login required")]
    AuthRequired,

    #[error("non-existent symbol: {0}")]
    UnknownSymbol(String),

    #[error("not enough funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("not enough shares of {ticker}: held {held}, requested {requested}")]
    InsufficientShares {
        ticker: String,
        held: i64,
        requested: i64,
    },

    #[error("cash balance would exceed the representable range")]
    Overflow,

    #[error("database error: {0}")]
    Store(#[from] anyhow::Error),
}
