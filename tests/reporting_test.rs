mod common;

use anyhow::Result;
use common::{register_user, test_service};
use papertrade::domain::{CashKind, TradeKind, SIGNUP_BONUS_CENTS};

#[tokio::test]
async fn test_portfolio_values_holdings_at_current_quotes() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 10).await?;
    service.buy(user_id, "NFLX", 2).await?;

    let report = service.portfolio(user_id).await?;
    assert_eq!(report.username, "alice");
    assert_eq!(report.cash_cents, SIGNUP_BONUS_CENTS - 150_000 - 80_000);
    assert_eq!(report.positions.len(), 2);

    // Positions come back ordered by ticker.
    assert_eq!(report.positions[0].ticker, "AAPL");
    assert_eq!(report.positions[0].shares, 10);
    assert_eq!(report.positions[0].price_cents, Some(15_000));
    assert_eq!(report.positions[0].worth_cents, Some(150_000));
    assert_eq!(report.positions[1].ticker, "NFLX");
    assert_eq!(report.positions[1].worth_cents, Some(80_000));

    assert_eq!(report.holdings_worth_cents, 230_000);
    assert_eq!(report.total_worth_cents, SIGNUP_BONUS_CENTS);
    // Trading at unchanged prices neither gains nor loses.
    assert_eq!(report.gain_cents, 0);
    Ok(())
}

#[tokio::test]
async fn test_portfolio_gain_tracks_price_moves() -> Result<()> {
    let (service, quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 10).await?;
    quotes.set("AAPL", 20_000);

    let report = service.portfolio(user_id).await?;
    assert_eq!(report.holdings_worth_cents, 200_000);
    assert_eq!(report.total_worth_cents, SIGNUP_BONUS_CENTS + 50_000);
    assert_eq!(report.gain_cents, 50_000);
    Ok(())
}

#[tokio::test]
async fn test_portfolio_gain_is_relative_to_net_deposits() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    // Moving cash in and out is not a gain or a loss.
    service.deposit(user_id, 500_000).await?;
    service.withdraw(user_id, 200_000).await?;

    let report = service.portfolio(user_id).await?;
    assert_eq!(report.cash_cents, SIGNUP_BONUS_CENTS + 300_000);
    assert_eq!(report.gain_cents, 0);
    Ok(())
}

#[tokio::test]
async fn test_portfolio_excludes_zero_positions() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 5).await?;
    service.buy(user_id, "NFLX", 1).await?;
    service.sell(user_id, "AAPL", 5).await?;

    let report = service.portfolio(user_id).await?;
    assert_eq!(report.positions.len(), 1);
    assert_eq!(report.positions[0].ticker, "NFLX");
    Ok(())
}

#[tokio::test]
async fn test_portfolio_with_unpriceable_holding() -> Result<()> {
    let (service, quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 10).await?;
    service.buy(user_id, "NFLX", 2).await?;
    quotes.remove("NFLX");

    // The NFLX position is still listed, unpriced, and left out of the
    // totals.
    let report = service.portfolio(user_id).await?;
    assert_eq!(report.positions.len(), 2);
    assert_eq!(report.positions[1].ticker, "NFLX");
    assert_eq!(report.positions[1].price_cents, None);
    assert_eq!(report.positions[1].worth_cents, None);
    assert_eq!(report.holdings_worth_cents, 150_000);
    assert_eq!(
        report.total_worth_cents,
        report.cash_cents + report.holdings_worth_cents
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_portfolio() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    let report = service.portfolio(user_id).await?;
    assert!(report.positions.is_empty());
    assert_eq!(report.holdings_worth_cents, 0);
    assert_eq!(report.total_worth_cents, SIGNUP_BONUS_CENTS);
    assert_eq!(report.gain_cents, 0);
    Ok(())
}

#[tokio::test]
async fn test_history_orders_newest_first_with_stable_ranks() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 10).await?;
    service.buy(user_id, "NFLX", 2).await?;
    service.sell(user_id, "AAPL", 4).await?;

    let history = service.history(user_id).await?;
    assert_eq!(history.trades.len(), 3);

    // Ranks count up in execution order; the listing is reversed.
    assert_eq!(history.trades[0].rank, 3);
    assert_eq!(history.trades[0].ticker, "AAPL");
    assert_eq!(history.trades[0].kind, TradeKind::Sold);
    assert_eq!(history.trades[1].rank, 2);
    assert_eq!(history.trades[1].ticker, "NFLX");
    assert_eq!(history.trades[1].kind, TradeKind::Bought);
    assert_eq!(history.trades[2].rank, 1);
    assert_eq!(history.trades[2].ticker, "AAPL");
    assert_eq!(history.trades[2].kind, TradeKind::Bought);
    Ok(())
}

#[tokio::test]
async fn test_cash_history_running_totals() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.deposit(user_id, 100_000).await?;
    service.withdraw(user_id, 40_000).await?;

    let history = service.history(user_id).await?;
    assert_eq!(history.cash.len(), 3);

    assert_eq!(history.cash[0].rank, 3);
    assert_eq!(history.cash[0].kind, CashKind::Withdrawal);
    assert_eq!(history.cash[0].amount_cents, 40_000);
    assert_eq!(
        history.cash[0].running_total_cents,
        SIGNUP_BONUS_CENTS + 60_000
    );

    assert_eq!(history.cash[1].rank, 2);
    assert_eq!(history.cash[1].kind, CashKind::Deposit);
    assert_eq!(
        history.cash[1].running_total_cents,
        SIGNUP_BONUS_CENTS + 100_000
    );

    assert_eq!(history.cash[2].rank, 1);
    assert_eq!(history.cash[2].running_total_cents, SIGNUP_BONUS_CENTS);
    Ok(())
}

#[tokio::test]
async fn test_cash_history_ignores_trades() -> Result<()> {
    let (service, _quotes, _temp) = test_service().await?;
    let user_id = register_user(&service, "alice").await?;

    service.buy(user_id, "AAPL", 10).await?;

    // Trades change cash but are not cash transactions.
    let history = service.history(user_id).await?;
    assert_eq!(history.cash.len(), 1);
    assert_eq!(history.cash[0].running_total_cents, SIGNUP_BONUS_CENTS);
    Ok(())
}
