//! 단일 주문 전략
//!
//! 지정가/시장가 주문 한 건을 제출하고 결과를 감싼다

use rust_decimal::Decimal;

use crate::error::TradingError;
use crate::exchange::client::ExchangeClient;
use crate::models::order::{OrderSide, TimeInForce};
use crate::models::strategy_result::StrategyResult;

/// 지정가 주문
pub async fn place_limit(
    client: &ExchangeClient,
    symbol: &str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
    time_in_force: TimeInForce,
) -> Result<StrategyResult, TradingError> {
    client.log().strategy_start("limit", symbol);
    let result = client.place_limit_order(symbol, side, quantity, price, time_in_force).await;
    finish(client, "limit", symbol, result.map(StrategyResult::Single))
}

/// 시장가 주문
pub async fn place_market(
    client: &ExchangeClient,
    symbol: &str,
    side: OrderSide,
    quantity: Decimal,
) -> Result<StrategyResult, TradingError> {
    client.log().strategy_start("market", symbol);
    let result = client.place_market_order(symbol, side, quantity).await;
    finish(client, "market", symbol, result.map(StrategyResult::Single))
}

fn finish(
    client: &ExchangeClient,
    strategy: &str,
    symbol: &str,
    result: Result<StrategyResult, TradingError>,
) -> Result<StrategyResult, TradingError> {
    let outcome = if result.is_ok() { "ok" } else { "failed" };
    client.log().strategy_end(strategy, symbol, outcome);
    result
}
