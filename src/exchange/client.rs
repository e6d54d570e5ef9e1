use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::{ClientConfig, ExchangeSettings};
use crate::error::TradingError;
use crate::exchange::binance_futures::BinanceFuturesExchange;
use crate::exchange::dry_run::DryRunExchange;
use crate::exchange::traits::Exchange;
use crate::models::order::{OrderRequest, OrderSide, TimeInForce};
use crate::models::response::OrderResponse;
use crate::order_core::validator::{BasicOrderValidator, OrderValidator};
use crate::utils::logging::OrderLog;

/// Order entry point used by the strategies.
///
/// Validates every request before it reaches the connector, then logs the
/// submission and its outcome through the injected [`OrderLog`].
#[derive(Clone)]
pub struct ExchangeClient {
  exchange: Arc<dyn Exchange>,
  validator: BasicOrderValidator,
  log: OrderLog,
}

impl ExchangeClient {
  /// Pick the live or dry-run connector from the resolved configuration.
  pub fn from_config(config: &ClientConfig, settings: &ExchangeSettings, log: OrderLog) -> Result<Self, TradingError> {
    let exchange: Arc<dyn Exchange> = match config.credentials() {
      Some((key, secret)) => Arc::new(BinanceFuturesExchange::new(settings, key.clone(), secret.clone(), log.clone())?),
      None => Arc::new(DryRunExchange::new()),
    };

    if exchange.is_dry_run() {
      log.note("dry-run mode: orders are simulated, nothing is sent to the exchange");
    }

    Ok(Self::with_exchange(exchange, BasicOrderValidator::new(settings.max_quantity), log))
  }

  pub fn with_exchange(exchange: Arc<dyn Exchange>, validator: BasicOrderValidator, log: OrderLog) -> Self {
    ExchangeClient { exchange, validator, log }
  }

  /// Dry-run client with default bounds, for demos and tests.
  pub fn dry_run() -> Self {
    Self::with_exchange(Arc::new(DryRunExchange::new()), BasicOrderValidator::default(), OrderLog::default())
  }

  pub fn is_dry_run(&self) -> bool {
    self.exchange.is_dry_run()
  }

  pub fn log(&self) -> &OrderLog {
    &self.log
  }

  pub fn validator(&self) -> &BasicOrderValidator {
    &self.validator
  }

  pub async fn place_limit_order(
    &self,
    symbol: &str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
    time_in_force: TimeInForce,
  ) -> Result<OrderResponse, TradingError> {
    self.submit(OrderRequest::limit(symbol, side, quantity, price, time_in_force)).await
  }

  pub async fn place_market_order(&self, symbol: &str, side: OrderSide, quantity: Decimal) -> Result<OrderResponse, TradingError> {
    self.submit(OrderRequest::market(symbol, side, quantity)).await
  }

  /// Validate, then send exactly one request to the connector.
  pub async fn submit(&self, order: OrderRequest) -> Result<OrderResponse, TradingError> {
    if let Err(e) = self.validator.validate(&order) {
      self.log.validation_failed(&order.symbol, &e);
      return Err(e);
    }

    self.log.order_submitted(&order, self.is_dry_run());

    match self.exchange.submit_order(&order).await {
      Ok(response) => {
        self.log.order_accepted(&response);
        Ok(response)
      }
      Err(e) => {
        self.log.order_failed(&order, &e);
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exchange::traits::MockExchange;
  use crate::models::order::OrderType;
  use rust_decimal_macros::dec;

  fn client(mock: MockExchange) -> ExchangeClient {
    ExchangeClient::with_exchange(Arc::new(mock), BasicOrderValidator::default(), OrderLog::default())
  }

  #[tokio::test]
  async fn test_validation_runs_before_dispatch() {
    let mut mock = MockExchange::new();
    mock.expect_is_dry_run().return_const(true);
    mock.expect_submit_order().never();
    let client = client(mock);

    let err = client.place_market_order("btc-usdt", OrderSide::Buy, dec!(1)).await.unwrap_err();
    assert!(matches!(err, TradingError::InvalidSymbol(_)));

    let err = client.place_market_order("BTCUSDT", OrderSide::Buy, dec!(0)).await.unwrap_err();
    assert!(matches!(err, TradingError::InvalidQuantity(_)));

    let err = client
      .place_limit_order("BTCUSDT", OrderSide::Buy, dec!(1), dec!(-5), TimeInForce::Gtc)
      .await
      .unwrap_err();
    assert!(matches!(err, TradingError::InvalidPrice(_)));
  }

  #[tokio::test]
  async fn test_rejection_is_propagated() {
    let mut mock = MockExchange::new();
    mock.expect_is_dry_run().return_const(false);
    mock.expect_submit_order().times(1).returning(|_| {
      Err(TradingError::OrderRejected { code: Some(-2019), reason: "Margin is insufficient.".into() })
    });
    let client = client(mock);

    let err = client.place_market_order("BTCUSDT", OrderSide::Sell, dec!(0.01)).await.unwrap_err();
    assert!(matches!(err, TradingError::OrderRejected { code: Some(-2019), .. }));
  }

  #[tokio::test]
  async fn test_limit_order_request_shape() {
    let mut mock = MockExchange::new();
    mock.expect_is_dry_run().return_const(true);
    mock.expect_submit_order()
      .withf(|order| {
        order.order_type == OrderType::Limit
          && order.price == Some(dec!(42000))
          && order.time_in_force == Some(TimeInForce::Ioc)
      })
      .times(1)
      .returning(|order| {
        Ok(OrderResponse {
          execution: crate::models::response::Execution::DryRun,
          request: order.clone(),
          status: crate::models::order::OrderStatus::New,
          client_order_id: None,
          transact_time: 0,
          raw: serde_json::Value::Null,
        })
      });
    let client = client(mock);

    let resp = client
      .place_limit_order("BTCUSDT", OrderSide::Buy, dec!(0.001), dec!(42000), TimeInForce::Ioc)
      .await
      .unwrap();
    assert_eq!(resp.request.side, OrderSide::Buy);
  }

  #[tokio::test]
  async fn test_missing_credentials_select_dry_run() {
    let config = ClientConfig::new(None, None, false);
    let client = ExchangeClient::from_config(&config, &ExchangeSettings::default(), OrderLog::default()).unwrap();
    assert!(client.is_dry_run());

    let resp = client.place_market_order("BTCUSDT", OrderSide::Buy, dec!(0.001)).await.unwrap();
    assert!(resp.is_dry_run());
  }

  #[test]
  fn test_credentials_select_live_connector() {
    let config = ClientConfig::new(Some("key".into()), Some("secret".into()), false);
    let client = ExchangeClient::from_config(&config, &ExchangeSettings::default(), OrderLog::default()).unwrap();
    assert!(!client.is_dry_run());

    let forced = ClientConfig::new(Some("key".into()), Some("secret".into()), true);
    let client = ExchangeClient::from_config(&forced, &ExchangeSettings::default(), OrderLog::default()).unwrap();
    assert!(client.is_dry_run());
  }

  #[tokio::test]
  async fn test_configured_max_quantity() {
    let settings = ExchangeSettings { max_quantity: dec!(1), ..ExchangeSettings::default() };
    let client = ExchangeClient::from_config(&ClientConfig::simulated(), &settings, OrderLog::default()).unwrap();

    let err = client.place_market_order("BTCUSDT", OrderSide::Buy, dec!(2)).await.unwrap_err();
    assert!(matches!(err, TradingError::InvalidQuantity(_)));
  }
}
