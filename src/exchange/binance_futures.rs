use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

use crate::config::{ExchangeSettings, Secret};
use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::order::{OrderRequest, OrderStatus};
use crate::models::response::{Execution, OrderResponse};
use crate::utils::current_timestamp_ms;
use crate::utils::logging::OrderLog;

type HmacSha256 = Hmac<Sha256>;

const ORDER_PATH: &str = "/fapi/v1/order";

/// Binance USDT-M Futures REST connector (order placement only)
pub struct BinanceFuturesExchange {
  base_url: String,
  api_key: Secret,
  api_secret: Secret,
  recv_window_ms: u64,
  http: reqwest::Client,
  log: OrderLog,
}

/// Acknowledgement body returned by `POST /fapi/v1/order`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAck {
  order_id: u64,
  client_order_id: Option<String>,
  status: OrderStatus,
  symbol: String,
  #[serde(default)]
  update_time: Option<i64>,
  #[serde(default)]
  orig_qty: Option<Decimal>,
}

/// Error body, e.g. `{"code":-2019,"msg":"Margin is insufficient."}`
#[derive(Debug, Deserialize)]
struct ApiError {
  code: i64,
  msg: String,
}

impl BinanceFuturesExchange {
  pub fn new(settings: &ExchangeSettings, api_key: Secret, api_secret: Secret, log: OrderLog) -> Result<Self, TradingError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(settings.timeout_ms))
      .build()
      .map_err(|e| TradingError::ConfigError(format!("failed to build http client: {}", e)))?;

    Ok(BinanceFuturesExchange {
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      api_key,
      api_secret,
      recv_window_ms: settings.recv_window_ms,
      http,
      log,
    })
  }

  pub(crate) fn sign(secret: &str, query: &str) -> Result<String, TradingError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
      .map_err(|e| TradingError::ConfigError(format!("invalid api secret: {}", e)))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
  }

  /// Canonical query string for an order. The timestamp must be fresh for every request.
  pub(crate) fn build_query(order: &OrderRequest, client_order_id: &str, recv_window_ms: u64, timestamp: i64) -> String {
    let mut params = order.to_params();
    params.push(("newClientOrderId", client_order_id.to_string()));
    params.push(("newOrderRespType", "RESULT".to_string()));
    params.push(("recvWindow", recv_window_ms.to_string()));
    params.push(("timestamp", timestamp.to_string()));

    params
      .iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect::<Vec<_>>()
      .join("&")
  }

  /// Decode a 2xx body. The venue accepted the order, so echo mismatches are only logged.
  pub(crate) fn parse_ack(order: &OrderRequest, body: &str, log: &OrderLog) -> Result<OrderResponse, TradingError> {
    let raw: serde_json::Value = serde_json::from_str(body)
      .map_err(|e| TradingError::ParseError(format!("order response is not json: {}", e)))?;
    let ack: OrderAck = serde_json::from_value(raw.clone())
      .map_err(|e| TradingError::ParseError(format!("unexpected order response: {}", e)))?;

    if ack.symbol != order.symbol {
      log.ack_mismatch("symbol", &ack.symbol, &order.symbol);
    }
    if let Some(qty) = ack.orig_qty {
      if qty != order.quantity {
        log.ack_mismatch("origQty", &qty.to_string(), &order.quantity.to_string());
      }
    }

    Ok(OrderResponse {
      execution: Execution::Live { order_id: ack.order_id },
      request: order.clone(),
      status: ack.status,
      client_order_id: ack.client_order_id,
      transact_time: ack.update_time.unwrap_or_else(current_timestamp_ms),
      raw,
    })
  }

  pub(crate) fn parse_rejection(status: reqwest::StatusCode, body: &str) -> TradingError {
    match serde_json::from_str::<ApiError>(body) {
      Ok(err) => TradingError::OrderRejected { code: Some(err.code), reason: err.msg },
      Err(_) => TradingError::OrderRejected { code: None, reason: format!("HTTP {}: {}", status, body) },
    }
  }
}

#[async_trait]
impl Exchange for BinanceFuturesExchange {
  async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, TradingError> {
    let client_order_id = format!("xq-{}", uuid::Uuid::new_v4().simple());
    let query = Self::build_query(order, &client_order_id, self.recv_window_ms, current_timestamp_ms());
    let signature = Self::sign(self.api_secret.expose(), &query)?;
    let url = format!("{}{}?{}&signature={}", self.base_url, ORDER_PATH, query, signature);

    self.log.request_sent(ORDER_PATH, &order.symbol, &client_order_id);

    let res = self.http
      .post(url)
      .header("X-MBX-APIKEY", self.api_key.expose())
      .send().await
      .map_err(|e| TradingError::NetworkError(format!("submit_order http error: {}", e)))?;

    let status = res.status();
    let body = res.text().await
      .map_err(|e| TradingError::NetworkError(format!("submit_order body error: {}", e)))?;

    if !status.is_success() {
      return Err(Self::parse_rejection(status, &body));
    }

    Self::parse_ack(order, &body, &self.log)
  }

  fn is_dry_run(&self) -> bool {
    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::order::{OrderSide, TimeInForce};
  use rust_decimal_macros::dec;

  #[test]
  fn test_signature_matches_venue_example() {
    let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
    let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
    assert_eq!(
      BinanceFuturesExchange::sign(secret, query).unwrap(),
      "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
    );
  }

  #[test]
  fn test_signature_changes_with_timestamp() {
    let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.001));
    let q1 = BinanceFuturesExchange::build_query(&order, "xq-1", 5000, 1_000);
    let q2 = BinanceFuturesExchange::build_query(&order, "xq-1", 5000, 1_001);
    assert_ne!(
      BinanceFuturesExchange::sign("secret", &q1).unwrap(),
      BinanceFuturesExchange::sign("secret", &q2).unwrap()
    );
  }

  #[test]
  fn test_build_query() {
    let order = OrderRequest::limit("BTCUSDT", OrderSide::Sell, dec!(0.001), dec!(43000), TimeInForce::Gtc);
    let query = BinanceFuturesExchange::build_query(&order, "xq-abc", 5000, 1499827319559);
    assert_eq!(
      query,
      "symbol=BTCUSDT&side=SELL&type=LIMIT&quantity=0.001&price=43000&timeInForce=GTC\
       &newClientOrderId=xq-abc&newOrderRespType=RESULT&recvWindow=5000&timestamp=1499827319559"
    );
  }

  #[test]
  fn test_parse_ack() {
    let order = OrderRequest::limit("BTCUSDT", OrderSide::Sell, dec!(0.001), dec!(43000), TimeInForce::Gtc);
    let body = r#"{"orderId":22542179,"symbol":"BTCUSDT","status":"NEW","clientOrderId":"xq-abc",
      "price":"43000","avgPrice":"0.00","origQty":"0.001","executedQty":"0","side":"SELL",
      "type":"LIMIT","timeInForce":"GTC","updateTime":1566818724722}"#;

    let resp = BinanceFuturesExchange::parse_ack(&order, body, &OrderLog::default()).unwrap();
    assert_eq!(resp.order_id(), Some(22542179));
    assert!(!resp.is_dry_run());
    assert_eq!(resp.status, OrderStatus::New);
    assert_eq!(resp.client_order_id.as_deref(), Some("xq-abc"));
    assert_eq!(resp.transact_time, 1566818724722);
    assert_eq!(resp.raw["side"], "SELL");
  }

  #[test]
  fn test_parse_ack_rejects_garbage() {
    let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.001));
    let log = OrderLog::default();
    assert!(matches!(
      BinanceFuturesExchange::parse_ack(&order, "<html>", &log),
      Err(TradingError::ParseError(_))
    ));
    assert!(matches!(
      BinanceFuturesExchange::parse_ack(&order, r#"{"symbol":"BTCUSDT","status":"NEW"}"#, &log),
      Err(TradingError::ParseError(_))
    ));
  }

  #[test]
  fn test_accepted_order_with_mismatched_echo_stays_live() {
    let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.001));
    let body = r#"{"orderId":77,"symbol":"ETHUSDT","status":"FILLED","origQty":"0.002","updateTime":1}"#;

    let resp = BinanceFuturesExchange::parse_ack(&order, body, &OrderLog::default()).unwrap();
    assert_eq!(resp.order_id(), Some(77));
    assert_eq!(resp.status, OrderStatus::Filled);
    assert_eq!(resp.request, order);
    assert_eq!(resp.raw["symbol"], "ETHUSDT");
  }

  #[test]
  fn test_parse_rejection() {
    let err = BinanceFuturesExchange::parse_rejection(
      reqwest::StatusCode::BAD_REQUEST,
      r#"{"code":-2019,"msg":"Margin is insufficient."}"#,
    );
    match err {
      TradingError::OrderRejected { code, reason } => {
        assert_eq!(code, Some(-2019));
        assert_eq!(reason, "Margin is insufficient.");
      }
      other => panic!("unexpected error: {:?}", other),
    }

    let err = BinanceFuturesExchange::parse_rejection(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
    assert!(matches!(err, TradingError::OrderRejected { code: None, .. }));
  }

  #[tokio::test]
  async fn test_unreachable_venue_is_network_error() {
    let settings = ExchangeSettings {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout_ms: 500,
      ..ExchangeSettings::default()
    };
    let exchange =
      BinanceFuturesExchange::new(&settings, Secret::new("key"), Secret::new("secret"), OrderLog::default()).unwrap();
    let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.001));

    let result = exchange.submit_order(&order).await;
    assert!(matches!(result, Err(TradingError::NetworkError(_))));
    assert!(!exchange.is_dry_run());
  }
}
