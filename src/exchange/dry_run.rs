use async_trait::async_trait;

use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::order::{OrderRequest, OrderStatus};
use crate::models::response::{Execution, OrderResponse};
use crate::utils::current_timestamp_ms;

/// A no-op exchange connector that answers every order without sending it
#[derive(Debug, Default, Clone)]
pub struct DryRunExchange;

impl DryRunExchange {
  pub fn new() -> Self { Self }
}

#[async_trait]
impl Exchange for DryRunExchange {
  async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, TradingError> {
    // raw payload mirrors what would have been sent, so both modes print the same fields
    let mut raw = serde_json::Map::new();
    for (key, value) in order.to_params() {
      raw.insert(key.to_string(), serde_json::Value::String(value));
    }
    raw.insert("status".to_string(), serde_json::Value::String("NEW".to_string()));
    raw.insert("dryRun".to_string(), serde_json::Value::Bool(true));

    Ok(OrderResponse {
      execution: Execution::DryRun,
      request: order.clone(),
      status: OrderStatus::New,
      client_order_id: None,
      transact_time: current_timestamp_ms(),
      raw: serde_json::Value::Object(raw),
    })
  }

  fn is_dry_run(&self) -> bool { true }
}
