use async_trait::async_trait;

use crate::error::TradingError;
use crate::models::order::OrderRequest;
use crate::models::response::OrderResponse;

/// The `Exchange` trait is the boundary to the trading venue.
/// It is implemented by the signed REST connector, the dry-run connector and test doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Submit one order. Implementations perform at most one outbound request and never retry.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, TradingError>;

    /// Whether responses are simulated rather than sent to the venue
    fn is_dry_run(&self) -> bool;
}
