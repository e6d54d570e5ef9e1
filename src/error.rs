/**
* filename : error
* author : HAMA
* date: 2025. 5. 8.
* description:
**/

use thiserror::Error;

use crate::models::response::OrderResponse;
use crate::models::strategy_result::TwapSlice;

#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Order rejected by exchange (code {code:?}): {reason}")]
    OrderRejected { code: Option<i64>, reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TWAP aborted at slice {failed_slice}/{total_slices} after {} completed slices: {source}", .executed.len())]
    TwapAborted {
        failed_slice: usize,
        total_slices: usize,
        executed: Vec<TwapSlice>,
        #[source]
        source: Box<TradingError>,
    },

    #[error("TWAP cancelled after {completed}/{total_slices} slices")]
    TwapCancelled {
        completed: usize,
        total_slices: usize,
        executed: Vec<TwapSlice>,
    },
}

impl TradingError {
    /// 입력 검증 실패 여부. 검증 실패는 재시도 대상이 아님
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TradingError::InvalidSymbol(_)
                | TradingError::InvalidQuantity(_)
                | TradingError::InvalidPrice(_)
                | TradingError::InvalidParameter(_)
        )
    }

    /// Slices that were already executed before a TWAP stopped early.
    pub fn partial_slices(&self) -> &[TwapSlice] {
        match self {
            TradingError::TwapAborted { executed, .. } | TradingError::TwapCancelled { executed, .. } => executed,
            _ => &[],
        }
    }

    /// Responses of the executed slices, in submission order.
    pub fn partial_responses(&self) -> Vec<&OrderResponse> {
        self.partial_slices().iter().map(|s| &s.response).collect()
    }
}
