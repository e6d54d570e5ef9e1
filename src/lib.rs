//! 선물 주문 실행 라이브러리
//!
//! Binance USDT-M 선물에 지정가, 시장가, 익절/손절 쌍 주문과 TWAP 분할 주문을
//! 제출합니다. API 키가 없으면 항상 dry-run으로 동작합니다.

pub mod config;
pub mod error;
pub mod exchange;
pub mod models;
pub mod order_core;
pub mod strategies;
pub mod utils;

// 핵심 타입 재노출
pub use crate::config::{ClientConfig, Settings};
pub use crate::error::TradingError;
pub use crate::exchange::{Exchange, ExchangeClient};
pub use crate::models::order::{OrderRequest, OrderSide, OrderStatus, OrderType, TimeInForce};
pub use crate::models::response::{Execution, OrderResponse};
pub use crate::models::strategy_result::{OcoResult, StrategyResult, TwapReport};

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, TradingError>;
