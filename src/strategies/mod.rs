//! 주문 전략
//!
//! 거래소 클라이언트 호출을 순서와 시간 간격에 맞춰 조합한다

pub mod oco;
pub mod orders;
pub mod twap;

// 핵심 전략 재노출
pub use oco::place_oco;
pub use orders::{place_limit, place_market};
pub use twap::{execute_twap, execute_twap_with_cancel, TwapParams};
