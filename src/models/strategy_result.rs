use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::{OrderRequest, OrderSide};
use crate::models::response::OrderResponse;

/// 전략 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyResult {
    Single(OrderResponse),
    Oco(OcoResult),
    Twap(TwapReport),
}

/// 손절 주문 다리. 현재는 요청만 구성하고 제출하지 않음
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopLeg {
    Conceptual { request: OrderRequest, info: String },
}

impl StopLeg {
    pub fn request(&self) -> &OrderRequest {
        match self {
            StopLeg::Conceptual { request, .. } => request,
        }
    }

    pub fn order_id(&self) -> Option<u64> {
        match self {
            StopLeg::Conceptual { .. } => None,
        }
    }
}

/// 체결 감시 후 반대 주문 취소 기능의 상태
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Monitoring {
    NotImplemented { note: String },
}

/// 익절/손절 쌍 주문 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcoResult {
    pub take_profit: OrderResponse,
    pub stop_leg: StopLeg,
    pub monitoring: Monitoring,
}

impl OcoResult {
    /// Venue ids of (take-profit, stop) legs, for an external monitor to cancel the counterpart.
    pub fn counterpart_ids(&self) -> (Option<u64>, Option<u64>) {
        (self.take_profit.order_id(), self.stop_leg.order_id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwapSlice {
    /// 1부터 시작
    pub index: usize,
    pub quantity: Decimal,
    pub response: OrderResponse,
}

/// TWAP 실행 보고서
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwapReport {
    pub symbol: String,
    pub side: OrderSide,
    pub total_quantity: Decimal,
    pub slice_quantity: Decimal,
    pub total_slices: usize,
    pub slices: Vec<TwapSlice>,
}

impl TwapReport {
    pub fn executed_quantity(&self) -> Decimal {
        self.slices.iter().map(|s| s.quantity).sum()
    }

    pub fn responses(&self) -> impl Iterator<Item = &OrderResponse> {
        self.slices.iter().map(|s| &s.response)
    }
}
