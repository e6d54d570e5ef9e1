use serde::{Deserialize, Serialize};

use crate::models::order::{OrderRequest, OrderStatus};

/// 응답 출처 태그. 모의 실행과 실거래 응답을 키 탐색 없이 구분
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Execution {
    DryRun,
    Live { order_id: u64 },
}

/// 거래소 주문 응답 (정규화)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub execution: Execution,
    pub request: OrderRequest,
    pub status: OrderStatus,
    pub client_order_id: Option<String>,
    /// 밀리초 타임스탬프
    pub transact_time: i64,
    pub raw: serde_json::Value,
}

impl OrderResponse {
    pub fn is_dry_run(&self) -> bool {
        matches!(self.execution, Execution::DryRun)
    }

    /// Venue-assigned id; `None` for simulated responses.
    pub fn order_id(&self) -> Option<u64> {
        match self.execution {
            Execution::Live { order_id } => Some(order_id),
            Execution::DryRun => None,
        }
    }
}
