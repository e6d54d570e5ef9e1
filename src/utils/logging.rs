//! 로깅 유틸리티
//!
//! 로거 초기화와 주문 이벤트 로깅 핸들 제공

use env_logger::Builder;

use crate::error::TradingError;
use crate::models::order::OrderRequest;
use crate::models::response::OrderResponse;

/// 기본 로그 타깃
pub const DEFAULT_TARGET: &str = "xquant::orders";

/// 로깅 시스템 초기화. 프로세스당 한 번만 호출
///
/// `RUST_LOG`가 설정되어 있으면 `level` 위에 덧씌워진다.
pub fn init(level: &str) -> Result<(), TradingError> {
    let mut builder = Builder::new();
    builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| TradingError::ConfigError(format!("logger already initialized: {}", e)))?;

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", level);

    Ok(())
}

/// 주문 이벤트 로깅 핸들
///
/// 거래소 클라이언트 생성 시 주입된다. 복제 비용이 작다.
#[derive(Debug, Clone)]
pub struct OrderLog {
    target: &'static str,
}

impl Default for OrderLog {
    fn default() -> Self {
        OrderLog { target: DEFAULT_TARGET }
    }
}

impl OrderLog {
    pub fn new(target: &'static str) -> Self {
        OrderLog { target }
    }

    /// 전략 시작 로그
    pub fn strategy_start(&self, strategy: &str, symbol: &str) {
        log::info!(target: self.target, "strategy started strategy={} symbol={}", strategy, symbol);
    }

    /// 전략 종료 로그
    pub fn strategy_end(&self, strategy: &str, symbol: &str, outcome: &str) {
        log::info!(
            target: self.target,
            "strategy finished strategy={} symbol={} outcome={}",
            strategy,
            symbol,
            outcome
        );
    }

    /// 주문 제출 로그
    pub fn order_submitted(&self, order: &OrderRequest, dry_run: bool) {
        log::info!(
            target: self.target,
            "placing order symbol={} side={} type={} quantity={} price={} stop_price={} dry_run={}",
            order.symbol,
            order.side,
            order.order_type,
            order.quantity,
            order.price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            order.stop_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            dry_run
        );
    }

    /// 주문 응답 로그
    pub fn order_accepted(&self, response: &OrderResponse) {
        log::info!(
            target: self.target,
            "order response symbol={} side={} order_id={} status={:?} dry_run={}",
            response.request.symbol,
            response.request.side,
            response.order_id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            response.status,
            response.is_dry_run()
        );
    }

    /// 주문 실패 로그
    pub fn order_failed(&self, order: &OrderRequest, error: &TradingError) {
        log::error!(
            target: self.target,
            "order failed symbol={} side={} type={} error={}",
            order.symbol,
            order.side,
            order.order_type,
            error
        );
    }

    /// 검증 실패 로그
    pub fn validation_failed(&self, context: &str, error: &TradingError) {
        log::error!(target: self.target, "validation error context={} error={}", context, error);
    }

    pub fn twap_slice(&self, index: usize, total: usize, quantity: &rust_decimal::Decimal) {
        log::info!(target: self.target, "TWAP slice {}/{} slice_qty={}", index, total, quantity);
    }

    /// TWAP 중단 로그
    pub fn twap_aborted(&self, index: usize, total: usize, error: &TradingError) {
        log::error!(target: self.target, "TWAP aborted slice={}/{} error={}", index, total, error);
    }

    /// 서명된 요청 전송 직전
    pub fn request_sent(&self, path: &str, symbol: &str, client_order_id: &str) {
        log::debug!(target: self.target, "POST {} symbol={} client_order_id={}", path, symbol, client_order_id);
    }

    /// 거래소가 요청과 다른 값을 돌려준 경우
    pub fn ack_mismatch(&self, field: &str, echoed: &str, requested: &str) {
        log::warn!(
            target: self.target,
            "venue echoed {}={} for requested {}",
            field,
            echoed,
            requested
        );
    }

    pub fn note(&self, message: &str) {
        log::info!(target: self.target, "{}", message);
    }
}
