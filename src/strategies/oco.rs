//! 익절/손절 쌍 주문 (OCO 모사)
//!
//! 선물 시장에는 단일 OCO 엔드포인트가 없다. 익절 지정가 주문을 먼저 넣고,
//! 손절 STOP 주문은 요청만 구성해 결과로 돌려준다. 한쪽 체결 시 반대쪽을
//! 취소하는 감시는 호출자 몫이다.

use rust_decimal::Decimal;

use crate::error::TradingError;
use crate::exchange::client::ExchangeClient;
use crate::models::order::{OrderRequest, OrderSide, TimeInForce};
use crate::models::strategy_result::{Monitoring, OcoResult, StopLeg};
use crate::order_core::validator::validate_order_input;

/// 체결 감시 미구현 안내
pub const MONITORING_NOTE: &str = "cancel-on-fill is not implemented: subscribe to ORDER_TRADE_UPDATE on the \
user data stream or poll order status, and cancel the counterpart leg when one fills";

/// 익절 + 손절 주문 배치
///
/// 모든 가격과 수량은 제출 전에 검증된다. 익절 주문이 실패하면 손절 주문은
/// 구성하지 않고 오류를 그대로 전달한다.
pub async fn place_oco(
    client: &ExchangeClient,
    symbol: &str,
    side: OrderSide,
    quantity: Decimal,
    take_profit_price: Decimal,
    stop_price: Decimal,
    stop_limit_price: Decimal,
) -> Result<OcoResult, TradingError> {
    let log = client.log();

    let prices = [take_profit_price, stop_price, stop_limit_price];
    if let Err(e) = validate_order_input(symbol, quantity, &prices, client.validator().max_quantity()) {
        log.validation_failed("oco", &e);
        return Err(e);
    }

    log.strategy_start("oco", symbol);

    // 포지션 청산 방향
    let exit_side = side.inverse();

    let take_profit = match client
        .place_limit_order(symbol, exit_side, quantity, take_profit_price, TimeInForce::Gtc)
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            log.strategy_end("oco", symbol, "take-profit failed");
            return Err(e);
        }
    };

    let stop_request = OrderRequest::stop(symbol, exit_side, quantity, stop_price, stop_limit_price);
    let info = format!(
        "Conceptual: create STOP or STOP_MARKET order with stopPrice={} and price={}",
        stop_price, stop_limit_price
    );
    log.note(&format!("stop leg not submitted symbol={} {}", symbol, info));
    log.note("monitoring orders is not implemented; counterpart cancellation is left to the caller");
    log.strategy_end("oco", symbol, "take-profit placed");

    Ok(OcoResult {
        take_profit,
        stop_leg: StopLeg::Conceptual { request: stop_request, info },
        monitoring: Monitoring::NotImplemented { note: MONITORING_NOTE.to_string() },
    })
}
