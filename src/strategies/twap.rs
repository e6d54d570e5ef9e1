/**
* filename : twap
* author : HAMA
* date: 2025. 5. 8.
* description: 시간 가중 평균 가격(TWAP) 분할 실행
**/

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::TradingError;
use crate::exchange::client::ExchangeClient;
use crate::models::order::OrderSide;
use crate::models::strategy_result::{TwapReport, TwapSlice};
use crate::order_core::validator::{validate_quantity_within, validate_symbol};

/// 분할 수량 소수 자릿수 (거래소 최소 수량 정밀도)
pub const SLICE_QUANTITY_SCALE: u32 = 8;

/// 분할 수량 계산. 분할마다 정확한 몫에서 반올림한다
fn round_slice(exact: Decimal) -> Decimal {
  exact.round_dp(SLICE_QUANTITY_SCALE)
}

/// TWAP 실행 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct TwapParams {
  pub symbol: String,
  pub side: OrderSide,
  pub total_quantity: Decimal,
  /// 분할 개수 (1 이상)
  pub slices: usize,
  /// 분할 사이 간격
  pub interval: Duration,
}

impl TwapParams {
  pub fn new(symbol: impl Into<String>, side: OrderSide, total_quantity: Decimal, slices: usize, interval: Duration) -> Self {
    TwapParams {
      symbol: symbol.into(),
      side,
      total_quantity,
      slices,
      interval,
    }
  }
}

/// TWAP 실행: 총 수량을 `slices`개의 동일한 시장가 주문으로 나눠 `interval` 간격으로 순차 제출
///
/// k번째 분할이 실패하면 더 이상 제출하지 않고, 완료된 k-1개 분할을
/// [`TradingError::TwapAborted`]에 담아 반환한다.
pub async fn execute_twap(client: &ExchangeClient, params: &TwapParams) -> Result<TwapReport, TradingError> {
  run(client, params, None).await
}

/// 취소 가능한 TWAP 실행. 분할 사이 대기 중 `cancel`에 `true`가 오면 중단
pub async fn execute_twap_with_cancel(
  client: &ExchangeClient,
  params: &TwapParams,
  cancel: watch::Receiver<bool>,
) -> Result<TwapReport, TradingError> {
  run(client, params, Some(cancel)).await
}

async fn run(
  client: &ExchangeClient,
  params: &TwapParams,
  mut cancel: Option<watch::Receiver<bool>>,
) -> Result<TwapReport, TradingError> {
  let log = client.log();
  let symbol = params.symbol.as_str();
  let (side, slices, interval) = (params.side, params.slices, params.interval);

  let exact = match check_params(client, params) {
    Ok(exact) => exact,
    Err(e) => {
      log.validation_failed("twap", &e);
      return Err(e);
    }
  };

  log.strategy_start("twap", symbol);

  let start = Instant::now();
  let mut executed: Vec<TwapSlice> = Vec::with_capacity(slices);

  for index in 1..=slices {
    // i번째 분할은 start + (i-1) * interval 이전에 제출되지 않는다
    let due = start + interval * (index - 1) as u32;

    if wait_for_slot(due, cancel.as_mut()).await {
      log.strategy_end("twap", symbol, "cancelled");
      return Err(TradingError::TwapCancelled {
        completed: executed.len(),
        total_slices: slices,
        executed,
      });
    }

    let quantity = round_slice(exact);
    log.twap_slice(index, slices, &quantity);

    match client.place_market_order(symbol, side, quantity).await {
      Ok(response) => executed.push(TwapSlice { index, quantity, response }),
      Err(e) => {
        log.twap_aborted(index, slices, &e);
        log.strategy_end("twap", symbol, "aborted");
        return Err(TradingError::TwapAborted {
          failed_slice: index,
          total_slices: slices,
          executed,
          source: Box::new(e),
        });
      }
    }
  }

  log.strategy_end("twap", symbol, "completed");

  Ok(TwapReport {
    symbol: symbol.to_string(),
    side,
    total_quantity: params.total_quantity,
    slice_quantity: round_slice(exact),
    total_slices: slices,
    slices: executed,
  })
}

/// 제출 전 파라미터 검증. 정확한 분할 몫을 반환
fn check_params(client: &ExchangeClient, params: &TwapParams) -> Result<Decimal, TradingError> {
  let (total_quantity, slices, interval) = (params.total_quantity, params.slices, params.interval);

  validate_symbol(&params.symbol)?;
  validate_quantity_within(total_quantity, client.validator().max_quantity())?;

  if slices == 0 {
    return Err(TradingError::InvalidParameter("slice count must be at least 1".to_string()));
  }

  // 마지막 분할 시각이 표현 가능한 범위인지
  let schedule = u32::try_from(slices - 1)
    .ok()
    .and_then(|n| interval.checked_mul(n))
    .and_then(|span| Instant::now().checked_add(span));
  if schedule.is_none() {
    return Err(TradingError::InvalidParameter(format!(
      "{} slices every {:?} cannot be scheduled",
      slices, interval
    )));
  }

  let exact = total_quantity / Decimal::from(slices);
  if round_slice(exact) <= Decimal::ZERO {
    return Err(TradingError::InvalidQuantity(format!(
      "total quantity {} split into {} slices rounds to zero at {} decimal places",
      total_quantity, slices, SLICE_QUANTITY_SCALE
    )));
  }

  Ok(exact)
}

/// 다음 분할 시각까지 대기. 취소되면 true
async fn wait_for_slot(due: Instant, cancel: Option<&mut watch::Receiver<bool>>) -> bool {
  if Instant::now() >= due {
    return cancel.map(|rx| *rx.borrow()).unwrap_or(false);
  }

  match cancel {
    None => {
      sleep_until(due).await;
      false
    }
    Some(rx) => {
      if *rx.borrow() {
        return true;
      }
      tokio::select! {
        biased;
        _ = cancelled(rx) => true,
        _ = sleep_until(due) => false,
      }
    }
  }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
  loop {
    if rx.changed().await.is_err() {
      // 송신자가 사라지면 취소는 더 이상 오지 않음
      std::future::pending::<()>().await;
    }
    if *rx.borrow() {
      return;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exchange::traits::MockExchange;
  use crate::models::order::OrderType;
  use crate::models::response::{Execution, OrderResponse};
  use crate::order_core::validator::BasicOrderValidator;
  use crate::utils::logging::OrderLog;
  use mockall::Sequence;
  use rust_decimal_macros::dec;
  use std::sync::Arc;

  fn ok_response(order: &crate::models::order::OrderRequest) -> Result<OrderResponse, TradingError> {
    Ok(OrderResponse {
      execution: Execution::DryRun,
      request: order.clone(),
      status: crate::models::order::OrderStatus::New,
      client_order_id: None,
      transact_time: 0,
      raw: serde_json::Value::Null,
    })
  }

  #[tokio::test]
  async fn test_twap_dry_run_example() {
    let client = ExchangeClient::dry_run();
    let report = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.01), 4, Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(report.slices.len(), 4);
    assert_eq!(report.slice_quantity, dec!(0.0025));
    for (i, slice) in report.slices.iter().enumerate() {
      assert_eq!(slice.index, i + 1);
      assert_eq!(slice.quantity, dec!(0.0025));
      assert_eq!(slice.response.request.side, OrderSide::Buy);
      assert_eq!(slice.response.request.symbol, "BTCUSDT");
      assert_eq!(slice.response.request.order_type, OrderType::Market);
    }
    assert_eq!(report.executed_quantity(), dec!(0.01));
  }

  #[tokio::test]
  async fn test_rounding_tolerance() {
    let client = ExchangeClient::dry_run();
    let report = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Sell, dec!(1), 3, Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(report.slice_quantity, dec!(0.33333333));
    let drift = (report.executed_quantity() - dec!(1)).abs();
    assert!(drift <= dec!(0.00000003));
  }

  #[tokio::test]
  async fn test_partial_failure_keeps_completed_slices() {
    let mut mock = MockExchange::new();
    let mut seq = Sequence::new();
    mock.expect_is_dry_run().return_const(true);
    mock.expect_submit_order().times(2).in_sequence(&mut seq).returning(ok_response);
    mock.expect_submit_order()
      .times(1)
      .in_sequence(&mut seq)
      .returning(|_| Err(TradingError::OrderRejected { code: Some(-1013), reason: "Filter failure".into() }));
    let client = ExchangeClient::with_exchange(Arc::new(mock), BasicOrderValidator::default(), OrderLog::default());

    let err = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.05), 5, Duration::ZERO))
      .await
      .unwrap_err();

    match &err {
      TradingError::TwapAborted { failed_slice, total_slices, executed, source } => {
        assert_eq!(*failed_slice, 3);
        assert_eq!(*total_slices, 5);
        assert_eq!(executed.len(), 2);
        assert_eq!(executed.last().unwrap().index, 2);
        assert!(matches!(**source, TradingError::OrderRejected { .. }));
      }
      other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.partial_responses().len(), 2);
  }

  #[tokio::test]
  async fn test_zero_slices_rejected() {
    let mut mock = MockExchange::new();
    mock.expect_is_dry_run().return_const(true);
    mock.expect_submit_order().never();
    let client = ExchangeClient::with_exchange(Arc::new(mock), BasicOrderValidator::default(), OrderLog::default());

    let err = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(1), 0, Duration::ZERO))
      .await
      .unwrap_err();
    assert!(matches!(err, TradingError::InvalidParameter(_)));
  }

  #[tokio::test]
  async fn test_slice_rounding_to_zero_rejected() {
    let mut mock = MockExchange::new();
    mock.expect_is_dry_run().return_const(true);
    mock.expect_submit_order().never();
    let client = ExchangeClient::with_exchange(Arc::new(mock), BasicOrderValidator::default(), OrderLog::default());

    let err = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.00000001), 4, Duration::ZERO))
      .await
      .unwrap_err();
    assert!(matches!(err, TradingError::InvalidQuantity(_)));
  }

  #[tokio::test(start_paused = true)]
  async fn test_slices_are_spaced() {
    let client = ExchangeClient::dry_run();
    let started = Instant::now();

    let report = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.3), 3, Duration::from_secs(60)))
      .await
      .unwrap();

    assert_eq!(report.slices.len(), 3);
    // 마지막 분할 후에는 대기하지 않음
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(120));
    assert!(elapsed < Duration::from_secs(121));
  }

  #[tokio::test(start_paused = true)]
  async fn test_single_slice_does_not_wait() {
    let client = ExchangeClient::dry_run();
    let started = Instant::now();

    let report = execute_twap(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.3), 1, Duration::from_secs(60)))
      .await
      .unwrap();

    assert_eq!(report.slices.len(), 1);
    assert_eq!(report.slices[0].quantity, dec!(0.3));
    assert_eq!(started.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel_between_slices() {
    let client = ExchangeClient::dry_run();
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn({
      let client = client.clone();
      async move {
        execute_twap_with_cancel(&client, &TwapParams::new("BTCUSDT", OrderSide::Buy, dec!(0.4), 4, Duration::from_secs(10)), rx).await
      }
    });

    tokio::time::sleep(Duration::from_secs(15)).await;
    tx.send(true).unwrap();

    let err = handle.await.unwrap().unwrap_err();
    match err {
      TradingError::TwapCancelled { completed, total_slices, executed } => {
        assert_eq!(completed, 2);
        assert_eq!(total_slices, 4);
        assert_eq!(executed.len(), 2);
      }
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_dropped_cancel_sender_runs_to_completion() {
    let client = ExchangeClient::dry_run();
    let (tx, rx) = watch::channel(false);
    drop(tx);

    let report = execute_twap_with_cancel(&client, &TwapParams::new("BTCUSDT", OrderSide::Sell, dec!(0.2), 2, Duration::ZERO), rx)
      .await
      .unwrap();
    assert_eq!(report.slices.len(), 2);
  }
}
