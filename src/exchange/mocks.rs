use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::TradingError;
use crate::exchange::dry_run::DryRunExchange;
use crate::exchange::traits::Exchange;
use crate::models::order::OrderRequest;
use crate::models::response::OrderResponse;

/// How a scripted submission should fail
#[derive(Debug, Clone)]
pub enum ScriptedFailure {
    Rejected { code: i64, reason: String },
    Network(String),
}

impl ScriptedFailure {
    fn to_error(&self) -> TradingError {
        match self {
            ScriptedFailure::Rejected { code, reason } => TradingError::OrderRejected {
                code: Some(*code),
                reason: reason.clone(),
            },
            ScriptedFailure::Network(msg) => TradingError::NetworkError(msg.clone()),
        }
    }
}

/// A scripted exchange for tests and demos.
///
/// Answers like [`DryRunExchange`], records every submitted request with the
/// instant it arrived, and fails the n-th submission (1-based) when asked to.
#[derive(Default)]
pub struct ScriptedExchange {
    inner: DryRunExchange,
    fail_at: Option<(usize, ScriptedFailure)>,
    submitted: Mutex<Vec<(Instant, OrderRequest)>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th submission (1-based). Later calls succeed again.
    pub fn failing_at(call: usize, failure: ScriptedFailure) -> Self {
        ScriptedExchange {
            fail_at: Some((call, failure)),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.lock().iter().map(|(_, order)| order.clone()).collect()
    }

    pub fn submission_times(&self) -> Vec<Instant> {
        self.lock().iter().map(|(at, _)| *at).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Instant, OrderRequest)>> {
        // a panicking test thread must not hide the recorded calls
        self.submitted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Exchange for ScriptedExchange {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, TradingError> {
        let call = {
            let mut submitted = self.lock();
            submitted.push((Instant::now(), order.clone()));
            submitted.len()
        };

        if let Some((fail_call, failure)) = &self.fail_at {
            if *fail_call == call {
                return Err(failure.to_error());
            }
        }

        self.inner.submit_order(order).await
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
