pub mod binance_futures;
pub mod client;
pub mod dry_run;
pub mod mocks;
pub mod traits;

pub use binance_futures::BinanceFuturesExchange;
pub use client::ExchangeClient;
pub use dry_run::DryRunExchange;
pub use mocks::{ScriptedExchange, ScriptedFailure};
pub use traits::Exchange;
