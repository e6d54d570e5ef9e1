/**
* filename : main
* author : HAMA
* date: 2025. 5. 8.
* description: 주문 CLI (limit / market / oco / twap)
**/

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Duration;

use xquant_futures::config::{ClientConfig, Settings};
use xquant_futures::error::TradingError;
use xquant_futures::exchange::ExchangeClient;
use xquant_futures::models::order::{OrderSide, TimeInForce};
use xquant_futures::models::strategy_result::StrategyResult;
use xquant_futures::order_core::validate_order_input;
use xquant_futures::strategies::{execute_twap_with_cancel, place_limit, place_market, place_oco, TwapParams};
use xquant_futures::utils::logging::{self, OrderLog};
use xquant_futures::VERSION;

/// Binance USDT-M 선물 주문 도구 (자격 증명이 없으면 dry-run)
#[derive(Parser, Debug)]
#[command(name = "xquant-futures")]
#[command(about = "Place limit, market, paired take-profit/stop and TWAP orders on Binance USDT-M futures")]
#[command(version)]
struct Args {
    /// API key (falls back to BINANCE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API secret (falls back to BINANCE_SECRET)
    #[arg(long, global = true)]
    api_secret: Option<String>,

    /// Do not send real orders
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log filter, e.g. info or debug (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place a limit order
    Limit {
        /// Trading pair, e.g. BTCUSDT
        symbol: String,
        /// BUY or SELL
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        #[arg(long, default_value = "GTC")]
        time_in_force: TimeInForce,
    },

    /// Place a market order
    Market {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
    },

    /// Place a take-profit limit order and describe the matching stop order
    Oco {
        symbol: String,
        /// Side of the open position
        side: OrderSide,
        quantity: Decimal,
        #[arg(long)]
        take_profit: Decimal,
        #[arg(long)]
        stop: Decimal,
        #[arg(long)]
        stop_limit: Decimal,
    },

    /// Split a market order into equal slices spaced in time
    Twap {
        symbol: String,
        side: OrderSide,
        total_quantity: Decimal,
        #[arg(long, default_value_t = 5)]
        slices: usize,
        /// Seconds between slices
        #[arg(long, default_value_t = 60.0)]
        interval: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let level = args.log_level.clone().unwrap_or_else(|| settings.logging.level.clone());
    if let Err(e) = logging::init(&level) {
        eprintln!("{}", e);
    }
    log::info!("xquant-futures {} 시작", VERSION);

    match run(args, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args, settings: Settings) -> anyhow::Result<()> {
    let log = OrderLog::default();

    if let Err(e) = validate_command(&args.command, settings.exchange.max_quantity) {
        log.validation_failed("cli", &e);
        return Err(e.into());
    }

    // 자격 증명은 시작 시 한 번만 결정
    let config = ClientConfig::resolve(args.api_key, args.api_secret, args.dry_run);
    let client = ExchangeClient::from_config(&config, &settings.exchange, log)?;

    let result = match args.command {
        Command::Limit { symbol, side, quantity, price, time_in_force } => {
            place_limit(&client, &symbol, side, quantity, price, time_in_force).await?
        }
        Command::Market { symbol, side, quantity } => place_market(&client, &symbol, side, quantity).await?,
        Command::Oco { symbol, side, quantity, take_profit, stop, stop_limit } => {
            StrategyResult::Oco(place_oco(&client, &symbol, side, quantity, take_profit, stop, stop_limit).await?)
        }
        Command::Twap { symbol, side, total_quantity, slices, interval } => {
            let interval = Duration::try_from_secs_f64(interval)
                .map_err(|e| TradingError::InvalidParameter(format!("interval: {}", e)))?;

            let (tx, rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Ctrl-C received, stopping TWAP before the next slice");
                    let _ = tx.send(true);
                }
            });

            let params = TwapParams::new(symbol, side, total_quantity, slices, interval);
            match execute_twap_with_cancel(&client, &params, rx).await {
                Ok(report) => StrategyResult::Twap(report),
                Err(e) => {
                    // 이미 체결된 분할은 실패와 함께 출력
                    if !e.partial_slices().is_empty() {
                        print_json(e.partial_slices())?;
                    }
                    return Err(e.into());
                }
            }
        }
    };

    print_json(&result)?;
    Ok(())
}

/// 클라이언트 생성 전 입력 검증. 수량 상한은 설정값을 따른다
fn validate_command(command: &Command, max_quantity: Decimal) -> Result<(), TradingError> {
    match command {
        Command::Limit { symbol, quantity, price, .. } => validate_order_input(symbol, *quantity, &[*price], max_quantity),
        Command::Market { symbol, quantity, .. } => validate_order_input(symbol, *quantity, &[], max_quantity),
        Command::Oco { symbol, quantity, take_profit, stop, stop_limit, .. } => {
            validate_order_input(symbol, *quantity, &[*take_profit, *stop, *stop_limit], max_quantity)
        }
        Command::Twap { symbol, total_quantity, slices, interval, .. } => {
            validate_order_input(symbol, *total_quantity, &[], max_quantity)?;
            if *slices == 0 {
                return Err(TradingError::InvalidParameter("--slices must be at least 1".to_string()));
            }
            if !interval.is_finite() || *interval < 0.0 {
                return Err(TradingError::InvalidParameter("--interval must be a non-negative number".to_string()));
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), TradingError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
