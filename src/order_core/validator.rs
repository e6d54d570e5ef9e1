use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::TradingError;
use crate::models::order::OrderRequest;

/// 기본 최대 주문 수량
pub const DEFAULT_MAX_QUANTITY: Decimal = dec!(1000000);

/// 가격 최대 소수 자릿수
pub const MAX_PRICE_SCALE: u32 = 8;

/// USDT-M 선물에서 허용하는 견적 자산 접미사
const QUOTE_ASSETS: [&str; 3] = ["USDT", "USDC", "BUSD"];

/// 심볼 검증 (예: BTCUSDT)
pub fn validate_symbol(symbol: &str) -> Result<(), TradingError> {
    if symbol.is_empty() {
        return Err(TradingError::InvalidSymbol("symbol must not be empty".to_string()));
    }

    if !symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(TradingError::InvalidSymbol(format!(
            "{} must contain only uppercase letters and digits",
            symbol
        )));
    }

    let has_quote = QUOTE_ASSETS
        .iter()
        .any(|quote| symbol.len() > quote.len() && symbol.ends_with(quote));
    if !has_quote {
        return Err(TradingError::InvalidSymbol(format!(
            "{} must be a base asset followed by one of {:?}",
            symbol, QUOTE_ASSETS
        )));
    }

    Ok(())
}

/// 수량 검증 (기본 상한 사용)
pub fn validate_quantity(quantity: Decimal) -> Result<(), TradingError> {
    validate_quantity_within(quantity, DEFAULT_MAX_QUANTITY)
}

pub fn validate_quantity_within(quantity: Decimal, max_quantity: Decimal) -> Result<(), TradingError> {
    if quantity <= Decimal::ZERO {
        return Err(TradingError::InvalidQuantity(format!("quantity must be positive, got {}", quantity)));
    }

    if quantity > max_quantity {
        return Err(TradingError::InvalidQuantity(format!(
            "quantity {} exceeds maximum {}",
            quantity, max_quantity
        )));
    }

    Ok(())
}

/// 가격 검증
pub fn validate_price(price: Decimal) -> Result<(), TradingError> {
    if price <= Decimal::ZERO {
        return Err(TradingError::InvalidPrice(format!("price must be positive, got {}", price)));
    }

    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(TradingError::InvalidPrice(format!(
            "price {} has more than {} decimal places",
            price, MAX_PRICE_SCALE
        )));
    }

    Ok(())
}

/// 주문 입력값 일괄 검증: 심볼, 설정된 상한 내 수량, 각 가격 순
pub fn validate_order_input(
    symbol: &str,
    quantity: Decimal,
    prices: &[Decimal],
    max_quantity: Decimal,
) -> Result<(), TradingError> {
    validate_symbol(symbol)?;
    validate_quantity_within(quantity, max_quantity)?;
    prices.iter().try_for_each(|price| validate_price(*price))
}

/// 주문 검증기 인터페이스
pub trait OrderValidator: Send + Sync {
    /// 주문 검증
    fn validate(&self, order: &OrderRequest) -> Result<(), TradingError>;
}

/// 기본 주문 검증기
#[derive(Debug, Clone)]
pub struct BasicOrderValidator {
    max_quantity: Decimal,
}

impl BasicOrderValidator {
    pub fn new(max_quantity: Decimal) -> Self {
        BasicOrderValidator { max_quantity }
    }

    pub fn max_quantity(&self) -> Decimal {
        self.max_quantity
    }
}

impl Default for BasicOrderValidator {
    fn default() -> Self {
        BasicOrderValidator::new(DEFAULT_MAX_QUANTITY)
    }
}

impl OrderValidator for BasicOrderValidator {
    fn validate(&self, order: &OrderRequest) -> Result<(), TradingError> {
        validate_symbol(&order.symbol)?;
        validate_quantity_within(order.quantity, self.max_quantity)?;

        if let Some(price) = order.price {
            validate_price(price)?;
        }
        if let Some(stop_price) = order.stop_price {
            validate_price(stop_price)?;
        }

        order.check_shape()
    }
}
