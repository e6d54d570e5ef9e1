use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TradingError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// 반대 방향 (포지션 청산 방향)
    pub fn inverse(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(TradingError::InvalidParameter(format!("unknown order side: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopMarket,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::Stop => "STOP",
            OrderType::StopMarket => "STOP_MARKET",
        }
    }

    /// 지정가(price)가 필요한 주문 유형인지
    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::Stop)
    }

    /// 트리거 가격(stopPrice)이 필요한 주문 유형인지
    pub fn requires_stop_price(&self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopMarket)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Gtc,
    Ioc,
    Fok,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeInForce {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::Gtc),
            "IOC" => Ok(TimeInForce::Ioc),
            "FOK" => Ok(TimeInForce::Fok),
            other => Err(TradingError::InvalidParameter(format!("unknown time in force: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    ExpiredInMatch,
}

/// 거래소에 제출할 주문 요청
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
}

impl OrderRequest {
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            stop_price: None,
            time_in_force: Some(time_in_force),
        }
    }

    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
        }
    }

    /// 스탑 리밋: stop_price 도달 시 price 지정가 주문으로 전환
    pub fn stop(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Stop,
            quantity,
            price: Some(price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::Gtc),
        }
    }

    pub fn stop_market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, stop_price: Decimal) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            order_type: OrderType::StopMarket,
            quantity,
            price: None,
            stop_price: Some(stop_price),
            time_in_force: None,
        }
    }

    /// 주문 유형과 가격 필드 조합 검증
    pub fn check_shape(&self) -> Result<(), TradingError> {
        if self.quantity <= Decimal::ZERO {
            return Err(TradingError::InvalidQuantity(format!("quantity must be positive, got {}", self.quantity)));
        }
        if self.order_type.requires_price() != self.price.is_some() {
            return Err(TradingError::InvalidParameter(format!(
                "{} order {} a price",
                self.order_type,
                if self.order_type.requires_price() { "requires" } else { "must not carry" }
            )));
        }
        if self.order_type.requires_stop_price() != self.stop_price.is_some() {
            return Err(TradingError::InvalidParameter(format!(
                "{} order {} a stop price",
                self.order_type,
                if self.order_type.requires_stop_price() { "requires" } else { "must not carry" }
            )));
        }
        if self.time_in_force.is_some() && !self.order_type.requires_price() {
            return Err(TradingError::InvalidParameter(format!(
                "{} order must not carry a time in force",
                self.order_type
            )));
        }
        Ok(())
    }

    /// Venue query parameters in canonical order, without timestamp or signature.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.to_string()),
            ("type", self.order_type.to_string()),
            ("quantity", self.quantity.normalize().to_string()),
        ];
        if let Some(price) = self.price {
            params.push(("price", price.normalize().to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice", stop_price.normalize().to_string()));
        }
        if let Some(tif) = self.time_in_force {
            params.push(("timeInForce", tif.to_string()));
        }
        params
    }
}
