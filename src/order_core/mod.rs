pub mod validator;

pub use validator::{
    validate_order_input, validate_price, validate_quantity, validate_quantity_within, validate_symbol, BasicOrderValidator,
    OrderValidator, DEFAULT_MAX_QUANTITY,
};
