pub mod order;
pub mod response;
pub mod strategy_result;
