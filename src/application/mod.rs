pub mod app_error;
pub mod business_days;
pub mod fees;
pub mod ports;
pub mod use_cases;
