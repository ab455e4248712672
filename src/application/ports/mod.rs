pub mod payment_processor;
