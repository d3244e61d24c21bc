pub mod alert_generator;
