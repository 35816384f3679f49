pub mod config_port;
pub mod data_port;
pub mod market_data_port;
