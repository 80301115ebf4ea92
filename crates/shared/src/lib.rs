pub mod config;
mod config_env;
pub mod i18n;
pub mod llm;
pub mod posts;
pub mod simulations;
