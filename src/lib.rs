pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod i18n;
pub mod pipeline;
pub mod retry;
pub mod security;
pub mod translation;
