pub mod app;
pub mod config;
pub mod convert;
pub mod domain;
pub mod download;
pub mod error;
pub mod format;
pub mod mapper;
pub mod output;
pub mod record;
pub mod sparql;
pub mod symbols;
pub mod turtle;
