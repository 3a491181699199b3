use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{
    ConvertResult, DownloadResult, ProgressEvent, ProgressSink, RunAllResult, SymbolsResult,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_download(result: &DownloadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_symbols(result: &SymbolsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_convert(result: &ConvertResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_all(result: &RunAllResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
