//! Logging for the game module.
//!
//! Everything the module logs through `tracing` is formatted by a
//! `tracing-subscriber` fmt layer and handed to the host console through
//! `gi.dprintf`, one call per event. The host stamps its own console lines,
//! so timestamps and ANSI colours are left out.

use std::io;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::game_import::gi_dprintf;

/// Filter used when the `g_log` cvar is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
    #[error("bad log filter: {0}")]
    BadFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Buffers one formatted event and prints it on drop.
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            gi_dprintf(&String::from_utf8_lossy(&self.buf));
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter { buf: Vec::with_capacity(128) }
    }
}

/// Build the console subscriber without installing it.
pub fn console_subscriber(filter: &str) -> Result<impl Subscriber + Send + Sync + 'static, LogError> {
    let filter = EnvFilter::try_new(filter)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish())
}

/// Install the global subscriber. `filter` takes `RUST_LOG` style directives,
/// e.g. `"info,oblivion_game::m_kigrax=debug"`.
pub fn init_logging(filter: &str) -> Result<(), LogError> {
    console_subscriber(filter)?.try_init()?;
    Ok(())
}

/// Run `f` with warnings routed to this thread's console recording.
#[cfg(test)]
pub fn with_console_warnings<R>(f: impl FnOnce() -> R) -> R {
    match console_subscriber("warn") {
        Ok(sub) => tracing::subscriber::with_default(sub, f),
        Err(e) => panic!("console subscriber: {}", e),
    }
}
