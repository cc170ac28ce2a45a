use crate::error::QRError;

/// Receives one record per failed public operation.
pub trait Logger: Send + Sync {
    fn error(&self, err: &QRError, tag: &str);
}

/// Forwards records to the `log` facade under the `qrcache` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn error(&self, err: &QRError, tag: &str) {
        log::error!(target: "qrcache", "{tag}: {err}");
    }
}
