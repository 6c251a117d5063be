//! Append-only results journal.
//!
//! All workers share one journal file. Appends are serialized behind a
//! mutex so concurrent handlers never interleave partial records, and the
//! banner header is written exactly once even when several workers race
//! the first initialization.

use crate::analysis::AnalysisResult;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

const SEPARATOR_WIDTH: usize = 80;
const BANNER: &str = "REGISTRO DE MENSAJES TCP - SERVIDOR DE CONTEO DE VOCALES";

/// One journal entry: the analyzed message together with its verdicts.
/// Once appended it is never rewritten.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: String,
    pub message: String,
    pub target: char,
    pub count: usize,
    pub prime: bool,
}

impl LogRecord {
    /// Build a record for `message` stamped with the current local time.
    pub fn new(message: &str, result: &AnalysisResult) -> Self {
        LogRecord {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            message: message.to_string(),
            target: result.target,
            count: result.count,
            prime: result.prime.unwrap_or(false),
        }
    }

    /// Render the fixed textual block this record occupies in the file.
    fn render(&self) -> String {
        let verdict = if self.prime { "SI" } else { "NO" };
        format!(
            "Fecha: {}\nMensaje: {}\nÚltima vocal: {}\nRepeticiones: {}\n¿Es primo?: {}\n{}\n\n",
            self.timestamp,
            self.message,
            self.target,
            self.count,
            verdict,
            "-".repeat(SEPARATOR_WIDTH),
        )
    }
}

/// Shared handle to the journal file. The mutex is the only cross-worker
/// synchronization in the server.
pub struct Journal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Journal {
    /// Open a journal at `path`, creating it with the banner header if it
    /// does not exist yet. An existing file is left untouched so records
    /// survive server restarts.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        Self::ensure_initialized(&path).await?;
        Ok(Arc::new(Journal {
            path,
            write_lock: Mutex::new(()),
        }))
    }

    /// Create the file with its header iff it is absent. `create_new` makes
    /// the existence check and the creation one atomic step, so concurrent
    /// callers produce exactly one header: losers of the race see
    /// `AlreadyExists` and return without writing.
    pub async fn ensure_initialized(path: &Path) -> io::Result<()> {
        match OpenOptions::new().write(true).create_new(true).open(path).await {
            Ok(mut file) => {
                let rule = "=".repeat(SEPARATOR_WIDTH);
                let header = format!("{rule}\n{BANNER}\n{rule}\n\n");
                file.write_all(header.as_bytes()).await?;
                file.flush().await?;
                info!(path = %path.display(), "Journal created");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                info!(path = %path.display(), "Using existing journal");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Append one record. Exclusive access is held for the duration of the
    /// write and released on every path, including write failure.
    pub async fn append(&self, record: &LogRecord) -> io::Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(record.render().as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), "Record appended");
        Ok(())
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
