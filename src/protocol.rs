//! Per-connection protocol handling.
//!
//! One request per connection: a single bounded read, then
//! validate → analyze → persist → respond, then close. The protocol is
//! plain text both ways; the reply is exactly one line, either the
//! occurrence count or an `ERROR:` reason.

use crate::analysis::{self, AnalysisError, AnalysisMode};
use crate::journal::{Journal, LogRecord};
use bytes::BytesMut;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Receive buffer in last-char mode.
pub const LAST_CHAR_MAX_MESSAGE: usize = 1024;

/// Receive buffer in vowel mode, sized for longer phrases.
pub const LAST_VOWEL_MAX_MESSAGE: usize = 4096;

/// Maximum accepted message size for a mode. A message larger than this is
/// truncated at the buffer; there is no framing or reassembly.
pub fn max_message_size(mode: AnalysisMode) -> usize {
    match mode {
        AnalysisMode::LastChar => LAST_CHAR_MAX_MESSAGE,
        AnalysisMode::LastVowel => LAST_VOWEL_MAX_MESSAGE,
    }
}

/// The single line sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Successful analysis: the occurrence count.
    Count(usize),
    /// A client-input failure with its fixed reason.
    Invalid(AnalysisError),
    /// Unexpected server-side failure. The client never sees internals.
    #[allow(dead_code)]
    Internal,
}

impl Reply {
    /// Wire form, newline-terminated.
    pub fn to_line(&self) -> String {
        match self {
            Reply::Count(n) => format!("{n}\n"),
            Reply::Invalid(e) => format!("ERROR: {e}\n"),
            Reply::Internal => "ERROR: internal server error\n".to_string(),
        }
    }
}

/// Handle one client connection end to end.
///
/// Runs the full state machine for a single request and always leaves the
/// stream flushed and shut down, whichever branch fired. Journal failures
/// are logged and do not affect the reply; transport errors propagate to
/// the caller, which closes the connection by dropping the stream.
pub async fn handle_connection<S>(
    mut stream: S,
    mode: AnalysisMode,
    journal: Option<Arc<Journal>>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match receive(&mut stream, mode).await? {
        None => {
            warn!("Empty payload");
            Reply::Invalid(AnalysisError::NoData)
        }
        Some(message) => {
            debug!(message = %message, "Message received");
            match analysis::analyze(&message, mode) {
                Ok(result) => {
                    info!(
                        target_char = %result.target,
                        count = result.count,
                        prime = ?result.prime,
                        "Message analyzed"
                    );
                    if let Some(journal) = &journal {
                        persist(journal, &message, &result).await;
                    }
                    Reply::Count(result.count)
                }
                Err(e) => {
                    warn!(reason = %e, "Validation failed");
                    Reply::Invalid(e)
                }
            }
        }
    };

    respond(&mut stream, &reply).await
}

/// One bounded read, decoded as UTF-8 and trimmed of trailing whitespace.
/// Returns `None` for an empty payload. Bytes beyond the mode's buffer are
/// never read; an oversized message is truncated silently.
async fn receive<S>(stream: &mut S, mode: AnalysisMode) -> io::Result<Option<String>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(max_message_size(mode));
    let n = stream.read_buf(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    // Invalid UTF-8 cannot pass validation anyway; lossy decoding turns it
    // into replacement characters the validator rejects.
    let text = String::from_utf8_lossy(&buf).trim_end().to_string();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(text))
}

/// Best-effort journal append. The response path is independent of
/// persistence success.
async fn persist(journal: &Arc<Journal>, message: &str, result: &analysis::AnalysisResult) {
    let record = LogRecord::new(message, result);
    if let Err(e) = journal.append(&record).await {
        error!(error = %e, "Failed to append journal record");
    }
}

/// Write the reply line, flush, and shut the stream down.
async fn respond<S>(stream: &mut S, reply: &Reply) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(reply.to_line().as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}
