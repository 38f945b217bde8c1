//! Single-stream HTTP GET of the dataset archive.
//!
//! Streams the response body into any `Write` sink. No Range requests, no
//! retries: one request, one body.

use crate::error::{ProvisionError, Result};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Transfer limits for the archive GET.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum time to establish the connection.
    pub connect_timeout: Duration,
    /// Abort if throughput stays below this many bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Overall transfer timeout (None = unlimited).
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("dsp/{}", env!("CARGO_PKG_VERSION"))
}

/// Downloads `url` with a single GET, writing the body sequentially to `sink`.
/// Returns the number of bytes written.
///
/// If `abort` is given and becomes true mid-transfer, the transfer stops with
/// [`ProvisionError::Aborted`].
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch_to_writer<W: Write>(
    url: &str,
    sink: &mut W,
    opts: &FetchOptions,
    abort: Option<&AtomicBool>,
) -> Result<u64> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(&opts.user_agent)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    if let Some(t) = opts.timeout {
        easy.timeout(t)?;
    }
    if abort.is_some() {
        easy.progress(true)?;
    }
    let aborted = || abort.map(|a| a.load(Ordering::Relaxed)).unwrap_or(false);

    let mut written: u64 = 0;
    let mut write_err: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match sink.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                tracing::warn!("archive write failed: {}", e);
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        if abort.is_some() {
            // Returning false from the progress callback aborts the transfer.
            transfer.progress_function(|_, _, _, _| !aborted())?;
        }
        transfer.perform()
    };

    if let Some(e) = write_err {
        return Err(ProvisionError::io(format!("write body of {}", url), e));
    }
    if performed.is_err() && aborted() {
        tracing::info!(url, "GET aborted");
        return Err(ProvisionError::Aborted);
    }
    performed?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(ProvisionError::HttpStatus {
            url: url.to_string(),
            code,
        });
    }

    sink.flush()
        .map_err(|e| ProvisionError::io(format!("flush body of {}", url), e))?;
    tracing::debug!(url, bytes = written, "GET complete");
    Ok(written)
}
