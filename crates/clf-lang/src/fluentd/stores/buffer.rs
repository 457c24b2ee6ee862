use clf_config::{FlushMode, Tuning};
use serde::Serialize;

const FLUSH_THREAD_COUNT: u32 = 2;
const RETRY_WAIT: &str = "1s";
const RETRY_MAX_INTERVAL: &str = "60s";
const RETRY_TIMEOUT: &str = "60m";
const QUEUED_CHUNKS_LIMIT: &str = r##""#{ENV['BUFFER_QUEUE_LIMIT'] || '32'}""##;
const TOTAL_LIMIT_SIZE: &str = r##""#{ENV['TOTAL_LIMIT_SIZE_PER_BUFFER'] || '8589934592'}""##;
const CHUNK_LIMIT_SIZE: &str = r##""#{ENV['BUFFER_SIZE_LIMIT'] || '8m'}""##;

/// A file `<buffer>` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(in crate::fluentd) struct BufferParams {
    /// Chunk keys, e.g. `$.kubernetes.namespace_name`.
    pub keys: Vec<String>,
    /// Directory under `/var/lib/fluentd`.
    pub path: String,
    pub flush_mode: &'static str,
    pub flush_interval: Option<String>,
    pub flush_thread_count: u32,
    pub retry_type: &'static str,
    pub retry_wait: String,
    pub retry_max_interval: String,
    pub retry_timeout: String,
    pub queued_chunks_limit_size: String,
    pub total_limit_size: String,
    pub chunk_limit_size: String,
    pub overflow_action: &'static str,
}

/// Buffer defaults with the spec-wide tuning applied. `flush_interval` is
/// only written in interval mode.
pub(in crate::fluentd) fn buffer(
    path: &str,
    tuning: Option<&Tuning>,
    default_flush_interval: &str,
    keys: Vec<String>,
) -> BufferParams {
    let t = tuning.cloned().unwrap_or_default();
    let flush_mode = t.flush_mode.unwrap_or(FlushMode::Interval);
    let flush_interval = (flush_mode == FlushMode::Interval).then(|| {
        t.flush_interval
            .map_or_else(|| default_flush_interval.to_string(), |d| d.to_string())
    });
    let or = |v: Option<String>, default: &str| v.unwrap_or_else(|| default.to_string());
    BufferParams {
        keys,
        path: path.to_string(),
        flush_mode: flush_mode.as_str(),
        flush_interval,
        flush_thread_count: t.flush_thread_count.unwrap_or(FLUSH_THREAD_COUNT),
        retry_type: t.retry_type.map_or("exponential_backoff", |r| r.as_str()),
        retry_wait: or(t.retry_wait.map(|d| d.to_string()), RETRY_WAIT),
        retry_max_interval: or(t.retry_max_interval.map(|d| d.to_string()), RETRY_MAX_INTERVAL),
        retry_timeout: or(t.retry_timeout.map(|d| d.to_string()), RETRY_TIMEOUT),
        queued_chunks_limit_size: QUEUED_CHUNKS_LIMIT.to_string(),
        total_limit_size: or(t.total_limit_size.map(|s| s.to_string()), TOTAL_LIMIT_SIZE),
        chunk_limit_size: or(t.chunk_limit_size.map(|s| s.to_string()), CHUNK_LIMIT_SIZE),
        overflow_action: t.overflow_action.map_or("block", |a| a.as_str()),
    }
}
