use serde::{Deserialize, Serialize};

use crate::types::{ByteSize, HumanDuration};

/// Global buffer tuning for file-buffered collector stores.
///
/// Every field is optional; unset fields fall back to per-output-type defaults
/// at generation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_limit_size: Option<ByteSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_limit_size: Option<ByteSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_action: Option<OverflowAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_thread_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_mode: Option<FlushMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<HumanDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_wait: Option<HumanDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_type: Option<RetryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_max_interval: Option<HumanDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_timeout: Option<HumanDuration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowAction {
    ThrowException,
    Block,
    DropOldestChunk,
}

impl OverflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThrowException => "throw_exception",
            Self::Block => "block",
            Self::DropOldestChunk => "drop_oldest_chunk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    Lazy,
    Interval,
    Immediate,
}

impl FlushMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Interval => "interval",
            Self::Immediate => "immediate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryType {
    ExponentialBackoff,
    Periodic,
}

impl RetryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExponentialBackoff => "exponential_backoff",
            Self::Periodic => "periodic",
        }
    }
}

/// Per-output delivery and request tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputTuning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_write: Option<ByteSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_retry_duration: Option<HumanDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry_duration: Option<HumanDuration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    #[serde(rename = "atLeastOnce")]
    AtLeastOnce,
    #[serde(rename = "atMostOnce")]
    AtMostOnce,
}
