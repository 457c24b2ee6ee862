pub mod collector;
pub mod forwarder;
pub mod logging;
pub mod options;
pub mod outputs;
pub mod secrets;
pub mod tuning;
pub mod types;
mod validate;

pub use collector::{CollectorConfig, Dialect};
pub use forwarder::{
    ApplicationInput, AuditInput, AuditSource, Authentication, BearerTokenSpec,
    DEFAULT_OUTPUT_PREFIX, ForwarderSpec, InfrastructureInput, InfrastructureSource, InputKind,
    InputSpec, LabelSelector, OutputSecretSpec, OutputSpec, OutputTls, OutputType, ParseFormat,
    PipelineSpec, TokenSource,
};
pub use logging::{LogFormat, LoggingConfig};
pub use options::Options;
pub use outputs::{
    AzureMonitor, Cloudwatch, DataModel, Elasticsearch, GoogleCloudLogging, GroupBy, Http, Kafka,
    Loki, LokiStack, LokiStackLabelKeys, LokiStackTarget, Splunk, Syslog, SyslogRfc,
    TenantLabelKeys,
};
pub use secrets::{Secret, Secrets, secret_path};
pub use tuning::{DeliveryMode, FlushMode, OutputTuning, OverflowAction, RetryType, Tuning};
pub use types::{ByteSize, HumanDuration};
