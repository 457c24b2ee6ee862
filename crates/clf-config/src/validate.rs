use std::path::Path;

use crate::collector::CollectorConfig;
use crate::forwarder::ForwarderSpec;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// `[forwarder]` carries either a `spec` path or inline tables, never both.
pub(crate) fn validate_raw_forwarder(
    spec_path: Option<&Path>,
    inline: &ForwarderSpec,
) -> anyhow::Result<()> {
    let has_inline =
        !inline.inputs.is_empty() || !inline.outputs.is_empty() || !inline.pipelines.is_empty();
    if spec_path.is_some() && has_inline {
        anyhow::bail!("forwarder: `spec` and inline inputs/outputs/pipelines are mutually exclusive");
    }
    Ok(())
}

/// Internal validation, called automatically during `CollectorConfig::from_str` / `load`.
///
/// Only file-level concerns are checked here; the forwarder spec itself is
/// validated by the compiler, which reports every problem at once.
pub(crate) fn validate(config: &CollectorConfig) -> anyhow::Result<()> {
    if config.spec.pipelines.is_empty() {
        anyhow::bail!("forwarder: at least one pipeline is required");
    }

    if !is_valid_level(&config.logging.level) {
        anyhow::bail!(
            "logging.level: unknown level {:?} (expected one of {})",
            config.logging.level,
            LOG_LEVELS.join("/"),
        );
    }
    for (module, level) in &config.logging.modules {
        if !is_valid_level(level) {
            anyhow::bail!("logging.modules.{module}: unknown level {level:?}");
        }
    }

    if let Some(out) = &config.output
        && out.is_dir()
    {
        anyhow::bail!("collector.output: {} is a directory", out.display());
    }

    if config.options.service_account_token_secret_name.is_empty() {
        anyhow::bail!("options.service_account_token_secret_name must not be empty");
    }

    Ok(())
}

fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}
