use std::path::{Path, PathBuf};

use clf_config::{CollectorConfig, Dialect};
use clf_lang::{CheckError, RouteExplanation};
use orion_error::op_context;
use orion_error::ErrorOweBase;
use orion_error::prelude::*;

use crate::error::{RuntimeReason, RuntimeResult};

/// The result of one [`generate`] run.
#[derive(Debug, Clone)]
pub struct Generated {
    pub dialect: Dialect,
    pub text: String,
    /// File the text was written to; `None` when the config names no output.
    pub written_to: Option<PathBuf>,
}

/// Read `clf.toml` together with the spec file and secrets it points at.
pub fn load_config(path: &Path) -> RuntimeResult<CollectorConfig> {
    let config = CollectorConfig::load(path)
        .owe(RuntimeReason::Bootstrap)
        .position(path.display().to_string())?;
    clf_debug!(
        conf,
        path = %path.display(),
        dialect = %config.dialect,
        outputs = config.spec.outputs.len(),
        pipelines = config.spec.pipelines.len(),
        secrets = config.secrets.len(),
        "collector config loaded"
    );
    if config.options.debug {
        clf_warn!(conf, "debug mode: outputs are replaced by stdout sinks");
    }
    Ok(config)
}

/// Compile the configured spec and write it to the configured output.
#[tracing::instrument(name = "clf.generate", skip_all, fields(dialect = %config.dialect))]
pub fn generate(config: &CollectorConfig) -> RuntimeResult<Generated> {
    let mut op = op_context!("clf-generate").with_auto_log();
    op.record("dialect", config.dialect.as_str());

    let text = clf_lang::compile_forwarder(
        &config.spec,
        &config.secrets,
        &config.options,
        config.dialect,
    )
    .err_conv()?;

    if let Some(path) = &config.output {
        write_output(path, &text)?;
        clf_info!(
            gen,
            path = %path.display(),
            bytes = text.len(),
            "configuration written"
        );
    }

    op.mark_suc();
    Ok(Generated {
        dialect: config.dialect,
        text,
        written_to: config.output.clone(),
    })
}

/// Every diagnostic that would fail [`generate`], without rendering anything.
pub fn check(config: &CollectorConfig) -> Vec<CheckError> {
    let errors = clf_lang::check_spec(
        &config.spec,
        &config.secrets,
        &config.options,
        config.dialect,
    );
    clf_debug!(gen, dialect = %config.dialect, errors = errors.len(), "spec checked");
    errors
}

pub fn routes(config: &CollectorConfig) -> RouteExplanation {
    clf_lang::explain_routes(&config.spec)
}

fn write_output(path: &Path, text: &str) -> RuntimeResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .owe(RuntimeReason::Io)
            .position(dir.display().to_string())?;
    }
    std::fs::write(path, text)
        .owe(RuntimeReason::Io)
        .position(path.display().to_string())
}
