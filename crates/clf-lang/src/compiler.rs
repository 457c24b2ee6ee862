use clf_config::{Dialect, ForwarderSpec, Options, Secrets};

use crate::checker::{CheckError, check_dialect, check_forwarder};
use crate::error::{CompileResult, diagnostics_error};
use crate::normalize::normalize;
use crate::routes::plan_routes;
use crate::{fluentd, vector};

/// Every problem that would stop `spec` from compiling for `dialect`.
///
/// The spec is normalized first, so lokistack expansions and defaulted
/// pipeline names are checked like any other entity.
pub fn check_spec(
    spec: &ForwarderSpec,
    secrets: &Secrets,
    options: &Options,
    dialect: Dialect,
) -> Vec<CheckError> {
    check_normalized(&normalize(spec), secrets, options, dialect)
}

fn check_normalized(
    spec: &ForwarderSpec,
    secrets: &Secrets,
    options: &Options,
    dialect: Dialect,
) -> Vec<CheckError> {
    let mut errors = check_forwarder(spec, secrets, options);
    errors.extend(check_dialect(spec, dialect));
    errors
}

/// Compile a forwarder spec into a complete collector configuration.
///
/// Normalizes, validates (all diagnostics are collected before failing),
/// plans routes and renders the target dialect. A compile is a pure function
/// of its arguments: equal inputs give byte-identical output.
pub fn compile_forwarder(
    spec: &ForwarderSpec,
    secrets: &Secrets,
    options: &Options,
    dialect: Dialect,
) -> CompileResult<String> {
    let spec = normalize(spec);
    let errors = check_normalized(&spec, secrets, options, dialect);
    if !errors.is_empty() {
        tracing::debug!(%dialect, errors = errors.len(), "spec rejected");
        return Err(diagnostics_error(&errors));
    }

    let plan = plan_routes(&spec);
    tracing::debug!(
        %dialect,
        pipelines = plan.ordered_pipelines.len(),
        outputs = plan.ordered_outputs.len(),
        debug = options.debug,
        "compiling forwarder"
    );
    let text = match dialect {
        Dialect::Fluentd => fluentd::generate(&spec, &plan, secrets, options)?,
        Dialect::Vector => vector::generate(&spec, &plan, secrets, options)?,
    };
    tracing::debug!(%dialect, bytes = text.len(), "forwarder compiled");
    Ok(text)
}
