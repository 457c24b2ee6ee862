//! Spec validation.
//!
//! Every problem is reported; checking never stops at the first one. The
//! compiler runs the checker on the normalized spec and refuses to render
//! when anything is returned.

mod outputs;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use clf_config::{Dialect, ForwarderSpec, InputKind, Options, Secrets};

use crate::normalize::whole_kind;
use crate::template::label_name;
use crate::{fluentd, vector};

pub use outputs::dialect_supports;

/// Category of a spec problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Reference,
    Uniqueness,
    RequiredField,
    UnknownOutputType,
    AuthConfiguration,
}

/// A single spec problem with the name of the offending entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    pub kind: CheckKind,
    pub output: Option<String>,
    pub pipeline: Option<String>,
    pub input: Option<String>,
    pub message: String,
}

impl CheckError {
    fn new(kind: CheckKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            output: None,
            pipeline: None,
            input: None,
            message: message.into(),
        }
    }

    pub(crate) fn output(kind: CheckKind, name: &str, message: impl Into<String>) -> Self {
        Self {
            output: Some(name.to_string()),
            ..Self::new(kind, message)
        }
    }

    fn pipeline(kind: CheckKind, name: &str, message: impl Into<String>) -> Self {
        Self {
            pipeline: Some(name.to_string()),
            ..Self::new(kind, message)
        }
    }

    fn input(kind: CheckKind, name: &str, message: impl Into<String>) -> Self {
        Self {
            input: Some(name.to_string()),
            ..Self::new(kind, message)
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: ")?;
        if let Some(o) = &self.output {
            write!(f, "output `{o}`: ")?;
        } else if let Some(p) = &self.pipeline {
            write!(f, "pipeline `{p}`: ")?;
        } else if let Some(i) = &self.input {
            write!(f, "input `{i}`: ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Check a (normalized) spec against itself, its secrets and the options.
pub fn check_forwarder(spec: &ForwarderSpec, secrets: &Secrets, options: &Options) -> Vec<CheckError> {
    let mut errors = Vec::new();
    check_inputs(spec, &mut errors);
    outputs::check_outputs(spec, secrets, options, &mut errors);
    check_pipelines(spec, &mut errors);
    errors
}

/// Outputs whose type the target dialect cannot emit, and names that the
/// dialect turns into the same identifier.
pub fn check_dialect(spec: &ForwarderSpec, dialect: Dialect) -> Vec<CheckError> {
    let mut errors: Vec<CheckError> = spec
        .outputs
        .iter()
        .filter(|o| o.output_type.is_known() && !dialect_supports(dialect, &o.output_type))
        .map(|o| {
            CheckError::output(
                CheckKind::UnknownOutputType,
                &o.name,
                format!(
                    "output type `{}` is not supported by the {dialect} dialect",
                    o.output_type
                ),
            )
        })
        .collect();
    check_generated_ids(spec, dialect, &mut errors);
    errors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Input,
    Pipeline,
    Output,
}

impl Owner {
    fn collision(self, name: &str, message: String) -> CheckError {
        match self {
            Self::Input => CheckError::input(CheckKind::Uniqueness, name, message),
            Self::Pipeline => CheckError::pipeline(CheckKind::Uniqueness, name, message),
            Self::Output => CheckError::output(CheckKind::Uniqueness, name, message),
        }
    }
}

/// Fluentd labels (`@NAME`) and vector component ids must be unique and
/// must not shadow the ones the generator emits itself. Exact duplicates
/// of one entity type are left to [`check_forwarder`].
fn check_generated_ids(spec: &ForwarderSpec, dialect: Dialect, errors: &mut Vec<CheckError>) {
    let (reserved, what): (&[&str], &str) = match dialect {
        Dialect::Fluentd => (&fluentd::RESERVED_LABELS[..], "label"),
        Dialect::Vector => (&vector::RESERVED_IDS[..], "component id"),
    };
    let id_of = |name: &str| match dialect {
        Dialect::Fluentd => label_name(name),
        Dialect::Vector => vector::component_id(name),
    };

    let mut named: Vec<(Owner, &str)> = Vec::new();
    if dialect == Dialect::Vector {
        named.extend(
            spec.inputs
                .iter()
                .filter(|i| {
                    matches!(i.kind(), Some(InputKind::Infrastructure | InputKind::Audit))
                        && whole_kind(i).is_none()
                })
                .map(|i| (Owner::Input, i.name.as_str())),
        );
    }
    named.extend(spec.pipelines.iter().map(|p| (Owner::Pipeline, p.name())));
    named.extend(spec.outputs.iter().map(|o| (Owner::Output, o.name.as_str())));

    let mut seen: BTreeMap<String, (Owner, &str)> = BTreeMap::new();
    for (owner, name) in named {
        if name.is_empty() {
            continue;
        }
        let id = id_of(name);
        if reserved.contains(&id.as_str()) {
            errors.push(owner.collision(
                name,
                format!("{what} `{id}` is reserved by the {dialect} dialect"),
            ));
            continue;
        }
        match seen.get(&id) {
            Some(&(o, n)) if o == owner && n == name => {}
            Some(&(_, n)) => errors.push(owner.collision(
                name,
                format!("{what} `{id}` is also generated for `{n}`"),
            )),
            None => {
                seen.insert(id, (owner, name));
            }
        }
    }
}

fn check_inputs(spec: &ForwarderSpec, errors: &mut Vec<CheckError>) {
    let mut seen = BTreeSet::new();
    for input in &spec.inputs {
        if input.name.is_empty() {
            errors.push(CheckError::new(CheckKind::RequiredField, "input name must not be empty"));
            continue;
        }
        if InputKind::from_name(&input.name).is_some() {
            errors.push(CheckError::input(
                CheckKind::Uniqueness,
                &input.name,
                "name is reserved for a built-in input",
            ));
        }
        if !seen.insert(input.name.as_str()) {
            errors.push(CheckError::input(CheckKind::Uniqueness, &input.name, "duplicate input name"));
        }
        if input.kind_sections() != 1 {
            errors.push(CheckError::input(
                CheckKind::RequiredField,
                &input.name,
                "exactly one of application, infrastructure or audit must be set",
            ));
        }
    }
}

fn check_pipelines(spec: &ForwarderSpec, errors: &mut Vec<CheckError>) {
    let mut seen = BTreeSet::new();
    for p in &spec.pipelines {
        let name = p.name();
        if !seen.insert(name) {
            errors.push(CheckError::pipeline(CheckKind::Uniqueness, name, "duplicate pipeline name"));
        }
        if p.input_refs.is_empty() {
            errors.push(CheckError::pipeline(
                CheckKind::RequiredField,
                name,
                "at least one inputRef is required",
            ));
        }
        if p.output_refs.is_empty() {
            errors.push(CheckError::pipeline(
                CheckKind::RequiredField,
                name,
                "at least one outputRef is required",
            ));
        }
        for r in &p.input_refs {
            if InputKind::from_name(r).is_none() && spec.input(r).is_none() {
                errors.push(CheckError::pipeline(
                    CheckKind::Reference,
                    name,
                    format!("unknown input `{r}`"),
                ));
            }
        }
        for r in &p.output_refs {
            if spec.output(r).is_none() {
                errors.push(CheckError::pipeline(
                    CheckKind::Reference,
                    name,
                    format!("unknown output `{r}`"),
                ));
            }
        }
    }
}
