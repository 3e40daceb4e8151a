//! kubectl command builders for diagnostic collectors
//!
//! Collectors (`podLogs`, `describe`) are turned into `kubectl` invocations.
//! Every templated field is resolved first, then validated, then assembled.
//! Building never touches the cluster except to map a resource type.
//!
//! When no namespace is given, the literal `$NAMESPACE` is emitted and the
//! command runner substitutes the ambient namespace.

mod describe;
mod logs;

pub use describe::describe;
pub use logs::logs;

use crate::cluster::{ClientError, ResourceMapper};
use common::{template, Bindings, ResourceReference, TemplateError};
use thiserror::Error;

pub const KUBECTL: &str = "kubectl";

const NAME_OR_SELECTOR_REQUIRED: &str = "a name or selector must be specified";
const NAME_WITH_SELECTOR: &str = "name cannot be provided when a selector is specified";

/// Collector build errors; none of them are retryable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("{0}")]
    InvalidSpec(&'static str),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to map resource: {0}")]
    Mapping(ClientError),
}

/// Exactly one of `name` and `selector` must be set
fn check_target(name: &str, selector: &str) -> Result<(), CollectorError> {
    match (name.is_empty(), selector.is_empty()) {
        (true, true) => Err(CollectorError::InvalidSpec(NAME_OR_SELECTOR_REQUIRED)),
        (false, false) => Err(CollectorError::InvalidSpec(NAME_WITH_SELECTOR)),
        _ => Ok(()),
    }
}

/// Append `<name>` or `-l <selector>`
fn push_target(args: &mut Vec<String>, name: String, selector: String) {
    if !name.is_empty() {
        args.push(name);
    } else if !selector.is_empty() {
        args.push("-l".to_string());
        args.push(selector);
    }
}

fn namespace_or_placeholder(namespace: String) -> String {
    if namespace.is_empty() {
        common::NAMESPACE_PLACEHOLDER.to_string()
    } else {
        namespace
    }
}

/// Resolve a templated resource reference and map it to a kubectl resource name
///
/// Returns `(resource, cluster_scoped)`.
pub async fn map_resource(
    mapper: &dyn ResourceMapper,
    bindings: &Bindings,
    reference: &ResourceReference,
) -> Result<(String, bool), CollectorError> {
    let resolved = ResourceReference {
        api_version: template::convert_string(&reference.api_version, bindings)?,
        kind: template::convert_string(&reference.kind, bindings)?,
        resource: template::convert_string(&reference.resource, bindings)?,
    };
    if resolved.kind.is_empty() && resolved.resource.is_empty() {
        return Err(CollectorError::InvalidSpec(
            "a kind or resource must be specified",
        ));
    }
    mapper
        .map_resource(&resolved)
        .await
        .map_err(CollectorError::Mapping)
}
