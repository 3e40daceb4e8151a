//! ketju Common Types
//!
//! Shared data structures for the test engine: the binding context threaded
//! through every scope, the expression resolver used to turn templated fields
//! into literals, and the declarative test model (tests, steps, collectors).
//!
//! Nothing in this crate performs I/O.

pub mod bindings;
pub mod model;
pub mod template;

pub use bindings::{BindingError, Bindings};
pub use model::{
    Assert, Binding, Collect, Command, Create, Delete, Describe, Metadata, ObjectReference,
    Operation, PodLogs, ResourceReference, Scenario, Sleep, Step, Test, TestSpec,
    TimeoutOverrides,
};
pub use template::TemplateError;

/// Placeholder substituted with the ambient namespace when a command runs
pub const NAMESPACE_PLACEHOLDER: &str = "$NAMESPACE";

/// Binding holding the namespace name tests run in
pub const NAMESPACE_BINDING: &str = "namespace";

/// Binding holding per-instance test info (ordinal, scenario ordinal, metadata)
pub const TEST_BINDING: &str = "test";

/// Binding holding the identity of the cluster operations target
pub const CLUSTER_BINDING: &str = "cluster";
