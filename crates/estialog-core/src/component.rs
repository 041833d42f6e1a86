use crate::error::LogError;

/// A host-managed unit with a setup/teardown lifecycle.
///
/// Methods take `&self` so a component can be shared with the parts of the
/// host that drive it (a sink is also held by the [`LogRegistry`](crate::LogRegistry)).
pub trait Component: Send + Sync {
    /// Validates the bindings made at construction and makes the component live.
    fn initialize(&self) -> Result<(), LogError>;

    /// Stops the component. Calling it more than once is harmless.
    fn teardown(&self);
}
