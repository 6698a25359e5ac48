//! Physical backend boundary.
//!
//! Concrete backends (the solver validating physical feasibility) live
//! outside this crate. Handlers only ever observe them through this
//! trait, when checking that the data they would supply is structurally
//! compatible with the physical model.

/// What a handler may observe of the physical backend.
pub trait Backend {
    /// Number of elements carried by the named array, or `None` when the
    /// backend has no such array.
    fn n_elements(&self, array_name: &str) -> Option<usize>;

    /// Element names of the named array, in canonical backend order.
    fn element_names(&self, array_name: &str) -> Vec<String>;
}
