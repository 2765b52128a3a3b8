//! Relations - declaration, binding, validation and delete propagation

pub mod definition;
pub mod descriptor;
pub mod graph;
pub mod propagator;
pub mod validator;

pub use definition::*;
pub use descriptor::*;
pub use graph::*;
pub use propagator::*;
pub use validator::*;
