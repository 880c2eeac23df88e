//! Foundation layer: math types, id generation, and logging
//!
//! Leaf modules with no dependency on the scene graph itself.

pub mod ident;
pub mod logging;
pub mod math;
