pub mod cache;
pub mod compiled;
pub mod expr;
pub mod fields;
pub mod grid;
pub mod registry;
pub mod surface;
