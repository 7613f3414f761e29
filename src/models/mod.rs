pub mod animation;
pub mod generation;

pub use animation::*;
pub use generation::*;
