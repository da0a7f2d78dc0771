// src/models/mod.rs

pub mod chemical;
pub mod experiment;
pub mod safety;
pub mod user;

pub use chemical::*;
pub use experiment::*;
pub use safety::*;
pub use user::*;
