#![deny(dead_code)]
#![deny(unused_variables)]

//! Shared domain types, configuration and trait seams for the curriculum tutor.

pub mod config;
pub mod corpus;
pub mod error;
pub mod levels;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
