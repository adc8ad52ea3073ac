//! Domain model, validation rules and snapshot codec for `Tasklane`.
//!
//! This crate is pure: no async, no I/O. The application crate builds the
//! repository, use cases and state store on top of it.

pub mod codec;
pub mod task;
pub mod validation;
