//! `Tasklane`: an intent-driven task list state engine.
//!
//! User intents flow into a [`store::TaskStore`], which dispatches them to
//! the [`usecase`] layer. Use cases validate and call a
//! [`repository::TaskRepository`], and every outcome folds into a single
//! published [`store::TaskState`].

pub mod config;
pub mod driver;
pub mod repository;
pub mod store;
pub mod usecase;
