//! HTTP handlers for the todo API.

pub mod health;
pub mod todos;
