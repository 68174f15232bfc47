//! Application services for the bank account context.

pub mod command_handlers;
pub mod query_handlers;
