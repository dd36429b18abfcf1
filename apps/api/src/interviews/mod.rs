//! Interview records: generation of new interviews and the queries and
//! mutations the dashboard uses.

pub mod generator;
pub mod handlers;
pub mod prompts;
