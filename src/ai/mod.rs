//! AI feature — prompt templates and proxy routes.

pub mod prompts;
pub mod routes;
