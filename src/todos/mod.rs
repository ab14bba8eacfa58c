//! To-do list feature — row types and HTTP routes.

pub mod model;
pub mod routes;
