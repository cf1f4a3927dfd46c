pub mod build;
pub mod graph;
pub mod list;
pub mod plan;
pub mod publish;
pub mod schema;
