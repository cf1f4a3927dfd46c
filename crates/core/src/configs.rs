//! Configuration parsing for `kiln.yml` and `.kiln/tasks/*.yml` files
//!
//! These are the raw, serde-facing shapes. Project metadata is validated by the
//! [`resolver`](crate::resolver) before anything else consumes it.

pub mod project;
pub mod publishing;
pub mod tasks;

use crate::configs::project::ProjectFileConfig;

/// JSON Schema describing `kiln.yml`
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(ProjectFileConfig)
}
