//! Kiln Core Library
//!
//! This is the core library for the Kiln build orchestrator. Tasks are
//! declared as data, validated into an acyclic graph and executed in
//! dependency order; a publish flow packages artifacts and hands publication
//! descriptors to an upload client.
//!
//! ## Architecture
//!
//! - [`project_manager`] - High-level interface used by the CLI
//! - [`configs`] - Configuration parsing for `kiln.yml` and task files
//! - [`resolver`] - Validates raw project metadata into a [`resolver::ProjectSpec`]
//! - [`graph`] - Task graph construction, cycle detection and ordering
//! - [`execution`] - Task executor, state tracking and output locks
//! - [`actions`] - The built-in task kinds
//! - [`packager`] - Reproducible `.tar.gz` artifact bundles
//! - [`publication`] - Coordinates and publication descriptors
//! - [`publisher`] - Generates publications and uploads them
//! - [`toolchain`] / [`upload`] - External collaborators
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kiln_core::project_manager::{ProjectManager, ProjectManagerConfig};
//! use std::path::PathBuf;
//!
//! # fn example() -> kiln_core::types::KilnResult<()> {
//! let manager = ProjectManager::new(ProjectManagerConfig {
//!     project_root: PathBuf::from("."),
//!     parallelism: None,
//! })?;
//!
//! for task in manager.full_plan()?.task_ids() {
//!     println!("{}", task);
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod configs;
pub mod execution;
pub mod graph;
pub mod packager;
pub mod project_manager;
pub mod publication;
pub mod publisher;
pub mod resolver;
pub mod toolchain;
pub mod types;
pub mod upload;

// Re-export the main types for easier usage
pub use project_manager::{ProjectManager, ProjectManagerConfig};
pub use tokio_util::sync::CancellationToken;
pub use types::{KilnError, KilnResult};
