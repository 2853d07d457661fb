//! # stackgen_core
//!
//! Build options and config composition for stackgen.
//!
//! This crate decides which variables and sections go into each generated
//! config file and performs the filesystem side effects of a build.
//!
//! # Architecture
//!
//! - **Options**: Typed build options with production and dev defaults
//! - **Layout**: Template sources, destination paths and an optional root prefix
//! - **Builder**: Per-artifact composition policy and the build run itself
//!
//! # Example
//!
//! ```rust,no_run
//! use stackgen_core::{BuildLayout, Builder, OptionOverrides};
//!
//! let options = OptionOverrides {
//!     port: Some(9090),
//!     https: Some(true),
//!     ..Default::default()
//! }
//! .resolve();
//!
//! let report = Builder::new(options, BuildLayout::new("assets")).run()?;
//! println!("wrote {} files", report.written.len());
//! # Ok::<(), stackgen_core::BuildError>(())
//! ```

pub mod builder;
pub mod error;
pub mod layout;
pub mod options;

pub use builder::{BuildPlan, BuildReport, Builder, FpmSizing};
pub use error::{BuildError, BuildResult};
pub use layout::{Artifact, BuildLayout, ExtensionPaths, OutputPaths};
pub use options::{BuildOptions, Extension, OptionOverrides, DEFAULT_PORT, DISABLED_PATH};
