//! # stackgen_templates
//!
//! Placeholder templates for stackgen.
//!
//! A [`FileTemplate`] is bound to a template source and collects two kinds
//! of values before it is rendered:
//!
//! - **Variables**: scalar values substituted at `${name}`
//! - **Sections**: ordered blocks of text spliced in at `${section:name}`
//!
//! Rendering fails when a `${name}` placeholder has no variable. Section
//! placeholders that never received a block render as empty text.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackgen_templates::FileTemplate;
//!
//! let mut template = FileTemplate::new(std::path::Path::new("assets/nginx/nginx.conf.template"));
//! template
//!     .add_variable("client_max_body_size", "8M")
//!     .add_section_from_file("server", "assets/nginx/nginx-https.conf")
//!     .unwrap();
//!
//! template.render_to_file("/etc/nginx/nginx.conf").unwrap();
//! ```

pub mod error;
pub mod placeholder;
pub mod template;

pub use error::{TemplateError, TemplateResult};
pub use placeholder::{Placeholder, SECTION_NAMESPACE};
pub use template::{FileTemplate, TemplateSource};
