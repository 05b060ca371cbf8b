//! strata CLI library
//!
//! Exposes the clap-backed [`ArgSections`] source for applications that
//! register their own options in titled help sections, and the entry
//! point for the `strata` inspection binary.

mod args;
mod cli;

pub use args::{ArgSections, SectionWriter, CONFIG_SECTION, GENERIC_SECTION};
pub use cli::run;
