// SPDX-License-Identifier: PMPL-1.0-or-later

//! site-localize: translation and path synchronization for static sites.
//!
//! The engine substitutes translated text into HTML pages without
//! reformatting them, and keeps file names, directory names and internal
//! links consistent with the chosen language or with language-neutral
//! concept identifiers.
//!
//! COMPONENTS:
//! 1. **normalize**: canonical forms used to match observed text to table keys.
//! 2. **table**: translation, identifier and unresolved-concept tables.
//! 3. **markup**: lossless token walk with text and attribute substitution.
//! 4. **paths**: segment mapping, link rewriting and rename plans.
//! 5. **localize**: orchestration over a whole tree.

pub mod check;
pub mod config;
pub mod error;
pub mod lang;
pub mod localize;
pub mod markup;
pub mod normalize;
pub mod paths;
pub mod report;
pub mod resolve;
pub mod table;
pub mod types;

pub use config::LocalizeConfig;
pub use error::LocalizeError;
pub use localize::{Destination, Job, Localizer};
pub use paths::SegmentRule;
pub use types::{ConceptId, MissingSet, RunReport};
