//! Replicated document handles
//!
//! - `replicated_doc`: Loro document wrapper with read and write (commit) scopes

pub mod replicated_doc;

pub use replicated_doc::*;
