//! URL handling module for Spidey
//!
//! Canonical URLs are the identity of a page: every URL is passed through
//! [`canonicalize`] before it is compared against the visited set, queued,
//! or written to the store.

mod canonicalize;

pub use canonicalize::{canonicalize, default_port};
