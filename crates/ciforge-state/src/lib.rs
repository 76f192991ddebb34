//! ciforge-state — persistence for deployment config records and assets.
//!
//! Backed by [redb](https://docs.rs/redb). Each store handle is scoped to one
//! deployment name; the record is JSON-serialized into the `configs` table
//! and named byte blobs (director state, director credentials) live in the
//! `assets` table under `{deployment}/{asset}` keys.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{ConfigStore, RedbConfigStore};
