//! # Larder Core
//!
//! Domain model and observable cache store for larder.
//!
//! This crate provides:
//! - The [`Recipe`] entity cached from the remote source
//! - The [`Resource`] tagged state emitted for one logical request
//! - The [`RecipeStore`] cache interface with live (re-emitting) queries
//! - An in-memory store implementation with change notifications
//!
//! ## Key Invariants
//!
//! - A live query emits its current value immediately on subscription
//!   and re-emits after every committed write
//! - `upsert` never overwrites an existing row; it reports a conflict
//!   so callers can fall back to a partial update
//! - Dropping a [`CacheSubscription`] unregisters its watcher before
//!   the next commit is observed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod recipe;
mod resource;
mod store;

pub use error::{StoreError, StoreResult};
pub use recipe::{now_epoch_secs, Recipe};
pub use resource::Resource;
pub use store::{
    CacheSubscription, MemoryRecipeStore, RecipeStore, UpsertOutcome, WatchGuard,
    RESULTS_PER_PAGE,
};
