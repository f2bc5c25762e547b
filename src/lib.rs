//! # idcache
//!
//! An identity-preserving, two-tier object cache.
//!
//! A short-lived "hard" cache with per-entry expiry sits over a weak identity
//! registry and a caller-supplied loader. For any key, every concurrent
//! consumer observes the same `Arc<T>`: when the hard entry decays the loader
//! runs again and its output is merged into the instance that is still alive,
//! instead of handing out a second copy.
//!
//! ## Core Features
//!
//! - **Identity**: at most one live instance per key, shared by all holders
//! - **Bounded load frequency**: at most one load per key per ttl
//! - **In-place refresh**: reloads and pushed updates merge into the live instance
//! - **Non-owning registry**: the weak tier never keeps values alive and is swept lazily
//! - **Async loaders**: per-key load coalescing without holding the type lock across awaits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use idcache::{CacheRegistryBuilder, Cacheable, Identifier, Mergeable, Slot};
//!
//! let registry = CacheRegistryBuilder::new().build()?;
//! let customers = registry.cache::<Customer>();
//!
//! let customer = customers.get(42, 60, Some(|id: &Identifier| repo.load(id)))?;
//! customers.push_update(42, changed_customer);
//! ```

mod builder;
mod cache;
mod common;
mod config;
mod error;
mod model;
mod registry;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::CacheRegistryBuilder;
pub use cache::{CacheStats, IdentityCache, SweepScheduler};
pub use common::{DecayStore, WeakRegistry};
pub use config::CacheConfig;
pub use error::IdCacheError;
pub use model::*;
pub use registry::CacheRegistry;
pub use utils::time::{Clock, ManualClock, SystemClock};

/// Result type alias for idcache operations.
pub type Result<T> = std::result::Result<T, IdCacheError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
