//! Cacheable value contracts and keys.

mod key;
mod slot;

pub use key::{CacheKey, Identifier, KEY_SEPARATOR};
pub use slot::Slot;

/// In-place refresh of a shared instance.
///
/// Cached values are handed out as `Arc<T>`, so a merge copies the fields of
/// `fresh` onto `self` through interior mutability. Consistency of the
/// fields under concurrent readers is up to the implementor.
pub trait Mergeable: Send + Sync {
    fn merge(
        &self,
        fresh: Self,
    ) where
        Self: Sized;
}

/// A type that can be held by an [`IdentityCache`](crate::IdentityCache).
pub trait Cacheable: Mergeable + 'static {
    /// Logical type tag, the prefix of every [`CacheKey`] of this type.
    const TAG: &'static str;

    fn key(id: &Identifier) -> CacheKey {
        CacheKey::new(Self::TAG, id)
    }
}
