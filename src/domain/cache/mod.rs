//! Cache domain - get-or-populate memoization with per-entry expiry

mod fragment;
mod key;
mod repository;
mod ttl;

pub use fragment::FragmentCache;
pub use key::{key_label, CacheKey, CacheKeyBuilder};
pub(crate) use repository::glob_to_regex;
pub use repository::{Cache, CacheExt};
pub use ttl::{Ttl, TtlClass, TtlPolicy, Validity};

#[cfg(test)]
pub use repository::mock;
