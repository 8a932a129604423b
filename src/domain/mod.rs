//! Domain layer - Core caching semantics and entities

pub mod cache;
pub mod error;
pub mod forecast;
pub mod report;
pub mod upstream;

pub use cache::{Cache, CacheExt, CacheKey, FragmentCache, Ttl, TtlClass, TtlPolicy, Validity};
pub use error::DomainError;
pub use forecast::{DangerMode, DangerRating, IconRatings, Region, RegionCatalog, RegionKind};
pub use report::{Clock, FormattedReport, RawNode, RawReport, RawUser, SystemClock};
pub use upstream::UpstreamClient;
