//! Avalanche forecasts

mod danger;
mod region;

pub use danger::{DangerMode, DangerRating, IconRatings};
pub use region::{Region, RegionCatalog, RegionKind};

use crate::domain::cache::CacheKey;

pub mod keys {
    use super::*;

    pub fn region(id: &str) -> CacheKey {
        CacheKey::builder("forecast")
            .segment("region")
            .segment(id)
            .build()
    }
}
