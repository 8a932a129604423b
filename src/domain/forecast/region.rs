//! Forecast regions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a region's forecast is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Forecast served by the forecast upstream
    Avalx,
    /// Parks Canada forecast, also served by the forecast upstream
    Parks,
    /// Forecast published elsewhere; only a link is known
    Link,
    /// Hot zone with static properties
    Hotzone,
}

impl RegionKind {
    pub fn has_upstream_forecast(&self) -> bool {
        matches!(self, RegionKind::Avalx | RegionKind::Parks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub kind: RegionKind,
    /// External forecast URL (link regions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Static properties (hot zones)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

/// The set of regions known for the current season
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn find(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Regions whose forecast comes from the forecast upstream
    pub fn forecast_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.kind.has_upstream_forecast())
    }
}
