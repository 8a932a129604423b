//! Forecast service - cached region forecasts and danger-rating icons

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::domain::cache::{Cache, CacheExt, FragmentCache, TtlClass, TtlPolicy};
use crate::domain::forecast::{keys, DangerMode, IconRatings, Region, RegionCatalog, RegionKind};
use crate::domain::upstream::UpstreamClient;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct ForecastService {
    cache: Arc<dyn Cache>,
    fragments: FragmentCache,
    upstream: Arc<dyn UpstreamClient>,
    catalog: Arc<RegionCatalog>,
    ttl: TtlPolicy,
}

impl ForecastService {
    pub fn new(
        cache: Arc<dyn Cache>,
        upstream: Arc<dyn UpstreamClient>,
        catalog: Arc<RegionCatalog>,
        ttl: TtlPolicy,
    ) -> Self {
        let fragments = FragmentCache::new(cache.clone(), ttl.ttl(TtlClass::Fragment));

        Self {
            cache,
            fragments,
            upstream,
            catalog,
            ttl,
        }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    fn region(&self, id: &str) -> Result<&Region, DomainError> {
        self.catalog
            .find(id)
            .ok_or_else(|| DomainError::not_found(format!("Region '{}' not found", id)))
    }

    /// Forecast of one region, cached as an item
    ///
    /// Link and hot zone regions publish no forecast here and are not found.
    pub async fn region_forecast(&self, region_id: &str) -> Result<Value, DomainError> {
        let region = self.region(region_id)?;

        if !region.kind.has_upstream_forecast() {
            return Err(DomainError::not_found(format!(
                "Region '{}' has no forecast",
                region_id
            )));
        }

        self.upstream_forecast(region).await
    }

    /// Forecasts of every upstream-backed region, keyed by region id
    pub async fn all_forecasts(&self) -> Result<BTreeMap<String, Value>, DomainError> {
        let regions: Vec<&Region> = self.catalog.forecast_regions().collect();

        let forecasts = try_join_all(regions.iter().map(|r| self.upstream_forecast(r))).await?;

        Ok(regions
            .into_iter()
            .map(|r| r.id.clone())
            .zip(forecasts)
            .collect())
    }

    /// Danger icon for a region's current forecast
    pub async fn region_danger_icon(&self, region_id: &str) -> Result<String, DomainError> {
        let region = self.region(region_id)?;

        match region.kind {
            RegionKind::Link => self.render_icon(IconRatings::unrated()).await,
            RegionKind::Hotzone => Err(DomainError::not_found(format!(
                "Region '{}' has no danger ratings",
                region_id
            ))),
            RegionKind::Avalx | RegionKind::Parks => {
                let forecast = self.upstream_forecast(region).await?;
                let mode = DangerMode::of_forecast(&forecast)?;

                match mode.seasonal_icon() {
                    Some(icon) => {
                        debug!(region = %region_id, mode = %mode, "Serving seasonal danger icon");
                        Ok(icon.to_string())
                    }
                    None => self.render_icon(IconRatings::from_forecast(&forecast)?).await,
                }
            }
        }
    }

    /// Danger icon for explicit band codes (`0`..`5` or `n`)
    ///
    /// An invalid code is a render error and leaves nothing in the cache.
    /// Equivalent spellings (`N` and `n`, `01` and `1`) share one fragment.
    pub async fn danger_icon(&self, alp: &str, tln: &str, btl: &str) -> Result<String, DomainError> {
        let ratings = IconRatings::parse(alp, tln, btl)?;
        self.render_icon(ratings).await
    }

    async fn render_icon(&self, ratings: IconRatings) -> Result<String, DomainError> {
        self.fragments
            .wrap(&ratings.cache_key(), || Ok(ratings.render()))
            .await
    }

    async fn upstream_forecast(&self, region: &Region) -> Result<Value, DomainError> {
        let key = keys::region(&region.id);

        self.cache
            .wrap(key.as_str(), self.ttl.ttl(TtlClass::Item), || async {
                debug!(region = %region.id, "Fetching forecast");
                self.upstream
                    .fetch_json(&format!("/{}.json", region.id), &[])
                    .await
            })
            .await
    }
}
