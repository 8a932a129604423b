//! Mountain conditions report aggregation

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::cache::{Cache, CacheExt, Ttl, TtlClass, TtlPolicy};
use crate::domain::report::{
    format_report, is_recent, keys, Availability, Clock, FormattedReport, RawNode, RawReport,
    RawUser, SkipReason, SystemClock, SENTINEL_OWNER_ID,
};
use crate::domain::upstream::UpstreamClient;
use crate::domain::DomainError;

/// `report_type` values of the two list partitions
const LIST_PARTITIONS: [u8; 2] = [5, 3];

/// `report_type` sent with report detail requests
const DETAIL_REPORT_TYPE: u8 = 5;

/// Configuration for report aggregation
#[derive(Debug, Clone)]
pub struct ReportServiceConfig {
    /// Recency window in days
    pub limit_days: i64,
    /// Report/user pairs fetched concurrently while building the list
    pub fetch_concurrency: usize,
    pub ttl: TtlPolicy,
}

impl Default for ReportServiceConfig {
    fn default() -> Self {
        Self {
            limit_days: 7,
            fetch_concurrency: 8,
            ttl: TtlPolicy::default(),
        }
    }
}

/// Builds report lists and details from cached upstream calls
pub struct ReportService {
    cache: Arc<dyn Cache>,
    upstream: Arc<dyn UpstreamClient>,
    clock: Arc<dyn Clock>,
    config: ReportServiceConfig,
}

impl fmt::Debug for ReportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportService")
            .field("cache", &self.cache)
            .field("upstream", &self.upstream.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ReportService {
    pub fn new(
        cache: Arc<dyn Cache>,
        upstream: Arc<dyn UpstreamClient>,
        config: ReportServiceConfig,
    ) -> Self {
        Self {
            cache,
            upstream,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replaces the wall clock used for the recency window
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn ttl(&self, class: TtlClass) -> Ttl {
        self.config.ttl.ttl(class)
    }

    /// Recent reports, newest first
    pub async fn get_list(&self) -> Result<Vec<FormattedReport>, DomainError> {
        let key = keys::format_list();

        self.cache
            .wrap(key.as_str(), self.ttl(TtlClass::List), || self.build_list())
            .await
    }

    /// One report joined with its owner
    ///
    /// Unlike the list, any failure here fails the request.
    pub async fn get_item(&self, id: u64) -> Result<FormattedReport, DomainError> {
        let id = id.to_string();
        let key = keys::report_full(&id);

        self.cache
            .wrap(key.as_str(), self.ttl(TtlClass::Item), || async {
                let report = self.report(&id).await?;

                let owner = report
                    .uid
                    .clone()
                    .ok_or_else(|| DomainError::parse(format!("Report {} has no owner", id)))?;
                if owner == SENTINEL_OWNER_ID {
                    return Err(DomainError::unavailable(format!(
                        "Report {} is not owned by a real user",
                        id
                    )));
                }

                let user = self.user(&owner).await?;

                format_report(&report, &user).ok_or_else(|| {
                    DomainError::parse(format!("Report {} is missing required fields", id))
                })
            })
            .await
    }

    /// Drops the cached list and the raw node list
    pub async fn invalidate_list(&self) -> Result<usize, DomainError> {
        let mut removed = 0;

        for key in [keys::format_list(), keys::node_list()] {
            if self.cache.delete(key.as_str()).await? {
                removed += 1;
            }
        }

        info!(removed = removed, "Invalidated report list");
        Ok(removed)
    }

    /// Drops every cached entry of one report, and the list that contains it
    pub async fn invalidate_report(&self, id: u64) -> Result<usize, DomainError> {
        let id = id.to_string();
        let mut removed = self.cache.delete_pattern(&keys::report_pattern(&id)).await?;

        if self.cache.delete(keys::format_list().as_str()).await? {
            removed += 1;
        }

        info!(report_id = %id, removed = removed, "Invalidated report");
        Ok(removed)
    }

    async fn build_list(&self) -> Result<Vec<FormattedReport>, DomainError> {
        let nodes = self.node_list().await?;
        let total = nodes.len();
        let now = self.clock.now();

        let outcomes: Vec<(String, Result<Availability<FormattedReport>, DomainError>)> =
            stream::iter(nodes)
                .map(|node| async move {
                    let nid = node.nid.clone();
                    (nid, self.report_for_node(node).await)
                })
                .buffered(self.config.fetch_concurrency.max(1))
                .collect()
                .await;

        let mut reports: Vec<FormattedReport> = outcomes
            .into_iter()
            .filter_map(|(nid, outcome)| match outcome {
                Ok(Availability::Available(report)) => Some(report),
                Ok(Availability::Unavailable(reason)) => {
                    match reason {
                        SkipReason::SentinelOwner => {
                            warn!(nid = %nid, "Skipping report owned by sentinel user")
                        }
                        SkipReason::Unformattable => {
                            debug!(nid = %nid, reason = %reason, "Skipping report")
                        }
                    }
                    None
                }
                Err(e) => {
                    warn!(nid = %nid, error = %e, "Dropping report from list");
                    None
                }
            })
            .filter(|report| is_recent(report, now, self.config.limit_days))
            .collect();

        reports.sort_by(|a, b| b.dates.first().cmp(&a.dates.first()));

        debug!(nodes = total, returned = reports.len(), "Built report list");
        Ok(reports)
    }

    async fn report_for_node(
        &self,
        node: RawNode,
    ) -> Result<Availability<FormattedReport>, DomainError> {
        if node.has_sentinel_owner() {
            return Ok(Availability::Unavailable(SkipReason::SentinelOwner));
        }

        let (report, user) = futures::try_join!(self.report(&node.nid), self.user(&node.uid))?;

        Ok(match format_report(&report, &user) {
            Some(formatted) => Availability::Available(formatted),
            None => Availability::Unavailable(SkipReason::Unformattable),
        })
    }

    async fn node_list(&self) -> Result<Vec<RawNode>, DomainError> {
        let key = keys::node_list();

        self.cache
            .wrap(key.as_str(), self.ttl(TtlClass::List), || async {
                let (featured, standard) = futures::try_join!(
                    self.fetch_partition(LIST_PARTITIONS[0]),
                    self.fetch_partition(LIST_PARTITIONS[1])
                )?;

                let mut nodes = featured;
                nodes.extend(standard);
                Ok::<_, DomainError>(nodes)
            })
            .await
    }

    async fn fetch_partition(&self, report_type: u8) -> Result<Vec<RawNode>, DomainError> {
        let query = [("report_type", report_type.to_string())];
        let body = self.upstream.fetch_json("/node.json", &query).await?;

        if body.is_null() {
            warn!(report_type = report_type, "Upstream returned an empty node list");
            return Ok(Vec::new());
        }

        let entries: Vec<serde_json::Value> =
            decode(body, || format!("node list (report_type={})", report_type))?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<RawNode>(entry) {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!(
                        report_type = report_type,
                        error = %e,
                        "Dropping malformed node list entry"
                    );
                    None
                }
            })
            .collect())
    }

    async fn report(&self, id: &str) -> Result<RawReport, DomainError> {
        let key = keys::report(id);

        self.cache
            .wrap(key.as_str(), self.ttl(TtlClass::Item), || async {
                debug!(report_id = %id, "Fetching report");
                let query = [("report_type", DETAIL_REPORT_TYPE.to_string())];
                let body = self
                    .upstream
                    .fetch_json(&format!("/node/{}.json", id), &query)
                    .await?;
                decode::<RawReport, _>(body, || format!("report {}", id))
            })
            .await
    }

    async fn user(&self, id: &str) -> Result<RawUser, DomainError> {
        let key = keys::user(id);

        self.cache
            .wrap(key.as_str(), self.ttl(TtlClass::Item), || async {
                debug!(user_id = %id, "Fetching user");
                let body = self
                    .upstream
                    .fetch_json(&format!("/user/{}.json", id), &[])
                    .await?;
                decode::<RawUser, _>(body, || format!("user {}", id))
            })
            .await
    }
}

fn decode<T, F>(body: serde_json::Value, what: F) -> Result<T, DomainError>
where
    T: DeserializeOwned,
    F: FnOnce() -> String,
{
    serde_json::from_value(body).map_err(|e| DomainError::parse(format!("Invalid {}: {}", what(), e)))
}
