//! Drives every configured source and gathers the results into one report.

use crate::asset::Asset;
use crate::error::SourceError;
use crate::source::InventorySource;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinHandle};

#[derive(Default, Clone)]
pub struct Inventory {
    sources: Vec<Arc<dyn InventorySource>>,
}

#[derive(Debug)]
pub enum SourceOutcome {
    Collected(usize),
    Failed(SourceError),
    /// The fetch task died before reporting (panic or cancellation).
    Aborted(String),
}

#[derive(Debug)]
pub struct SourceReport {
    pub source: &'static str,
    pub outcome: SourceOutcome,
    pub elapsed: Duration,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Collected(_))
    }

    /// Short operator-facing status: the asset count or the failure diagnostic.
    pub fn describe(&self) -> String {
        match &self.outcome {
            SourceOutcome::Collected(n) => format!("{n} assets"),
            SourceOutcome::Failed(e) => e.to_string(),
            SourceOutcome::Aborted(msg) => format!("{} aborted: {msg}", self.source),
        }
    }

    /// Like [`describe`](Self::describe) but without the source name.
    pub fn detail(&self) -> String {
        match &self.outcome {
            SourceOutcome::Collected(n) => format!("{n} assets"),
            SourceOutcome::Failed(e) => e.detail(),
            SourceOutcome::Aborted(msg) => format!("aborted: {msg}"),
        }
    }
}

/// Assets from every source that answered, plus one status entry per source.
#[derive(Debug, Default)]
pub struct InventoryReport {
    assets: Vec<Asset>,
    sources: Vec<SourceReport>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn InventorySource>) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: Arc<dyn InventorySource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch each source in turn. A failing or panicking source is recorded and skipped.
    pub async fn collect(&self) -> InventoryReport {
        let mut report = InventoryReport::default();
        for source in &self.sources {
            let name = source.name();
            let result = spawn_fetch(source.clone()).await;
            report.finish(name, result);
        }
        report
    }

    /// Fetch all sources at once, one task per source. Results keep registration order.
    pub async fn collect_concurrent(&self) -> InventoryReport {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| (source.name(), spawn_fetch(source.clone())))
            .collect();
        let mut report = InventoryReport::default();
        for (name, handle) in handles {
            report.finish(name, handle.await);
        }
        report
    }
}

type FetchResult = (Result<Vec<Asset>, SourceError>, Duration);

// Each source runs in its own task so a panic inside an adapter only takes that source down.
fn spawn_fetch(source: Arc<dyn InventorySource>) -> JoinHandle<FetchResult> {
    tokio::spawn(async move {
        let started = Instant::now();
        let result = source.fetch_assets().await;
        (result, started.elapsed())
    })
}

impl InventoryReport {
    fn finish(&mut self, source: &'static str, joined: Result<FetchResult, JoinError>) {
        match joined {
            Ok((result, elapsed)) => self.record(source, result, elapsed),
            Err(e) => {
                tracing::warn!(source, "fetch task failed: {e}");
                self.sources.push(SourceReport {
                    source,
                    outcome: SourceOutcome::Aborted(e.to_string()),
                    elapsed: Duration::ZERO,
                });
            }
        }
    }

    fn record(&mut self, source: &'static str, result: Result<Vec<Asset>, SourceError>, elapsed: Duration) {
        let outcome = match result {
            Ok(mut assets) => {
                tracing::info!(source, count = assets.len(), elapsed_ms = elapsed.as_millis() as u64, "collected");
                let n = assets.len();
                self.assets.append(&mut assets);
                SourceOutcome::Collected(n)
            }
            Err(e) => {
                tracing::warn!(source, kind = e.kind(), "{e}");
                SourceOutcome::Failed(e)
            }
        };
        self.sources.push(SourceReport { source, outcome, elapsed });
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }

    pub fn sources(&self) -> &[SourceReport] {
        &self.sources
    }

    pub fn search(&self, query: &str) -> Vec<&Asset> {
        self.assets.iter().filter(|a| a.matches(query)).collect()
    }

    /// Asset count per source that answered.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.sources
            .iter()
            .filter_map(|s| match s.outcome {
                SourceOutcome::Collected(n) => Some((s.source, n)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.is_ok())
    }

    /// True when every source answered.
    pub fn is_complete(&self) -> bool {
        self.sources.iter().all(SourceReport::is_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetFields;
    use crate::record::{self, RawRecord};
    use crate::source::SourceClient;
    use crate::transport::CannedTransport;
    use async_trait::async_trait;

    struct Named {
        name: &'static str,
        client: SourceClient,
    }

    #[async_trait]
    impl InventorySource for Named {
        fn name(&self) -> &'static str { self.name }
        fn client(&self) -> &SourceClient { &self.client }
        fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError> {
            let fields = AssetFields {
                asset_id: record::identifier(&record, "id"),
                hostname: record::text(&record, "host"),
                ..Default::default()
            };
            Asset::from_fields(self.name, fields, record)
        }
    }

    fn source(name: &'static str, t: CannedTransport) -> Arc<dyn InventorySource> {
        Arc::new(Named { name, client: SourceClient::new(format!("http://{name}.local"), Arc::new(t)) })
    }

    fn inventory() -> Inventory {
        Inventory::new()
            .with_source(source("alpha", CannedTransport::ok(r#"[{"id":1,"host":"web01"},{"id":2,"host":"db01"}]"#)))
            .with_source(source("beta", CannedTransport::status(503, "unavailable")))
            .with_source(source("gamma", CannedTransport::ok(r#"[{"id":1,"host":"WEB02"}]"#)))
    }

    fn check(report: &InventoryReport) {
        assert_eq!(report.assets().len(), 3);
        let order: Vec<_> = report.sources().iter().map(|s| s.source).collect();
        assert_eq!(order, ["alpha", "beta", "gamma"]);
        assert!(!report.is_complete());

        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, "beta");
        match &failed[0].outcome {
            SourceOutcome::Failed(e) => assert_eq!(e.status(), Some(503)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(failed[0].describe(), "beta fetch failed (503): unavailable");
        assert_eq!(failed[0].detail(), "fetch failed (503): unavailable");

        let counts = report.counts();
        assert_eq!(counts.get("alpha"), Some(&2));
        assert_eq!(counts.get("gamma"), Some(&1));
        assert_eq!(counts.get("beta"), None);
    }

    #[tokio::test]
    async fn sequential_collect_tolerates_failures() {
        check(&inventory().collect().await);
    }

    #[tokio::test]
    async fn concurrent_collect_matches_sequential() {
        let report = inventory().collect_concurrent().await;
        check(&report);
        let ids: Vec<_> = report.assets().iter().map(|a| a.identity()).collect();
        assert_eq!(ids, [("alpha", "1"), ("alpha", "2"), ("gamma", "1")]);
    }

    #[tokio::test]
    async fn search_spans_sources() {
        let report = inventory().collect().await;
        let hits: Vec<_> = report.search("web").iter().map(|a| a.source()).collect();
        assert_eq!(hits, ["alpha", "gamma"]);
        assert!(report.search("nothing-like-this").is_empty());
    }

    struct Panicky {
        client: SourceClient,
    }

    #[async_trait]
    impl InventorySource for Panicky {
        fn name(&self) -> &'static str { "panicky" }
        fn client(&self) -> &SourceClient { &self.client }
        fn normalize(&self, _record: RawRecord) -> Result<Asset, SourceError> {
            panic!("adapter bug");
        }
    }

    fn with_panicking_source() -> Inventory {
        let panicky = Panicky { client: SourceClient::new("http://panicky.local", Arc::new(CannedTransport::ok(r#"[{"id":1}]"#))) };
        Inventory::new()
            .with_source(source("alpha", CannedTransport::ok(r#"[{"id":1,"host":"web01"}]"#)))
            .with_source(Arc::new(panicky))
            .with_source(source("gamma", CannedTransport::ok(r#"[{"id":2,"host":"db01"}]"#)))
    }

    fn check_panic_isolated(report: &InventoryReport) {
        let ids: Vec<_> = report.assets().iter().map(|a| a.identity()).collect();
        assert_eq!(ids, [("alpha", "1"), ("gamma", "2")]);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, "panicky");
        assert!(matches!(failed[0].outcome, SourceOutcome::Aborted(_)));
        assert!(failed[0].describe().starts_with("panicky aborted"));
        assert_eq!(report.counts().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_collect_isolates_panicking_source() {
        check_panic_isolated(&with_panicking_source().collect_concurrent().await);
    }

    #[tokio::test]
    async fn sequential_collect_isolates_panicking_source() {
        check_panic_isolated(&with_panicking_source().collect().await);
    }

    #[tokio::test]
    async fn empty_inventory_is_complete() {
        let inv = Inventory::new();
        assert!(inv.is_empty());
        let report = inv.collect_concurrent().await;
        assert!(report.is_complete());
        assert!(report.into_assets().is_empty());
    }
}
