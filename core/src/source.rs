use crate::asset::Asset;
use crate::error::SourceError;
use crate::record::RawRecord;
use crate::transport::{parse_records, Transport};
use async_trait::async_trait;
use std::sync::Arc;

/// Where a source lives and how to reach it.
#[derive(Clone)]
pub struct SourceClient {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl SourceClient {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        SourceClient { endpoint: endpoint.into(), transport }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// An upstream inventory system that yields hosts.
///
/// Implementors supply their name, their client and the field mapping in [`normalize`];
/// fetching and batch normalization are shared.
///
/// [`normalize`]: InventorySource::normalize
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Stamped onto every asset as its `source`.
    fn name(&self) -> &'static str;

    fn client(&self) -> &SourceClient;

    /// Map one upstream record onto the canonical asset. Missing keys become absent fields;
    /// only a record without a usable identifier is rejected.
    fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError>;

    async fn fetch_raw(&self) -> Result<Vec<RawRecord>, SourceError> {
        let client = self.client();
        let response = client
            .transport
            .get(&client.endpoint)
            .await
            .map_err(|error| SourceError::Transport { source_name: self.name().to_string(), error })?;
        parse_records(self.name(), response)
    }

    /// Fetch and normalize every record in order. One bad record fails the whole batch.
    async fn fetch_assets(&self) -> Result<Vec<Asset>, SourceError> {
        let records = self.fetch_raw().await?;
        let mut assets = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            match self.normalize(record) {
                Ok(a) => assets.push(a),
                Err(e) => {
                    tracing::debug!(source = self.name(), record = i, "normalization failed: {e}");
                    return Err(e);
                }
            }
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetFields;
    use crate::record;
    use crate::transport::CannedTransport;

    struct Fake {
        client: SourceClient,
    }

    impl Fake {
        fn with(t: CannedTransport) -> Self {
            Fake { client: SourceClient::new("http://fake.local/inventory", Arc::new(t)) }
        }
    }

    #[async_trait]
    impl InventorySource for Fake {
        fn name(&self) -> &'static str { "fake" }
        fn client(&self) -> &SourceClient { &self.client }
        fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError> {
            let fields = AssetFields {
                asset_id: record::identifier(&record, "key"),
                hostname: record::text(&record, "host"),
                ..Default::default()
            };
            Asset::from_fields(self.name(), fields, record)
        }
    }

    #[tokio::test]
    async fn fetch_assets_preserves_order() {
        let src = Fake::with(CannedTransport::ok(r#"[{"key":3,"host":"c"},{"key":1,"host":"a"},{"key":2}]"#));
        let assets = src.fetch_assets().await.unwrap();
        let ids: Vec<_> = assets.iter().map(|a| a.asset_id()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert!(assets.iter().all(|a| a.source() == "fake"));
        assert_eq!(assets[2].hostname(), "");
    }

    #[tokio::test]
    async fn one_bad_record_fails_the_batch() {
        let src = Fake::with(CannedTransport::ok(r#"[{"key":1},{"host":"no-id"}]"#));
        let err = src.fetch_assets().await.unwrap_err();
        assert_eq!(err.kind(), "normalize");
    }

    #[tokio::test]
    async fn http_error_yields_fetch_error() {
        let src = Fake::with(CannedTransport::status(503, "maintenance"));
        let err = src.fetch_assets().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "fake fetch failed (503): maintenance");
    }

    #[tokio::test]
    async fn object_payload_yields_schema_error() {
        let src = Fake::with(CannedTransport::ok(r#"{"key":1}"#));
        assert_eq!(src.fetch_assets().await.unwrap_err().kind(), "schema");
    }

    #[tokio::test]
    async fn transport_failure_names_source() {
        let src = Fake::with(CannedTransport::unreachable("connection refused"));
        let err = src.fetch_raw().await.unwrap_err();
        assert_eq!(err.to_string(), "fake request failed: connection refused");
    }
}
