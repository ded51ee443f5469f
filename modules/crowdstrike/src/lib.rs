//! CrowdStrike Falcon sensor hosts.

use async_trait::async_trait;
use inventory_core::{record, Asset, AssetFields, InventorySource, RawRecord, SourceClient, SourceError, Transport};
use std::sync::Arc;

pub const NAME: &str = "crowdstrike";
pub const DEFAULT_ENDPOINT: &str = "https://my.api.mockaroo.com/ironclad/crowdstrike/inventory.json";

pub struct CrowdstrikeSource {
    client: SourceClient,
}

impl CrowdstrikeSource {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        CrowdstrikeSource { client: SourceClient::new(endpoint, transport) }
    }
}

#[async_trait]
impl InventorySource for CrowdstrikeSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn client(&self) -> &SourceClient {
        &self.client
    }

    // Sensors carry no environment; the logged-in user is the closest thing to an owner.
    fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError> {
        let fields = AssetFields {
            asset_id: record::identifier(&record, "sensor_id"),
            hostname: record::text(&record, "hostname"),
            ip_address: record::text(&record, "local_ip"),
            os: record::text(&record, "os_version"),
            environment: None,
            owner_context: record::text(&record, "logged_in_user"),
        };
        Asset::from_fields(NAME, fields, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_core::CannedTransport;

    fn source(t: CannedTransport) -> CrowdstrikeSource {
        CrowdstrikeSource::new("http://falcon.local/hosts", Arc::new(t))
    }

    #[tokio::test]
    async fn maps_sensor_fields() {
        let body = r#"[{"sensor_id":"a1b2","hostname":"LAPTOP-7","local_ip":"10.1.2.3","os_version":"Windows 11","logged_in_user":"jdoe","environment":"prod"}]"#;
        let assets = source(CannedTransport::ok(body)).fetch_assets().await.unwrap();
        let a = &assets[0];
        assert_eq!(a.identity(), (NAME, "a1b2"));
        assert_eq!(a.hostname(), "LAPTOP-7");
        assert_eq!(a.ip_address(), Some("10.1.2.3"));
        assert_eq!(a.os(), Some("Windows 11"));
        assert_eq!(a.owner_context(), Some("jdoe"));
        assert_eq!(a.environment(), None);
        assert_eq!(a.summary(), "[crowdstrike] LAPTOP-7 ip=10.1.2.3 os=Windows 11 env=n/a owner=jdoe");
    }

    #[tokio::test]
    async fn numeric_sensor_id_becomes_string() {
        let assets = source(CannedTransport::ok(r#"[{"sensor_id":90210}]"#)).fetch_assets().await.unwrap();
        assert_eq!(assets[0].asset_id(), "90210");
    }

    #[tokio::test]
    async fn non_object_record_is_schema_error() {
        let err = source(CannedTransport::ok(r#"["a1b2"]"#)).fetch_assets().await.unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let err = source(CannedTransport::unreachable("dns error")).fetch_assets().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert_eq!(err.to_string(), "crowdstrike request failed: dns error");
    }
}
