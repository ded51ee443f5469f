//! Qualys vulnerability scanner host assets.
//!
//! Qualys groups hosts into asset groups, which stand in for the environment. It has no
//! notion of an owner.

use async_trait::async_trait;
use inventory_core::{record, Asset, AssetFields, InventorySource, RawRecord, SourceClient, SourceError, Transport};
use std::sync::Arc;

pub const NAME: &str = "qualys";
pub const DEFAULT_ENDPOINT: &str = "https://my.api.mockaroo.com/ironclad/qualys/inventory.json";

pub struct QualysSource {
    client: SourceClient,
}

impl QualysSource {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        QualysSource { client: SourceClient::new(endpoint, transport) }
    }
}

#[async_trait]
impl InventorySource for QualysSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn client(&self) -> &SourceClient {
        &self.client
    }

    fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError> {
        let fields = AssetFields {
            asset_id: record::identifier(&record, "asset_id"),
            hostname: record::text(&record, "hostname"),
            ip_address: record::text(&record, "ip_address"),
            os: record::text(&record, "operating_system"),
            environment: record::text(&record, "asset_group"),
            owner_context: None,
        };
        Asset::from_fields(NAME, fields, record)
    }
}
