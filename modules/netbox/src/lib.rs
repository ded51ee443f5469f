//! NetBox CMDB devices.

use async_trait::async_trait;
use inventory_core::{record, Asset, AssetFields, InventorySource, RawRecord, SourceClient, SourceError, Transport};
use std::sync::Arc;

pub const NAME: &str = "netbox";
pub const DEFAULT_ENDPOINT: &str = "https://my.api.mockaroo.com/ironclad/netbox/inventory.json";

pub struct NetboxSource {
    client: SourceClient,
}

impl NetboxSource {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        NetboxSource { client: SourceClient::new(endpoint, transport) }
    }
}

#[async_trait]
impl InventorySource for NetboxSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn client(&self) -> &SourceClient {
        &self.client
    }

    fn normalize(&self, record: RawRecord) -> Result<Asset, SourceError> {
        let fields = AssetFields {
            asset_id: record::identifier(&record, "id"),
            hostname: record::text(&record, "device_name"),
            ip_address: record::text(&record, "primary_ip"),
            os: record::text(&record, "platform"),
            environment: record::text(&record, "environment"),
            owner_context: record::text(&record, "tenant"),
        };
        Asset::from_fields(NAME, fields, record)
    }
}
