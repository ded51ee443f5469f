//! Core types for the inventory aggregator: the canonical asset, the source adapter
//! contract and the orchestrator that drives every configured source.

mod asset;
mod error;
mod inventory;
pub mod record;
mod source;
mod transport;

pub use asset::{Asset, AssetFields};
pub use error::{SourceError, TransportError};
pub use inventory::{Inventory, InventoryReport, SourceOutcome, SourceReport};
pub use record::RawRecord;
pub use source::{InventorySource, SourceClient};
pub use transport::{
    parse_records, CannedTransport, HttpResponse, HttpTransport, Transport, TransportSettings,
    API_KEY_HEADER,
};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
