use crate::error::SourceError;
use crate::record::RawRecord;
use serde::Serialize;
use std::fmt;

/// Normalized fields an adapter extracts from one raw record.
///
/// Every field defaults to `None`, so adapters only name what their source provides:
/// `AssetFields { asset_id, hostname, ..Default::default() }`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetFields {
    pub asset_id: Option<String>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub os: Option<String>,
    pub environment: Option<String>,
    pub owner_context: Option<String>,
}

/// One host as seen by one source.
///
/// `(source, asset_id)` identifies an asset; ids are only unique within a single source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    asset_id: String,
    hostname: String,
    ip_address: Option<String>,
    os: Option<String>,
    environment: Option<String>,
    owner_context: Option<String>,
    source: String,
    raw: RawRecord,
}

impl Asset {
    /// Build an asset for `source`. Fails when no usable identifier was found.
    pub fn from_fields(source: &str, fields: AssetFields, raw: RawRecord) -> Result<Asset, SourceError> {
        if source.trim().is_empty() {
            return Err(SourceError::Normalization {
                source_name: "unknown".into(),
                reason: "asset has no source name".into(),
            });
        }
        let asset_id = match fields.asset_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                return Err(SourceError::Normalization {
                    source_name: source.to_string(),
                    reason: "record has no usable asset identifier".into(),
                })
            }
        };
        Ok(Asset {
            asset_id,
            hostname: fields.hostname.unwrap_or_default(),
            ip_address: fields.ip_address,
            os: fields.os,
            environment: fields.environment,
            owner_context: fields.owner_context,
            source: source.to_string(),
            raw,
        })
    }

    pub fn asset_id(&self) -> &str { &self.asset_id }
    pub fn hostname(&self) -> &str { &self.hostname }
    pub fn ip_address(&self) -> Option<&str> { self.ip_address.as_deref() }
    pub fn os(&self) -> Option<&str> { self.os.as_deref() }
    pub fn environment(&self) -> Option<&str> { self.environment.as_deref() }
    pub fn owner_context(&self) -> Option<&str> { self.owner_context.as_deref() }
    pub fn source(&self) -> &str { &self.source }

    /// The upstream record this asset was built from, untouched.
    pub fn raw(&self) -> &RawRecord { &self.raw }

    /// `(source, asset_id)`
    pub fn identity(&self) -> (&str, &str) {
        (&self.source, &self.asset_id)
    }

    /// Case-insensitive substring search over every identifying and descriptive field.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        [
            self.asset_id.as_str(),
            self.hostname.as_str(),
            self.ip_address().unwrap_or(""),
            self.os().unwrap_or(""),
            self.environment().unwrap_or(""),
            self.owner_context().unwrap_or(""),
            self.source.as_str(),
        ]
        .iter()
        .any(|v| v.to_lowercase().contains(&q))
    }

    /// Single-line rendering shared by every source: `[source] host ip=.. os=.. env=.. owner=..`.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} ip={} os={} env={} owner={}",
            self.source,
            self.hostname,
            or_na(self.ip_address()),
            or_na(self.os()),
            or_na(self.environment()),
            or_na(self.owner_context()),
        )
    }
}

fn or_na(v: Option<&str>) -> &str {
    match v {
        Some(s) if !s.is_empty() => s,
        _ => "n/a",
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
