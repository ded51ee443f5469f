use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use crowdstrike::CrowdstrikeSource;
use inventory_core::{HttpTransport, Inventory, InventorySource, Transport, TransportSettings};
use netbox::NetboxSource;
use qualys::QualysSource;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG: &str = "inventory.yaml";
pub const DEFAULT_API_KEY_ENV: &str = "IRONCLAD_API_KEY";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub netbox: Option<SourceConfig>,
    pub qualys: Option<SourceConfig>,
    pub crowdstrike: Option<SourceConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub api_key_env: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub sources: Option<SourcesConfig>,
}

/// Load an explicit config file, or `./inventory.yaml` when it exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let cfg = parse_config(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(s)?)
}

/// The sources this build knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Netbox,
    Qualys,
    Crowdstrike,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Netbox, SourceKind::Qualys, SourceKind::Crowdstrike];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Netbox => netbox::NAME,
            SourceKind::Qualys => qualys::NAME,
            SourceKind::Crowdstrike => crowdstrike::NAME,
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            SourceKind::Netbox => netbox::DEFAULT_ENDPOINT,
            SourceKind::Qualys => qualys::DEFAULT_ENDPOINT,
            SourceKind::Crowdstrike => crowdstrike::DEFAULT_ENDPOINT,
        }
    }

    pub fn build(self, endpoint: &str, transport: Arc<dyn Transport>) -> Arc<dyn InventorySource> {
        match self {
            SourceKind::Netbox => Arc::new(NetboxSource::new(endpoint, transport)),
            SourceKind::Qualys => Arc::new(QualysSource::new(endpoint, transport)),
            SourceKind::Crowdstrike => Arc::new(CrowdstrikeSource::new(endpoint, transport)),
        }
    }

    fn section(self, sources: &SourcesConfig) -> Option<&SourceConfig> {
        match self {
            SourceKind::Netbox => sources.netbox.as_ref(),
            SourceKind::Qualys => sources.qualys.as_ref(),
            SourceKind::Crowdstrike => sources.crowdstrike.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub kind: SourceKind,
    pub url: String,
}

/// Resolved once at startup and handed to everything that needs it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key_env: String,
    pub transport: TransportSettings,
    pub sources: Vec<SourceEndpoint>,
}

impl Settings {
    /// Merge the optional file config with defaults. `env` looks up environment variables.
    pub fn resolve(cfg: Option<Config>, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
        let cfg = cfg.unwrap_or_default();
        let api_key_env = cfg.api_key_env.unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = env(&api_key_env).filter(|k| !k.is_empty());
        let defaults = TransportSettings::default();
        let timeout_ms = cfg.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be greater than zero"));
        }
        let transport = TransportSettings {
            api_key,
            timeout: Duration::from_millis(timeout_ms),
            user_agent: cfg.user_agent.unwrap_or(defaults.user_agent),
        };

        let sections = cfg.sources.unwrap_or_default();
        let mut sources = Vec::new();
        for kind in SourceKind::ALL {
            let section = kind.section(&sections).cloned().unwrap_or_default();
            if !section.enabled.unwrap_or(true) {
                continue;
            }
            let url = section.url.unwrap_or_else(|| kind.default_endpoint().to_string());
            Url::parse(&url).with_context(|| format!("invalid {} url: {url}", kind.name()))?;
            sources.push(SourceEndpoint { kind, url });
        }
        Ok(Settings { api_key_env, transport, sources })
    }

    /// Enabled sources, narrowed to `only` when it is non-empty.
    pub fn select(&self, only: &[SourceKind]) -> Vec<&SourceEndpoint> {
        self.sources
            .iter()
            .filter(|s| only.is_empty() || only.contains(&s.kind))
            .collect()
    }

    pub fn endpoint(&self, kind: SourceKind) -> Result<&SourceEndpoint> {
        self.sources
            .iter()
            .find(|s| s.kind == kind)
            .ok_or_else(|| anyhow!("source {} is disabled in the config", kind.name()))
    }

    pub fn http_transport(&self) -> Result<Arc<dyn Transport>> {
        if self.transport.api_key.is_none() {
            tracing::warn!("{} is not set; requests go out without an API key", self.api_key_env);
        }
        Ok(Arc::new(HttpTransport::new(&self.transport)?))
    }

    pub fn build_inventory(&self, only: &[SourceKind], transport: Arc<dyn Transport>) -> Result<Inventory> {
        let selected = self.select(only);
        if selected.is_empty() {
            return Err(anyhow!("no sources enabled"));
        }
        let mut inv = Inventory::new();
        for s in selected {
            inv.push(s.kind.build(&s.url, transport.clone()));
        }
        Ok(inv)
    }
}
