//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use shopfront_cache::Cache;
use shopfront_commerce::cart::BasketSession;
use shopfront_commerce::catalog::Product;
use shopfront_commerce::checkout::CheckoutOrchestrator;
use shopfront_commerce::recovery::RecoveryStore;
use shopfront_data::{FetchClient, HttpCommerceApi, HttpPaymentApi, TimeoutConfig};

use crate::config::CliConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["shopfront.toml", ".shopfront.toml", "shopfront.json"];
const SESSION_FILE: &str = "session.json";

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((path, config)) => {
                    output.debug(&format!("Using config {}", path.display()));
                    config
                }
                None => {
                    output.debug("No config file found; using defaults");
                    CliConfig::default()
                }
            }
        };

        Ok(Self {
            config: config.with_env_overrides(),
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(PathBuf, CliConfig)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    match CliConfig::load(config_path.to_str()?) {
                        Ok(config) => return Some((config_path, config)),
                        Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "skipping config"),
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Directory holding basket and recovery state.
    pub fn state_dir(&self) -> Result<PathBuf> {
        let dir = self.resolve_path(&self.config.storefront.state_dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        Ok(dir)
    }

    /// Open the persisted session store.
    pub fn cache(&self) -> Result<Cache> {
        let path = self.state_dir()?.join(SESSION_FILE);
        Cache::open_file(&path).with_context(|| format!("Failed to open session store: {}", path.display()))
    }

    /// Load the basket from the session store.
    pub fn basket(&self, cache: &Cache) -> Result<BasketSession> {
        Ok(BasketSession::load(cache, self.config.business.currency)?)
    }

    /// Load the product catalog.
    pub fn catalog(&self, path_override: Option<&str>) -> Result<Vec<Product>> {
        let path = path_override
            .or(self.config.storefront.catalog.as_deref())
            .ok_or_else(|| anyhow!("No catalog configured; pass --catalog or set storefront.catalog"))?;
        let path = self.resolve_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))
    }

    /// Build an orchestrator wired to the configured HTTP APIs.
    pub fn orchestrator(&self, cache: Cache) -> Result<CheckoutOrchestrator> {
        let api = &self.config.api;
        let timeouts = TimeoutConfig::from_total(api.timeout());

        let commerce_url = api
            .commerce_url
            .as_deref()
            .ok_or_else(|| anyhow!("No commerce API configured; set api.commerce_url or SHOPFRONT_COMMERCE_API"))?;
        let payment_url = api.payment_base().unwrap_or(commerce_url);

        let commerce = HttpCommerceApi::new(FetchClient::new(commerce_url, timeouts)?);
        let payments = HttpPaymentApi::new(FetchClient::new(payment_url, timeouts)?);

        Ok(CheckoutOrchestrator::new(
            Arc::new(commerce),
            Arc::new(payments),
            RecoveryStore::new(cache),
            self.config.business.clone(),
        ))
    }
}

/// Find a product by id.
pub fn find_product<'a>(catalog: &'a [Product], id: &str) -> Result<&'a Product> {
    catalog
        .iter()
        .find(|p| p.id.as_str() == id)
        .ok_or_else(|| anyhow!("Product not found: {}", id))
}
