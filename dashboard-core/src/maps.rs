//! Lazy loading of the third-party maps script.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{DashboardError, Result};

/// Substring identifying an already-present maps script.
pub const MAPS_SCRIPT_MARKER: &str = "maps.googleapis.com";

pub fn maps_script_url(api_key: &str) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/js?key={}&libraries=places",
        urlencoding::encode(api_key)
    )
}

/// Where scripts get injected: a page, a webview, or nothing at all.
#[async_trait]
pub trait ScriptHost: Send + Sync + std::fmt::Debug {
    /// Whether a script whose source contains `marker` is already present.
    fn has_script(&self, marker: &str) -> bool;

    /// Add a script reference and resolve once it has loaded.
    async fn inject(&self, src: &str) -> Result<()>;
}

/// Injects the maps script at most once, and never without a key.
#[derive(Debug, Default)]
pub struct MapsLoader {
    loaded: bool,
}

impl MapsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub async fn ensure_loaded(&mut self, host: &dyn ScriptHost, api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(DashboardError::Maps("no maps API key available yet".to_string()));
        }

        if self.loaded {
            return Ok(());
        }

        if host.has_script(MAPS_SCRIPT_MARKER) {
            tracing::debug!("maps script already present");
            self.loaded = true;
            return Ok(());
        }

        host.inject(&maps_script_url(api_key)).await?;
        tracing::info!("maps script loaded");
        self.loaded = true;
        Ok(())
    }
}

/// Host without a page: records injected sources and loads them instantly.
#[derive(Debug, Default)]
pub struct HeadlessScriptHost {
    scripts: Mutex<Vec<String>>,
}

impl HeadlessScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }
}

#[async_trait]
impl ScriptHost for HeadlessScriptHost {
    fn has_script(&self, marker: &str) -> bool {
        self.scripts.lock().iter().any(|src| src.contains(marker))
    }

    async fn inject(&self, src: &str) -> Result<()> {
        self.scripts.lock().push(src.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FailingHost;

    #[async_trait]
    impl ScriptHost for FailingHost {
        fn has_script(&self, _marker: &str) -> bool {
            false
        }

        async fn inject(&self, src: &str) -> Result<()> {
            Err(DashboardError::Maps(format!("blocked: {src}")))
        }
    }

    #[tokio::test]
    async fn injects_once() {
        let host = HeadlessScriptHost::new();
        let mut loader = MapsLoader::new();

        loader.ensure_loaded(&host, "KEY").await.unwrap();
        loader.ensure_loaded(&host, "KEY").await.unwrap();

        assert!(loader.is_loaded());
        assert_eq!(
            host.scripts(),
            vec!["https://maps.googleapis.com/maps/api/js?key=KEY&libraries=places".to_string()]
        );
    }

    #[tokio::test]
    async fn existing_script_is_detected() {
        let host = HeadlessScriptHost::new();
        host.inject("https://maps.googleapis.com/maps/api/js?key=OTHER").await.unwrap();

        let mut loader = MapsLoader::new();
        loader.ensure_loaded(&host, "KEY").await.unwrap();

        assert!(loader.is_loaded());
        assert_eq!(host.scripts().len(), 1);
    }

    #[tokio::test]
    async fn empty_key_never_loads() {
        let host = HeadlessScriptHost::new();
        let mut loader = MapsLoader::new();

        assert!(loader.ensure_loaded(&host, "").await.is_err());
        assert!(!loader.is_loaded());
        assert!(host.scripts().is_empty());
    }

    #[tokio::test]
    async fn failed_injection_leaves_loader_unloaded() {
        let mut loader = MapsLoader::new();
        let err = loader.ensure_loaded(&FailingHost, "KEY").await.unwrap_err();

        assert!(matches!(err, DashboardError::Maps(_)));
        assert!(!loader.is_loaded());
    }
}
