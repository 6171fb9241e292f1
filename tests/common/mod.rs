//! Common test utilities and fixtures.
//!
//! Shared store seeding, fast timing configuration and the axum-test
//! application wrapper used across the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use linkthree::config::{AggregationConfig, LoaderConfig, ResolverConfig, WriterConfig};
use linkthree::namespace::standalone_component;
use linkthree::{
    ComponentId, GraphStore, MemoryStore, Namespace, PageId, PageService, ReadConfig, SharedStore,
};

// =============================================================================
// Configuration
// =============================================================================

/// Timings scaled down so that misses and quiet windows finish quickly.
pub fn fast_config() -> ReadConfig {
    ReadConfig {
        legacy_namespace: true,
        base_url: "https://linko.test".into(),
        resolver: ResolverConfig {
            retries: 1,
            probe_timeout_ms: 50,
            retry_delay_ms: 20,
            deadline_ms: 500,
        },
        loader: LoaderConfig {
            load_timeout_ms: 200,
        },
        aggregation: AggregationConfig {
            window_ms: 100,
            idle_ms: 30,
            max_ms: 100,
            standalone_timeout_ms: 50,
            ..AggregationConfig::default()
        },
        writer: WriterConfig {
            availability_timeout_ms: 50,
            ..WriterConfig::default()
        },
    }
}

// =============================================================================
// Store Fixtures
// =============================================================================

/// A memory store plus the page service reading it.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub service: PageService,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: ReadConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }

    pub fn with_store(store: MemoryStore, config: ReadConfig) -> Self {
        let store = Arc::new(store);
        let shared: SharedStore = store.clone();
        Self {
            store,
            service: PageService::new(shared, config),
        }
    }

    /// Write a raw page record.
    pub async fn put_page(
        &self,
        namespace: Namespace,
        id: &str,
        record: Value,
    ) -> anyhow::Result<()> {
        self.store
            .put(&namespace.page(&PageId::from(id)), record)
            .await?;
        Ok(())
    }

    /// Write a raw slug mapping.
    pub async fn put_slug(
        &self,
        namespace: Namespace,
        slug: &str,
        value: Value,
    ) -> anyhow::Result<()> {
        self.store.put(&namespace.slug(slug), value).await?;
        Ok(())
    }

    /// Write a component reference under a page.
    pub async fn put_component(
        &self,
        namespace: Namespace,
        page: &str,
        component: Value,
    ) -> anyhow::Result<()> {
        let id = component["id"].as_str().unwrap_or_default().to_string();
        let path = namespace.page_components(&PageId::from(page)).child(id);
        self.store.put(&path, component).await?;
        Ok(())
    }

    /// Write a component's standalone node.
    pub async fn put_standalone(&self, component: Value) -> anyhow::Result<()> {
        let id = ComponentId::from(component["id"].as_str().unwrap_or_default());
        self.store.put(&standalone_component(&id), component).await?;
        Ok(())
    }
}

/// Page record as the editor writes it.
pub fn page_record(title: &str, author: &str, slug: &str, created_at: i64) -> Value {
    json!({
        "title": title,
        "author": author,
        "slug": slug,
        "createdAt": created_at,
        "updatedAt": created_at,
    })
}

/// Link component reference.
pub fn link(id: &str, order: i64, title: &str) -> Value {
    json!({
        "type": "link",
        "id": id,
        "order": order,
        "title": title,
        "url": format!("https://example.com/{}", id),
    })
}

// =============================================================================
// Test Application
// =============================================================================

#[cfg(feature = "server")]
pub use server::TestApp;

#[cfg(feature = "server")]
mod server {
    use std::sync::Arc;

    use axum_test::TestServer;
    use linkthree::server::{AppState, router};
    use linkthree::{MemoryStore, PageService, SharedStore};

    use super::fast_config;

    /// Test application over a fresh in-memory store.
    pub struct TestApp {
        pub server: TestServer,
        pub store: Arc<MemoryStore>,
    }

    impl TestApp {
        pub fn new() -> anyhow::Result<Self> {
            let store = Arc::new(MemoryStore::new());
            let shared: SharedStore = store.clone();
            let state = AppState::new(PageService::new(shared, fast_config()));
            let server = TestServer::new(router(state))?;
            Ok(Self { server, store })
        }

        /// Save a page through the API and return its id.
        pub async fn create_page(&self, body: serde_json::Value) -> anyhow::Result<String> {
            let response = self.server.put("/api/v1/pages").json(&body).await;
            response.assert_status(axum::http::StatusCode::CREATED);
            let report: serde_json::Value = response.json();
            report["page_id"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("save report without page_id: {}", report))
        }
    }
}
