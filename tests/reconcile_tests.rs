//! End-to-end reconciliation tests against the in-memory store.
//!
//! Each test drives the public service the way a viewer does while the store
//! delivers duplicates, tombstones and records from both namespaces.

mod common;

use std::time::Duration;

use common::{Fixture, fast_config, link, page_record};
use serde_json::json;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use linkthree::config::QuiescenceMode;
use linkthree::writer::ComponentDraft;
use linkthree::{
    CommitReason, Component, MemoryStore, Namespace, PageDraft, PageHandle, PageId, ReadConfig,
    Resolution,
};

fn ids(components: &[Component]) -> Vec<&str> {
    components.iter().map(|c| c.id.as_str()).collect()
}

/// Store that never reports a delivered snapshot, read with a fixed window.
fn windowed() -> Fixture {
    let mut config = fast_config();
    config.aggregation.quiescence = QuiescenceMode::Fixed;
    config.aggregation.window_ms = 500;
    config.aggregation.use_sync_marker = false;
    Fixture::with_store(MemoryStore::new().without_sync_marker(), config)
}

// =============================================================================
// Component Aggregation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_redelivered_component_keeps_last_value() -> anyhow::Result<()> {
    let fixture = windowed();
    let handle = PageHandle::new(Namespace::Current, PageId::from("page_live"));

    let service = fixture.service.clone();
    let reader_handle = handle.clone();
    let reader = tokio::spawn(async move {
        service
            .components(&reader_handle, &CancellationToken::new())
            .await
    });

    for title in ["first", "second", "third"] {
        sleep(Duration::from_millis(50)).await;
        fixture
            .put_component(Namespace::Current, "page_live", link("c1", 0, title))
            .await?;
    }

    let aggregation = reader.await?;
    assert!(matches!(
        aggregation,
        linkthree::Aggregation::Committed {
            reason: CommitReason::Quiet,
            ..
        }
    ));
    let components = aggregation.into_value().unwrap_or_default();
    assert_eq!(ids(&components), vec!["c1"]);
    assert_eq!(components[0].payload.get("title"), Some(&json!("third")));

    Ok(())
}

#[tokio::test]
async fn test_tombstone_after_live_version() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    fixture
        .put_page(Namespace::Current, "page_t", page_record("T", "pub_t", "", 1))
        .await?;
    fixture
        .put_component(
            Namespace::Current,
            "page_t",
            json!({"id": "c1", "type": "h1", "order": 5, "content": "Hi"}),
        )
        .await?;
    fixture
        .put_component(Namespace::Current, "page_t", json!({"id": "c1", "deleted": true}))
        .await?;

    let view = fixture
        .service
        .view(&PageId::from("page_t"), &CancellationToken::new())
        .await
        .ok_or_else(|| anyhow::anyhow!("page not loaded"))?;
    assert!(view.components.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_standalone_tombstone_hides_live_reference() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let handle = PageHandle::new(Namespace::Current, PageId::from("page_st"));
    for (id, order) in [("c1", 0), ("c2", 1)] {
        fixture
            .put_component(Namespace::Current, "page_st", link(id, order, id))
            .await?;
        fixture.put_standalone(link(id, order, id)).await?;
    }
    fixture
        .put_standalone(json!({"id": "c1", "deleted": true, "deletedAt": 9}))
        .await?;

    let components = fixture
        .service
        .components(&handle, &CancellationToken::new())
        .await
        .into_value()
        .unwrap_or_default();
    assert_eq!(ids(&components), vec!["c2"]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_tombstone_sticks_for_the_rest_of_the_window() -> anyhow::Result<()> {
    let fixture = windowed();
    let handle = PageHandle::new(Namespace::Current, PageId::from("page_s"));

    let service = fixture.service.clone();
    let reader = tokio::spawn(async move {
        service.components(&handle, &CancellationToken::new()).await
    });

    fixture
        .put_component(Namespace::Current, "page_s", link("c1", 0, "live"))
        .await?;
    sleep(Duration::from_millis(50)).await;
    fixture
        .put_component(Namespace::Current, "page_s", json!({"id": "c1", "deleted": true}))
        .await?;
    sleep(Duration::from_millis(50)).await;
    fixture
        .put_component(
            Namespace::Current,
            "page_s",
            json!({"id": "c1", "deleted": false, "title": "late edit"}),
        )
        .await?;

    let components = reader.await?.into_value().unwrap_or_default();
    assert!(components.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_orders_sorted_in_any_arrival_order() -> anyhow::Result<()> {
    let permutations = [[2, 0, 1], [0, 1, 2], [1, 2, 0], [2, 1, 0]];

    for orders in permutations {
        let fixture = Fixture::new();
        let handle = PageHandle::new(Namespace::Current, PageId::from("page_o"));
        for (i, order) in orders.iter().enumerate() {
            fixture
                .put_component(
                    Namespace::Current,
                    "page_o",
                    link(&format!("c{}", i), *order, "x"),
                )
                .await?;
        }

        let components = fixture
            .service
            .components(&handle, &CancellationToken::new())
            .await
            .into_value()
            .unwrap_or_default();
        let sorted: Vec<i64> = components.iter().map(|c| c.order).collect();
        assert_eq!(sorted, vec![0, 1, 2], "arrival {:?}", orders);
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_equal_orders_keep_arrival_order() -> anyhow::Result<()> {
    let fixture = windowed();
    let handle = PageHandle::new(Namespace::Current, PageId::from("page_e"));

    let service = fixture.service.clone();
    let reader = tokio::spawn(async move {
        service.components(&handle, &CancellationToken::new()).await
    });

    fixture
        .put_component(Namespace::Current, "page_e", link("c_z", 0, "first"))
        .await?;
    sleep(Duration::from_millis(20)).await;
    fixture
        .put_component(Namespace::Current, "page_e", link("c_a", 0, "second"))
        .await?;

    let components = reader.await?.into_value().unwrap_or_default();
    assert_eq!(ids(&components), vec!["c_z", "c_a"]);

    Ok(())
}

#[tokio::test]
async fn test_resave_reads_the_same() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let cancel = CancellationToken::new();

    let draft = PageDraft {
        title: "Alice".into(),
        slug: Some("alice".into()),
        author: "pub_alice".into(),
        components: vec![
            ComponentDraft::new(linkthree::ComponentKind::Heading).with("content", "Hi"),
            ComponentDraft::new(linkthree::ComponentKind::Link)
                .with("title", "Blog")
                .with("url", "https://alice.example"),
        ],
        ..PageDraft::default()
    };
    let saved = fixture.service.save(draft).await?;
    let first = fixture
        .service
        .view(&saved.page_id, &cancel)
        .await
        .ok_or_else(|| anyhow::anyhow!("first read failed"))?;

    let again = PageDraft {
        id: Some(first.id.clone()),
        title: first.title.clone(),
        slug: first.slug.clone(),
        author: first.author.clone(),
        components: first.components.iter().map(ComponentDraft::from).collect(),
        removed: Vec::new(),
    };
    fixture.service.save(again).await?;
    let second = fixture
        .service
        .view(&saved.page_id, &cancel)
        .await
        .ok_or_else(|| anyhow::anyhow!("second read failed"))?;

    assert_eq!(first.components, second.components);
    assert_eq!(first.title, second.title);
    assert_eq!(first.slug, second.slug);
    assert_eq!(first.created_at, second.created_at);

    Ok(())
}

#[tokio::test]
async fn test_deleted_page_and_component_come_back_on_resave() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let cancel = CancellationToken::new();
    let draft = PageDraft {
        title: "Alice".into(),
        slug: Some("alice".into()),
        author: "pub_alice".into(),
        components: vec![
            ComponentDraft::new(linkthree::ComponentKind::Heading).with("content", "Hi"),
        ],
        ..PageDraft::default()
    };
    let saved = fixture.service.save(draft.clone()).await?;
    let view = fixture
        .service
        .view(&saved.page_id, &cancel)
        .await
        .ok_or_else(|| anyhow::anyhow!("page not viewed"))?;

    for component in &saved.components {
        fixture
            .service
            .delete_component(&saved.page_id, component, "pub_alice")
            .await?;
    }
    fixture.service.delete_page(&saved.page_id, "pub_alice").await?;
    assert!(fixture.service.view(&saved.page_id, &cancel).await.is_none());

    let again = PageDraft {
        id: Some(saved.page_id.clone()),
        components: view.components.iter().map(ComponentDraft::from).collect(),
        ..draft
    };
    let report = fixture.service.save(again).await?;
    assert!(report.failed.is_empty());

    let revived = fixture
        .service
        .view(&saved.page_id, &cancel)
        .await
        .ok_or_else(|| anyhow::anyhow!("page still deleted after resave"))?;
    assert_eq!(ids(&revived.components), ids(&view.components));

    Ok(())
}

// =============================================================================
// Namespaces
// =============================================================================

#[tokio::test]
async fn test_index_prefers_current_namespace() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    fixture
        .put_page(Namespace::Legacy, "page_both", page_record("Old", "pub_a", "", 10))
        .await?;
    fixture
        .put_page(Namespace::Current, "page_both", page_record("New", "pub_a", "", 10))
        .await?;
    fixture
        .put_page(Namespace::Legacy, "page_old", page_record("Only legacy", "pub_b", "", 5))
        .await?;

    let index = fixture
        .service
        .index(&CancellationToken::new())
        .await
        .into_value()
        .unwrap_or_default();

    let titles: Vec<_> = index.pages().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["New", "Only legacy"]);

    Ok(())
}

#[tokio::test]
async fn test_legacy_page_is_viewed_and_saved_in_place() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let cancel = CancellationToken::new();
    fixture
        .put_page(Namespace::Legacy, "page_leg", page_record("Legacy", "pub_l", "leg", 3))
        .await?;
    fixture
        .put_component(Namespace::Legacy, "page_leg", link("c1", 0, "Old link"))
        .await?;

    let page = fixture
        .service
        .load(&PageId::from("page_leg"))
        .await
        .ok_or_else(|| anyhow::anyhow!("legacy page not loaded"))?;
    assert_eq!(page.namespace, Namespace::Legacy);

    let view = fixture
        .service
        .view(&page.id, &cancel)
        .await
        .ok_or_else(|| anyhow::anyhow!("legacy page not viewed"))?;
    assert_eq!(ids(&view.components), vec!["c1"]);

    let draft = PageDraft {
        id: Some(page.id.clone()),
        title: "Legacy, edited".into(),
        author: "pub_l".into(),
        components: view.components.iter().map(ComponentDraft::from).collect(),
        ..PageDraft::default()
    };
    let report = fixture.service.save_with_handle(draft, &page.handle).await?;
    assert_eq!(report.namespace, Namespace::Legacy);

    let current = linkthree::GraphStore::once(
        fixture.store.as_ref(),
        &Namespace::Current.page(&page.id),
    )
    .await?;
    assert!(current.is_none());

    Ok(())
}

// =============================================================================
// Slug Resolution
// =============================================================================

#[tokio::test]
async fn test_current_slug_resolves_without_legacy_mapping() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    fixture
        .put_slug(Namespace::Current, "alice", json!("page_abc123"))
        .await?;

    let resolution = fixture.service.resolve("alice").await;

    assert_eq!(
        resolution,
        Resolution::Found {
            page_id: PageId::from("page_abc123"),
            namespace: Namespace::Current,
        }
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_missing_slug_uses_full_retry_budget() -> anyhow::Result<()> {
    let fixture = Fixture::with_config(ReadConfig::default());

    let started = Instant::now();
    let resolution = fixture.service.resolve("never-created").await;

    assert_eq!(resolution, Resolution::NotFound);
    assert!(started.elapsed() >= Duration::from_secs(3));

    Ok(())
}
