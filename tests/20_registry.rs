mod common;

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use omnia_api::database::{ConnectionRegistry, Connector, DatabaseError};
use omnia_api::tenancy::StoreNaming;

/// Hands out `Arc<String>` handles and counts how many it built
#[derive(Default)]
struct CountingConnector {
    connects: AtomicUsize,
}

impl Connector for CountingConnector {
    type Handle = Arc<String>;

    fn connect(&self, connection_string: &str) -> Result<Arc<String>, DatabaseError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(connection_string.to_string()))
    }
}

fn registry_with_prefix(prefix: &str) -> ConnectionRegistry<CountingConnector> {
    let naming = StoreNaming::new(
        common::BASE_URL,
        prefix,
        &["dev".to_string(), "localhost".to_string()],
    )
    .expect("valid naming");
    ConnectionRegistry::new(naming, CountingConnector::default())
}

fn registry() -> ConnectionRegistry<CountingConnector> {
    registry_with_prefix("omnia_tenant_")
}

#[tokio::test]
async fn repeated_access_returns_the_same_handle() -> Result<()> {
    let registry = registry();
    let acme = common::slug("acme");

    let first = registry.get(&acme).await?;
    let second = registry.get(&acme).await?;

    assert!(Arc::ptr_eq(&first, &second), "handles differ");
    assert_eq!(registry.connector().connects.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len().await, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_one_handle() -> Result<()> {
    let registry = Arc::new(registry());

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get(&common::slug("acme")).await })
        })
        .collect();

    let handles: Vec<Arc<String>> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect::<Result<_, _>>()?;

    assert_eq!(registry.connector().connects.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len().await, 1);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])), "tasks saw different handles");
    Ok(())
}

#[tokio::test]
async fn tenants_get_isolated_handles() -> Result<()> {
    let registry = registry();

    let acme = registry.get(&common::slug("acme")).await?;
    let globex = registry.get(&common::slug("globex")).await?;

    assert!(!Arc::ptr_eq(&acme, &globex));
    assert!(acme.contains("/omnia_tenant_acme"), "acme handle: {}", acme);
    assert!(globex.contains("/omnia_tenant_globex"), "globex handle: {}", globex);

    let tenants: Vec<String> = registry.tenants().await.iter().map(|t| t.to_string()).collect();
    assert_eq!(tenants, vec!["acme", "globex"]);
    Ok(())
}

#[tokio::test]
async fn connection_string_only_swaps_the_database() -> Result<()> {
    let registry = registry();
    let handle = registry.get(&common::slug("my-shop")).await?;

    let url = url::Url::parse(&handle)?;
    assert_eq!(url.path(), "/omnia_tenant_my_shop");
    assert_eq!(url.username(), "omnia");
    assert_eq!(url.password(), Some("secret"));
    assert_eq!(url.host_str(), Some("127.0.0.1"));
    assert_eq!(url.port(), Some(1));
    assert_eq!(url.query(), Some("sslmode=disable"));
    Ok(())
}

#[tokio::test]
async fn default_aliases_share_the_default_store() -> Result<()> {
    let registry = registry();

    let dev = registry.get(&common::slug("dev")).await?;
    let localhost = registry.get(&common::slug("localhost")).await?;

    // One entry per slug, both pointing at the base database
    assert_eq!(registry.len().await, 2);
    assert_eq!(dev.as_str(), localhost.as_str());
    assert_eq!(url::Url::parse(&dev)?.path(), "/omnia");
    Ok(())
}

#[tokio::test]
async fn naming_failure_leaves_no_entry() -> Result<()> {
    let registry = registry_with_prefix(&"p".repeat(60));
    let slug = common::slug("acme-industries");

    let err = registry.get(&slug).await.expect_err("store name exceeds the limit");
    assert!(matches!(err, DatabaseError::Naming(_)), "unexpected error: {:?}", err);
    assert!(!registry.contains(&slug).await);
    assert!(registry.is_empty().await);
    assert_eq!(registry.connector().connects.load(Ordering::SeqCst), 0);
    Ok(())
}
