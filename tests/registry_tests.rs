//! Concurrency tests for the bundle registry's single-flight loading.

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use localekit::{BundleError, BundleRegistry};
use test_support::{CountingLoader, GatedLoader, code};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_loads_share_one_fetch() -> Result<()> {
    let registry = Arc::new(BundleRegistry::new());
    let gated = GatedLoader::new(CountingLoader::new(code("de"), &[("nav.home", "Startseite")]));
    registry.register(code("de"), gated.loader());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let shared = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let de = code("de");
            shared.load(&de).await
        }));
    }
    tokio::task::yield_now().await;
    gated.open();

    let mut bundles = Vec::new();
    for task in tasks {
        bundles.push(task.await.context("join load task")??);
    }
    ensure!(gated.calls() == 1, "expected one fetch, saw {}", gated.calls());
    let first = bundles.first().context("at least one bundle")?;
    ensure!(bundles.iter().all(|bundle| Arc::ptr_eq(bundle, first)));
    ensure!(first.get("nav.home") == Some("Startseite"));
    ensure!(registry.is_loaded(&code("de")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiters_on_a_failed_load_all_see_the_failure() -> Result<()> {
    let registry = Arc::new(BundleRegistry::new());
    let gated = GatedLoader::new(CountingLoader::new(code("nl"), &[]).failing_first(1));
    registry.register(code("nl"), gated.loader());

    let nl = code("nl");
    let first = registry.load(&nl);
    let second = registry.load(&nl);
    gated.open();
    let (first, second) = tokio::join!(first, second);

    ensure!(matches!(first, Err(BundleError::Loader { .. })));
    ensure!(matches!(second, Err(BundleError::Loader { .. })));
    ensure!(gated.calls() == 1);
    ensure!(!registry.is_loaded(&nl), "failures must not be cached");

    let retried = registry.load(&nl).await.context("second attempt succeeds")?;
    ensure!(retried.locale() == &nl);
    ensure!(gated.calls() == 2);
    Ok(())
}

#[tokio::test]
async fn cached_bundles_are_served_without_refetching() -> Result<()> {
    let registry = BundleRegistry::new();
    let counting = CountingLoader::new(code("es"), &[("nav.home", "Inicio")]);
    registry.register(code("es"), counting.loader());
    let es = code("es");

    let first = registry.load(&es).await?;
    let second = registry.load(&es).await?;
    ensure!(Arc::ptr_eq(&first, &second));
    ensure!(counting.calls() == 1);
    ensure!(
        registry
            .cached(&es)
            .is_some_and(|cached| Arc::ptr_eq(&cached, &first))
    );
    Ok(())
}

#[tokio::test]
async fn unregistered_codes_fail_without_side_effects() -> Result<()> {
    let registry = BundleRegistry::new();
    let fr = code("fr");
    let err = registry
        .load(&fr)
        .await
        .err()
        .context("fr is not registered")?;
    ensure!(matches!(err, BundleError::NotRegistered { ref locale } if locale == &fr));
    ensure!(registry.registered_locales().is_empty());
    Ok(())
}
