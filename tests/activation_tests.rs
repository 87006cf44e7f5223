//! Integration tests for the activation controller's observable state.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, ensure};
use localekit::{ActivationOptions, ActiveLocaleState, LoadStatus, Localization};
use test_support::{CountingLoader, GatedLoader, code};

type Log = Arc<Mutex<Vec<(String, LoadStatus)>>>;

fn observe(l10n: &Localization) -> (Log, localekit::Subscription) {
    let log: Log = Arc::default();
    let sink = Arc::clone(&log);
    let subscription = l10n
        .controller()
        .subscribe(move |state: &ActiveLocaleState| {
            sink.lock()
                .expect("log lock")
                .push((state.current_locale.to_string(), state.load_status));
        });
    (log, subscription)
}

fn entries(log: &Log) -> Vec<(String, LoadStatus)> {
    log.lock().expect("log lock").clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newer_requests_win_over_slow_loads() -> Result<()> {
    let gated = GatedLoader::new(CountingLoader::new(code("es"), &[("nav.home", "Inicio")]));
    let l10n = Localization::builder()
        .with_builtin_bundles()
        .register(code("es"), gated.loader())
        .build()
        .context("build context")?;
    let (log, _subscription) = observe(&l10n);

    let controller = Arc::clone(l10n.controller());
    let slow = tokio::spawn(async move { controller.activate(Some("es-MX")).await });
    while gated.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let fast = l10n.controller().activate(Some("de-DE")).await;
    gated.open();
    let settled = slow.await.context("join slow activation")?;

    ensure!(fast.current_locale.as_str() == "de" && fast.load_status == LoadStatus::Loaded);
    ensure!(settled == fast, "stale completion changed state to {settled:?}");
    ensure!(l10n.controller().state() == fast);
    ensure!(
        l10n.registry().is_loaded(&code("es")),
        "the abandoned bundle is still cached for later use"
    );
    ensure!(
        entries(&log)
            == [
                ("es".to_owned(), LoadStatus::Loading),
                ("de".to_owned(), LoadStatus::Loading),
                ("de".to_owned(), LoadStatus::Loaded),
            ],
        "unexpected transitions {:?}",
        entries(&log)
    );
    Ok(())
}

#[tokio::test]
async fn error_recovers_only_through_loading() -> Result<()> {
    let flaky = CountingLoader::new(code("nl"), &[("nav.home", "Start")]).failing_first(1);
    let l10n = Localization::builder()
        .with_builtin_bundles()
        .register(code("nl"), flaky.loader())
        .build()
        .context("build context")?;
    let (log, _subscription) = observe(&l10n);

    let failed = l10n.controller().activate(Some("nl-NL")).await;
    ensure!(failed.load_status == LoadStatus::Error);
    ensure!(l10n.controller().bundle().is_none());
    let recovered = l10n.controller().activate(Some("nl-NL")).await;
    ensure!(recovered.load_status == LoadStatus::Loaded);

    let statuses: Vec<LoadStatus> = entries(&log).into_iter().map(|(_, status)| status).collect();
    ensure!(
        statuses
            == [
                LoadStatus::Loading,
                LoadStatus::Error,
                LoadStatus::Loading,
                LoadStatus::Loaded,
            ]
    );
    ensure!(flaky.calls() == 2);
    Ok(())
}

#[tokio::test]
async fn fallback_option_switches_to_the_fallback_locale() -> Result<()> {
    let broken = CountingLoader::new(code("de"), &[]).failing_first(usize::MAX);
    let l10n = Localization::builder()
        .with_builtin_bundles()
        .register(code("de"), broken.loader())
        .with_options(ActivationOptions {
            fallback_on_load_error: true,
        })
        .build()
        .context("build context")?;
    let (log, _subscription) = observe(&l10n);

    let state = l10n.controller().activate(Some("de-AT")).await;

    ensure!(state.current_locale.as_str() == "en");
    ensure!(state.load_status == LoadStatus::Loaded);
    ensure!(l10n.controller().last_error().is_some());
    ensure!(
        entries(&log)
            == [
                ("de".to_owned(), LoadStatus::Loading),
                ("de".to_owned(), LoadStatus::Error),
                ("en".to_owned(), LoadStatus::Loading),
                ("en".to_owned(), LoadStatus::Loaded),
            ]
    );
    Ok(())
}

#[tokio::test]
async fn observers_may_read_controller_state() -> Result<()> {
    let l10n = Localization::builder()
        .with_builtin_bundles()
        .build()
        .context("build context")?;
    let seen: Arc<Mutex<Vec<LoadStatus>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let controller = Arc::downgrade(l10n.controller());
    let _subscription = l10n.controller().subscribe(move |_: &ActiveLocaleState| {
        if let Some(controller) = controller.upgrade() {
            sink.lock()
                .expect("seen lock")
                .push(controller.state().load_status);
        }
    });

    l10n.controller().activate(Some("es")).await;

    ensure!(*seen.lock().expect("seen lock") == [LoadStatus::Loading, LoadStatus::Loaded]);
    ensure!(
        l10n.controller()
            .translate("app.greeting", &[("name", "\"Zoë\"")])
            .as_deref()
            == Some("¡Hola, &quot;Zoë&quot;!")
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_activations_notify_in_applied_order() -> Result<()> {
    let l10n = Localization::builder()
        .with_builtin_bundles()
        .build()
        .context("build context")?;
    let (log, _subscription) = observe(&l10n);
    let mismatches: Arc<Mutex<Vec<(ActiveLocaleState, ActiveLocaleState)>>> = Arc::default();
    let sink = Arc::clone(&mismatches);
    let weak = Arc::downgrade(l10n.controller());
    let _checker = l10n.controller().subscribe(move |seen: &ActiveLocaleState| {
        if let Some(controller) = weak.upgrade() {
            let current = controller.state();
            if current != *seen {
                sink.lock()
                    .expect("mismatch lock")
                    .push((seen.clone(), current));
            }
        }
    });

    let preferences = ["de-AT", "es-MX", "nl-BE", "en-GB"];
    let mut tasks = Vec::new();
    for preference in preferences.into_iter().cycle().take(64) {
        let controller = Arc::clone(l10n.controller());
        tasks.push(tokio::spawn(async move {
            controller.activate(Some(preference)).await
        }));
    }
    for task in tasks {
        task.await.context("join activation")?;
    }

    let mismatches = mismatches.lock().expect("mismatch lock").clone();
    ensure!(
        mismatches.is_empty(),
        "observers saw superseded snapshots: {mismatches:?}"
    );
    let final_state = l10n.controller().state();
    let last = entries(&log).last().cloned();
    ensure!(
        last == Some((final_state.current_locale.to_string(), final_state.load_status)),
        "last notification {last:?} does not match {final_state:?}"
    );
    Ok(())
}
