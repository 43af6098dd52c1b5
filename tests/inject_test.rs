//! Injection with explicitly bound containers

use injekt::{
    service_key, Arg, BoxError, CallArgs, CallContext, Container, ContainerError, FromContainer,
    Inject, Injector, Keyed, ServiceKey,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Service {
    called: bool,
}

struct Repository {
    table: &'static str,
}

#[derive(Debug, PartialEq)]
struct Settings {
    retries: u32,
}

service_key!(AuditRepo = "repo.audit");

fn container() -> Container {
    let container = Container::new();
    container.register_singleton("svc", || Service { called: true });
    container.register_singleton("repo.users", || Repository { table: "users" });
    container
}

#[test]
fn test_sync_injection() {
    let handler = Injector::with_container(container()).wrap(|svc: Inject<Service>| svc.into_inner());

    let instance = handler.call().unwrap();
    assert!(instance.called);
}

#[tokio::test]
async fn test_async_injection() {
    let handler = Injector::with_container(container())
        .wrap_async(|svc: Inject<Service>| async move { svc.into_inner() });

    let instance = handler.call().await.unwrap();
    assert!(instance.called);
}

#[test]
fn test_singleton_shared_between_calls() {
    let handler =
        Injector::with_container(container()).wrap(|svc: Inject<Service>| svc.into_inner());

    let first = handler.call().unwrap();
    let second = handler.call().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_keyed_and_typed_parameters() {
    let container = container();
    container.register_singleton(AuditRepo::KEY, || Repository { table: "audit" });
    container.bind::<Repository>("repo.users");

    let handler = Injector::with_container(container).wrap(
        |users: Inject<Repository>, audit: Keyed<Repository, AuditRepo>| {
            format!("{}+{}", users.table, audit.table)
        },
    );
    assert_eq!(handler.call().unwrap(), "users+audit");
}

#[test]
fn test_caller_values_override_resolution() {
    let handler = Injector::with_container(container())
        .wrap(|repo: Inject<Repository>, limit: Arg<usize>| format!("{}:{}", repo.table, *limit));

    let output = handler
        .call_with(
            CallArgs::new()
                .with(10usize)
                .with(Repository { table: "stub" }),
        )
        .unwrap();
    assert_eq!(output, "stub:10");
}

#[test]
fn test_resolution_follows_declaration_order() {
    let container = Container::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let first_log = order.clone();
    container.register_factory("first", move || {
        first_log.lock().push("first");
        1u8
    });
    let second_log = order.clone();
    container.register_factory("second", move || {
        second_log.lock().push("second");
        2u16
    });

    let handler =
        Injector::with_container(container).wrap(|b: Inject<u16>, a: Inject<u8>| *a as u16 + *b);
    assert_eq!(handler.call().unwrap(), 3);
    assert_eq!(*order.lock(), vec!["second", "first"]);
}

#[test]
fn test_failure_prevents_invocation() {
    let container = container();
    container.try_register_factory("settings", || {
        Err::<Settings, BoxError>("settings file missing".into())
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let handler = Injector::with_container(container).wrap(
        move |_svc: Inject<Service>, _settings: Inject<Settings>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        },
    );

    let err = handler.call().unwrap_err();
    assert!(err.is_creation_failure());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_async_target_with_async_dependency_chain() {
    let container = container();
    let handle = container.clone();
    container.register_async_singleton("settings", move || {
        let handle = handle.clone();
        async move {
            // Manual nested resolution from inside a factory.
            let svc = handle.aresolve::<Service>("svc").await?;
            Ok::<_, BoxError>(Settings {
                retries: if svc.called { 3 } else { 0 },
            })
        }
    });

    let handler = Injector::with_container(container).wrap_async(
        |settings: Inject<Settings>, attempt: Arg<u32>| async move {
            tokio::task::yield_now().await;
            settings.retries - *attempt
        },
    );

    let remaining = handler.call_with(CallArgs::new().with(1u32)).await.unwrap();
    assert_eq!(remaining, 2);
}

#[test]
fn test_async_wrapper_usable_from_sync_code() {
    let container = container();
    container.register_async_factory("settings", || async {
        Ok::<_, BoxError>(Settings { retries: 5 })
    });
    let handler = Injector::with_container(container)
        .wrap_async(|settings: Inject<Settings>| async move { settings.retries });

    assert_eq!(tokio_test::block_on(handler.call()).unwrap(), 5);
}

#[test]
fn test_container_parameter_allows_manual_resolution() {
    let handler = Injector::with_container(container()).wrap(|container: Container| {
        container
            .resolve::<Repository>("repo.users")
            .map(|repo| repo.table)
    });

    assert_eq!(handler.call().unwrap().unwrap(), "users");
}

/// A parameter type with its own resolution rule
struct RetryBudget(u32);

#[async_trait::async_trait]
impl FromContainer for RetryBudget {
    fn from_container(ctx: &mut CallContext) -> injekt::Result<Self> {
        let settings = ctx.container()?.resolve_by_type::<Settings>()?;
        Ok(RetryBudget(settings.retries * 2))
    }
}

#[test]
fn test_custom_from_container() {
    let container = container();
    container.register_singleton("settings", || Settings { retries: 2 });

    let handler = Injector::with_container(container).wrap(|budget: RetryBudget| budget.0);
    assert_eq!(handler.call().unwrap(), 4);

    let empty = Injector::with_container(Container::new()).wrap(|budget: RetryBudget| budget.0);
    assert!(matches!(
        empty.call().unwrap_err(),
        ContainerError::TypeNotBound { .. }
    ));
}
