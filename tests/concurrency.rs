//! The store lock is held for a whole handler invocation.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use common::{dispatcher, run, typed_len};
use computesim::{
    ActionContext, ApiResult, Dispatcher, RequestParams, ResourceId, ResourceKind,
    ResponseBody, SharedStore,
};

const THREADS: usize = 8;
const ROUNDS: usize = 50;

fn counter_kind() -> ResourceKind {
    ResourceKind::Custom("counter".to_string())
}

/// Read-modify-write across two steps; loses updates unless serialized.
fn increment(ctx: &mut ActionContext<'_>, _params: &RequestParams) -> ApiResult<ResponseBody> {
    let kind = counter_kind();
    let current = ctx
        .require(&kind, "counter-1")?
        .attribute("value")
        .and_then(|v| v.as_int())
        .unwrap_or_default();
    thread::yield_now();
    ctx.require_mut(&kind, "counter-1")?
        .set_attribute("value", current + 1);
    Ok(ResponseBody::new().with("value", current + 1))
}

#[test]
fn test_parallel_run_instances_allocate_unique_ids() {
    let d = Arc::new(dispatcher());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                (0..ROUNDS / 10)
                    .flat_map(|_| run(&d, 2, "t3.micro"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all.insert(id), "duplicate id");
        }
    }
    assert_eq!(all.len(), THREADS * (ROUNDS / 10) * 2);
    assert_eq!(typed_len(&d, &ResourceKind::Instance), all.len());
}

#[test]
fn test_read_modify_write_is_serialized() {
    let store = SharedStore::default();
    store
        .with(|s| {
            let counter = computesim::Resource::builder(counter_kind())
                .id(ResourceId::new("counter-1"))
                .owner(s.account_id().clone())
                .attribute("value", 0)
                .build()
                .unwrap();
            s.put(counter).unwrap();
        });

    let mut d = Dispatcher::new(store.clone());
    d.register("Increment", increment);
    let d = Arc::new(d);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    d.dispatch("Increment", &RequestParams::new()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let value = store
        .with(|s| s.get("counter-1").and_then(|r| r.attribute("value")).and_then(|v| v.as_int()));
    assert_eq!(value, Some(i64::try_from(THREADS * ROUNDS).unwrap()));
}

#[test]
fn test_isolated_stores_do_not_share_state() {
    let a = dispatcher();
    let b = dispatcher();
    run(&a, 3, "t3.micro");
    assert_eq!(typed_len(&a, &ResourceKind::Instance), 3);
    assert_eq!(typed_len(&b, &ResourceKind::Instance), 0);
}

fn crash(ctx: &mut ActionContext<'_>, _params: &RequestParams) -> ApiResult<ResponseBody> {
    let id = ctx.store_mut().fresh_id(&counter_kind());
    panic!("handler crashed while holding the store: {id}");
}

#[test]
fn test_panicking_handler_does_not_disable_dispatch() {
    let mut d = dispatcher();
    d.register("Crash", crash);
    let d = Arc::new(d);

    let crashed = {
        let d = Arc::clone(&d);
        thread::spawn(move || d.dispatch("Crash", &RequestParams::new())).join()
    };
    assert!(crashed.is_err());

    for _ in 0..3 {
        let ids = run(&d, 1, "t3.micro");
        assert_eq!(ids.len(), 1);
    }
    assert_eq!(typed_len(&d, &ResourceKind::Instance), 3);
}
