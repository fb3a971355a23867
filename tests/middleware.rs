use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use switchyard::middleware::{ApiVersion, Cors};
use switchyard::{
    Error, Group, Method, MiddlewareRef, Next, Request, Response, RouterBuilder, StatusCode,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn record(log: &Log, label: &'static str) -> MiddlewareRef {
    let log = Arc::clone(log);
    MiddlewareRef::inline(move |req: Request, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(label);
            next.run(req).await
        }
    })
}

fn counted_handler(count: &Arc<AtomicUsize>) -> impl Fn(Request) -> std::future::Ready<Response> + Clone + Send + Sync + 'static {
    let count = Arc::clone(count);
    move |_req: Request| {
        count.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Response::text("handled"))
    }
}

#[tokio::test]
async fn short_circuit_stops_the_chain() {
    let calls = [(); 3].map(|_| Arc::new(AtomicUsize::new(0)));
    let handler_calls = Arc::new(AtomicUsize::new(0));

    let counting = |i: usize, stop: bool| {
        let calls = Arc::clone(&calls[i]);
        MiddlewareRef::inline(move |req: Request, next: Next| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if stop {
                    return Response::status(StatusCode::FORBIDDEN);
                }
                next.run(req).await
            }
        })
    };

    let mut routes = RouterBuilder::new();
    routes.global(counting(0, false)).global(counting(1, true));
    routes.get("/secret", counted_handler(&handler_calls)).unwrap().middleware(counting(2, false));
    let router = routes.build().unwrap();

    let res = router.dispatch(Request::new(Method::GET, "/secret")).await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(calls[0].load(Ordering::SeqCst), 1);
    assert_eq!(calls[1].load(Ordering::SeqCst), 1);
    assert_eq!(calls[2].load(Ordering::SeqCst), 0);
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_runs_exactly_once_per_dispatch() {
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let mut routes = RouterBuilder::new();
    routes.get("/", counted_handler(&handler_calls)).unwrap();
    let router = routes.build().unwrap();

    for _ in 0..3 {
        router.dispatch(Request::new(Method::GET, "/")).await;
    }
    assert_eq!(handler_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn global_then_group_then_route() {
    let log: Log = Arc::default();
    let mut routes = RouterBuilder::new();
    routes.global(record(&log, "global"));
    routes
        .group(Group::new().prefix("/api").middleware(record(&log, "outer")), |r| {
            r.group(Group::new().middleware(record(&log, "inner")), |r| {
                r.get("/items", |_: Request| async { "items" })?
                    .middleware(record(&log, "route"));
                Ok(())
            })
        })
        .unwrap();
    let router = routes.build().unwrap();

    let res = router.dispatch(Request::new(Method::GET, "/api/items")).await;
    assert_eq!(res.body(), b"items");
    assert_eq!(*log.lock().unwrap(), ["global", "outer", "inner", "route"]);
}

#[tokio::test]
async fn unmatched_requests_skip_middleware() {
    let log: Log = Arc::default();
    let mut routes = RouterBuilder::new();
    routes.global(record(&log, "global"));
    let router = routes.build().unwrap();

    let res = router.dispatch(Request::new(Method::GET, "/nowhere")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fallback_is_wrapped_by_global_middleware() {
    let log: Log = Arc::default();
    let mut routes = RouterBuilder::new();
    routes.global(record(&log, "global"));
    routes.fallback(|_: Request| async { StatusCode::NOT_FOUND }).unwrap();
    let router = routes.build().unwrap();

    router.dispatch(Request::new(Method::GET, "/nowhere")).await;
    assert_eq!(*log.lock().unwrap(), ["global"]);
}

#[tokio::test]
async fn aliases_and_middleware_groups() {
    let log: Log = Arc::default();
    let mut routes = RouterBuilder::new();
    let (a, b) = (Arc::clone(&log), Arc::clone(&log));
    routes
        .alias("auth", move |req: Request, next: Next| {
            a.lock().unwrap().push("auth");
            next.run(req)
        })
        .alias("audit", move |req: Request, next: Next| {
            b.lock().unwrap().push("audit");
            next.run(req)
        })
        .middleware_group("admin", ["auth", "audit"]);
    routes.get("/dashboard", |_: Request| async { "ok" }).unwrap().middleware("admin");
    let router = routes.build().unwrap();

    router.dispatch(Request::new(Method::GET, "/dashboard")).await;
    assert_eq!(*log.lock().unwrap(), ["auth", "audit"]);
}

#[test]
fn unknown_alias_fails_the_build() {
    let mut routes = RouterBuilder::new();
    routes.get("/", |_: Request| async { "ok" }).unwrap().middleware("missing");
    assert!(matches!(routes.build(), Err(Error::UnknownMiddleware(name)) if name == "missing"));
}

#[tokio::test]
async fn versioned_routes_carry_their_tag() {
    let mut routes = RouterBuilder::new();
    routes
        .version("v2", |r| {
            r.get("/status", |req: Request| async move {
                let tag = req.extensions().get::<ApiVersion>().map(|v| v.0.clone());
                Response::text(tag.unwrap_or_default())
            })?
            .name("status")?;
            Ok(())
        })
        .unwrap();
    let router = routes.build().unwrap();

    assert!(router.has_route("v2.status"));
    let res = router.dispatch(Request::new(Method::GET, "/v2/status")).await;
    assert_eq!(res.body(), b"v2");
}

#[tokio::test]
async fn cors_answers_preflights_itself() {
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let mut routes = RouterBuilder::new();
    routes.global(Cors::permissive().max_age(600));
    routes.any("/things", counted_handler(&handler_calls)).unwrap();
    let router = routes.build().unwrap();

    let preflight = Request::new(Method::OPTIONS, "/things")
        .with_header("origin", "https://app.example")
        .with_header("access-control-request-method", "POST");
    let res = router.dispatch(preflight).await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(res.header("access-control-max-age"), Some("600"));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);

    let res = router.dispatch(Request::new(Method::GET, "/things")).await;
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
}
