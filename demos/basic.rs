//! A small photo-sharing API: closures, a controller resource, groups,
//! middleware aliases, a redirect and a fallback.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/photos/7
//!   curl http://localhost:3000/nowhere                # fallback
//!   curl -i http://localhost:3000/pictures/7         # 301 to /photos
//!   curl -H 'authorization: x' http://localhost:3000/admin/stats
//!   curl http://localhost:3000/v1/status
//!
//! With SWITCHYARD_ROUTE_CACHE set, the cacheable routes are written there
//! after the first start and loaded from it on the next.

use switchyard::middleware::{ApiVersion, Cors, Trace};
use switchyard::{
    Config, Controllers, Group, Next, Request, Response, RouteSnapshot, RouterBuilder, Server,
    StatusCode,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), switchyard::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let mut routes = match config.route_cache.as_deref().filter(|path| path.exists()) {
        Some(path) => {
            let snapshot = RouteSnapshot::load(path)?;
            info!(routes = snapshot.routes.len(), "using cached routes");
            RouterBuilder::from_snapshot(&snapshot)?
        }
        None => {
            let mut routes = RouterBuilder::new();
            cacheable_routes(&mut routes)?;
            routes
        }
    };

    routes
        .global(Trace)
        .global(Cors::permissive())
        .alias("auth", require_token)
        .middleware_group("admin", ["auth"])
        .controllers(photo_controller());

    routes.group(Group::new().prefix("/admin").middleware("admin").name("admin."), |r| {
        r.get("/stats", stats)?.name("stats")?;
        Ok(())
    })?;
    routes.version("v1", |r| {
        r.get("/status", status)?.name("status")?;
        Ok(())
    })?;
    routes.fallback(not_found)?;

    let router = routes.build()?;
    for route in router.list_routes() {
        info!(methods = %route.methods, uri = %route.uri, action = %route.action, "route");
    }

    if let Some(path) = &config.route_cache {
        let snapshot = router.snapshot();
        if !snapshot.is_complete() {
            warn!(skipped = snapshot.non_cacheable.len(), "closure routes are not cached");
        }
        snapshot.save(path)?;
    }

    Server::from_config(&config).serve(router).await
}

/// Everything here is named, so it survives a round trip through the cache.
fn cacheable_routes(routes: &mut RouterBuilder) -> Result<(), switchyard::Error> {
    routes.api_resource("photos", "PhotoController")?;
    routes.permanent_redirect("/pictures/{id?}", "/photos")?;
    Ok(())
}

fn photo_controller() -> Controllers {
    Controllers::new()
        .register("PhotoController", "index", |_: Request| async {
            Response::json(br#"[{"id":7}]"#.to_vec())
        })
        .register("PhotoController", "store", |req: Request| async move {
            if req.body().is_empty() {
                return Response::status(StatusCode::BAD_REQUEST);
            }
            Response::builder()
                .status(StatusCode::CREATED)
                .header("location", "/photos/8")
                .no_body()
        })
        .register("PhotoController", "show", |req: Request| async move {
            match req.param_as::<u64>("photo") {
                Some(id) => Response::json(format!(r#"{{"id":{id}}}"#).into_bytes()),
                None => Response::status(StatusCode::NOT_FOUND),
            }
        })
        .register("PhotoController", "update", |_: Request| async {
            Response::status(StatusCode::NO_CONTENT)
        })
        .register("PhotoController", "destroy", |_: Request| async {
            Response::status(StatusCode::NO_CONTENT)
        })
}

async fn require_token(req: Request, next: Next) -> Response {
    if req.header("authorization").is_none() {
        return Response::status(StatusCode::UNAUTHORIZED);
    }
    next.run(req).await
}

async fn stats(_: Request) -> Response {
    Response::json(br#"{"photos":1}"#.to_vec())
}

async fn status(req: Request) -> Response {
    let version = req.extensions().get::<ApiVersion>().map(|v| v.0.as_str()).unwrap_or("none");
    Response::text(format!("ok ({version})"))
}

async fn not_found(req: Request) -> Response {
    let path = req.param("fallback").unwrap_or_default();
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .text(format!("nothing at /{path}"))
}
