use switchyard::{
    Action, Controllers, Error, Group, Method, Request, Response, ResourceOptions, RouterBuilder,
    StatusCode,
};

async fn ok(_: Request) -> Response {
    Response::text("ok")
}

#[test]
fn duplicate_names_are_rejected() {
    let mut routes = RouterBuilder::new();
    routes.get("/a", ok).unwrap().name("dup").unwrap();
    let err = routes.get("/b", ok).unwrap().name("dup").err();
    assert!(matches!(err, Some(Error::DuplicateRouteName(name)) if name == "dup"));
    routes.get("/c", ok).unwrap();

    let router = routes.build().unwrap();
    let uris: Vec<_> = router.list_routes().into_iter().map(|r| r.uri).collect();
    assert_eq!(uris, ["/a", "/c"]);
    assert_eq!(router.url_for("dup", &[]).unwrap(), "/a");
}

#[test]
fn failed_resource_registers_nothing() {
    let mut routes = RouterBuilder::new();
    routes.get("/gallery/{photo}", ok).unwrap().name("photos.show").unwrap();
    let err = routes.resource("photos", "PhotoController").err();
    assert!(matches!(err, Some(Error::DuplicateRouteName(name)) if name == "photos.show"));

    let router = routes.build().unwrap();
    assert_eq!(router.table().len(), 1);
    assert!(!router.has_route("photos.index"));
    assert!(!router.has_route("photos.store"));
}

#[test]
fn failed_group_registers_nothing() {
    let mut routes = RouterBuilder::new();
    let result = routes.group(Group::new().prefix("/admin"), |r| {
        r.get("/users", ok)?.name("users")?;
        r.get("/posts/{post}", ok)?.where_regex("post", "[")?;
        Ok(())
    });
    assert!(matches!(result, Err(Error::InvalidConstraint { .. })));
    routes.get("/users", ok).unwrap().name("users").unwrap();

    let router = routes.build().unwrap();
    assert_eq!(router.table().len(), 1);
    assert_eq!(router.url_for("users", &[]).unwrap(), "/users");
}

#[test]
fn renaming_a_route_frees_its_old_name() {
    let mut routes = RouterBuilder::new();
    routes.get("/a", ok).unwrap().name("first").unwrap().name("second").unwrap();
    routes.get("/b", ok).unwrap().name("first").unwrap();
    let router = routes.build().unwrap();
    assert_eq!(router.url_for("second", &[]).unwrap(), "/a");
    assert_eq!(router.url_for("first", &[]).unwrap(), "/b");
}

#[test]
fn empty_method_set_is_rejected() {
    let mut routes = RouterBuilder::new();
    let err = routes.match_(Vec::<Method>::new(), "/nothing", ok).err();
    assert!(matches!(err, Some(Error::EmptyMethodSet(uri)) if uri == "/nothing"));
}

#[test]
fn malformed_templates_and_constraints_are_rejected() {
    let mut routes = RouterBuilder::new();
    assert!(matches!(routes.get("/users/{id", ok).err(), Some(Error::InvalidPattern { .. })));
    assert!(matches!(routes.get("/{a}/{a}", ok).err(), Some(Error::InvalidPattern { .. })));
    assert!(matches!(routes.get("/{page?}/list", ok).err(), Some(Error::InvalidPattern { .. })));
    assert!(matches!(
        routes.get("/users/{id}", ok).unwrap().where_regex("id", "(").err(),
        Some(Error::InvalidConstraint { .. })
    ));
    assert!(routes.build().unwrap().table().is_empty());
}

#[test]
fn reverse_routing() {
    let mut routes = RouterBuilder::new();
    routes.get("/demo/ping", ok).unwrap().name("demo.ping").unwrap();
    routes.get("/posts/{post}/comments/{comment}", ok).unwrap().name("comments.show").unwrap();
    routes.get("/users/{id}", ok).unwrap().name("users.show").unwrap().where_number("id");
    routes.get("/archive/{year?}", ok).unwrap().name("archive").unwrap();
    let router = routes.build().unwrap();

    assert!(router.has_route("demo.ping"));
    assert!(!router.has_route("demo.pong"));
    assert_eq!(router.url_for("demo.ping", &[]).unwrap(), "/demo/ping");
    assert_eq!(
        router.url_for("comments.show", &[("post", "hello world"), ("comment", "3")]).unwrap(),
        "/posts/hello%20world/comments/3"
    );
    assert_eq!(
        router.url_for("users.show", &[("id", "7"), ("tab", "posts")]).unwrap(),
        "/users/7?tab=posts"
    );
    assert_eq!(router.url_for("archive", &[]).unwrap(), "/archive");
    assert_eq!(router.url_for("archive", &[("year", "2024")]).unwrap(), "/archive/2024");

    assert!(matches!(router.url_for("nope", &[]), Err(Error::RouteNotFound(_))));
    assert!(matches!(
        router.url_for("comments.show", &[("post", "1")]),
        Err(Error::MissingParameter { param, .. }) if param == "comment"
    ));
    assert!(matches!(
        router.url_for("users.show", &[("id", "seven")]),
        Err(Error::ParameterMismatch { .. })
    ));
}

#[test]
fn list_routes_in_registration_order() {
    let mut routes = RouterBuilder::new();
    routes.get("/", ok).unwrap().name("home").unwrap();
    routes.post("/users", Action::controller("UserController", "store")).unwrap().middleware("auth");
    routes.permanent_redirect("/old", "/").unwrap();
    routes.fallback(ok).unwrap();
    routes.alias("auth", |req: Request, next: switchyard::Next| next.run(req));
    routes.controllers(Controllers::new().register("UserController", "store", ok));
    let router = routes.build().unwrap();

    let listed = router.list_routes();
    let rows: Vec<_> = listed
        .iter()
        .map(|r| (r.methods.to_string(), r.uri.as_str(), r.action.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            ("GET|HEAD".to_owned(), "/", "Closure"),
            ("POST".to_owned(), "/users", "UserController@store"),
            ("GET|HEAD|POST|PUT|PATCH|DELETE|OPTIONS".to_owned(), "/old", "Redirect(301 -> /)"),
            ("GET|HEAD|POST|PUT|PATCH|DELETE|OPTIONS".to_owned(), "/{fallback}", "Closure"),
        ]
    );
    assert_eq!(listed[0].name.as_deref(), Some("home"));
    assert_eq!(listed[1].middleware, ["auth"]);
}

#[test]
fn unresolved_controller_action_fails_the_build() {
    let mut routes = RouterBuilder::new();
    routes.get("/x", Action::controller("Missing", "index")).unwrap();
    assert!(matches!(routes.build(), Err(Error::UnresolvedAction(action)) if action == "Missing@index"));
}

#[test]
fn nested_groups_join_prefixes_and_names() {
    let mut routes = RouterBuilder::new();
    routes
        .group(Group::new().prefix("/api").name("api."), |r| {
            r.group(Group::new().prefix("v1/").name("v1."), |r| {
                r.get("/users", ok)?.name("users")?;
                r.get("/", ok)?.name("root")?;
                Ok(())
            })
        })
        .unwrap();
    routes.group(Group::new().prefix("/empty"), |_| Ok(())).unwrap();
    let router = routes.build().unwrap();

    assert_eq!(router.url_for("api.v1.users", &[]).unwrap(), "/api/v1/users");
    assert_eq!(router.url_for("api.v1.root", &[]).unwrap(), "/api/v1");
    assert_eq!(router.table().len(), 2);
}

#[tokio::test]
async fn group_constraints_apply_to_member_routes() {
    let mut routes = RouterBuilder::new();
    routes
        .group(Group::new().prefix("/orders").where_number("id"), |r| {
            r.get("/{id}", ok)?;
            Ok(())
        })
        .unwrap();
    let router = routes.build().unwrap();

    let hit = router.dispatch(Request::new(Method::GET, "/orders/5")).await;
    let miss = router.dispatch(Request::new(Method::GET, "/orders/five")).await;
    assert_eq!(hit.status_code(), StatusCode::OK);
    assert_eq!(miss.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn resources_register_conventional_routes() {
    let mut routes = RouterBuilder::new();
    routes.resource("photos", "PhotoController").unwrap();
    routes.api_resource("posts.comments", "CommentController").unwrap();
    routes
        .resource_with("tags", "TagController", ResourceOptions::only(["index", "show"]))
        .unwrap();

    let mut controllers = Controllers::new();
    for (controller, actions) in [
        ("PhotoController", &["index", "create", "store", "show", "edit", "update", "destroy"][..]),
        ("CommentController", &["index", "store", "show", "update", "destroy"][..]),
        ("TagController", &["index", "show"][..]),
    ] {
        for action in actions {
            controllers = controllers.register(controller, *action, ok);
        }
    }
    routes.controllers(controllers);
    let router = routes.build().unwrap();

    assert_eq!(router.table().len(), 7 + 5 + 2);
    assert_eq!(router.url_for("photos.edit", &[("photo", "3")]).unwrap(), "/photos/3/edit");
    assert_eq!(router.url_for("photos.create", &[]).unwrap(), "/photos/create");
    assert_eq!(
        router.url_for("posts.comments.show", &[("post", "1"), ("comment", "2")]).unwrap(),
        "/posts/1/comments/2"
    );
    assert!(!router.has_route("posts.comments.edit"));
    assert!(router.has_route("tags.show"));
    assert!(!router.has_route("tags.store"));

    let update = router.table().by_name("photos.update").unwrap();
    assert_eq!(update.methods().to_string(), "PUT|PATCH");
}
