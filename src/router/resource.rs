//! Conventional CRUD routes for a controller.

use http::Method;

use crate::error::Error;
use crate::handler::Action;
use crate::router::RouterBuilder;

/// The seven resource actions, in registration order.
///
/// `create` precedes `show` so `/photos/create` is not captured as
/// `/photos/{photo}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResourceAction {
    Index,
    Create,
    Store,
    Show,
    Edit,
    Update,
    Destroy,
}

impl ResourceAction {
    const ALL: [Self; 7] = [
        Self::Index,
        Self::Create,
        Self::Store,
        Self::Show,
        Self::Edit,
        Self::Update,
        Self::Destroy,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Index   => "index",
            Self::Create  => "create",
            Self::Store   => "store",
            Self::Show    => "show",
            Self::Edit    => "edit",
            Self::Update  => "update",
            Self::Destroy => "destroy",
        }
    }

    fn methods(self) -> &'static [Method] {
        match self {
            Self::Index | Self::Create | Self::Show | Self::Edit => &[Method::GET, Method::HEAD],
            Self::Store   => &[Method::POST],
            Self::Update  => &[Method::PUT, Method::PATCH],
            Self::Destroy => &[Method::DELETE],
        }
    }

    fn uri(self, base: &str, param: &str) -> String {
        match self {
            Self::Index | Self::Store     => base.to_owned(),
            Self::Create                  => format!("{base}/create"),
            Self::Show | Self::Update | Self::Destroy => format!("{base}/{{{param}}}"),
            Self::Edit                    => format!("{base}/{{{param}}}/edit"),
        }
    }
}

/// Which resource actions to register.
#[derive(Clone, Debug, Default)]
pub struct ResourceOptions {
    only: Option<Vec<String>>,
    except: Vec<String>,
}

impl ResourceOptions {
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { only: Some(actions.into_iter().map(Into::into).collect()), except: Vec::new() }
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { only: None, except: actions.into_iter().map(Into::into).collect() }
    }

    fn includes(&self, action: ResourceAction) -> bool {
        let name = action.as_str();
        self.only.as_ref().is_none_or(|only| only.iter().any(|a| a == name))
            && !self.except.iter().any(|a| a == name)
    }
}

impl RouterBuilder {
    /// Registers `index`, `create`, `store`, `show`, `edit`, `update` and
    /// `destroy` for `controller`, named `{name}.{action}`.
    ///
    /// A dotted name nests: `posts.comments` lives under
    /// `/posts/{post}/comments`.
    pub fn resource(&mut self, name: &str, controller: &str) -> Result<(), Error> {
        self.resource_with(name, controller, ResourceOptions::default())
    }

    /// [`resource`](Self::resource) without the HTML-form actions `create`
    /// and `edit`.
    pub fn api_resource(&mut self, name: &str, controller: &str) -> Result<(), Error> {
        self.resource_with(name, controller, ResourceOptions::except(["create", "edit"]))
    }

    pub fn resource_with(
        &mut self,
        name: &str,
        controller: &str,
        options: ResourceOptions,
    ) -> Result<(), Error> {
        let (base, param) = resource_paths(name);
        let mark = self.mark();
        for action in ResourceAction::ALL.into_iter().filter(|a| options.includes(*a)) {
            let registered = self
                .match_(
                    action.methods().iter().cloned(),
                    &action.uri(&base, &param),
                    Action::controller(controller, action.as_str()),
                )
                .and_then(|route| route.name(&format!("{name}.{}", action.as_str())))
                .map(drop);
            if let Err(err) = registered {
                self.rollback(mark);
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Base path and member parameter for a possibly dotted resource name.
fn resource_paths(name: &str) -> (String, String) {
    let parts: Vec<&str> = name.split('.').collect();
    let mut base = String::new();
    for (i, part) in parts.iter().enumerate() {
        base.push('/');
        base.push_str(part);
        if i + 1 < parts.len() {
            base.push_str(&format!("/{{{}}}", singular(part)));
        }
    }
    let param = parts.last().map(|last| singular(last)).unwrap_or_default();
    (base, param)
}

fn singular(word: &str) -> String {
    let word = word.replace('-', "_");
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_owned()
    } else {
        word
    }
}
