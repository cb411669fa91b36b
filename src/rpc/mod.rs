// RPC procedure registry and request context
//
// Procedures are named query/mutation handlers registered under dotted
// paths (`label.create`, `group.members.get`). Each handler declares a
// typed input, and the registry adapts it onto the JSON wire: inputs are
// validated by deserialization before the handler runs, outputs are
// serialized after it returns. Authorization is the handler's first act,
// via [`RequestContext::require_session`] / [`RequestContext::require_editor`].
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::database::models::{Role, User};
use crate::database::store::EntityStore;
use crate::error::ApiError;
use crate::permissions;

pub mod artist;
pub mod collectable;
pub mod collector;
pub mod group;
pub mod image;
pub mod label;

/// Whether a procedure reads or writes. The HTTP binding maps queries to
/// GET and mutations to POST and rejects mismatched calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Query => "query",
            ProcedureKind::Mutation => "mutation",
        }
    }
}

/// Authenticated caller attached to a request context.
///
/// Roles are read from the store while resolving the session, never from
/// the token, so revocations take effect on the next request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub roles: Vec<Role>,
}

/// Everything a procedure handler can reach: the entity store and the
/// caller's session, when one was presented.
#[derive(Clone)]
pub struct RequestContext {
    pub store: Arc<dyn EntityStore>,
    pub session: Option<Session>,
}

impl RequestContext {
    pub fn new(store: Arc<dyn EntityStore>, session: Option<Session>) -> Self {
        Self { store, session }
    }

    /// Returns the session, or fails with `UNAUTHENTICATED`.
    pub fn require_session(&self) -> Result<&Session, ApiError> {
        self.session
            .as_ref()
            .ok_or_else(|| ApiError::unauthenticated("you must be signed in to call this procedure"))
    }

    /// Returns the session if it carries an editor-tier role; fails with
    /// `UNAUTHENTICATED` (no session) or `FORBIDDEN` (insufficient roles).
    pub fn require_editor(&self) -> Result<&Session, ApiError> {
        let session = self.require_session()?;

        if permissions::is_editor_tier(&session.roles) {
            Ok(session)
        } else {
            Err(ApiError::forbidden(
                "you do not have permission to call this procedure",
            ))
        }
    }
}

type HandlerFuture = BoxFuture<'static, Result<Value, ApiError>>;
type HandlerFn = Arc<dyn Fn(RequestContext, Value) -> HandlerFuture + Send + Sync>;

pub struct Procedure {
    pub kind: ProcedureKind,
    handler: HandlerFn,
}

/// Name-to-procedure table.
pub struct Registry {
    procedures: HashMap<&'static str, Procedure>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            procedures: HashMap::new(),
        }
    }

    pub fn query<F, Fut, In, Out>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(RequestContext, In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, ApiError>> + Send + 'static,
        In: DeserializeOwned + Send + 'static,
        Out: Serialize,
    {
        self.register(name, ProcedureKind::Query, f)
    }

    pub fn mutation<F, Fut, In, Out>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(RequestContext, In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, ApiError>> + Send + 'static,
        In: DeserializeOwned + Send + 'static,
        Out: Serialize,
    {
        self.register(name, ProcedureKind::Mutation, f)
    }

    fn register<F, Fut, In, Out>(mut self, name: &'static str, kind: ProcedureKind, f: F) -> Self
    where
        F: Fn(RequestContext, In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, ApiError>> + Send + 'static,
        In: DeserializeOwned + Send + 'static,
        Out: Serialize,
    {
        let f = Arc::new(f);
        let handler: HandlerFn = Arc::new(move |ctx, raw| {
            let f = f.clone();
            Box::pin(async move {
                // Deserialization is the input schema: anything that does
                // not fit the declared shape is rejected before the
                // handler (and therefore the store) is touched.
                let input: In = serde_json::from_value(raw)
                    .map_err(|e| ApiError::validation_failed(format!("invalid input: {}", e)))?;
                let output = f(ctx, input).await?;
                serde_json::to_value(output).map_err(|e| {
                    ApiError::internal(format!("failed to serialize response: {}", e))
                })
            })
        });

        self.procedures.insert(name, Procedure { kind, handler });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Sorted (name, kind) pairs, for diagnostics and the CLI listing.
    pub fn names(&self) -> Vec<(&'static str, ProcedureKind)> {
        let mut names: Vec<_> = self
            .procedures
            .iter()
            .map(|(name, procedure)| (*name, procedure.kind))
            .collect();
        names.sort_by_key(|(name, _)| *name);
        names
    }

    /// Looks up `name`, checks the call kind, and runs the handler.
    ///
    /// Unknown names fail `NOT_FOUND` and kind mismatches fail
    /// `BAD_REQUEST`, both before any handler code runs.
    pub async fn dispatch(
        &self,
        name: &str,
        kind: ProcedureKind,
        ctx: RequestContext,
        input: Value,
    ) -> Result<Value, ApiError> {
        let procedure = self
            .procedures
            .get(name)
            .ok_or_else(|| ApiError::not_found(format!("no procedure named '{}'", name)))?;

        if procedure.kind != kind {
            let verb = match procedure.kind {
                ProcedureKind::Query => "GET",
                ProcedureKind::Mutation => "POST",
            };
            return Err(ApiError::bad_request(format!(
                "'{}' is a {}; call it with {}",
                name,
                procedure.kind.as_str(),
                verb
            )));
        }

        (procedure.handler)(ctx, input).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        build_registry()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("procedures", &self.names())
            .finish()
    }
}

impl Serialize for ProcedureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Builds the full procedure table served under `/rpc/:procedure`.
///
/// Wire names keep the client-facing camelCase dotted paths.
pub fn build_registry() -> Registry {
    Registry::new()
        .query("artist.get", artist::get)
        .query("collectable.random", collectable::random)
        .query("collector.get", collector::get)
        .mutation("protectedCollector.rename", collector::rename)
        .mutation("image.avatar", image::avatar)
        .mutation("image.banner", image::banner)
        .query("label.get", label::get)
        .query("label.unique", label::unique)
        .query("label.get.groups", label::get_groups)
        .mutation("label.create", label::create)
        .mutation("label.update", label::update)
        .mutation("group.create", group::create)
        .query("group.info", group::info)
        .mutation("group.members.create", group::members_create)
        .query("group.members.get", group::members_get)
}
