//! Process-wide state store
//!
//! The store owns one slice per domain behind a single `tokio` RwLock. An
//! action takes the write lock to begin its operation, releases it while the
//! HTTP call is in flight and takes it again to settle.

use crate::async_op::AsyncOp;
use crate::auth::AuthState;
use crate::campaigns::CampaignsState;
use crate::query::ListQuery;
use crate::recipients::RecipientsState;
use crate::single_emails::SingleEmailsState;
use crate::slice::ListSlice;
use crate::smtp::SmtpState;
use crate::templates::TemplatesState;
use mailreach_client::{ApiClient, ListParams, Page, Services, Session};
use mailreach_common::config::SyncConfig;
use mailreach_common::types::Entity;
use mailreach_common::{Config, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, warn};

/// Whole client-side state tree
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub smtp: SmtpState,
    pub recipients: RecipientsState,
    pub campaigns: CampaignsState,
    pub single_emails: SingleEmailsState,
    pub templates: TemplatesState,
    /// Bumped by every reset; results started in an older epoch are dropped
    epoch: u64,
}

impl AppState {
    pub fn new(page_size: u32) -> Self {
        Self {
            auth: AuthState::default(),
            smtp: SmtpState::new(page_size),
            recipients: RecipientsState::new(page_size),
            campaigns: CampaignsState::new(page_size),
            single_emails: SingleEmailsState::new(page_size),
            templates: TemplatesState::new(page_size),
            epoch: 0,
        }
    }
}

/// Selects one list slice out of the state tree
pub(crate) type SliceSelector<T, F> = fn(&mut AppState) -> &mut ListSlice<T, F>;

/// Shared handle to the state tree and the services that feed it
#[derive(Debug, Clone)]
pub struct Store {
    services: Services,
    session: Session,
    settings: SyncConfig,
    state: Arc<RwLock<AppState>>,
}

impl Store {
    pub fn new(client: ApiClient, settings: SyncConfig) -> Self {
        let session = client.session().clone();
        Self {
            services: Services::new(client),
            session,
            state: Arc::new(RwLock::new(AppState::new(settings.page_size))),
            settings,
        }
    }

    /// Build the client stack from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = Session::from_config(&config.session)?;
        let client = ApiClient::new(&config.api, session)?;
        Ok(Self::new(client, config.sync.clone()))
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &SyncConfig {
        &self.settings
    }

    /// Read access to the current state
    pub async fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().await
    }

    /// Run `f` against the current state and return its result
    pub async fn snapshot<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Mutate local-only state such as the campaign detail view
    pub async fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    /// Drop every cached entity and flag
    pub(crate) async fn reset(&self) {
        let mut state = self.state.write().await;
        let epoch = state.epoch + 1;
        *state = AppState::new(self.settings.page_size);
        state.epoch = epoch;
    }

    /// Track one async operation from start to settlement.
    ///
    /// `prepare` runs under the same lock that begins the ticket, so the input
    /// it reads belongs to that generation. `apply` only runs when the ticket
    /// is still current.
    pub(crate) async fn dispatch_with<P, T, Sel, Prep, Call, Fut, Apply>(
        &self,
        op: Sel,
        prepare: Prep,
        call: Call,
        apply: Apply,
    ) -> Result<T>
    where
        Sel: Fn(&mut AppState) -> &mut AsyncOp,
        Prep: FnOnce(&mut AppState) -> P,
        Call: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<T>>,
        Apply: FnOnce(&mut AppState, &T),
    {
        self.try_dispatch_with(op, prepare, call, move |s, value: &T| {
            apply(s, value);
            Ok(())
        })
        .await
    }

    /// [`Store::dispatch_with`] whose `apply` may refuse the result. A refused
    /// result settles the operation as rejected and its error is returned.
    ///
    /// Results of calls started before the last [`Store::reset`] are returned
    /// to the caller but never touch the fresh state.
    pub(crate) async fn try_dispatch_with<P, T, Sel, Prep, Call, Fut, Apply>(
        &self,
        op: Sel,
        prepare: Prep,
        call: Call,
        apply: Apply,
    ) -> Result<T>
    where
        Sel: Fn(&mut AppState) -> &mut AsyncOp,
        Prep: FnOnce(&mut AppState) -> P,
        Call: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<T>>,
        Apply: FnOnce(&mut AppState, &T) -> Result<()>,
    {
        let (epoch, ticket, input) = {
            let mut state = self.state.write().await;
            let input = prepare(&mut *state);
            (state.epoch, op(&mut *state).begin(), input)
        };

        let outcome = call(input).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("Discarding result of a request issued before the state was reset");
            drop(ticket);
            return outcome;
        }

        match outcome {
            Ok(value) => {
                if !op(&mut *state).is_current(&ticket) {
                    op(&mut *state).fulfill(ticket);
                    return Ok(value);
                }
                match apply(&mut *state, &value) {
                    Ok(()) => {
                        op(&mut *state).fulfill(ticket);
                        Ok(value)
                    }
                    Err(e) => {
                        warn!("Response could not be applied ({}): {}", e.code(), e);
                        op(&mut *state).reject(ticket, e.to_string());
                        Err(e)
                    }
                }
            }
            Err(e) => {
                if op(&mut *state).reject(ticket, e.to_string()) {
                    warn!("Request failed ({}): {}", e.code(), e);
                }
                Err(e)
            }
        }
    }

    /// [`Store::dispatch_with`] for calls that need no state as input
    pub(crate) async fn dispatch<T, Sel, Fut, Apply>(
        &self,
        op: Sel,
        call: Fut,
        apply: Apply,
    ) -> Result<T>
    where
        Sel: Fn(&mut AppState) -> &mut AsyncOp,
        Fut: Future<Output = Result<T>>,
        Apply: FnOnce(&mut AppState, &T),
    {
        self.dispatch_with(op, |_| (), move |()| call, apply).await
    }

    /// [`Store::try_dispatch_with`] for calls that need no state as input
    pub(crate) async fn try_dispatch<T, Sel, Fut, Apply>(
        &self,
        op: Sel,
        call: Fut,
        apply: Apply,
    ) -> Result<T>
    where
        Sel: Fn(&mut AppState) -> &mut AsyncOp,
        Fut: Future<Output = Result<T>>,
        Apply: FnOnce(&mut AppState, &T) -> Result<()>,
    {
        self.try_dispatch_with(op, |_| (), move |()| call, apply).await
    }

    /// Fetch the current page of a list slice with its own query.
    ///
    /// `load` receives the slice scope and the query parameters.
    pub(crate) async fn fetch_list<T, F, L, Fut>(&self, slice: SliceSelector<T, F>, load: L) -> Result<()>
    where
        T: Entity + Clone + 'static,
        F: Default + Clone + PartialEq + 'static,
        L: FnOnce(Option<i64>, ListParams<F>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let strict = self.settings.strict_shapes;
        self.dispatch_with(
            move |s| &mut slice(s).fetch,
            move |s| {
                let slice = slice(s);
                (slice.scope(), slice.query.params().clone())
            },
            move |(scope, params): (Option<i64>, ListParams<F>)| {
                let (page, limit) = (params.page, params.limit);
                let request = load(scope, params);
                async move {
                    match request.await {
                        Err(Error::UnrecognizedShape { key, shape }) if !strict => {
                            warn!(
                                "Unrecognized '{}' response shape {}, showing an empty list",
                                key, shape
                            );
                            Ok(Page::empty(page, limit))
                        }
                        other => other,
                    }
                }
            },
            move |s, page: &Page<T>| slice(s).apply_page(page.clone()),
        )
        .await?;
        Ok(())
    }

    /// Apply `change` to a slice query. Returns whether the query changed.
    pub(crate) async fn change_query<T, F>(
        &self,
        slice: SliceSelector<T, F>,
        change: impl FnOnce(&mut ListQuery<F>) -> bool,
    ) -> bool {
        let mut state = self.state.write().await;
        let changed = change(&mut slice(&mut *state).query);
        if changed {
            debug!("List query changed, refetching");
        }
        changed
    }

    /// Create through `call` and prepend the result
    pub(crate) async fn create_in<T, F, Fut>(&self, slice: SliceSelector<T, F>, call: Fut) -> Result<T>
    where
        T: Entity + Clone + 'static,
        F: Default + Clone + PartialEq + 'static,
        Fut: Future<Output = Result<T>>,
    {
        self.dispatch(
            move |s| &mut slice(s).create,
            call,
            move |s, item: &T| slice(s).apply_created(item.clone()),
        )
        .await
    }

    /// Update through `call`, merge the returned fields and return the
    /// merged entity if it is cached
    pub(crate) async fn merge_in<T, F, Fut>(
        &self,
        slice: SliceSelector<T, F>,
        id: i64,
        call: Fut,
    ) -> Result<Option<T>>
    where
        T: Entity + Serialize + DeserializeOwned + Clone + 'static,
        F: Default + Clone + PartialEq + 'static,
        Fut: Future<Output = Result<Map<String, Value>>>,
    {
        self.try_dispatch(
            move |s| &mut slice(s).update,
            call,
            move |s, fields: &Map<String, Value>| slice(s).apply_merged(id, fields),
        )
        .await?;

        let mut state = self.state.write().await;
        Ok(slice(&mut *state).items.get(id).cloned())
    }

    /// Delete through `call` and drop the cached entity
    pub(crate) async fn remove_in<T, F, Fut>(
        &self,
        slice: SliceSelector<T, F>,
        id: i64,
        call: Fut,
    ) -> Result<()>
    where
        T: Entity + 'static,
        F: Default + Clone + PartialEq + 'static,
        Fut: Future<Output = Result<()>>,
    {
        self.dispatch(
            move |s| &mut slice(s).delete,
            call,
            move |s, _: &()| slice(s).apply_removed(id),
        )
        .await
    }
}
