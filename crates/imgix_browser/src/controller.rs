// SPDX-License-Identifier: Apache-2.0

//! The pagination/search state machine.
//!
//! [`Controller`] owns all gallery state. Actions mutate it through
//! [`Controller::dispatch_all`], which reconciles the batch into at most one
//! [`FetchRequest`]. Completions come back through [`Controller::apply`] and
//! are dropped unless they answer the most recently issued request.
//!
//! The session uses [`Controller::dispatch_held`] instead, which keeps a
//! source change's re-fetch back for one page-debounce window so that a page
//! change following the selection is served by the same request.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::config::Credentials;
use crate::debounce::LeadingDebounce;
use crate::error::ApiError;
use crate::fetch::CollectionApi;
use crate::models::asset::Asset;
use crate::models::page::{PageInfo, page_count};
use crate::models::payload::RawCollectionPayload;
use crate::models::source::Source;
use crate::normalize::normalize_collection;
use crate::notices::{ErrorQueue, ErrorRecord};
use crate::query::AssetQuery;
use crate::urls::build_asset_urls;

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pick the source to browse. Resets the page index and dismisses
    /// queued errors; the held search term is kept.
    SelectSource(Source),
    /// Go to a page. Debounced, and ignored while a search is in flight.
    ChangePage(usize),
    /// Update the held search term without submitting it.
    SetSearchTerm(String),
    /// Submit a search, optionally replacing the held term first. Debounced.
    Search(Option<String>),
    /// Dismiss the first `n` queued errors.
    ResolveErrors(usize),
    /// Re-issue the current page's query, e.g. after an upload.
    Refresh,
}

/// An outbound asset query tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub source_id: String,
    pub query: AssetQuery,
}

impl FetchRequest {
    pub fn resource_path(&self) -> String {
        self.query.resource_path(&self.source_id)
    }
}

/// What [`Controller::apply`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The completion answered the latest request and was stored.
    Current,
    /// A newer request had been issued; the completion was discarded.
    Superseded,
}

/// Gallery state. Only the controller mutates it.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub selected_source: Option<Source>,
    pub all_sources: Vec<Source>,
    pub page: PageInfo,
    pub search_term: String,
    pub assets: Vec<Asset>,
    pub errors: ErrorQueue,
    pub is_searching: bool,
    pub verified: bool,
}

/// Immutable view handed to display collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub selected_source: Option<Source>,
    pub all_sources: Vec<Source>,
    pub page: PageInfo,
    pub search_term: String,
    pub assets: Vec<Asset>,
    /// Head of the error queue.
    pub error: Option<ErrorRecord>,
    pub queued_errors: usize,
    pub is_searching: bool,
    /// A request is held or in flight and its completion not yet applied.
    pub loading: bool,
}

/// Source and page index the last request was issued for.
#[derive(Debug, Clone, Default)]
struct Reconciled {
    source_id: Option<String>,
    page_index: usize,
}

#[derive(Debug)]
pub struct Controller {
    state: ControllerState,
    generation: u64,
    applied_generation: u64,
    reconciled: Reconciled,
    /// Deadline of a source-change fetch held by `dispatch_held`.
    source_hold: Option<Instant>,
    page_debounce: LeadingDebounce,
    search_debounce: LeadingDebounce,
}

impl Controller {
    pub fn new(credentials: &Credentials, debounce: Duration) -> Self {
        Self {
            state: ControllerState {
                verified: credentials.successfully_verified,
                ..Default::default()
            },
            generation: 0,
            applied_generation: 0,
            reconciled: Reconciled::default(),
            source_hold: None,
            page_debounce: LeadingDebounce::new(debounce),
            search_debounce: LeadingDebounce::new(debounce),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            selected_source: self.state.selected_source.clone(),
            all_sources: self.state.all_sources.clone(),
            page: self.state.page,
            search_term: self.state.search_term.clone(),
            assets: self.state.assets.clone(),
            error: self.state.errors.first().cloned(),
            queued_errors: self.state.errors.len(),
            is_searching: self.state.is_searching,
            loading: self.is_loading(),
        }
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.applied_generation != self.generation || self.source_hold.is_some()
    }

    /// Loads the source catalog. Runs once, before any action.
    ///
    /// An unverified credential short-circuits with `InvalidCredential`; a
    /// catalog that cannot be read or has no enabled source queues
    /// `NoSourcesAvailable`.
    pub async fn mount<A: CollectionApi + ?Sized>(&mut self, api: &A) {
        if !self.state.verified {
            warn!("API key is not verified, skipping source catalog");
            self.state.errors.replace_with(ErrorRecord::invalid_credential());
            return;
        }

        let sources = match catalog::fetch_enabled_sources(api).await {
            Ok(sources) => sources,
            Err(e) => {
                error!("Failed to load source catalog: {}", e);
                Vec::new()
            }
        };

        if sources.is_empty() {
            self.state.errors.replace_with(ErrorRecord::no_sources());
            return;
        }

        info!("Loaded {} enabled sources", sources.len());
        self.state.all_sources = sources;
    }

    /// Looks a loaded source up by id, then by name.
    pub fn find_source(&self, key: &str) -> Option<&Source> {
        self.state
            .all_sources
            .iter()
            .find(|s| s.id == key)
            .or_else(|| self.state.all_sources.iter().find(|s| s.name == key))
    }

    pub fn dispatch(&mut self, action: Action) -> Option<FetchRequest> {
        self.dispatch_all([action])
    }

    /// Applies a batch of actions, then issues at most one request.
    ///
    /// A request is issued when an action asked for one explicitly (search,
    /// refresh), when the selected source changed, or when the page index
    /// changed while no search is in flight.
    pub fn dispatch_all<I>(&mut self, actions: I) -> Option<FetchRequest>
    where
        I: IntoIterator<Item = Action>,
    {
        let mut explicit = false;
        for action in actions {
            explicit |= self.reduce(action);
        }

        if explicit || self.needs_reconcile() {
            self.issue()
        } else {
            None
        }
    }

    /// Applies a batch like [`Controller::dispatch_all`], except that a
    /// re-fetch caused only by a new source is held until the page-debounce
    /// window has passed. A page change arriving in the meantime issues one
    /// request for the new source and page; otherwise
    /// [`Controller::release_hold`] issues it at [`Controller::hold_deadline`].
    /// Searches and refreshes are never held.
    pub fn dispatch_held<I>(&mut self, actions: I) -> Option<FetchRequest>
    where
        I: IntoIterator<Item = Action>,
    {
        let mut explicit = false;
        let mut selected = false;
        let mut paged = false;
        for action in actions {
            let before = self.state.page.current_index;
            let is_page_change = matches!(action, Action::ChangePage(_));
            selected |= matches!(action, Action::SelectSource(_));
            explicit |= self.reduce(action);
            paged |= is_page_change && self.state.page.current_index != before;
        }

        if explicit {
            return self.issue();
        }
        if !self.source_changed() {
            return if self.page_changed() { self.issue() } else { None };
        }

        let wait = self.page_debounce.wait();
        if paged || wait.is_zero() {
            return self.issue();
        }
        if selected || self.source_hold.is_none() {
            debug!("Holding source fetch for {:?}", wait);
            self.source_hold = Some(Instant::now() + wait);
        }
        None
    }

    /// When a held source fetch is due.
    pub fn hold_deadline(&self) -> Option<Instant> {
        self.source_hold
    }

    /// Ends a hold and issues the held request if it is still needed.
    pub fn release_hold(&mut self) -> Option<FetchRequest> {
        self.source_hold.take()?;
        if self.needs_reconcile() {
            self.issue()
        } else {
            None
        }
    }

    /// Returns true if the action itself requires a fetch.
    fn reduce(&mut self, action: Action) -> bool {
        match action {
            Action::SelectSource(source) => {
                debug!("Selecting source '{}' ({})", source.name, source.id);
                self.state.selected_source = Some(source);
                self.state.page.current_index = 0;
                self.state.errors.clear();
                false
            }
            Action::ChangePage(index) => {
                if !self.page_debounce.admit() {
                    debug!("Dropping page change to {} inside debounce window", index);
                    return false;
                }
                if self.state.is_searching {
                    debug!("Dropping page change to {} while a search is in flight", index);
                    return false;
                }
                self.state.page.current_index = index;
                false
            }
            Action::SetSearchTerm(term) => {
                self.state.search_term = term;
                false
            }
            Action::Search(term) => {
                if let Some(term) = term {
                    self.state.search_term = term;
                }
                if !self.search_debounce.admit() {
                    debug!("Dropping search submission inside debounce window");
                    return false;
                }
                if self.state.selected_source.is_none() {
                    debug!("Ignoring search without a selected source");
                    return false;
                }
                self.state.page.current_index = 0;
                self.state.is_searching = true;
                true
            }
            Action::ResolveErrors(n) => {
                let removed = self.state.errors.resolve(n);
                debug!("Resolved {} errors", removed);
                false
            }
            Action::Refresh => self.state.selected_source.is_some(),
        }
    }

    fn needs_reconcile(&self) -> bool {
        self.source_changed() || self.page_changed()
    }

    fn source_changed(&self) -> bool {
        let current_source = self.state.selected_source.as_ref().map(|s| s.id.as_str());
        current_source != self.reconciled.source_id.as_deref()
    }

    fn page_changed(&self) -> bool {
        !self.state.is_searching && self.state.page.current_index != self.reconciled.page_index
    }

    fn issue(&mut self) -> Option<FetchRequest> {
        self.source_hold = None;
        let source = self.state.selected_source.as_ref()?;
        let query = AssetQuery::for_term(self.state.page.current_index, &self.state.search_term);

        self.generation += 1;
        self.reconciled = Reconciled {
            source_id: Some(source.id.clone()),
            page_index: self.state.page.current_index,
        };

        let request = FetchRequest {
            generation: self.generation,
            source_id: source.id.clone(),
            query,
        };
        debug!(
            "Issuing request #{}: {}",
            request.generation,
            request.resource_path()
        );
        Some(request)
    }

    /// Stores the outcome of `request` if it is still the latest one.
    pub fn apply(
        &mut self,
        request: &FetchRequest,
        outcome: Result<RawCollectionPayload, ApiError>,
    ) -> Applied {
        if request.generation != self.generation {
            debug!(
                "Discarding response #{} (latest is #{})",
                request.generation, self.generation
            );
            return Applied::Superseded;
        }

        let page = normalize_collection(outcome, request.query.fallback_error());

        self.state.page.total_page_count = page_count(page.total_records);
        if self.state.page.total_page_count == 0 {
            self.state.errors.extend(page.missing_total);
        }

        if !page.assets.is_empty() && !self.state.errors.is_empty() {
            self.state.errors.clear();
        }

        let domain = self
            .state
            .selected_source
            .as_ref()
            .map(|s| s.domain.as_str())
            .unwrap_or_default();
        self.state.assets = build_asset_urls(&page.assets, domain);
        self.state.is_searching = false;
        self.applied_generation = request.generation;

        Applied::Current
    }

    /// Issues `request` against `api` and applies the outcome.
    pub async fn settle<A: CollectionApi + ?Sized>(
        &mut self,
        api: &A,
        request: FetchRequest,
    ) -> Applied {
        let outcome = api.request(&request.resource_path()).await;
        self.apply(&request, outcome)
    }

    /// Full URL of the asset at `index` on the current page, for handing
    /// back to the host.
    pub fn pick(&self, index: usize) -> Option<String> {
        self.state.assets.get(index).map(|asset| asset.src.clone())
    }
}
