use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use indexmap::IndexMap;

use crate::domain::entities::query::QuerySignature;
use crate::domain::entities::record::ResponsePage;
use crate::usecase::ports::source::{FetchError, RecordSource};
use crate::usecase::services::request_builder::RequestBuilder;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

pub type FetchOutcome = Result<Rc<ResponsePage>, FetchError>;

type PendingFetch = Shared<LocalBoxFuture<'static, FetchOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub signature: QuerySignature,
    pub data: Option<Rc<ResponsePage>>,
    pub status: CacheStatus,
    pub last_error: Option<FetchError>,
    /// Set once the grid has moved to another signature; the next resolve
    /// refetches while the old rows stay visible.
    pub stale: bool,
}

impl CacheEntry {
    fn idle(signature: QuerySignature) -> Self {
        Self {
            signature,
            data: None,
            status: CacheStatus::Idle,
            last_error: None,
            stale: false,
        }
    }
}

/// What the grid should show for the active signature right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheView {
    pub data: Option<Rc<ResponsePage>>,
    /// Signature the shown data belongs to.
    pub data_signature: Option<QuerySignature>,
    /// Shown data belongs to an earlier signature.
    pub is_placeholder: bool,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

struct CacheState {
    entries: IndexMap<QuerySignature, CacheEntry>,
    in_flight: HashMap<QuerySignature, PendingFetch>,
    active: Option<QuerySignature>,
    placeholder: Option<(QuerySignature, Rc<ResponsePage>)>,
    capacity: usize,
}

impl CacheState {
    fn activate(&mut self, signature: &QuerySignature) {
        if self.active.as_ref() != Some(signature) {
            if let Some(previous) = self.active.take() {
                if let Some(entry) = self.entries.get_mut(&previous) {
                    entry.stale = true;
                }
            }
            self.active = Some(signature.clone());
        }

        // most recently used entries live at the back
        if let Some(entry) = self.entries.shift_remove(signature) {
            if let Some(data) = &entry.data {
                self.placeholder = Some((signature.clone(), Rc::clone(data)));
            }
            self.entries.insert(signature.clone(), entry);
        }
    }

    fn fresh_data(&self, signature: &QuerySignature) -> Option<Rc<ResponsePage>> {
        self.entries
            .get(signature)
            .filter(|entry| entry.status == CacheStatus::Success && !entry.stale)
            .and_then(|entry| entry.data.clone())
    }

    /// Rows left behind by an earlier signature change. They are served at
    /// once while a refresh runs; a failed refresh is not served this way.
    fn revalidating_data(&self, signature: &QuerySignature) -> Option<Rc<ResponsePage>> {
        self.entries
            .get(signature)
            .filter(|entry| entry.stale && entry.status != CacheStatus::Error)
            .and_then(|entry| entry.data.clone())
    }

    fn begin(&mut self, signature: &QuerySignature, pending: PendingFetch) {
        let entry = self
            .entries
            .entry(signature.clone())
            .or_insert_with(|| CacheEntry::idle(signature.clone()));
        entry.status = CacheStatus::Loading;
        self.in_flight.insert(signature.clone(), pending);
        self.evict_overflow();
    }

    fn complete(&mut self, signature: &QuerySignature, outcome: &FetchOutcome) {
        self.in_flight.remove(signature);
        let is_active = self.active.as_ref() == Some(signature);
        let entry = self
            .entries
            .entry(signature.clone())
            .or_insert_with(|| CacheEntry::idle(signature.clone()));

        match outcome {
            Ok(page) => {
                entry.data = Some(Rc::clone(page));
                entry.status = CacheStatus::Success;
                entry.last_error = None;
                entry.stale = !is_active;
                if is_active {
                    self.placeholder = Some((signature.clone(), Rc::clone(page)));
                }
                tracing::info!(
                    total_results = page.total_results,
                    total_pages = page.total_pages,
                    rows = page.rows.len(),
                    is_active,
                    "fetch completed"
                );
            }
            Err(err) => {
                entry.status = CacheStatus::Error;
                entry.last_error = Some(err.clone());
                tracing::warn!(error = %err, is_active, "fetch failed");
            }
        }

        self.evict_overflow();
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            let victim = self.entries.keys().position(|signature| {
                self.active.as_ref() != Some(signature) && !self.in_flight.contains_key(signature)
            });
            match victim {
                Some(index) => {
                    if let Some((signature, _)) = self.entries.shift_remove_index(index) {
                        tracing::debug!(?signature, "evicted cache entry");
                    }
                }
                None => break,
            }
        }
    }
}

/// Memoizes one response per signature.
///
/// Concurrent resolves of the same signature share one fetch. A response is
/// always stored under its own signature, but only the active signature's
/// response feeds the view; a late answer for an abandoned signature never
/// replaces what the grid shows.
pub struct ResultCache {
    source: Rc<dyn RecordSource>,
    builder: RequestBuilder,
    state: Rc<RefCell<CacheState>>,
}

impl ResultCache {
    pub fn new(source: Rc<dyn RecordSource>, builder: RequestBuilder, capacity: usize) -> Self {
        Self {
            source,
            builder,
            state: Rc::new(RefCell::new(CacheState {
                entries: IndexMap::new(),
                in_flight: HashMap::new(),
                active: None,
                placeholder: None,
                capacity: capacity.max(1),
            })),
        }
    }

    /// Make `signature` the active one and return its page.
    ///
    /// A fresh success is returned as is. A success left stale by an earlier
    /// signature change is also returned at once, with a refresh registered
    /// as in flight; the refresh runs while it is awaited through
    /// [`ResultCache::settle`] or a later `resolve`. Otherwise the caller
    /// joins the in-flight fetch or starts one.
    pub async fn resolve(&self, signature: &QuerySignature) -> FetchOutcome {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.activate(signature);

            if let Some(data) = state.fresh_data(signature) {
                tracing::debug!(?signature, "cache hit");
                return Ok(data);
            }
            if let Some(data) = state.revalidating_data(signature) {
                if !state.in_flight.contains_key(signature) {
                    let pending = self.start_fetch(signature);
                    state.begin(signature, pending);
                }
                tracing::debug!(?signature, "serving stale entry while it refreshes");
                return Ok(data);
            }

            if let Some(pending) = state.in_flight.get(signature) {
                tracing::debug!(?signature, "joining in-flight fetch");
                pending.clone()
            } else {
                let pending = self.start_fetch(signature);
                state.begin(signature, pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Wait for the fetch in flight for `signature`, if there is one.
    pub async fn settle(&self, signature: &QuerySignature) -> Option<FetchOutcome> {
        let pending = self.state.borrow().in_flight.get(signature).cloned();
        match pending {
            Some(pending) => Some(pending.await),
            None => None,
        }
    }

    fn start_fetch(&self, signature: &QuerySignature) -> PendingFetch {
        let source = Rc::clone(&self.source);
        let state = Rc::clone(&self.state);
        let request = self.builder.build(signature);
        let signature = signature.clone();

        async move {
            let outcome = source.fetch(&request).await.map(Rc::new);
            state.borrow_mut().complete(&signature, &outcome);
            outcome
        }
        .boxed_local()
        .shared()
    }

    pub fn view(&self) -> CacheView {
        let state = self.state.borrow();
        let Some(active) = state.active.as_ref() else {
            return CacheView::default();
        };

        let entry = state.entries.get(active);
        let is_loading = state.in_flight.contains_key(active);
        let error = entry
            .filter(|entry| entry.status == CacheStatus::Error)
            .and_then(|entry| entry.last_error.clone());

        let (data, data_signature) = match entry.and_then(|entry| entry.data.clone()) {
            Some(data) => (Some(data), Some(active.clone())),
            None => match &state.placeholder {
                Some((signature, data)) => (Some(Rc::clone(data)), Some(signature.clone())),
                None => (None, None),
            },
        };

        CacheView {
            is_placeholder: data_signature
                .as_ref()
                .is_some_and(|signature| signature != active),
            data,
            data_signature,
            is_loading,
            error,
        }
    }

    pub fn entry(&self, signature: &QuerySignature) -> Option<CacheEntry> {
        self.state.borrow().entries.get(signature).cloned()
    }

    pub fn active(&self) -> Option<QuerySignature> {
        self.state.borrow().active.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::{Cell, RefCell};

    use async_trait::async_trait;
    use futures::channel::oneshot;

    use crate::domain::entities::record::{ArkRecord, ResponsePage};
    use crate::usecase::ports::source::{FetchError, RecordSource};
    use crate::usecase::services::request_builder::{
        RequestDescriptor, PARAM_PAGE, PARAM_PAGE_SIZE,
    };

    /// Builds a page whose arks encode the request, e.g. `p0-r1`.
    pub fn page_for(request: &RequestDescriptor, total_results: usize) -> ResponsePage {
        let index: usize = request.param(PARAM_PAGE).and_then(|v| v.parse().ok()).unwrap_or(0);
        let size: usize = request
            .param(PARAM_PAGE_SIZE)
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let start = index * size;
        let rows = (start..total_results.min(start + size))
            .map(|row| ArkRecord {
                ark: format!("p{index}-r{row}"),
                original_identifier: format!("id-{row}"),
                project: request.param("project").unwrap_or("astro").to_string(),
                path: format!("/scans/{row}"),
                url: None,
            })
            .collect();
        ResponsePage {
            rows,
            total_results,
            total_pages: total_results.div_ceil(size),
            page: Some(index),
            page_size: Some(size),
        }
    }

    /// Answers immediately and counts calls.
    pub struct CountingSource {
        pub calls: Cell<usize>,
        pub total_results: Cell<usize>,
        pub requests: RefCell<Vec<RequestDescriptor>>,
    }

    impl CountingSource {
        pub fn new(total_results: usize) -> Self {
            Self {
                calls: Cell::new(0),
                total_results: Cell::new(total_results),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl RecordSource for CountingSource {
        async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.requests.borrow_mut().push(request.clone());
            Ok(page_for(request, self.total_results.get()))
        }
    }

    /// Holds every fetch open until the test releases it.
    #[derive(Default)]
    pub struct GatedSource {
        pub requests: RefCell<Vec<RequestDescriptor>>,
        gates: RefCell<Vec<Option<oneshot::Sender<Result<ResponsePage, FetchError>>>>>,
    }

    impl GatedSource {
        pub fn calls(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn release(&self, call: usize, outcome: Result<ResponsePage, FetchError>) {
            let sender = self.gates.borrow_mut()[call]
                .take()
                .expect("gate should only be released once");
            let _ = sender.send(outcome);
        }
    }

    #[async_trait(?Send)]
    impl RecordSource for GatedSource {
        async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError> {
            let (sender, receiver) = oneshot::channel();
            self.requests.borrow_mut().push(request.clone());
            self.gates.borrow_mut().push(Some(sender));
            receiver
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".to_string())))
        }
    }
}
