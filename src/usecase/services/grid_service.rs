use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::entities::field::{ColumnMeta, FieldId, COLUMNS};
use crate::domain::entities::query::{FilterSpec, QuerySignature, SortDirection, SortSpec};
use crate::domain::entities::record::{ArkRecord, ResponsePage};
use crate::usecase::controllers::filter::FilterController;
use crate::usecase::controllers::pagination::{PageWindow, PaginationController};
use crate::usecase::controllers::sort::SortController;
use crate::usecase::ports::source::{FetchError, GridError, RecordSource, ValidationError};
use crate::usecase::services::request_builder::RequestBuilder;
use crate::usecase::services::result_cache::ResultCache;

/// User intents emitted by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridIntent {
    ToggleSort(FieldId),
    SubmitFilter { field: FieldId, value: String },
    GoToPage(usize),
    ChangePageSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnState {
    pub meta: ColumnMeta,
    pub sorted: Option<SortDirection>,
}

/// Everything the view needs to draw the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub rows: Vec<ArkRecord>,
    pub columns: Vec<ColumnState>,
    pub active_sort: Option<SortSpec>,
    pub active_filter: Option<FilterSpec>,
    pub pagination: PageWindow,
    pub page_index: usize,
    pub page_size: usize,
    pub total_results: usize,
    pub total_pages: usize,
    pub is_loading: bool,
    pub is_placeholder: bool,
    pub error: Option<FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Applied,
    Clamped,
    Superseded,
}

#[derive(Debug, Default)]
struct Controllers {
    sort: SortController,
    filter: FilterController,
    pagination: PaginationController,
}

impl Controllers {
    fn signature(&self) -> QuerySignature {
        QuerySignature::new(
            self.filter.active().cloned(),
            self.sort.active(),
            self.pagination.page(),
        )
    }
}

/// Single dispatcher for grid intents.
///
/// Each intent updates exactly one controller and yields the next
/// [`QuerySignature`]; [`GridService::sync`] then resolves that signature
/// through the cache. Intents are applied synchronously and in order, so the
/// signature for a later intent is always derived after an earlier one.
pub struct GridService {
    controllers: RefCell<Controllers>,
    cache: ResultCache,
}

impl GridService {
    pub fn new(
        source: Rc<dyn RecordSource>,
        page_size: usize,
        window_radius: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            controllers: RefCell::new(Controllers {
                pagination: PaginationController::new(page_size, window_radius),
                ..Controllers::default()
            }),
            cache: ResultCache::new(source, RequestBuilder::default(), cache_capacity),
        }
    }

    pub fn signature(&self) -> QuerySignature {
        self.controllers.borrow().signature()
    }

    /// Apply an intent. A rejected intent leaves every controller as it was.
    pub fn dispatch(&self, intent: GridIntent) -> Result<QuerySignature, GridError> {
        let mut controllers = self.controllers.borrow_mut();
        match intent {
            GridIntent::ToggleSort(field) => {
                if !field.is_sortable() {
                    tracing::warn!(%field, "rejected sort on non-sortable column");
                    return Err(ValidationError::NotSortable(field).into());
                }
                controllers.sort.toggle(field);
                controllers.pagination.reset();
            }
            GridIntent::SubmitFilter { field, value } => {
                if let Err(err) = controllers.filter.submit(field, &value) {
                    tracing::warn!(error = %err, "rejected filter submission");
                    return Err(err.into());
                }
                controllers.pagination.reset();
            }
            GridIntent::GoToPage(index) => {
                controllers.pagination.set_page(index);
            }
            GridIntent::ChangePageSize(size) => {
                controllers.pagination.set_page_size(size)?;
            }
        }

        let signature = controllers.signature();
        tracing::debug!(?signature, "dispatched intent");
        Ok(signature)
    }

    /// Resolve the current signature and fold the response totals into the
    /// pagination state.
    ///
    /// Cached rows served during a refresh are folded in first, so the page
    /// window always matches the rows on screen; the refreshed totals follow
    /// once the refresh settles. When the totals push the current page out of
    /// range the page is clamped and the clamped signature is resolved once
    /// more.
    pub async fn sync(&self) -> RenderState {
        let mut clamped = false;
        loop {
            let signature = self.signature();
            let Ok(page) = self.cache.resolve(&signature).await else {
                break;
            };
            match self.fold(&signature, &page) {
                Fold::Clamped if !clamped => {
                    clamped = true;
                    continue;
                }
                Fold::Superseded => break,
                Fold::Clamped | Fold::Applied => {}
            }

            if let Some(Ok(page)) = self.cache.settle(&signature).await {
                if self.fold(&signature, &page) == Fold::Clamped && !clamped {
                    clamped = true;
                    continue;
                }
            }
            break;
        }
        self.render_state()
    }

    fn fold(&self, signature: &QuerySignature, page: &ResponsePage) -> Fold {
        let mut controllers = self.controllers.borrow_mut();
        if controllers.signature() != *signature {
            // superseded by a newer intent while in flight
            return Fold::Superseded;
        }
        if controllers
            .pagination
            .on_response(page.total_results, page.total_pages)
        {
            tracing::debug!(
                page_index = controllers.pagination.page_index(),
                "page clamped to new totals"
            );
            Fold::Clamped
        } else {
            Fold::Applied
        }
    }

    /// Apply an intent and resolve the resulting signature.
    pub async fn handle(&self, intent: GridIntent) -> Result<RenderState, GridError> {
        self.dispatch(intent)?;
        Ok(self.sync().await)
    }

    pub fn render_state(&self) -> RenderState {
        let controllers = self.controllers.borrow();
        let view = self.cache.view();
        let active_sort = controllers.sort.active();

        RenderState {
            rows: view
                .data
                .as_ref()
                .map(|page| page.rows.clone())
                .unwrap_or_default(),
            columns: COLUMNS
                .iter()
                .map(|meta| ColumnState {
                    meta: *meta,
                    sorted: controllers.sort.direction_of(meta.field),
                })
                .collect(),
            active_sort,
            active_filter: controllers.filter.active().cloned(),
            pagination: controllers.pagination.window(),
            page_index: controllers.pagination.page_index(),
            page_size: controllers.pagination.page_size(),
            total_results: controllers.pagination.total_results(),
            total_pages: controllers.pagination.total_pages(),
            is_loading: view.is_loading,
            is_placeholder: view.is_placeholder,
            error: view.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::domain::entities::query::PageSpec;
    use crate::usecase::controllers::pagination::DEFAULT_WINDOW_RADIUS;
    use crate::usecase::services::result_cache::test_support::CountingSource;

    fn service(total_results: usize) -> (Rc<CountingSource>, GridService) {
        let source = Rc::new(CountingSource::new(total_results));
        let grid = GridService::new(source.clone(), 10, DEFAULT_WINDOW_RADIUS, 16);
        (source, grid)
    }

    #[tokio::test]
    async fn filter_submission_resets_to_first_page() {
        let (_source, grid) = service(200);
        grid.sync().await;
        grid.handle(GridIntent::GoToPage(7)).await.expect("page change should apply");
        assert_eq!(grid.signature().page.index, 7);

        let state = grid
            .handle(GridIntent::SubmitFilter {
                field: FieldId::Project,
                value: "astro".to_string(),
            })
            .await
            .expect("filter should apply");

        assert_eq!(state.page_index, 0);
        assert_eq!(
            state.active_filter.map(|filter| filter.value),
            Some("astro".to_string())
        );
    }

    #[tokio::test]
    async fn sort_toggle_resets_page_but_keeps_size() {
        let (_source, grid) = service(200);
        grid.dispatch(GridIntent::ChangePageSize(20)).expect("size should apply");
        grid.sync().await;
        grid.dispatch(GridIntent::GoToPage(3)).expect("page should apply");

        let signature = grid
            .dispatch(GridIntent::ToggleSort(FieldId::OriginalIdentifier))
            .expect("sort should apply");

        assert_eq!(signature.page, PageSpec { index: 0, size: 20 });
    }

    #[test]
    fn rejected_filter_keeps_state() {
        let (_source, grid) = service(10);
        grid.dispatch(GridIntent::SubmitFilter {
            field: FieldId::Ark,
            value: "b7".to_string(),
        })
        .expect("ark filter should apply");
        let before = grid.signature();

        let result = grid.dispatch(GridIntent::SubmitFilter {
            field: FieldId::Path,
            value: "/x".to_string(),
        });

        assert_eq!(
            result,
            Err(GridError::Validation(ValidationError::NotFilterable(FieldId::Path)))
        );
        assert_eq!(grid.signature(), before);
    }

    #[tokio::test]
    async fn response_totals_drive_the_window() {
        let (source, grid) = service(47);

        let state = grid.sync().await;

        assert_eq!(source.calls.get(), 1);
        assert_eq!(state.rows.len(), 10);
        assert_eq!(state.total_results, 47);
        assert_eq!(state.total_pages, 5);
        assert_eq!(state.pagination.page_numbers(), vec![1, 2, 3, 4, 5]);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn out_of_range_page_is_clamped_and_refetched() {
        let (source, grid) = service(100);
        grid.sync().await;
        grid.handle(GridIntent::GoToPage(9)).await.expect("page should apply");
        source.total_results.set(25);

        let state = grid
            .handle(GridIntent::GoToPage(8))
            .await
            .expect("page should apply");

        assert_eq!(source.calls.get(), 4);
        assert_eq!(state.page_index, 2);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.rows.first().map(|row| row.ark.as_str()), Some("p2-r20"));
    }

    #[tokio::test]
    async fn column_state_marks_the_sorted_column() {
        let (_source, grid) = service(5);
        grid.handle(GridIntent::ToggleSort(FieldId::Ark)).await.expect("sort should apply");

        let state = grid
            .handle(GridIntent::ToggleSort(FieldId::Ark))
            .await
            .expect("sort should apply");

        let sorted: Vec<_> = state
            .columns
            .iter()
            .filter_map(|column| column.sorted.map(|dir| (column.meta.field, dir)))
            .collect();
        assert_eq!(sorted, vec![(FieldId::Ark, SortDirection::Desc)]);
    }
}
