use std::rc::Rc;
use std::task::Poll;

use dioxus::prelude::*;

use crate::config::GridConfig;
use crate::domain::entities::field::{filterable_columns, FieldId};
use crate::domain::entities::query::SortDirection;
use crate::domain::entities::record::ArkRecord;
use crate::ui::state::app_state::AppState;
use crate::usecase::controllers::pagination::PageControl;
use crate::usecase::ports::source::FetchError;
use crate::usecase::services::grid_service::{ColumnState, GridIntent, GridService, RenderState};

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

pub fn sort_arrow(direction: Option<SortDirection>) -> &'static str {
    match direction {
        Some(SortDirection::Asc) => " ↓",
        Some(SortDirection::Desc) => " ↑",
        None => "",
    }
}

pub fn page_title(state: &RenderState) -> &'static str {
    if state.active_filter.is_some() {
        "Filter Results"
    } else {
        "ARK Database"
    }
}

pub fn header_cell_style(column: &ColumnState) -> String {
    format!(
        "width: {}px; text-align: left; padding: 4px 8px; border-bottom: 2px solid #444; cursor: {}; user-select: none;",
        column.meta.width,
        if column.meta.sortable { "pointer" } else { "default" }
    )
}

pub fn body_style(state: &RenderState) -> &'static str {
    if state.is_placeholder {
        "opacity: 0.6;"
    } else {
        ""
    }
}

pub fn fetch_error_message(err: &FetchError) -> String {
    match err {
        FetchError::Network(_) => format!("An error occurred... ({err}). Resubmit to retry."),
        FetchError::Server { status, .. } => {
            format!("An error occurred... (server responded {status}). Resubmit to retry.")
        }
        FetchError::Decode(_) => {
            "An error occurred... (unexpected response). Resubmit to retry.".to_string()
        }
    }
}

pub fn cell_value(record: &ArkRecord, field: FieldId) -> &str {
    match field {
        FieldId::Ark => &record.ark,
        FieldId::OriginalIdentifier => &record.original_identifier,
        FieldId::Project => &record.project,
        FieldId::Path => &record.path,
    }
}

fn build_grid() -> Result<Rc<GridService>, String> {
    let config = GridConfig::from_env().map_err(|err| format!("{err:#}"))?;
    let source = config.build_source().map_err(|err| format!("{err:#}"))?;
    tracing::debug!(?config, "grid configured");
    Ok(Rc::new(GridService::new(
        source,
        config.page_size,
        config.window_radius,
        config.cache_capacity,
    )))
}

/// Resolve the current signature, publishing the loading state once the
/// fetch has started and the final state when it settles.
async fn drive_sync(grid: Rc<GridService>, mut render: Signal<Option<RenderState>>) {
    let sync = grid.sync();
    futures::pin_mut!(sync);
    if let Poll::Ready(state) = futures::poll!(sync.as_mut()) {
        render.set(Some(state));
        return;
    }
    render.set(Some(grid.render_state()));
    let state = sync.await;
    render.set(Some(state));
}

#[component]
pub fn App() -> Element {
    let AppState {
        render,
        mut notice,
        mut filter_field,
        mut filter_text,
    } = AppState::new();

    let grid = use_hook(build_grid);

    use_hook({
        let grid = grid.clone();
        move || {
            if let Ok(grid) = grid {
                spawn(drive_sync(grid, render));
            }
        }
    });

    let dispatch = use_callback({
        let grid = grid.clone();
        move |intent: GridIntent| {
            let Ok(grid) = grid.clone() else {
                return;
            };
            match grid.dispatch(intent) {
                Ok(_) => {
                    notice.set(None);
                    spawn(drive_sync(grid, render));
                }
                Err(err) => notice.set(Some(err.to_string())),
            }
        }
    });

    if let Err(err) = &grid {
        return rsx! {
            div { style: "padding: 16px; font-family: sans-serif;",
                h1 { "ARK Database" }
                p { "Unable to start: {err}" }
            }
        };
    }

    let Some(state) = render() else {
        return rsx! {
            div { style: "padding: 16px; font-family: sans-serif;",
                h1 { "ARK Database" }
                p { "Loading..." }
            }
        };
    };

    let title = page_title(&state);
    let page_size = state.page_size;
    let controls = state.pagination.controls();
    let columns = state.columns.clone();
    let row_fields: Vec<FieldId> = columns.iter().map(|column| column.meta.field).collect();

    rsx! {
        div { style: "padding: 16px; font-family: sans-serif;",
            div { style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; margin-bottom: 12px;",
                h1 { style: "margin: 0 16px 0 0;", "{title}" }
                label { r#for: "filterFor", "Filter for" }
                input {
                    id: "filterFor",
                    r#type: "text",
                    value: "{filter_text}",
                    oninput: move |event| filter_text.set(event.value()),
                    onkeydown: move |event| {
                        if event.key() == Key::Enter {
                            dispatch.call(GridIntent::SubmitFilter {
                                field: filter_field(),
                                value: filter_text(),
                            });
                        }
                    },
                }
                label { r#for: "filterIn", "in" }
                select {
                    id: "filterIn",
                    value: "{filter_field().as_param()}",
                    onchange: move |event| {
                        if let Ok(field) = event.value().parse::<FieldId>() {
                            filter_field.set(field);
                        }
                    },
                    for column in filterable_columns() {
                        option { key: "{column.field}", value: "{column.field.as_param()}", "{column.header}" }
                    }
                }
                button {
                    onclick: move |_| {
                        dispatch.call(GridIntent::SubmitFilter {
                            field: filter_field(),
                            value: filter_text(),
                        });
                    },
                    "Filter Results"
                }
                label { r#for: "pageSize", "Rows per page" }
                select {
                    id: "pageSize",
                    value: "{page_size}",
                    onchange: move |event| {
                        if let Ok(size) = event.value().parse::<usize>() {
                            dispatch.call(GridIntent::ChangePageSize(size));
                        }
                    },
                    for size in PAGE_SIZE_OPTIONS {
                        option { key: "{size}", value: "{size}", "{size}" }
                    }
                }
            }

            if let Some(message) = notice() {
                p { style: "color: #a15c00;", "{message}" }
            }

            table { style: "border-collapse: collapse;",
                thead {
                    tr {
                        {columns.iter().map(|column| {
                            let field = column.meta.field;
                            let sortable = column.meta.sortable;
                            rsx! {
                                th {
                                    key: "{field}",
                                    style: "{header_cell_style(column)}",
                                    onclick: move |_| {
                                        if sortable {
                                            dispatch.call(GridIntent::ToggleSort(field));
                                        }
                                    },
                                    "{column.meta.header}{sort_arrow(column.sorted)}"
                                }
                            }
                        })}
                    }
                }
                tbody { style: "{body_style(&state)}",
                    {state.rows.iter().enumerate().map(|(row_idx, record)| {
                        let row_fields = row_fields.clone();
                        rsx! {
                            tr { key: "{row_idx}",
                                for field in row_fields {
                                    td {
                                        key: "{field}",
                                        style: "padding: 4px 8px; border-bottom: 1px solid #ddd;",
                                        if field == FieldId::Ark {
                                            if let Some(url) = record.url.clone() {
                                                a { href: "{url}", target: "_blank", "{record.ark}" }
                                            } else {
                                                "{record.ark}"
                                            }
                                        } else {
                                            "{cell_value(record, field)}"
                                        }
                                    }
                                }
                            }
                        }
                    })}
                }
            }

            div { style: "display: flex; gap: 4px; align-items: center; margin-top: 12px;",
                {controls.into_iter().map(|control: PageControl| {
                    let target = control.target;
                    rsx! {
                        button {
                            key: "{control.label}",
                            disabled: !control.enabled,
                            style: if control.current { "font-weight: bold;" } else { "" },
                            onclick: move |_| dispatch.call(GridIntent::GoToPage(target)),
                            "{control.label}"
                        }
                    }
                })}
                span { style: "margin-left: 8px;", "{state.total_results} results" }
            }

            if state.is_loading {
                p { "Loading..." }
            }
            if let Some(err) = &state.error {
                p { style: "color: #b00020;", "{fetch_error_message(err)}" }
            }
        }
    }
}
