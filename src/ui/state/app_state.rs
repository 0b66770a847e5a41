use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::field::FieldId;
use crate::usecase::services::grid_service::RenderState;

pub struct AppState {
    /// Latest projection of the grid; `None` until the first sync starts.
    pub render: Signal<Option<RenderState>>,
    /// Message for a rejected intent, cleared by the next accepted one.
    pub notice: Signal<Option<String>>,
    pub filter_field: Signal<FieldId>,
    pub filter_text: Signal<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            render: use_signal(|| None::<RenderState>),
            notice: use_signal(|| None::<String>),
            filter_field: use_signal(|| FieldId::Ark),
            filter_text: use_signal(String::new),
        }
    }
}
