use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tabs/new", post(handlers::form_create_tab))
        .route("/tabs/open", post(handlers::form_load_tab))
        .route("/tabs/save", post(handlers::form_save_selected))
        .route("/tabs/:id/select", post(handlers::form_select_tab))
        .route("/tabs/:id/remove", post(handlers::form_remove_tab))
        .route("/tabs/:id/counters/add", post(handlers::form_add_counter))
        .route(
            "/tabs/:id/counters/:index/increment",
            post(handlers::form_increment_counter),
        )
        .route(
            "/tabs/:id/counters/:index/decrement",
            post(handlers::form_decrement_counter),
        )
        .route(
            "/tabs/:id/counters/:index/obtained",
            post(handlers::form_obtain_counter),
        )
        .route(
            "/tabs/:id/counters/:index/rename",
            post(handlers::form_rename_counter),
        )
        .route("/api/tabs", get(handlers::get_tabs).post(handlers::create_tab))
        .route("/api/tabs/load", post(handlers::load_tab))
        .route("/api/tabs/save", post(handlers::save_selected_tab))
        .route("/api/tabs/:id", delete(handlers::remove_tab))
        .route("/api/tabs/:id/select", post(handlers::select_tab))
        .route("/api/tabs/:id/save", post(handlers::save_tab))
        .route("/api/tabs/:id/counters", post(handlers::add_counter))
        .route(
            "/api/tabs/:id/counters/:index/increment",
            post(handlers::increment_counter),
        )
        .route(
            "/api/tabs/:id/counters/:index/decrement",
            post(handlers::decrement_counter),
        )
        .route(
            "/api/tabs/:id/counters/:index/obtained",
            post(handlers::obtain_counter),
        )
        .route(
            "/api/tabs/:id/counters/:index/rename",
            post(handlers::rename_counter),
        )
        .route("/api/saves", get(handlers::get_saves))
        .with_state(state)
}
