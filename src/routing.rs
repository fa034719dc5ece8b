//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, default_redirect_url, get_log_in_page, get_log_out,
        post_log_in,
    },
    endpoints,
    export::{export_parties_summary, export_party_ledger},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    party::{
        create_party_endpoint, delete_party_endpoint, get_create_party_page, get_parties_page,
        get_party_page,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::PARTIES_VIEW, get(get_parties_page))
        .route(endpoints::NEW_PARTY_VIEW, get(get_create_party_page))
        .route(endpoints::PARTIES_EXPORT, get(export_parties_summary))
        .route(endpoints::PARTY_VIEW, get(get_party_page))
        .route(endpoints::PARTY_EXPORT, get(export_party_ledger))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PARTIES_API, post(create_party_endpoint))
            .route(endpoints::PARTY_API, delete(delete_party_endpoint))
            .route(
                endpoints::PARTY_TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION_API,
                put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the customers list.
async fn get_index_page() -> Redirect {
    Redirect::to(&default_redirect_url())
}
