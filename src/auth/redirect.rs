//! Where to send the admin after logging in.
//!
//! Only local paths are accepted as redirect targets so that the log-in form
//! cannot be used to send someone to another site.

use axum::{extract::Request, http::Uri};

use crate::{endpoints, party::PartyKind};

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW && !path.starts_with("/api")
}

/// The page shown after logging in when no redirect URL was given.
pub fn default_redirect_url() -> String {
    PartyKind::Customer.list_url()
}

/// Reduce `raw_url` to a local path and query, or `None` if it points
/// elsewhere.
///
/// Absolute URLs are only accepted when `allow_absolute` is set, which is the
/// case for the `HX-Current-URL` header that htmx always sends in full.
fn local_path_and_query(raw_url: &str, allow_absolute: bool) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if !allow_absolute && (uri.scheme().is_some() || uri.authority().is_some()) {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Check a redirect URL submitted by a client.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    local_path_and_query(raw_url, false)
}

/// The log-in page URL that sends the admin back to `redirect_target` afterwards.
pub fn log_in_redirect_url(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN_VIEW, param),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// The log-in URL for a request that failed authentication.
///
/// Page requests come back to the page itself. API requests come back to the
/// page htmx sent them from. Anything else falls back to the customers list.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let redirect_target = redirect_target.unwrap_or_else(|| {
        tracing::warn!(
            "No valid redirect target for {}. Falling back to the customers list.",
            request.uri()
        );
        default_redirect_url()
    });

    log_in_redirect_url(&redirect_target)
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    local_path_and_query(current_url, true)
}
