//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        default_redirect_url, get_password_hash, invalidate_auth_cookie, normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_card, password_input},
    timezone::get_local_offset,
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect password.";
pub const PASSWORD_NOT_SET_ERROR_MSG: &str =
    "The admin password has not been set. Run the set_password program on the server to set it.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (password_input("", error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form(None, redirect_url.as_deref());
    let content = log_in_card("Log in to Ledgerbook", &log_in_form);
    base("Log In", &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Riyadh".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie set and the client is
/// redirected to the requested page, or the customers list.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(log_in_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(log_in_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let password_hash = match state.db_connection.lock() {
        Ok(connection) => get_password_hash(&connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };
    let password_hash = match password_hash {
        Ok(password_hash) => password_hash,
        Err(Error::PasswordNotSet) => {
            return log_in_form(Some(PASSWORD_NOT_SET_ERROR_MSG), redirect_url).into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
        }
    };

    match password_hash.verify(&log_in_data.password) {
        Ok(()) => {}
        Err(Error::InvalidCredentials) => {
            tracing::info!("Rejected a log-in attempt with an incorrect password.");
            return log_in_form(Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url).into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
        }
    }

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let redirect_url = redirect_url
        .map(str::to_owned)
        .unwrap_or_else(default_redirect_url);

    set_auth_cookie(
        jar.clone(),
        &password_hash,
        state.cookie_duration,
        local_offset,
    )
    .map(|updated_jar| {
        tracing::info!("Admin logged in.");
        (StatusCode::SEE_OTHER, HxRedirect(redirect_url), updated_jar)
    })
    .map_err(|err| {
        tracing::error!("Error setting auth cookie: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
            invalidate_auth_cookie(jar),
        )
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The raw data entered in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Password entered during log-in.
    pub password: String,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}


#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
        routing::post,
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        PasswordHash, ValidatedPassword,
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, create_admin_table, set_password_hash},
        endpoints,
        test_utils::{assert_hx_redirect, parse_html_fragment},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, PASSWORD_NOT_SET_ERROR_MSG,
        post_log_in,
    };

    fn get_test_state(password: Option<&str>) -> LoginState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_admin_table(&connection).expect("Could not create admin table");

        if let Some(password) = password {
            let hash = PasswordHash::new(ValidatedPassword::new_unchecked(password), 4)
                .expect("Could not hash test password");
            set_password_hash(&hash, &connection).expect("Could not store test password");
        }

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn new_log_in_request(state: LoginState, log_in_form: LogInData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_log_in(State(state), jar, Form(log_in_form)).await
    }

    fn log_in_data(password: &str, redirect_url: Option<&str>) -> LogInData {
        LogInData {
            password: password.to_owned(),
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_password() {
        let state = get_test_state(Some("test"));

        let response = new_log_in_request(state, log_in_data("test", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/parties/customers");
        assert_set_token_cookie(&response);
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let state = get_test_state(Some("test"));
        let redirect_url = "/party/7";

        let response = new_log_in_request(state, log_in_data("test", Some(redirect_url))).await;

        assert_hx_redirect(&response, redirect_url);
    }

    #[tokio::test]
    async fn log_in_falls_back_on_invalid_redirect_url() {
        let state = get_test_state(Some("test"));

        let response =
            new_log_in_request(state, log_in_data("test", Some("https://example.com"))).await;

        assert_hx_redirect(&response, "/parties/customers");
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let state = get_test_state(Some("test"));

        let response = new_log_in_request(state, log_in_data("wrongpassword", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn log_in_explains_missing_password() {
        let state = get_test_state(None);

        let response = new_log_in_request(state, log_in_data("test", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, PASSWORD_NOT_SET_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_password_field() {
        let state = get_test_state(None);
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .post(endpoints::LOG_IN_API)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[track_caller]
    fn assert_set_token_cookie(response: &Response<Body>) {
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|header| Cookie::parse(header.to_str().unwrap().to_owned()).unwrap())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
            .expect("no token cookie set");

        assert!(cookie.expires_datetime() > Some(OffsetDateTime::now_utc()));
    }

    async fn assert_error_message(response: Response<Body>, message: &str) {
        let fragment = parse_html_fragment(response).await;
        let error_selector = scraper::Selector::parse("p.text-red-500.text-base").unwrap();
        let error = fragment
            .select(&error_selector)
            .next()
            .expect("expected error message paragraph");
        let error_text = error.text().collect::<String>();
        assert_eq!(error_text.trim(), message);
    }
}
