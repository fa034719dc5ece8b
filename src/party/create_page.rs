//! Defines the route handler for the page for adding a party.

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        amount_input, base, loading_spinner,
    },
    navigation::NavBar,
    not_found::get_404_not_found_response,
    party::PartyKind,
    timezone::get_local_date,
    transaction::{expense_category_select, funding_source_select},
};

/// The state needed for the add party page.
#[derive(Debug, Clone)]
pub struct CreatePartyPageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Riyadh".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreatePartyPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for adding a party of the kind named in the URL.
pub async fn get_create_party_page(
    State(state): State<CreatePartyPageState>,
    Path(route_segment): Path<String>,
) -> Result<Response, Error> {
    let Some(kind) = PartyKind::from_route_segment(&route_segment) else {
        return Ok(get_404_not_found_response());
    };

    let today = get_local_date(&state.local_timezone).inspect_err(|_| {
        tracing::error!(
            "could not get local time offset from timezone {}",
            &state.local_timezone
        )
    })?;

    Ok(create_party_view(kind, today).into_response())
}

fn create_party_view(kind: PartyKind, today: Date) -> Markup {
    let info = kind.info();
    let nav_bar = NavBar::new(Some(kind)).into_html();
    let title = format!("Add {}", info.singular);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4 self-start" { (title) }

            form
                hx-post=(endpoints::PARTIES_API)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                class="w-full space-y-4 md:space-y-6"
            {
                input type="hidden" name="kind" value=(info.route_segment);

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        id="name"
                        type="text"
                        name="name"
                        placeholder="Name"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (amount_input("opening_balance", "Opening Balance", ""))

                div
                {
                    label for="funding_source" class=(FORM_LABEL_STYLE) { "Funding Source" }
                    (funding_source_select("funding_source", None, FORM_TEXT_INPUT_STYLE))
                }

                @if info.tracks_expenses {
                    div
                    {
                        label for="expense_category" class=(FORM_LABEL_STYLE) { "Expense Category" }
                        (expense_category_select("expense_category", None, FORM_TEXT_INPUT_STYLE))
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        id="date"
                        type="date"
                        name="date"
                        value=(today)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="htmx-indicator" { (loading_spinner()) }
                    (title)
                }
            }
        }
    };

    base(&title, &content)
}
