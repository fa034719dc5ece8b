//! Displays the parties of one kind with the totals of their ledgers.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_button, format_amount,
    },
    navigation::NavBar,
    not_found::get_404_not_found_response,
    party::{PartyKind, PartySummary, get_party_summaries},
    transaction::LedgerTotals,
};

/// The state needed for the [get_parties_page](crate::party::get_parties_page) route handler.
#[derive(Debug, Clone)]
pub struct PartiesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PartiesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the parties page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Only show parties whose name contains this text.
    #[serde(default)]
    pub search: String,
}

/// Renders the list of parties of the kind named in the URL.
pub async fn get_parties_page(
    State(state): State<PartiesPageState>,
    Path(route_segment): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, Error> {
    let Some(kind) = PartyKind::from_route_segment(&route_segment) else {
        return Ok(get_404_not_found_response());
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summaries = get_party_summaries(kind, &query.search, &connection)
        .inspect_err(|error| tracing::error!("could not get {kind} summaries: {error}"))?;

    Ok(parties_view(kind, &query.search, &summaries).into_response())
}

fn parties_view(kind: PartyKind, search: &str, summaries: &[PartySummary]) -> Markup {
    let info = kind.info();
    let list_url = kind.list_url();
    let new_party_url = kind.new_party_url();
    let nav_bar = NavBar::new(Some(kind)).into_html();
    let grand_totals = summaries
        .iter()
        .fold(LedgerTotals::default(), |totals, summary| LedgerTotals {
            debit: totals.debit + summary.totals.debit,
            credit: totals.credit + summary.totals.credit,
        });

    let table_row = |summary: &PartySummary| {
        let party = &summary.party;

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    a href=(format_endpoint(endpoints::PARTY_VIEW, party.id)) class=(LINK_STYLE)
                    {
                        (party.name)
                    }
                }

                td class="px-6 py-4 text-right tabular-nums" { (format_amount(summary.totals.debit)) }
                td class="px-6 py-4 text-right tabular-nums" { (format_amount(summary.totals.credit)) }
                td class="px-6 py-4 text-right tabular-nums" { (format_amount(summary.totals.net())) }

                td class=(TABLE_CELL_STYLE)
                {
                    (delete_button(
                        &format_endpoint(endpoints::PARTY_API, party.id),
                        &format!(
                            "Are you sure you want to delete '{}' and all of their transactions? This cannot be undone.",
                            party.name
                        ),
                        "closest tr",
                        "delete",
                    ))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { (info.plural) }

                    div class="flex gap-4"
                    {
                        a href=(new_party_url) class=(LINK_STYLE)
                        {
                            "Add " (info.singular)
                        }

                        a href=(kind.export_url()) class=(LINK_STYLE) download
                        {
                            "Export to Excel"
                        }
                    }
                }

                form method="get" action=(list_url) class="flex gap-2"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search by name"
                        aria-label="Search by name"
                        class=(FORM_TEXT_INPUT_STYLE);

                    button type="submit" class="px-4 py-2 bg-blue-500 text-white rounded"
                    {
                        "Search"
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class="px-6 py-3 text-right" { "Total Debit" }
                                th scope="col" class="px-6 py-3 text-right" { "Total Credit" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for summary in summaries {
                                (table_row(summary))
                            }

                            @if summaries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        @if search.trim().is_empty() {
                                            "No " (info.plural.to_lowercase()) " found. Add one "
                                            a href=(new_party_url) class=(LINK_STYLE)
                                            {
                                                "here"
                                            }
                                            "."
                                        } @else {
                                            "No " (info.plural.to_lowercase()) " match \"" (search.trim()) "\"."
                                        }
                                    }
                                }
                            }
                        }

                        tfoot class="font-semibold text-gray-900 dark:text-white"
                        {
                            tr
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                                td class="px-6 py-4 text-right tabular-nums" { (format_amount(grand_totals.debit)) }
                                td class="px-6 py-4 text-right tabular-nums" { (format_amount(grand_totals.credit)) }
                                td class="px-6 py-4 text-right tabular-nums" { (format_amount(grand_totals.net())) }
                                td {}
                            }
                        }
                    }
                }
            }
        }
    );

    base(info.plural, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        html::format_amount,
        party::{
            NewParty, PartyKind, create_party,
            parties_page::{PartiesPageState, SearchQuery, get_parties_page},
        },
        test_utils::{assert_valid_html, parse_html_document},
    };

    fn get_test_state(parties: &[(&str, PartyKind, f64)]) -> PartiesPageState {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        for (name, kind, opening_balance) in parties {
            create_party(&NewParty::test(name, *kind, *opening_balance), &mut conn).unwrap();
        }

        PartiesPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    async fn render(state: PartiesPageState, segment: &str, search: &str) -> Html {
        let response = get_parties_page(
            State(state),
            Path(segment.to_owned()),
            Query(SearchQuery {
                search: search.to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[track_caller]
    fn body_rows(html: &Html) -> Vec<ElementRef<'_>> {
        html.select(&Selector::parse("tbody tr").unwrap()).collect()
    }

    #[track_caller]
    fn row_text(row: &ElementRef<'_>) -> String {
        row.text().collect::<String>()
    }

    #[tokio::test]
    async fn lists_only_parties_of_kind() {
        let state = get_test_state(&[
            ("Ahmed", PartyKind::Customer, 500.0),
            ("Acme", PartyKind::Supplier, 20.0),
        ]);

        let html = render(state, "customers", "").await;

        let rows = body_rows(&html);
        assert_eq!(rows.len(), 1);
        let text = row_text(&rows[0]);
        assert!(text.contains("Ahmed"));
        assert!(text.contains(&format_amount(500.0)));

        let link = rows[0]
            .select(&Selector::parse("a").unwrap())
            .next()
            .expect("party name should link to the party page");
        assert_eq!(
            link.value().attr("href"),
            Some(format_endpoint(endpoints::PARTY_VIEW, 1).as_str())
        );
    }

    #[tokio::test]
    async fn rows_have_delete_buttons() {
        let state = get_test_state(&[("Ahmed", PartyKind::Customer, 500.0)]);

        let html = render(state, "customers", "").await;

        let button = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .expect("no delete button");
        assert_eq!(
            button.value().attr("hx-delete"),
            Some(format_endpoint(endpoints::PARTY_API, 1).as_str())
        );
        assert!(button.value().attr("hx-confirm").is_some());
    }

    #[tokio::test]
    async fn search_filters_rows() {
        let state = get_test_state(&[
            ("Ahmed", PartyKind::Customer, 1.0),
            ("Sara", PartyKind::Customer, 2.0),
        ]);

        let html = render(state, "customers", "SAR").await;

        let rows = body_rows(&html);
        assert_eq!(rows.len(), 1);
        assert!(row_text(&rows[0]).contains("Sara"));
    }

    #[tokio::test]
    async fn shows_grand_totals() {
        let state = get_test_state(&[
            ("Ahmed", PartyKind::Customer, 100.0),
            ("Sara", PartyKind::Customer, 250.5),
        ]);

        let html = render(state, "customers", "").await;

        let footer = html
            .select(&Selector::parse("tfoot tr").unwrap())
            .next()
            .expect("no totals row");
        assert!(row_text(&footer).contains(&format_amount(350.5)));
    }

    #[tokio::test]
    async fn empty_list_links_to_add_page() {
        let state = get_test_state(&[]);

        let html = render(state, "custodies", "").await;

        let rows = body_rows(&html);
        assert_eq!(rows.len(), 1);
        let link = rows[0]
            .select(&Selector::parse("a").unwrap())
            .next()
            .expect("no link to the add page");
        assert_eq!(
            link.value().attr("href"),
            Some(PartyKind::Custody.new_party_url().as_str())
        );
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let state = get_test_state(&[]);

        let response = get_parties_page(
            State(state),
            Path("employees".to_owned()),
            Query(SearchQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
