//! The page for a single party: its balance, the form for adding to its ledger
//! and the ledger itself with inline editing.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    database_id::PartyId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, INLINE_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        amount_input, base, delete_button, format_amount, loading_spinner,
    },
    navigation::NavBar,
    party::{Party, get_party},
    timezone::get_local_date,
    transaction::{
        LedgerRow, LedgerTotals, TransactionField, expense_category_select,
        funding_source_select, get_party_transactions, ledger_totals, running_balance,
    },
};

/// The state needed for the [get_party_page](crate::party::get_party_page) route handler.
#[derive(Debug, Clone)]
pub struct PartyPageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Riyadh".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PartyPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders a party with its ledger, most recent entries first.
pub async fn get_party_page(
    State(state): State<PartyPageState>,
    Path(party_id): Path<PartyId>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).inspect_err(|_| {
        tracing::error!(
            "could not get local time offset from timezone {}",
            &state.local_timezone
        )
    })?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let party = get_party(party_id, &connection)?;
    let transactions = get_party_transactions(party_id, &connection)
        .inspect_err(|error| tracing::error!("could not get ledger of party {party_id}: {error}"))?;
    drop(connection);

    let totals = ledger_totals(&transactions);
    let rows = running_balance(transactions);

    Ok(party_view(&party, &rows, totals, today).into_response())
}

fn party_view(party: &Party, rows: &[LedgerRow], totals: LedgerTotals, today: Date) -> Markup {
    let info = party.kind.info();
    let nav_bar = NavBar::new(Some(party.kind)).into_html();
    let export_url = format_endpoint(endpoints::PARTY_EXPORT, party.id);
    // Description, debit, credit, funding source, (expense category,) date,
    // balance and actions.
    let column_count = if info.tracks_expenses { 8 } else { 7 };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-6xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    div
                    {
                        a href=(party.kind.list_url()) class=(LINK_STYLE)
                        {
                            "Back to " (info.plural.to_lowercase())
                        }

                        h1 class="text-xl font-bold" { (party.name) }

                        p class="text-gray-500 dark:text-gray-400" { (info.singular) }
                    }

                    div class="text-right"
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                        p id="party-balance" class="text-2xl font-bold tabular-nums"
                        {
                            (format_amount(party.balance))
                        }

                        a href=(export_url) class=(LINK_STYLE) download { "Export to Excel" }
                    }
                }

                (add_transaction_form(party, today))

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Debit" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Credit" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Funding Source" }
                                @if info.tracks_expenses {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Expense Category" }
                                }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (ledger_row(row, info.tracks_expenses))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan=(column_count)
                                        class="px-6 py-4 text-center"
                                    {
                                        "No transactions yet."
                                    }
                                }
                            }
                        }

                        tfoot class="font-semibold text-gray-900 dark:text-white"
                        {
                            tr
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                                td class="px-6 py-4 tabular-nums" { (format_amount(totals.debit)) }
                                td class="px-6 py-4 tabular-nums" { (format_amount(totals.credit)) }
                                td {}
                                @if info.tracks_expenses {
                                    td {}
                                }
                                td {}
                                td class="px-6 py-4 text-right tabular-nums" { (format_amount(totals.net())) }
                                td {}
                            }
                        }
                    }
                }
            }
        }
    );

    base(&party.name, &content)
}

fn add_transaction_form(party: &Party, today: Date) -> Markup {
    let tracks_expenses = party.kind.info().tracks_expenses;

    html! {
        form
            hx-post=(format_endpoint(endpoints::PARTY_TRANSACTIONS_API, party.id))
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="grid gap-4 md:grid-cols-3 p-4 rounded bg-white dark:bg-gray-800"
        {
            div class="md:col-span-3"
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Description"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (amount_input("debit", "Debit", ""))
            (amount_input("credit", "Credit", ""))

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

            div
            {
                label for="funding_source" class=(FORM_LABEL_STYLE) { "Funding Source" }
                (funding_source_select("funding_source", None, FORM_TEXT_INPUT_STYLE))
            }

            @if tracks_expenses {
                div
                {
                    label for="expense_category" class=(FORM_LABEL_STYLE) { "Expense Category" }
                    (expense_category_select("expense_category", None, FORM_TEXT_INPUT_STYLE))
                }
            }

            div class="md:col-span-3"
            {
                button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="htmx-indicator" { (loading_spinner()) }
                    "Add Transaction"
                }
            }
        }
    }
}

/// A form that saves a single field of a transaction as soon as it changes.
fn inline_edit_form(transaction_url: &str, field: TransactionField, control: Markup) -> Markup {
    html! {
        form
            hx-put=(transaction_url)
            hx-trigger="change"
            hx-target-error="#alert-container"
        {
            input type="hidden" name="field" value=(field.form_name());
            (control)
        }
    }
}

fn ledger_row(row: &LedgerRow, tracks_expenses: bool) -> Markup {
    let transaction = &row.transaction;
    let transaction_url = format_endpoint(endpoints::TRANSACTION_API, transaction.id);

    let amount_control = |amount: f64| {
        html! {
            input
                type="number"
                name="value"
                step="0.01"
                min="0"
                value=(format!("{amount:.2}"))
                class=(INLINE_INPUT_STYLE);
        }
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class="px-6 py-2"
            {
                (inline_edit_form(&transaction_url, TransactionField::Description, html! {
                    input
                        type="text"
                        name="value"
                        value=(transaction.description)
                        required
                        class=(INLINE_INPUT_STYLE);
                }))
            }

            td class="px-6 py-2"
            {
                (inline_edit_form(&transaction_url, TransactionField::Debit, amount_control(transaction.debit)))
            }

            td class="px-6 py-2"
            {
                (inline_edit_form(&transaction_url, TransactionField::Credit, amount_control(transaction.credit)))
            }

            td class="px-6 py-2"
            {
                (inline_edit_form(
                    &transaction_url,
                    TransactionField::FundingSource,
                    funding_source_select("value", transaction.funding_source, INLINE_INPUT_STYLE),
                ))
            }

            @if tracks_expenses {
                td class="px-6 py-2"
                {
                    (inline_edit_form(
                        &transaction_url,
                        TransactionField::ExpenseCategory,
                        expense_category_select("value", transaction.expense_category, INLINE_INPUT_STYLE),
                    ))
                }
            }

            td class="px-6 py-2"
            {
                (inline_edit_form(&transaction_url, TransactionField::Date, html! {
                    input
                        type="date"
                        name="value"
                        value=(transaction.date)
                        required
                        class=(INLINE_INPUT_STYLE);
                }))
            }

            td class="px-6 py-2 text-right tabular-nums" { (format_amount(row.running_balance)) }

            td class="px-6 py-2"
            {
                (delete_button(
                    &transaction_url,
                    &format!(
                        "Are you sure you want to delete '{}'? This cannot be undone.",
                        transaction.description
                    ),
                    "closest tr",
                    "none",
                ))
            }
        }
    }
}
