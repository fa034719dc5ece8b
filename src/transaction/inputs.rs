//! Form controls for choosing a funding source or expense category.

use maud::{Markup, html};

use crate::transaction::{ExpenseCategory, FundingSource, NONE_FORM_VALUE};

pub fn funding_source_select(name: &str, selected: Option<FundingSource>, style: &str) -> Markup {
    html! {
        select name=(name) class=(style)
        {
            option value=(NONE_FORM_VALUE) selected[selected.is_none()] { "None" }

            @for source in FundingSource::ALL {
                option value=(source.tag()) selected[selected == Some(source)] { (source.label()) }
            }
        }
    }
}

pub fn expense_category_select(
    name: &str,
    selected: Option<ExpenseCategory>,
    style: &str,
) -> Markup {
    html! {
        select name=(name) class=(style)
        {
            option value=(NONE_FORM_VALUE) selected[selected.is_none()] { "None" }

            @for category in ExpenseCategory::ALL {
                option value=(category.tag()) selected[selected == Some(category)] { (category.label()) }
            }
        }
    }
}
