//! Builds the sheets of the exported workbooks and writes them as XLSX.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use crate::{
    Error,
    export::localize::{format_localized_amount, format_localized_date},
    party::{Party, PartyKind, PartySummary},
    transaction::{LedgerTotals, Transaction, ledger_totals, running_balance},
};

const TOTALS_LABEL: &str = "الإجمالي";
const LEDGER_SHEET_NAME: &str = "المعاملات";

/// How the header row of a sheet is coloured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderStyle {
    /// Dark text on light blue, used for ledgers.
    Light,
    /// White text on dark blue, used for summaries.
    Dark,
}

/// A column of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: &'static str,
    pub width: f64,
}

/// The cells of a single worksheet, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub header_style: HeaderStyle,
    pub rows: Vec<Vec<String>>,
    /// The last row, with the label in the first column.
    pub totals: Vec<String>,
}

fn column(header: &'static str, width: f64) -> Column {
    Column { header, width }
}

/// The ledger of `party` oldest first with the running balance, followed by
/// the totals.
///
/// A party without transactions gets a totals row of zeros.
pub fn ledger_sheet(party: &Party, transactions: Vec<Transaction>) -> Sheet {
    let tracks_expenses = party.kind.info().tracks_expenses;
    let totals = ledger_totals(&transactions);

    let mut columns = vec![
        column("الوصف", 40.0),
        column("مدين", 15.0),
        column("دائن", 15.0),
        column("مصدر التمويل", 25.0),
    ];
    if tracks_expenses {
        columns.push(column("نوع المصروف", 25.0));
    }
    columns.push(column("التاريخ", 25.0));
    columns.push(column("الرصيد", 18.0));

    let mut ledger = running_balance(transactions);
    ledger.reverse();

    let rows = ledger
        .into_iter()
        .map(|row| {
            let transaction = row.transaction;
            let mut cells = vec![
                transaction.description,
                format_localized_amount(transaction.debit),
                format_localized_amount(transaction.credit),
                transaction
                    .funding_source
                    .map(|source| source.local_label().to_owned())
                    .unwrap_or_default(),
            ];
            if tracks_expenses {
                cells.push(
                    transaction
                        .expense_category
                        .map(|category| category.local_label().to_owned())
                        .unwrap_or_default(),
                );
            }
            cells.push(format_localized_date(transaction.date));
            cells.push(format_localized_amount(row.running_balance));
            cells
        })
        .collect();

    let mut totals_row = vec![
        TOTALS_LABEL.to_owned(),
        format_localized_amount(totals.debit),
        format_localized_amount(totals.credit),
        String::new(),
    ];
    if tracks_expenses {
        totals_row.push(String::new());
    }
    totals_row.push(String::new());
    totals_row.push(format_localized_amount(totals.net()));

    Sheet {
        name: LEDGER_SHEET_NAME.to_owned(),
        columns,
        header_style: HeaderStyle::Light,
        rows,
        totals: totals_row,
    }
}

/// One row per party with its ledger totals, followed by the grand totals.
pub fn summary_sheet(kind: PartyKind, summaries: &[PartySummary]) -> Sheet {
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.party.name.clone(),
                format_localized_amount(summary.totals.debit),
                format_localized_amount(summary.totals.credit),
                format_localized_amount(summary.totals.net()),
            ]
        })
        .collect();

    let grand_totals = summaries
        .iter()
        .fold(LedgerTotals::default(), |totals, summary| LedgerTotals {
            debit: totals.debit + summary.totals.debit,
            credit: totals.credit + summary.totals.credit,
        });

    Sheet {
        name: kind.info().export_label.to_owned(),
        columns: vec![
            column("الاسم", 30.0),
            column("إجمالي مدين", 20.0),
            column("إجمالي دائن", 20.0),
            column("صافي الرصيد", 20.0),
        ],
        header_style: HeaderStyle::Dark,
        rows,
        totals: vec![
            TOTALS_LABEL.to_owned(),
            format_localized_amount(grand_totals.debit),
            format_localized_amount(grand_totals.credit),
            format_localized_amount(grand_totals.net()),
        ],
    }
}

/// Write `sheet` as a right-to-left worksheet and return the XLSX file.
///
/// # Errors
/// Returns [Error::ExportError] if the workbook cannot be written.
pub fn write_workbook(sheet: &Sheet) -> Result<Vec<u8>, Error> {
    let header_format = match sheet.header_style {
        HeaderStyle::Light => Format::new().set_background_color(Color::RGB(0xD9E1F2)),
        HeaderStyle::Dark => Format::new()
            .set_background_color(Color::RGB(0x0070C0))
            .set_font_color(Color::White),
    }
    .set_bold()
    .set_border(FormatBorder::Thin)
    .set_align(FormatAlign::Center)
    .set_align(FormatAlign::VerticalCenter);

    let cell_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let totals_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xE2EFDA))
        .set_border(FormatBorder::Thin)
        .set_border_bottom(FormatBorder::Double)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name)?;
    worksheet.set_right_to_left(true);
    worksheet.set_default_row_height(30);

    for (col, column) in sheet.columns.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, column.width)?;
        worksheet.write_string_with_format(0, col, column.header, &header_format)?;
    }

    for (row, cells) in sheet.rows.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            worksheet.write_string_with_format(row, col as u16, cell, &cell_format)?;
        }
    }

    let totals_row = sheet.rows.len() as u32 + 1;
    for (col, cell) in sheet.totals.iter().enumerate() {
        worksheet.write_string_with_format(totals_row, col as u16, cell, &totals_format)?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::date};

    use crate::{
        export::{
            localize::parse_localized_amount,
            workbook::{HeaderStyle, ledger_sheet, summary_sheet, write_workbook},
        },
        party::{Party, PartyKind, PartySummary},
        transaction::{ExpenseCategory, FundingSource, LedgerTotals, Transaction},
    };

    fn party(kind: PartyKind) -> Party {
        Party {
            id: 1,
            name: "أحمد".to_owned(),
            kind,
            balance: 0.0,
        }
    }

    fn transaction(id: i64, debit: f64, credit: f64, date: time::Date) -> Transaction {
        Transaction {
            id,
            party_id: 1,
            description: format!("entry {id}"),
            debit,
            credit,
            funding_source: Some(FundingSource::Cash),
            expense_category: None,
            date,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_ledger_has_zero_totals() {
        let sheet = ledger_sheet(&party(PartyKind::Customer), Vec::new());

        assert!(sheet.rows.is_empty());
        assert_eq!(sheet.columns.len(), 6);
        assert_eq!(
            sheet.totals,
            ["الإجمالي", "٠.٠٠", "٠.٠٠", "", "", "٠.٠٠"]
        );
        assert!(write_workbook(&sheet).is_ok());
    }

    #[test]
    fn ledger_is_oldest_first_with_running_balance() {
        let transactions = vec![
            transaction(3, 100.0, 0.0, date!(2025 - 03 - 01)),
            transaction(1, 500.0, 0.0, date!(2025 - 01 - 01)),
            transaction(2, 0.0, 200.0, date!(2025 - 02 - 01)),
        ];

        let sheet = ledger_sheet(&party(PartyKind::Supplier), transactions);

        let descriptions: Vec<&str> = sheet.rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(descriptions, ["entry 1", "entry 2", "entry 3"]);
        let balances: Vec<f64> = sheet
            .rows
            .iter()
            .map(|row| parse_localized_amount(row.last().unwrap()).unwrap())
            .collect();
        assert_eq!(balances, [500.0, 300.0, 400.0]);
        assert_eq!(sheet.rows[0][3], "كاش");
        assert_eq!(sheet.rows[0][4], "١ يناير ٢٠٢٥");
    }

    #[test]
    fn ledger_totals_parse_back() {
        let transactions = vec![
            transaction(1, 500.25, 0.0, date!(2025 - 01 - 01)),
            transaction(2, 0.0, 200.1, date!(2025 - 02 - 01)),
        ];

        let sheet = ledger_sheet(&party(PartyKind::Customer), transactions);

        let totals = &sheet.totals;
        assert_eq!(parse_localized_amount(&totals[1]), Some(500.25));
        assert_eq!(parse_localized_amount(&totals[2]), Some(200.1));
        assert_eq!(parse_localized_amount(totals.last().unwrap()), Some(300.15));
    }

    #[test]
    fn custody_ledger_has_expense_column() {
        let mut entry = transaction(1, 0.0, 75.0, date!(2025 - 01 - 15));
        entry.expense_category = Some(ExpenseCategory::Fuel);

        let sheet = ledger_sheet(&party(PartyKind::Custody), vec![entry]);

        assert_eq!(sheet.columns.len(), 7);
        assert_eq!(sheet.columns[4].header, "نوع المصروف");
        assert_eq!(sheet.rows[0][4], "وقود");
        assert_eq!(sheet.rows[0][5], "١٥ يناير ٢٠٢٥");
        assert_eq!(sheet.totals.len(), 7);
    }

    #[test]
    fn summary_has_grand_totals() {
        let summaries = vec![
            PartySummary {
                party: party(PartyKind::Customer),
                totals: LedgerTotals {
                    debit: 600.0,
                    credit: 200.0,
                },
            },
            PartySummary {
                party: Party {
                    id: 2,
                    name: "Sara".to_owned(),
                    kind: PartyKind::Customer,
                    balance: 50.0,
                },
                totals: LedgerTotals {
                    debit: 50.0,
                    credit: 0.0,
                },
            },
        ];

        let sheet = summary_sheet(PartyKind::Customer, &summaries);

        assert_eq!(sheet.name, "العملاء");
        assert_eq!(sheet.header_style, HeaderStyle::Dark);
        assert_eq!(sheet.rows[0], ["أحمد", "٦٠٠.٠٠", "٢٠٠.٠٠", "٤٠٠.٠٠"]);
        assert_eq!(sheet.totals, ["الإجمالي", "٦٥٠.٠٠", "٢٠٠.٠٠", "٤٥٠.٠٠"]);
    }

    #[test]
    fn writes_xlsx_file() {
        let sheet = summary_sheet(PartyKind::Custody, &[]);

        let bytes = write_workbook(&sheet).unwrap();

        // XLSX files are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }
}
