//! Arabic presentation of numbers and dates for exported workbooks.

use time::{Date, Month};

/// Replace the ASCII digits in `text` with Arabic-Indic digits (U+0660 to U+0669).
pub fn to_arabic_indic_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(digit) => char::from_u32(0x0660 + digit).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Format an amount with exactly two decimals in Arabic-Indic digits, e.g. "-١٢٣٤.٥٠".
pub fn format_localized_amount(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    // Avoid "-0.00".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };

    to_arabic_indic_digits(&format!("{rounded:.2}"))
}

/// Format a date as an Arabic long date, e.g. "١٥ يناير ٢٠٢٥".
pub fn format_localized_date(date: Date) -> String {
    let text = format!(
        "{} {} {}",
        date.day(),
        arabic_month_name(date.month()),
        date.year()
    );

    to_arabic_indic_digits(&text)
}

fn arabic_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "يناير",
        Month::February => "فبراير",
        Month::March => "مارس",
        Month::April => "أبريل",
        Month::May => "مايو",
        Month::June => "يونيو",
        Month::July => "يوليو",
        Month::August => "أغسطس",
        Month::September => "سبتمبر",
        Month::October => "أكتوبر",
        Month::November => "نوفمبر",
        Month::December => "ديسمبر",
    }
}

/// Read back an amount written by [format_localized_amount].
#[cfg(test)]
pub fn parse_localized_amount(text: &str) -> Option<f64> {
    let ascii: String = text
        .chars()
        .map(|c| match c as u32 {
            0x0660..=0x0669 => char::from_digit(c as u32 - 0x0660, 10).unwrap_or(c),
            _ => c,
        })
        .collect();

    ascii.parse().ok()
}
