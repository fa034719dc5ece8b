//! The closed sets of labels a transaction can carry: where the money came
//! from, and what a custody expense was spent on.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::Error;

/// The form value that means "no selection".
pub const NONE_FORM_VALUE: &str = "none";

/// Where the money for a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingSource {
    Cash,
    AlbiladBank,
    AlrajhiBank,
}

impl FundingSource {
    pub const ALL: [FundingSource; 3] = [
        FundingSource::Cash,
        FundingSource::AlbiladBank,
        FundingSource::AlrajhiBank,
    ];

    /// The value used in forms and in the database.
    pub fn tag(self) -> &'static str {
        match self {
            FundingSource::Cash => "cash",
            FundingSource::AlbiladBank => "albilad_bank",
            FundingSource::AlrajhiBank => "alrajhi_bank",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FundingSource::Cash => "Cash",
            FundingSource::AlbiladBank => "Albilad Bank",
            FundingSource::AlrajhiBank => "Al Rajhi Bank",
        }
    }

    /// The label written to exported workbooks.
    pub fn local_label(self) -> &'static str {
        match self {
            FundingSource::Cash => "كاش",
            FundingSource::AlbiladBank => "بنك البلاد",
            FundingSource::AlrajhiBank => "بنك الراجحى",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.tag() == tag)
    }

    /// Parse the value of a funding source `<select>`.
    ///
    /// An empty value or [NONE_FORM_VALUE] means no funding source.
    ///
    /// # Errors
    /// Returns [Error::InvalidFundingSource] for any other unknown value.
    pub fn parse_form_value(raw: &str) -> Result<Option<Self>, Error> {
        let raw = raw.trim();

        if raw.is_empty() || raw == NONE_FORM_VALUE {
            return Ok(None);
        }

        Self::from_tag(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidFundingSource(raw.to_owned()))
    }
}

/// What money held in custody was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Fuel,
    Maintenance,
    Salaries,
    Supplies,
    Transport,
    Miscellaneous,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Fuel,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Salaries,
        ExpenseCategory::Supplies,
        ExpenseCategory::Transport,
        ExpenseCategory::Miscellaneous,
    ];

    /// The value used in forms and in the database.
    pub fn tag(self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "fuel",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Salaries => "salaries",
            ExpenseCategory::Supplies => "supplies",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Miscellaneous => "miscellaneous",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "Fuel",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Miscellaneous => "Miscellaneous",
        }
    }

    /// The label written to exported workbooks.
    pub fn local_label(self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "وقود",
            ExpenseCategory::Maintenance => "صيانة",
            ExpenseCategory::Salaries => "رواتب",
            ExpenseCategory::Supplies => "مستلزمات",
            ExpenseCategory::Transport => "نقل",
            ExpenseCategory::Miscellaneous => "نثريات",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.tag() == tag)
    }

    /// Parse the value of an expense category `<select>`.
    ///
    /// An empty value or [NONE_FORM_VALUE] means no category.
    ///
    /// # Errors
    /// Returns [Error::InvalidExpenseCategory] for any other unknown value.
    pub fn parse_form_value(raw: &str) -> Result<Option<Self>, Error> {
        let raw = raw.trim();

        if raw.is_empty() || raw == NONE_FORM_VALUE {
            return Ok(None);
        }

        Self::from_tag(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidExpenseCategory(raw.to_owned()))
    }
}

impl ToSql for FundingSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.tag().as_bytes())))
    }
}

impl FromSql for FundingSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;

        FundingSource::from_tag(tag)
            .ok_or_else(|| FromSqlError::Other(format!("unknown funding source \"{tag}\"").into()))
    }
}

impl ToSql for ExpenseCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.tag().as_bytes())))
    }
}

impl FromSql for ExpenseCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;

        ExpenseCategory::from_tag(tag).ok_or_else(|| {
            FromSqlError::Other(format!("unknown expense category \"{tag}\"").into())
        })
    }
}
