use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// A bindable value inside a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Bool(bool),
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
        }
    }
}

/// One clause of a WHERE. Field names are always code-owned column expressions,
/// values are always bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: &'static str, value: Value },
    In { field: &'static str, values: Vec<Value> },
    Range { field: &'static str, min: Option<Value>, max: Option<Value> },
    Compare { field: &'static str, op: CompareOp, value: Value },
    /// Branch scoping: rows with no branch belong to every branch.
    InOrNull { field: &'static str, values: Vec<Value> },
    /// Free-text search, OR-ed across the fields.
    AnyIlike { fields: &'static [&'static str], pattern: String },
}

impl Predicate {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq { field, value: value.into() }
    }

    pub fn is_in<V: Into<Value>>(field: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn search(fields: &'static [&'static str], term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() || fields.is_empty() {
            return None;
        }
        Some(Predicate::AnyIlike {
            fields,
            pattern: format!("%{}%", escape_like(term)),
        })
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    Today,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    LastYear,
}

fn month_start(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    month_start(y, m) - Duration::days(1)
}

impl DatePreset {
    /// Inclusive start and end of the preset relative to `today`. Weeks start on Monday.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        match self {
            DatePreset::Today => (today, today),
            DatePreset::ThisWeek => (week_start, week_start + Duration::days(6)),
            DatePreset::LastWeek => (week_start - Duration::days(7), week_start - Duration::days(1)),
            DatePreset::ThisMonth => (month_start(today.year(), today.month()), month_end(today.year(), today.month())),
            DatePreset::LastMonth => {
                let (y, m) = if today.month() == 1 { (today.year() - 1, 12) } else { (today.year(), today.month() - 1) };
                (month_start(y, m), month_end(y, m))
            }
            DatePreset::ThisQuarter => {
                let first = (today.month0() / 3) * 3 + 1;
                (month_start(today.year(), first), month_end(today.year(), first + 2))
            }
            DatePreset::ThisYear => (month_start(today.year(), 1), month_end(today.year(), 12)),
            DatePreset::LastYear => (month_start(today.year() - 1, 1), month_end(today.year() - 1, 12)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateFilter {
    pub preset: Option<DatePreset>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateFilter {
    /// Replaces a preset with explicit bounds. Explicit bounds win over a preset.
    pub fn resolved(&self, today: NaiveDate) -> DateFilter {
        if self.start.is_some() || self.end.is_some() {
            return DateFilter {
                preset: None,
                start: self.start,
                end: self.end,
            };
        }
        match self.preset {
            Some(preset) => {
                let (start, end) = preset.resolve(today);
                DateFilter {
                    preset: None,
                    start: Some(start),
                    end: Some(end),
                }
            }
            None => DateFilter::default(),
        }
    }

    fn predicate(&self, field: &'static str) -> Option<Predicate> {
        if self.start.is_none() && self.end.is_none() {
            return None;
        }
        Some(Predicate::Range {
            field,
            min: self.start.map(Value::Date),
            max: self.end.map(Value::Date),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AmountRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AmountComparison {
    #[serde(default)]
    pub operator: CompareOp,
    pub value: Option<Decimal>,
}

/// Which columns a finance table exposes to filtering. Relation filters aimed at a
/// column the table does not have are dropped.
#[derive(Debug, Clone, Copy)]
pub struct FinanceColumns {
    pub date: &'static str,
    pub amount: &'static str,
    pub category: Option<&'static str>,
    pub payment_method: Option<&'static str>,
    pub member: Option<&'static str>,
    pub group: Option<&'static str>,
    pub tag_item: Option<&'static str>,
    pub occasion: Option<&'static str>,
    pub session: Option<&'static str>,
    pub branch: &'static str,
    pub is_deleted: &'static str,
    pub created_at: &'static str,
    pub search: &'static [&'static str],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinanceFilter {
    pub category_filter: Vec<String>,
    pub payment_method_filter: Vec<String>,
    pub amount_range: Option<AmountRange>,
    pub amount_comparison: Option<AmountComparison>,
    pub date_filter: Option<DateFilter>,
    pub member_ids: Vec<Uuid>,
    pub group_ids: Vec<Uuid>,
    pub tag_item_ids: Vec<Uuid>,
    pub occasion_ids: Vec<Uuid>,
    pub session_ids: Vec<Uuid>,
    pub branch_ids: Vec<Uuid>,
    pub search: Option<String>,
}

fn push_in<V: Into<Value> + Clone>(predicates: &mut Vec<Predicate>, column: Option<&'static str>, values: &[V]) {
    if let Some(column) = column {
        if !values.is_empty() {
            predicates.push(Predicate::is_in(column, values.iter().cloned()));
        }
    }
}

impl FinanceFilter {
    pub fn with_resolved_dates(mut self, today: NaiveDate) -> Self {
        self.date_filter = self.date_filter.map(|d| d.resolved(today));
        self
    }

    fn comparison_value(&self) -> Option<(CompareOp, Decimal)> {
        self.amount_comparison.as_ref().and_then(|c| c.value.map(|v| (c.operator, v)))
    }

    /// One predicate per present filter key. Branch selection is not handled here,
    /// it goes through the branch scope. Date presets must already be resolved.
    pub fn normalize(&self, columns: &FinanceColumns) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        push_in(&mut predicates, columns.category, &self.category_filter);
        push_in(&mut predicates, columns.payment_method, &self.payment_method_filter);
        if let Some(AmountRange { min: Some(min), max: Some(max) }) = &self.amount_range {
            predicates.push(Predicate::Range {
                field: columns.amount,
                min: Some(Value::Decimal(*min)),
                max: Some(Value::Decimal(*max)),
            });
        }
        let comparison = self.comparison_value();
        if let Some((op, value)) = comparison {
            predicates.push(Predicate::Compare {
                field: columns.amount,
                op,
                value: Value::Decimal(value),
            });
        }
        if let Some(p) = self.date_filter.as_ref().and_then(|d| d.predicate(columns.date)) {
            predicates.push(p);
        }
        push_in(&mut predicates, columns.member, &self.member_ids);
        push_in(&mut predicates, columns.group, &self.group_ids);
        push_in(&mut predicates, columns.tag_item, &self.tag_item_ids);
        push_in(&mut predicates, columns.occasion, &self.occasion_ids);
        push_in(&mut predicates, columns.session, &self.session_ids);
        // an amount comparison takes the place of free-text search
        if comparison.is_none() {
            if let Some(p) = self.search.as_deref().and_then(|s| Predicate::search(columns.search, s)) {
                predicates.push(p);
            }
        }
        predicates
    }
}
