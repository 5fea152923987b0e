//! Table schema: the read/browse contract of a resource.

use crate::resource::form::SelectOption;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Human timestamp format for `date_time()` columns.
pub const DATE_TIME_FORMAT: &str = "%b %-d, %Y %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    /// Inline on/off switch bound to a boolean attribute.
    Toggle,
}

/// Maps a stored state to its display label. Must be total over its input.
#[derive(Clone, Copy)]
pub struct StateFormatter(pub fn(Option<&str>) -> &'static str);

impl fmt::Debug for StateFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateFormatter")
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ColumnFormat {
    Plain,
    DateTime,
    State(StateFormatter),
}

impl Serialize for ColumnFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            ColumnFormat::Plain => "plain",
            ColumnFormat::DateTime => "date_time",
            ColumnFormat::State(_) => "state",
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TableColumn {
    pub name: String,
    pub label: String,
    pub kind: ColumnKind,
    pub format: ColumnFormat,
    pub searchable: bool,
    pub sortable: bool,
    pub toggleable: bool,
    pub hidden_by_default: bool,
}

impl TableColumn {
    fn base(name: &str, label: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            format: ColumnFormat::Plain,
            searchable: false,
            sortable: false,
            toggleable: false,
            hidden_by_default: false,
        }
    }

    #[must_use]
    pub fn text(name: &str, label: &str) -> Self {
        Self::base(name, label, ColumnKind::Text)
    }

    #[must_use]
    pub fn toggle(name: &str, label: &str) -> Self {
        Self::base(name, label, ColumnKind::Toggle)
    }

    #[must_use]
    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn date_time(mut self) -> Self {
        self.format = ColumnFormat::DateTime;
        self
    }

    /// User may show/hide the column; `hidden_by_default` sets its initial state.
    #[must_use]
    pub const fn toggleable(mut self, hidden_by_default: bool) -> Self {
        self.toggleable = true;
        self.hidden_by_default = hidden_by_default;
        self
    }

    #[must_use]
    pub const fn format_state_using(mut self, f: fn(Option<&str>) -> &'static str) -> Self {
        self.format = ColumnFormat::State(StateFormatter(f));
        self
    }

    /// Display value of one cell. Never fails: values a format does not
    /// understand are passed through unchanged.
    pub fn render(&self, value: Option<&Value>) -> Value {
        let value = value.unwrap_or(&Value::Null);
        if self.kind == ColumnKind::Toggle {
            return value.clone();
        }
        match self.format {
            ColumnFormat::Plain => value.clone(),
            ColumnFormat::DateTime => match value {
                Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                    Ok(dt) => Value::String(dt.with_timezone(&Utc).format(DATE_TIME_FORMAT).to_string()),
                    Err(_) => value.clone(),
                },
                _ => value.clone(),
            },
            ColumnFormat::State(StateFormatter(f)) => {
                let label = match value {
                    Value::Null => f(None),
                    Value::String(s) => f(Some(s)),
                    other => f(Some(&other.to_string())),
                };
                Value::String(label.to_string())
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    /// Exact match against a closed option set.
    Select { options: Vec<SelectOption> },
    /// true / false / unconstrained.
    Ternary,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableFilter {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

impl TableFilter {
    #[must_use]
    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FilterKind::Select { options },
        }
    }

    #[must_use]
    pub fn ternary(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FilterKind::Ternary,
        }
    }

    /// Parse a raw query value. Empty means unconstrained (`Ok(None)`).
    pub fn parse(&self, raw: &str) -> Result<Option<Value>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match &self.kind {
            FilterKind::Select { options } => {
                if options.iter().any(|o| o.value == raw) {
                    Ok(Some(Value::String(raw.to_string())))
                } else {
                    Err(format!("{} filter does not accept '{}'", self.name, raw))
                }
            }
            FilterKind::Ternary => match raw {
                "1" | "true" => Ok(Some(Value::Bool(true))),
                "0" | "false" => Ok(Some(Value::Bool(false))),
                _ => Err(format!("{} filter expects true or false", self.name)),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Edit,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    DeleteMany,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Option<SortDirection> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DefaultSort {
    pub column: String,
    pub direction: SortDirection,
}

/// One page-size choice; `All` disables the limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSize {
    Count(u32),
    All,
}

impl PageSize {
    pub fn parse(s: &str) -> Option<PageSize> {
        match s.trim() {
            "all" => Some(PageSize::All),
            n => n.parse().ok().filter(|n| *n > 0).map(PageSize::Count),
        }
    }

    pub fn limit(&self) -> Option<u32> {
        match self {
            PageSize::Count(n) => Some(*n),
            PageSize::All => None,
        }
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSize::Count(n) => serializer.serialize_u32(*n),
            PageSize::All => serializer.serialize_str("all"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Pagination {
    pub options: Vec<PageSize>,
    pub default: PageSize,
}

impl Pagination {
    #[must_use]
    pub fn new(options: Vec<PageSize>, default: PageSize) -> Self {
        Self { options, default }
    }

    /// Requested size when it is one of the options, otherwise the default.
    pub fn resolve(&self, raw: Option<&str>) -> PageSize {
        raw.and_then(PageSize::parse)
            .filter(|p| self.options.contains(p))
            .unwrap_or(self.default)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            options: vec![PageSize::Count(10), PageSize::Count(25), PageSize::Count(50)],
            default: PageSize::Count(10),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TableSchema {
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub actions: Vec<RowAction>,
    pub bulk_actions: Vec<BulkAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<DefaultSort>,
    pub pagination: Pagination,
}

impl TableSchema {
    #[must_use]
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filters(mut self, filters: Vec<TableFilter>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: Vec<RowAction>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn bulk_actions(mut self, bulk_actions: Vec<BulkAction>) -> Self {
        self.bulk_actions = bulk_actions;
        self
    }

    #[must_use]
    pub fn default_sort(mut self, column: &str, direction: SortDirection) -> Self {
        self.default_sort = Some(DefaultSort {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn paginated(mut self, options: Vec<PageSize>, default: PageSize) -> Self {
        self.pagination = Pagination::new(options, default);
        self
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn filter(&self, name: &str) -> Option<&TableFilter> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn searchable_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| c.sortable)
    }

    pub fn has_action(&self, action: RowAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn has_bulk_action(&self, action: BulkAction) -> bool {
        self.bulk_actions.contains(&action)
    }

    /// Display cells for one row, keyed by column name.
    pub fn render_row(&self, row: &Value) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.render(row.get(&c.name))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yes_no(state: Option<&str>) -> &'static str {
        match state {
            Some("y") => "yes",
            _ => "?",
        }
    }

    #[test]
    fn date_time_column_renders_human_format() {
        let c = TableColumn::text("created_at", "Created").date_time();
        let v = c.render(Some(&json!("2025-01-19T20:57:00+00:00")));
        assert_eq!(v, json!("Jan 19, 2025 20:57:00"));
        assert_eq!(c.render(Some(&json!(null))), json!(null));
        assert_eq!(c.render(Some(&json!("garbage"))), json!("garbage"));
    }

    #[test]
    fn state_column_falls_back_for_any_value() {
        let c = TableColumn::text("flag", "Flag").format_state_using(yes_no);
        assert_eq!(c.render(Some(&json!("y"))), json!("yes"));
        assert_eq!(c.render(Some(&json!(3))), json!("?"));
        assert_eq!(c.render(None), json!("?"));
    }

    #[test]
    fn ternary_filter_has_three_positions() {
        let f = TableFilter::ternary("is_active", "Active");
        assert_eq!(f.parse("true").unwrap(), Some(json!(true)));
        assert_eq!(f.parse("0").unwrap(), Some(json!(false)));
        assert_eq!(f.parse("").unwrap(), None);
        assert!(f.parse("maybe").is_err());
    }

    #[test]
    fn select_filter_only_accepts_options() {
        let f = TableFilter::select("g", "G", vec![SelectOption::new("a", "A")]);
        assert_eq!(f.parse("a").unwrap(), Some(json!("a")));
        assert!(f.parse("b").is_err());
    }

    #[test]
    fn pagination_falls_back_to_default() {
        let p = Pagination::new(vec![PageSize::Count(10), PageSize::Count(20), PageSize::All], PageSize::Count(20));
        assert_eq!(p.resolve(None), PageSize::Count(20));
        assert_eq!(p.resolve(Some("10")), PageSize::Count(10));
        assert_eq!(p.resolve(Some("all")), PageSize::All);
        assert_eq!(p.resolve(Some("15")), PageSize::Count(20));
        assert_eq!(p.resolve(Some("x")), PageSize::Count(20));
        assert_eq!(serde_json::to_value(&p.options).unwrap(), json!([10, 20, "all"]));
    }
}
