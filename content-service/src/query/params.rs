//! Typed view of a list request's query string.
//!
//! Every key that is not one of [`RESERVED_KEYS`] is a filter on the field of
//! the same name. Comparison operators use a bracket suffix
//! (`price[gte]=100`), matching the conventions of the site's admin UI.

use bson::Bson;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

/// Query keys that drive pagination, sorting, projection and search rather
/// than filtering.
pub const RESERVED_KEYS: [&str; 5] = ["page", "limit", "sort", "fields", "search"];

pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// A filter value, typed on parse so numeric and date comparisons behave.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Text(String),
}

impl Scalar {
    /// Integers first, then finite floats, booleans, dates (RFC 3339 or
    /// `YYYY-MM-DD`); anything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(value) = trimmed.parse::<i64>() {
            return Scalar::Int(value);
        }
        if looks_numeric(trimmed) {
            if let Ok(value) = trimmed.parse::<f64>() {
                if value.is_finite() {
                    return Scalar::Float(value);
                }
            }
        }
        match trimmed {
            "true" => return Scalar::Bool(true),
            "false" => return Scalar::Bool(false),
            _ => {}
        }
        if let Some(date) = parse_date(trimmed) {
            return Scalar::Date(date);
        }

        Scalar::Text(raw.to_string())
    }

    /// Values an equality filter on `raw` accepts: the typed form, plus the
    /// raw text when typing changed it. A stored `"1001"` and a stored `1001`
    /// both match `sku=1001`.
    pub fn equality_forms(raw: &str) -> Vec<Self> {
        match Scalar::parse(raw) {
            text @ Scalar::Text(_) => vec![text],
            typed => vec![typed, Scalar::Text(raw.to_string())],
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            Scalar::Int(value) => Bson::Int64(*value),
            Scalar::Float(value) => Bson::Double(*value),
            Scalar::Bool(value) => Bson::Boolean(*value),
            Scalar::Date(value) => {
                Bson::DateTime(bson::DateTime::from_millis(value.timestamp_millis()))
            }
            Scalar::Text(value) => Bson::String(value.clone()),
        }
    }
}

// Keeps "inf", "NaN" and friends out of the float branch.
fn looks_numeric(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// One predicate on a field. All conditions on a field must hold.
///
/// Equality on a value that types as a number, boolean or date is parsed to
/// `In` over the typed and textual forms; range operators compare typed
/// values only.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Scalar),
    Gt(Scalar),
    Gte(Scalar),
    Lt(Scalar),
    Lte(Scalar),
    In(Vec<Scalar>),
}

impl Condition {
    /// Mongo operator this condition renders to.
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::Gt(_) => "$gt",
            Condition::Gte(_) => "$gte",
            Condition::Lt(_) => "$lt",
            Condition::Lte(_) => "$lte",
            Condition::In(_) => "$in",
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            Condition::Eq(value)
            | Condition::Gt(value)
            | Condition::Gte(value)
            | Condition::Lt(value)
            | Condition::Lte(value) => value.to_bson(),
            Condition::In(values) => Bson::Array(values.iter().map(Scalar::to_bson).collect()),
        }
    }

    fn parse(operator: Option<&str>, raw: &str) -> Option<Self> {
        let condition = match operator {
            None | Some("eq") => {
                let mut forms = Scalar::equality_forms(raw);
                if forms.len() == 1 {
                    Condition::Eq(forms.remove(0))
                } else {
                    Condition::In(forms)
                }
            }
            Some("gt") => Condition::Gt(Scalar::parse(raw)),
            Some("gte") => Condition::Gte(Scalar::parse(raw)),
            Some("lt") => Condition::Lt(Scalar::parse(raw)),
            Some("lte") => Condition::Lte(Scalar::parse(raw)),
            Some("in") => {
                let values: Vec<Scalar> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .flat_map(Scalar::equality_forms)
                    .collect();
                if values.is_empty() {
                    return None;
                }
                Condition::In(values)
            }
            Some(other) => {
                tracing::debug!(operator = %other, "Ignoring unsupported filter operator");
                return None;
            }
        };
        Some(condition)
    }
}

/// Adds `condition` to a field's list. Repeated equality collapses into a
/// membership test; a repeated range operator replaces the earlier one.
fn merge_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match condition {
        Condition::Eq(value) => {
            for existing in conditions.iter_mut() {
                match existing {
                    Condition::In(values) => {
                        values.push(value);
                        return;
                    }
                    Condition::Eq(first) => {
                        let first = first.clone();
                        *existing = Condition::In(vec![first, value]);
                        return;
                    }
                    _ => {}
                }
            }
            conditions.push(Condition::Eq(value));
        }
        Condition::In(mut values) => {
            for existing in conditions.iter_mut() {
                match existing {
                    Condition::In(current) => {
                        current.append(&mut values);
                        return;
                    }
                    Condition::Eq(first) => {
                        values.insert(0, first.clone());
                        *existing = Condition::In(values);
                        return;
                    }
                    _ => {}
                }
            }
            conditions.push(Condition::In(values));
        }
        range => {
            let kind = std::mem::discriminant(&range);
            match conditions
                .iter_mut()
                .find(|existing| std::mem::discriminant(&**existing) == kind)
            {
                Some(slot) => *slot = range,
                None => conditions.push(range),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Comma separated field names, `-` prefix for descending. Invalid
    /// names are skipped and a repeated field keeps its first position.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut keys: Vec<SortKey> = Vec::new();
        for token in raw.split(',').map(str::trim) {
            let (field, direction) = match token.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (token.strip_prefix('+').unwrap_or(token), SortDirection::Asc),
            };
            if !is_valid_field(field) || keys.iter().any(|key| key.field == field) {
                continue;
            }
            keys.push(SortKey {
                field: field.to_string(),
                direction,
            });
        }

        if keys.is_empty() {
            None
        } else {
            Some(Self { keys })
        }
    }

    /// Most recently created first.
    pub fn newest_first() -> Self {
        Self {
            keys: vec![
                SortKey {
                    field: "createdAt".to_string(),
                    direction: SortDirection::Desc,
                },
                SortKey {
                    field: "_id".to_string(),
                    direction: SortDirection::Desc,
                },
            ],
        }
    }

    /// Appends `_id` ascending unless already present so page boundaries are
    /// stable when the requested keys tie.
    pub fn with_tiebreak(mut self) -> Self {
        if !self.keys.iter().any(|key| key.field == "_id") {
            self.keys.push(SortKey {
                field: "_id".to_string(),
                direction: SortDirection::Asc,
            });
        }
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Pagination fallbacks applied when `page`/`limit` are missing or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefaults {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: None,
        }
    }
}

/// A list request after parsing, before any query is assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub filters: BTreeMap<String, Vec<Condition>>,
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
    pub fields: Option<Vec<String>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListParams {
    /// Parses a raw (still percent-encoded) query string.
    pub fn from_query_str(raw: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)?;
        Ok(Self::from_pairs(pairs))
    }

    /// Builds params from decoded key/value pairs in request order. For
    /// reserved keys the last occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = ListParams::default();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            let (field, operator) = split_operator(key);

            if RESERVED_KEYS.contains(&field) {
                if operator.is_none() {
                    params.apply_reserved(field, value);
                }
                continue;
            }
            if !is_valid_field(field) {
                tracing::debug!(key = %key, "Ignoring filter on invalid field name");
                continue;
            }
            if let Some(condition) = Condition::parse(operator, value) {
                merge_condition(
                    params.filters.entry(field.to_string()).or_default(),
                    condition,
                );
            }
        }

        params
    }

    fn apply_reserved(&mut self, key: &str, value: &str) {
        match key {
            "page" => self.page = parse_positive(value),
            "limit" => self.limit = parse_positive(value),
            "sort" => self.sort = SortSpec::parse(value),
            "fields" => self.fields = parse_fields(value),
            "search" => {
                let term = value.trim();
                self.search = (!term.is_empty()).then(|| term.to_string());
            }
            _ => {}
        }
    }
}

/// `price[gte]` -> (`price`, Some(`gte`)); keys without a bracket suffix
/// have no operator.
fn split_operator(key: &str) -> (&str, Option<&str>) {
    if let Some(open) = key.find('[') {
        if let Some(operator) = key[open + 1..].strip_suffix(']') {
            return (&key[..open], Some(operator));
        }
    }
    (key, None)
}

/// Dotted path of non-empty segments; no segment may start with `$` or
/// contain brackets.
pub fn is_valid_field(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && !segment.starts_with('$') && !segment.contains(|c| c == '[' || c == ']')
        })
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value >= 1)
}

fn parse_fields(raw: &str) -> Option<Vec<String>> {
    let mut fields: Vec<String> = Vec::new();
    for field in raw.split(',').map(str::trim) {
        // Exclusion tokens are not supported alongside inclusion.
        if field.starts_with('-') || !is_valid_field(field) {
            continue;
        }
        if !fields.iter().any(|existing| existing == field) {
            fields.push(field.to_string());
        }
    }
    (!fields.is_empty()).then_some(fields)
}
