//! Evaluates a [`ListQuery`] against documents held in memory.
//!
//! Follows MongoDB's semantics closely enough for the operators the query
//! builder emits: array fields match when any element matches, mixed types
//! never compare equal, and sorting uses the server's cross-type order.

use super::builder::{ListQuery, Projection, SearchSpec, VERSION_KEY};
use super::params::{Condition, Scalar, SortDirection, SortSpec};
use bson::{Bson, Document};
use std::cmp::Ordering;

/// Value at a dotted `path`, descending through embedded documents.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

pub fn matches(query: &ListQuery, document: &Document) -> bool {
    let filters_hold = query.filters().iter().all(|(field, conditions)| {
        let value = lookup(document, field);
        conditions
            .iter()
            .all(|condition| condition_holds(condition, value))
    });

    filters_hold
        && query
            .search()
            .map_or(true, |search| search_matches(search, document))
}

fn condition_holds(condition: &Condition, value: Option<&Bson>) -> bool {
    if let Some(Bson::Array(items)) = value {
        return items
            .iter()
            .any(|item| condition_holds(condition, Some(item)));
    }
    let Some(value) = value else {
        return false;
    };

    let compare = |scalar: &Scalar| compare_scalar(value, scalar);
    match condition {
        Condition::Eq(scalar) => compare(scalar) == Some(Ordering::Equal),
        Condition::Gt(scalar) => compare(scalar) == Some(Ordering::Greater),
        Condition::Gte(scalar) => matches!(
            compare(scalar),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Condition::Lt(scalar) => compare(scalar) == Some(Ordering::Less),
        Condition::Lte(scalar) => {
            matches!(compare(scalar), Some(Ordering::Less | Ordering::Equal))
        }
        Condition::In(scalars) => scalars
            .iter()
            .any(|scalar| compare(scalar) == Some(Ordering::Equal)),
    }
}

/// Orders a stored value against a query scalar; `None` when the types are
/// not comparable.
fn compare_scalar(value: &Bson, scalar: &Scalar) -> Option<Ordering> {
    match (value, scalar) {
        (Bson::Int64(stored), Scalar::Int(wanted)) => Some(stored.cmp(wanted)),
        (Bson::Int32(stored), Scalar::Int(wanted)) => Some(i64::from(*stored).cmp(wanted)),
        (_, Scalar::Int(wanted)) => as_f64(value)?.partial_cmp(&(*wanted as f64)),
        (_, Scalar::Float(wanted)) => as_f64(value)?.partial_cmp(wanted),
        (Bson::Boolean(stored), Scalar::Bool(wanted)) => Some(stored.cmp(wanted)),
        (Bson::DateTime(stored), Scalar::Date(wanted)) => {
            Some(stored.timestamp_millis().cmp(&wanted.timestamp_millis()))
        }
        (Bson::String(stored), Scalar::Text(wanted)) => Some(stored.as_str().cmp(wanted.as_str())),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(number) => Some(f64::from(*number)),
        Bson::Int64(number) => Some(*number as f64),
        Bson::Double(number) => Some(*number),
        _ => None,
    }
}

fn search_matches(search: &SearchSpec, document: &Document) -> bool {
    let needle = search.term().to_lowercase();
    let contains = |value: &Bson| match value {
        Bson::String(text) => text.to_lowercase().contains(&needle),
        _ => false,
    };

    search
        .fields()
        .iter()
        .filter_map(|field| lookup(document, field))
        .any(|value| match value {
            Bson::Array(items) => items.iter().any(contains),
            other => contains(other),
        })
}

/// Compares two documents under `sort`; later keys break earlier ties.
pub fn compare_documents(sort: &SortSpec, left: &Document, right: &Document) -> Ordering {
    for key in sort.keys() {
        let ordering = compare_values(lookup(left, &key.field), lookup(right, &key.field));
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) => 1,
        Some(Bson::String(_) | Bson::Symbol(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Binary(_)) => 5,
        Some(Bson::ObjectId(_)) => 6,
        Some(Bson::Boolean(_)) => 7,
        Some(Bson::DateTime(_)) => 8,
        Some(Bson::Timestamp(_)) => 9,
        Some(Bson::RegularExpression(_)) => 10,
        Some(_) => 11,
    }
}

fn compare_values(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let rank = type_rank(left).cmp(&type_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(Bson::ObjectId(a)), Some(Bson::ObjectId(b))) => a.bytes().cmp(&b.bytes()),
        (Some(Bson::Boolean(a)), Some(Bson::Boolean(b))) => a.cmp(b),
        (Some(Bson::DateTime(a)), Some(Bson::DateTime(b))) => a.cmp(b),
        (Some(Bson::Timestamp(a)), Some(Bson::Timestamp(b))) => {
            (a.time, a.increment).cmp(&(b.time, b.increment))
        }
        (Some(a), Some(b)) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// Applies a projection. Included dotted paths keep their whole top-level
/// field.
pub fn project(projection: &Projection, mut document: Document) -> Document {
    match projection {
        Projection::ExcludeInternal => {
            document.remove(VERSION_KEY);
            document
        }
        Projection::Include(fields) => {
            let mut projected = Document::new();
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
            for field in fields {
                let top = field.split('.').next().unwrap_or(field.as_str());
                if let Some(value) = document.get(top) {
                    projected.insert(top, value.clone());
                }
            }
            projected
        }
    }
}
