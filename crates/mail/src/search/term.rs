//! Query fragment construction
//!
//! [`build_term`] renders one field's values into a Gmail query fragment
//! and [`combine`] joins fragments into the final search string.

use chrono::{Local, NaiveDateTime};

use super::date::validate_before;
use super::field::SearchField;
use crate::error::{MailError, Result};

/// Logical operator joining the fragments of different fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combinator {
    /// Gmail's implicit AND (space separated)
    #[default]
    And,
    /// `a OR b`, grouped in `{ }`
    Or,
}

/// Render `values` for `field`, validating dates against the current time
pub fn build_term<S: AsRef<str>>(field: SearchField, values: &[S], joiner: &str) -> Result<String> {
    build_term_at(field, values, joiner, Local::now().naive_local())
}

/// Render `values` for `field`, validating dates against `now`
pub fn build_term_at<S: AsRef<str>>(
    field: SearchField,
    values: &[S],
    joiner: &str,
    now: NaiveDateTime,
) -> Result<String> {
    if values.is_empty() || values.iter().any(|v| v.as_ref().trim().is_empty()) {
        return Err(MailError::EmptyQuery);
    }

    if field.is_date() {
        for value in values {
            validate_before(value.as_ref(), now)?;
        }
    }

    let format = field.format();
    let rendered: Vec<String> = values
        .iter()
        .map(|value| {
            format!(
                "{surround}{keyword}{sep}{value}{surround}",
                surround = format.surround,
                keyword = format.keyword,
                sep = format.sep,
                value = value.as_ref().trim(),
            )
        })
        .collect();

    let joined = rendered.join(joiner);
    Ok(if format.group_or {
        format!("{{{}}}", joined)
    } else {
        joined
    })
}

/// Join per-field fragments into one query
pub fn combine<S: AsRef<str>>(fragments: &[S], mode: Combinator) -> Result<String> {
    if fragments.is_empty() {
        return Err(MailError::EmptyQuery);
    }

    let parts: Vec<&str> = fragments.iter().map(|f| f.as_ref()).collect();
    Ok(match mode {
        Combinator::And => parts.join(" "),
        Combinator::Or => format!("{{{}}}", parts.join(" OR ")),
    })
}
