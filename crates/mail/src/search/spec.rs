//! Structured search request

use chrono::{Local, NaiveDateTime};

use super::field::SearchField;
use super::term::{Combinator, build_term_at, combine};
use crate::error::{MailError, Result};

/// Search fields with their values, a combinator and a result cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    terms: Vec<(SearchField, Vec<String>)>,
    mode: Combinator,
    max_results: usize,
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            mode: Combinator::And,
            max_results: Self::MAX_RESULTS,
        }
    }
}

impl SearchSpec {
    /// Largest number of messages a search may return
    pub const MAX_RESULTS: usize = 500;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Combinator) -> Self {
        self.mode = mode;
        self
    }

    /// Set the result cap, which must be within 1..=500
    pub fn with_max_results(mut self, max_results: usize) -> Result<Self> {
        if !(1..=Self::MAX_RESULTS).contains(&max_results) {
            return Err(MailError::InvalidMaxResults(max_results));
        }
        self.max_results = max_results;
        Ok(self)
    }

    /// Add values for a field, appending to any values it already has.
    /// An empty value list leaves the spec unchanged.
    pub fn push<I, S>(&mut self, field: SearchField, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        match self.terms.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => existing.extend(values),
            None => self.terms.push((field, values)),
        }
    }

    /// Builder form of [`push`](Self::push)
    pub fn with<I, S>(mut self, field: SearchField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(field, values);
        self
    }

    /// Fold another spec's terms into this one; its mode and cap take over
    pub fn merge(&mut self, other: SearchSpec) {
        for (field, values) in other.terms {
            self.push(field, values);
        }
        self.mode = other.mode;
        self.max_results = other.max_results;
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn mode(&self) -> Combinator {
        self.mode
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn values(&self, field: SearchField) -> Option<&[String]> {
        self.terms
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, values)| values.as_slice())
    }

    /// Render the Gmail query string
    pub fn to_query(&self) -> Result<String> {
        self.to_query_at(Local::now().naive_local())
    }

    /// Render the Gmail query string, validating dates against `now`
    pub fn to_query_at(&self, now: NaiveDateTime) -> Result<String> {
        if self.is_empty() {
            return Err(MailError::EmptyQuery);
        }

        let fragments = self
            .terms
            .iter()
            .map(|(field, values)| build_term_at(*field, values, " ", now))
            .collect::<Result<Vec<_>>>()?;

        combine(&fragments, self.mode)
    }
}
