//! Paged search and message retrieval

use anyhow::Result;
use log::{debug, info};

use crate::gmail::api::{ListMessagesResponse, MessageRef};
use crate::gmail::{BodyFormat, MailApi, parse_message};
use crate::models::{MessageId, ParsedMessage, dedupe_by_id};
use crate::search::SearchSpec;

/// Follow continuation tokens until the results run out or `max_results`
/// references have been collected.
///
/// `search` receives the query and the page token (`None` for the first
/// page). Errors are returned as soon as a page request fails.
pub fn page_response<F>(mut search: F, query: &str, max_results: usize) -> Result<Vec<MessageRef>>
where
    F: FnMut(&str, Option<&str>) -> Result<ListMessagesResponse>,
{
    let mut messages: Vec<MessageRef> = Vec::new();
    let mut page_token: Option<String> = None;

    while messages.len() < max_results {
        let response = search(query, page_token.as_deref())?;

        let page = match response.messages {
            Some(page) if !page.is_empty() => page,
            _ => break,
        };

        let remaining = max_results - messages.len();
        messages.extend(page.into_iter().take(remaining));
        debug!("Collected {} message reference(s)", messages.len());

        match response.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(messages)
}

/// Run a search and parse every message it returns
///
/// Messages sharing an id collapse into one entry, the later one winning.
pub fn fetch_messages(
    api: &dyn MailApi,
    spec: &SearchSpec,
    format: BodyFormat,
) -> crate::Result<(String, Vec<ParsedMessage>)> {
    let query = spec.to_query()?;
    info!("Searching for {:?} (max {})", query, spec.max_results());

    let refs = page_response(|q, token| api.list_messages(q, token), &query, spec.max_results())?;

    let mut parsed = Vec::with_capacity(refs.len());
    for message_ref in &refs {
        let message = api.get_message(&MessageId::new(&message_ref.id))?;
        parsed.push(parse_message(api, &message, format)?);
    }

    Ok((query, dedupe_by_id(parsed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Calls = RefCell<Vec<Option<String>>>;

    /// Serve `total` refs in pages of `page_size`, with a log for requested tokens
    fn paged_source(
        total: usize,
        page_size: usize,
    ) -> (Calls, impl Fn(Option<&str>) -> ListMessagesResponse) {
        let calls = RefCell::new(Vec::new());
        let serve = move |token: Option<&str>| {
            let start: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (start + page_size).min(total);
            ListMessagesResponse {
                messages: Some(
                    (start..end)
                        .map(|i| MessageRef::new(format!("m{}", i)))
                        .collect(),
                ),
                next_page_token: (end < total).then(|| end.to_string()),
                result_size_estimate: None,
            }
        };
        (calls, serve)
    }

    #[test]
    fn test_cap_stops_paging() {
        let (calls, serve) = paged_source(5, 2);
        let refs = page_response(
            |_, token| {
                calls.borrow_mut().push(token.map(str::to_string));
                Ok(serve(token))
            },
            "q",
            3,
        )
        .unwrap();

        assert_eq!(refs.len(), 3);
        assert_eq!(calls.borrow().len(), 2);
        let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_no_request_after_tokenless_page() {
        let (calls, serve) = paged_source(5, 2);
        let refs = page_response(
            |_, token| {
                calls.borrow_mut().push(token.map(str::to_string));
                Ok(serve(token))
            },
            "q",
            500,
        )
        .unwrap();

        assert_eq!(refs.len(), 5);
        assert_eq!(
            *calls.borrow(),
            vec![None, Some("2".to_string()), Some("4".to_string())]
        );
    }

    #[test]
    fn test_empty_result() {
        let refs = page_response(|_, _| Ok(ListMessagesResponse::default()), "q", 10).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_error_propagates_immediately() {
        let mut calls = 0;
        let result = page_response(
            |_, _| {
                calls += 1;
                anyhow::bail!("HTTP 500")
            },
            "q",
            10,
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_query_passed_through() {
        let mut seen = Vec::new();
        page_response(
            |q, _| {
                seen.push(q.to_string());
                Ok(ListMessagesResponse::default())
            },
            "from:a@x.com",
            1,
        )
        .unwrap();
        assert_eq!(seen, vec!["from:a@x.com".to_string()]);
    }
}
