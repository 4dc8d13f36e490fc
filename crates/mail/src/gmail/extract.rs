//! Message extraction
//!
//! Flattens a Gmail message into a [`ParsedMessage`]: header fields from
//! the top-level header list, a plaintext body, and attachment payloads.
//!
//! The part tree is walked depth-first with an explicit stack. Children of
//! a multipart container are pushed in order and popped in reverse, and
//! every plain-text part overwrites the body found before it, so the
//! body comes from the last plain-text part popped.

use anyhow::Result;
use base64::prelude::*;
use log::debug;

use super::MailApi;
use super::api::{GmailMessage, Header, MessagePart};
use crate::models::{Attachments, MessageId, ParsedMessage};

/// How a decoded plain-text body is post-processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFormat {
    /// Keep the decoded text as is
    Plain,
    /// Run the decoded text through an HTML-to-text converter
    #[default]
    HtmlToText,
}

impl BodyFormat {
    fn render(self, text: String) -> String {
        match self {
            BodyFormat::Plain => text,
            BodyFormat::HtmlToText => nanohtml2text::html2text(&text),
        }
    }
}

/// Body and attachments pulled out of a part tree
#[derive(Debug, Default)]
pub struct ExtractedFields {
    pub body: Option<String>,
    pub attachments: Attachments,
}

/// Header fields read from a message, before the id fallback is applied
#[derive(Debug, Default, PartialEq, Eq)]
struct HeaderFields {
    recipient: Option<String>,
    sender: Option<String>,
    subject: Option<String>,
    date: Option<String>,
    id: Option<String>,
}

/// Parse a full Gmail message into a [`ParsedMessage`]
pub fn parse_message(
    api: &dyn MailApi,
    message: &GmailMessage,
    format: BodyFormat,
) -> Result<ParsedMessage> {
    let empty = MessagePart::default();
    let payload = message.payload.as_ref().unwrap_or(&empty);
    let headers = payload.headers.as_deref().unwrap_or_default();

    let fields = read_headers(headers);
    let extracted = extract_fields(api, &MessageId::new(&message.id), payload, format)?;

    let id = fields
        .id
        .unwrap_or_else(|| ParsedMessage::placeholder_id(fields.date.as_deref()));

    Ok(ParsedMessage {
        id,
        sender: fields.sender,
        recipient: fields.recipient,
        subject: fields.subject,
        date: fields.date,
        body: extracted.body,
        attachments: extracted.attachments,
    })
}

/// Walk the part tree collecting the body and attachments
///
/// Attachments that are not inline are fetched through `api` using the
/// Gmail message id. A part whose payload is missing or empty is skipped.
pub fn extract_fields(
    api: &dyn MailApi,
    message_id: &MessageId,
    root: &MessagePart,
    format: BodyFormat,
) -> Result<ExtractedFields> {
    let mut out = ExtractedFields::default();
    let mut stack = vec![root];

    while let Some(part) = stack.pop() {
        let mime_type = part.mime_type.as_deref().unwrap_or_default();

        if mime_type.contains("multipart") {
            if let Some(children) = &part.parts {
                stack.extend(children.iter());
            }
            continue;
        }

        let Some(body) = &part.body else {
            continue;
        };

        if let Some(attachment_id) = &body.attachment_id {
            let data = match &body.data {
                Some(data) => Some(data.clone()),
                None => {
                    debug!(
                        "Fetching attachment {} of {}",
                        attachment_id,
                        message_id.as_str()
                    );
                    api.get_attachment(message_id, attachment_id)?.data
                }
            };

            if let Some(bytes) = data
                .as_deref()
                .filter(|d| !d.is_empty())
                .and_then(decode_base64)
            {
                let filename = part.filename.clone().unwrap_or_default();
                out.attachments.insert(filename, bytes);
            }
        } else if mime_type == "text/plain"
            && let Some(data) = body.data.as_deref().filter(|d| !d.is_empty())
            && let Some(bytes) = decode_base64(data)
        {
            let charset = part_charset(part);
            out.body = Some(format.render(decode_text(&bytes, charset.as_deref())));
        }
    }

    Ok(out)
}

/// Extract a header value by name (last occurrence wins)
pub fn extract_header(headers: &[Header], name: &str) -> Option<String> {
    headers
        .iter()
        .rev()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

fn read_headers(headers: &[Header]) -> HeaderFields {
    HeaderFields {
        recipient: extract_header(headers, "Delivered-To"),
        sender: extract_header(headers, "From"),
        subject: extract_header(headers, "Subject"),
        date: extract_header(headers, "Date"),
        id: extract_header(headers, "Message-ID"),
    }
}

/// Decode base64 body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
pub fn decode_base64(data: &str) -> Option<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders.iter().find_map(|decoder| decoder.decode(data).ok())
}

/// `charset` parameter of the part's Content-Type header
fn part_charset(part: &MessagePart) -> Option<String> {
    let headers = part.headers.as_deref()?;
    let content_type = extract_header(headers, "Content-Type")?;
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Turn decoded part bytes into text with normalized line endings.
///
/// Bytes are read in `charset`; UTF-8 is assumed when it is absent or unknown.
fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let text = match charset.and_then(|c| encoding_rs::Encoding::for_label(c.as_bytes())) {
        Some(encoding) if encoding != encoding_rs::UTF_8 => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    text.replace("\r\n", "\n")
}
