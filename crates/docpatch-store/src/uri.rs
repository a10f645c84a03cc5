//! Document URIs.
//!
//! A document URI names a document, an optional key path inside it and an
//! optional historical revision:
//!
//! ```text
//! doc://ignored-authority/<docId>/<seg>/<seg>?history=N&label=text
//! snapshot:/<docId>
//! ```
//!
//! Strings in any other scheme are simply not document URIs.

use crate::config::StoreConfig;
use crate::error::UriError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::trace;

/// The parts of a parsed document URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUriDetails {
    pub doc_id: String,
    /// Canonical URI of the whole document, without key path or query.
    pub doc_url: String,
    pub key_path: Vec<String>,
    /// Revision index; `None` means the live document.
    pub history: Option<usize>,
    /// Display-only label.
    pub label: Option<String>,
}

impl DocumentUriDetails {
    pub fn is_historical(&self) -> bool {
        self.history.is_some()
    }

    /// Same document and query, different key path.
    pub fn with_key_path(&self, key_path: Vec<String>) -> Self {
        Self {
            key_path,
            ..self.clone()
        }
    }

    /// Render back into a URI string in the document scheme.
    pub fn to_uri(&self) -> String {
        let mut uri = self.doc_url.clone();
        for segment in &self.key_path {
            uri.push('/');
            uri.push_str(&urlencoding::encode(segment));
        }

        let mut query = Vec::new();
        if let Some(history) = self.history {
            query.push(format!("history={}", history));
        }
        if let Some(label) = &self.label {
            query.push(format!("label={}", urlencoding::encode(label)));
        }
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.join("&"));
        }
        uri
    }
}

impl std::fmt::Display for DocumentUriDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

/// A document URI found inside free text. Offsets are in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    pub start: usize,
    pub end: usize,
    pub uri: String,
}

/// Parses document URIs for one pair of schemes.
#[derive(Clone, Debug)]
pub struct UriResolver {
    document_scheme: String,
    snapshot_scheme: String,
    link_pattern: Regex,
}

/// `scheme:/seg/seg` runs in free text, for any scheme.
fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<scheme>[A-Za-z][A-Za-z0-9+.-]*):(?:/[A-Za-z0-9_.]+)+").unwrap()
    })
}

impl UriResolver {
    pub fn new(document_scheme: impl Into<String>, snapshot_scheme: impl Into<String>) -> Self {
        Self {
            document_scheme: document_scheme.into(),
            snapshot_scheme: snapshot_scheme.into(),
            link_pattern: link_pattern().clone(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.document_scheme, &config.snapshot_scheme)
    }

    pub fn document_scheme(&self) -> &str {
        &self.document_scheme
    }

    pub fn snapshot_scheme(&self) -> &str {
        &self.snapshot_scheme
    }

    /// Canonical URI of a whole document.
    pub fn document_url(&self, doc_id: &str) -> String {
        format!("{}:/{}", self.document_scheme, urlencoding::encode(doc_id))
    }

    /// Parse `uri`, reporting why it is not a document URI.
    pub fn parse(&self, uri: &str) -> Result<DocumentUriDetails, UriError> {
        let (scheme, rest) = uri
            .split_once(':')
            .filter(|(scheme, _)| !scheme.is_empty())
            .ok_or_else(|| UriError::MissingScheme(uri.to_string()))?;

        let is_document = scheme.eq_ignore_ascii_case(&self.document_scheme);
        let is_snapshot = scheme.eq_ignore_ascii_case(&self.snapshot_scheme);
        if !is_document && !is_snapshot {
            return Err(UriError::UnknownScheme(scheme.to_string()));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let (hierarchy, query) = match rest.split_once('?') {
            Some((hierarchy, query)) => (hierarchy, Some(query)),
            None => (rest, None),
        };

        // The authority, when present, carries no meaning.
        let path = match hierarchy.strip_prefix("//") {
            Some(after) => after.find('/').map_or("", |i| &after[i..]),
            None => hierarchy,
        };
        let path = path.strip_prefix('/').unwrap_or(path);

        let mut segments = path
            .split('/')
            .map(|segment| decode_component(segment, uri))
            .collect::<Result<Vec<_>, _>>()?;
        if segments.len() > 1 && segments.last().is_some_and(String::is_empty) {
            segments.pop();
        }

        let mut segments = segments.into_iter();
        let doc_id = segments
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UriError::MissingDocumentId(uri.to_string()))?;
        let doc_url = self.document_url(&doc_id);

        if is_snapshot {
            return Ok(DocumentUriDetails {
                doc_id,
                doc_url,
                key_path: Vec::new(),
                history: None,
                label: None,
            });
        }

        let (history, label) = match query {
            Some(query) => parse_query(query, uri)?,
            None => (None, None),
        };

        Ok(DocumentUriDetails {
            doc_id,
            doc_url,
            key_path: segments.collect(),
            history,
            label,
        })
    }

    /// Parse `uri`, or `None` when it is not a document URI.
    pub fn interpret(&self, uri: &str) -> Option<DocumentUriDetails> {
        match self.parse(uri) {
            Ok(details) => Some(details),
            Err(err) => {
                trace!(uri, error = %err, "not a document URI");
                None
            }
        }
    }

    /// Find every `scheme:/seg/seg` run of the document scheme in `text`.
    pub fn find_document_links(&self, text: &str) -> Vec<DocumentLink> {
        self.link_pattern
            .captures_iter(text)
            .filter(|caps| {
                caps.name("scheme")
                    .is_some_and(|scheme| scheme.as_str().eq_ignore_ascii_case(&self.document_scheme))
            })
            .filter_map(|caps| caps.get(0))
            .map(|m| DocumentLink {
                start: m.start(),
                end: m.end(),
                uri: m.as_str().to_string(),
            })
            .collect()
    }
}

impl Default for UriResolver {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

fn parse_query(query: &str, uri: &str) -> Result<(Option<usize>, Option<String>), UriError> {
    let mut history = None;
    let mut label = None;

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            // Only a whole decimal number selects a revision, and 0 is the
            // initial revision. Anything else reads the live document.
            "history" => history = decode_component(value, uri)?.trim().parse().ok(),
            "label" => label = Some(decode_component(value, uri)?),
            _ => {}
        }
    }

    Ok((history, label))
}

fn decode_component(input: &str, uri: &str) -> Result<String, UriError> {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UriError::InvalidEscape(uri.to_string()))
}
