//! Encoded hits and the batches they travel in.

use crate::Error;
use std::fmt;

/// One percent-encoded event, ready for transmission.
///
/// Produced by [`encode_hit`](crate::encode_hit) or wrapped with
/// [`Hit::from_encoded`]; the string is a query string without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit(String);

impl Hit {
    pub(crate) fn new(encoded: String) -> Self {
        Self(encoded)
    }

    /// Wrap a query string encoded elsewhere.
    ///
    /// Fails on an empty string, a leading `?`, or a line break, which would
    /// split the hit across lines of the batch.
    pub fn from_encoded(encoded: impl Into<String>) -> Result<Self, Error> {
        let encoded = encoded.into();
        if encoded.is_empty() {
            return Err(Error::Encoding("hit is empty".into()));
        }
        if encoded.starts_with('?') {
            return Err(Error::Encoding("hit must not start with '?'".into()));
        }
        if encoded.contains(['\n', '\r']) {
            return Err(Error::Encoding("hit contains a line break".into()));
        }
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Hit> for String {
    fn from(hit: Hit) -> String {
        hit.0
    }
}

/// Request body for one flush: every hit on its own line, newline terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    body: String,
    len: usize,
}

impl Batch {
    /// Join drained hits in order. Returns `None` for an empty drain.
    pub fn from_hits(hits: Vec<Hit>) -> Option<Self> {
        if hits.is_empty() {
            return None;
        }

        let len = hits.len();
        let capacity = hits.iter().map(|h| h.0.len() + 1).sum();
        let mut body = String::with_capacity(capacity);
        for hit in hits {
            body.push_str(&hit.0);
            body.push('\n');
        }

        Some(Self { body, len })
    }

    /// A batch carrying exactly one hit.
    pub fn single(hit: Hit) -> Self {
        let mut body = hit.0;
        body.push('\n');
        Self { body, len: 1 }
    }

    /// Number of hits in the batch.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
