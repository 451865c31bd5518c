//! Hit encoding: default context + event parameters → one query string.

use crate::hit::Hit;
use crate::types::{CustomDimensions, DefaultContext, QueryItem, QueryItems};
use crate::Error;
use url::form_urlencoded;

/// Encode one hit.
///
/// Parameters are written in order: the default context, then the event
/// payload, then the custom dimensions if any. Items without a value are
/// skipped.
///
/// Uses `application/x-www-form-urlencoded` escaping, so a space becomes `+`
/// rather than `%20`.
pub fn encode_hit(
    context: &DefaultContext,
    payload: &dyn QueryItems,
    custom: Option<&CustomDimensions>,
) -> Result<Hit, Error> {
    let mut items = context.query_items();
    items.extend(payload.query_items());
    if let Some(custom) = custom {
        items.extend(custom.query_items());
    }

    encode_items(items)
}

fn encode_items(items: Vec<QueryItem>) -> Result<Hit, Error> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut written = 0usize;

    for item in items {
        let Some(value) = item.value else {
            continue;
        };
        if item.name.is_empty() {
            return Err(Error::Encoding(format!(
                "parameter with value {:?} has no name",
                value
            )));
        }
        serializer.append_pair(&item.name, &value);
        written += 1;
    }

    if written == 0 {
        return Err(Error::Encoding("no parameters to encode".into()));
    }

    Ok(Hit::new(serializer.finish()))
}
