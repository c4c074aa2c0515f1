//! VISA resource regular expression matching
//!
//! The query syntax used for discovery is the one defined by the VISA
//! library specification, not the host regex syntax: `?` matches any
//! single character, `*`/`+` repeat the preceding expression,
//! character classes and alternation work as usual. Matching is
//! case-insensitive and anchored at the start of the resource name.

use regex::Regex;
use tracing::warn;

use openvisa_core::{Error, Result, StatusCode};

/// Filter resource names according to a VISA query expression.
///
/// An optional attribute clause in braces (`?*::INSTR{VI_ATTR_...}`)
/// is stripped and ignored with a warning; evaluating it would require
/// opening each resource.
///
/// # Errors
/// Returns [`Error::Visa`] with `VI_ERROR_INV_EXPR` when the query is
/// not a valid expression.
pub fn filter<'a, I>(resources: I, query: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = match query.split_once('{') {
        Some((head, _)) => {
            warn!(query, "optional part of the query expression not supported");
            head
        }
        None => query,
    };

    // `?` is the VISA single-character wildcard.
    let translated = query.replace('?', ".");

    let matcher = Regex::new(&format!("^(?i:{translated})"))
        .map_err(|_| Error::visa(StatusCode::ErrorInvalidExpression))?;

    Ok(resources
        .into_iter()
        .filter(|name| matcher.is_match(name))
        .map(ToString::to_string)
        .collect())
}
