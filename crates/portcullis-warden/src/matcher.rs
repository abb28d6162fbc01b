//! Occurrence matching.
//!
//! An occurrence matches an image when its resource locator, with any
//! leading `https://` or `http://` stripped, is exactly the image
//! reference string. Digest-pinned and tagged references are compared
//! as opaque strings.

use portcullis_ledger::Occurrence;

use crate::subject::ImageRef;

/// Strip one leading URI scheme from a resource locator.
#[must_use]
pub fn strip_scheme(resource_url: &str) -> &str {
    resource_url
        .strip_prefix("https://")
        .or_else(|| resource_url.strip_prefix("http://"))
        .unwrap_or(resource_url)
}

/// Select the occurrences whose resource locator refers to `image`.
///
/// Pure function; preserves the input ordering.
#[must_use]
pub fn matching_occurrences<'a>(
    image: &ImageRef,
    occurrences: &'a [Occurrence],
) -> Vec<&'a Occurrence> {
    occurrences
        .iter()
        .filter(|occ| strip_scheme(&occ.resource_url) == image.as_str())
        .collect()
}
