//! Filter stage of the bounty list.
//!
//! Text, tag and language matching all use the same rule: case-insensitive
//! substring.

use std::sync::Arc;

use log::warn;

use crate::{
    error::RecordError,
    model::{BountyRecord, FilterCriteria, Tag, TagSet},
};

/// Keep the records that satisfy `criteria`, in their original order.
///
/// Records that can't be evaluated are logged and dropped, they never fail the whole pass.
pub fn filter(records: &[Arc<BountyRecord>], criteria: &FilterCriteria) -> Vec<Arc<BountyRecord>> {
    records
        .iter()
        .filter(|record| match matches(record, criteria) {
            Ok(keep) => keep,
            Err(err) => {
                warn!("Excluding bounty from list: {err}");
                false
            },
        })
        .cloned()
        .collect()
}

/// Predicate for a single record
pub fn matches(record: &BountyRecord, criteria: &FilterCriteria) -> Result<bool, RecordError> {
    if !record.is_displayable() {
        return Ok(false);
    }

    Ok(matches_search(record, &criteria.search_text)?
        && matches_tags(record, &criteria.tags)?
        && matches_facets(record, criteria)?)
}

fn matches_search(record: &BountyRecord, search_text: &str) -> Result<bool, RecordError> {
    if search_text.is_empty() {
        return Ok(true);
    }
    let needle = search_text.to_lowercase();

    let provenance = [record.owner.as_deref(), record.repo_name.as_deref()];
    Ok(contains(&record.text(), &needle)
        || provenance
            .into_iter()
            .flatten()
            .any(|field| contains(field, &needle))
        || any_tag(record.labels()?, &needle)
        || any_tag(record.languages()?, &needle))
}

/// Every selected tag has to show up in the labels or the languages
fn matches_tags(record: &BountyRecord, tags: &TagSet) -> Result<bool, RecordError> {
    for tag in tags.iter() {
        let needle = tag.to_lowercase();
        let found =
            any_tag(record.labels()?, &needle) || any_tag(record.languages()?, &needle);
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_facets(record: &BountyRecord, criteria: &FilterCriteria) -> Result<bool, RecordError> {
    if criteria.funded_only && !record.is_funded()? {
        return Ok(false);
    }
    if criteria.unclaimed_only && !record.is_unclaimed()? {
        return Ok(false);
    }
    if criteria.unassigned_only && record.is_assigned() {
        return Ok(false);
    }
    Ok(true)
}

fn any_tag(tags: &[Tag], needle: &str) -> bool {
    tags.iter().any(|tag| contains(&tag.name, needle))
}

/// `needle` must already be lowercase
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
