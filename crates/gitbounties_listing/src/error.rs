use thiserror::Error;

/// A bounty record that could not be evaluated against the filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("bounty {id} is missing field `{field}`")]
    MissingField { id: String, field: &'static str },
}

impl RecordError {
    pub(crate) fn missing(id: &str, field: &'static str) -> Self {
        RecordError::MissingField {
            id: id.to_owned(),
            field,
        }
    }
}

/// A page that arrived for a request that is no longer outstanding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discarding stale page (generation {ticket_generation}, current {current_generation})")]
pub struct StalePage {
    pub ticket_generation: u64,
    pub current_generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown facet `{0}`, expected one of funded, unclaimed, unassigned")]
pub struct UnknownFacet(pub String);
