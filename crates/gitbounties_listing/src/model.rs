use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RecordError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BountyStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: Option<String>,
    pub token_address: Option<String>,
    /// Raw token amount, as emitted by the indexer
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignees {
    #[serde(default)]
    pub nodes: Vec<Assignee>,
}

/// A GitHub issue merged with its on-chain bounty data.
///
/// Fields the listing consults may be missing when an upstream lookup failed;
/// accessors report that as a [`RecordError`] instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyRecord {
    pub id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub owner: Option<String>,
    pub repo_name: Option<String>,
    pub labels: Option<Vec<Tag>>,
    pub languages: Option<Vec<Tag>>,
    pub status: Option<BountyStatus>,
    pub deposits: Option<Vec<Deposit>>,
    pub assignees: Option<Assignees>,
    #[serde(default, deserialize_with = "mint_time")]
    pub bounty_mint_time: u64,
    pub url: Option<String>,
    pub bounty_address: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::offset::Utc>>,
}

impl BountyRecord {
    /// Title and body joined, the haystack for free text search
    pub fn text(&self) -> String {
        let mut text = self.title.clone().unwrap_or_default();
        text.push_str(self.body.as_deref().unwrap_or_default());
        text
    }

    pub fn labels(&self) -> Result<&[Tag], RecordError> {
        self.labels
            .as_deref()
            .ok_or_else(|| RecordError::missing(&self.id, "labels"))
    }

    pub fn languages(&self) -> Result<&[Tag], RecordError> {
        self.languages
            .as_deref()
            .ok_or_else(|| RecordError::missing(&self.id, "languages"))
    }

    pub fn status(&self) -> Result<BountyStatus, RecordError> {
        self.status
            .ok_or_else(|| RecordError::missing(&self.id, "status"))
    }

    pub fn deposits(&self) -> Result<&[Deposit], RecordError> {
        self.deposits
            .as_deref()
            .ok_or_else(|| RecordError::missing(&self.id, "deposits"))
    }

    /// Only records with a url can be linked to from the list
    pub fn is_displayable(&self) -> bool {
        self.url.as_deref().map_or(false, |url| !url.is_empty())
    }

    pub fn is_funded(&self) -> Result<bool, RecordError> {
        Ok(!self.deposits()?.is_empty())
    }

    pub fn is_unclaimed(&self) -> Result<bool, RecordError> {
        Ok(self.status()? == BountyStatus::Open)
    }

    pub fn is_assigned(&self) -> bool {
        self.assignees
            .as_ref()
            .map_or(false, |assignees| !assignees.nodes.is_empty())
    }
}

/// The indexer reports mint time as a decimal string, fixtures usually as a number
fn mint_time<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn direction(self) -> FetchDirection {
        match self {
            SortOrder::Newest => FetchDirection::Desc,
            SortOrder::Oldest => FetchDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchDirection {
    Asc,
    #[default]
    Desc,
}

impl FetchDirection {
    pub fn sort_order(self) -> SortOrder {
        match self {
            FetchDirection::Desc => SortOrder::Newest,
            FetchDirection::Asc => SortOrder::Oldest,
        }
    }
}

impl fmt::Display for FetchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchDirection::Asc => write!(f, "asc"),
            FetchDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Selected tags, unique by value and kept in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        TagSet::default()
    }

    /// Returns false if the tag was already selected
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Everything the filter stage looks at, always fully populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search_text: String,
    pub tags: TagSet,
    pub funded_only: bool,
    pub unclaimed_only: bool,
    pub unassigned_only: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            search_text: String::new(),
            tags: TagSet::new(),
            funded_only: true,
            unclaimed_only: true,
            unassigned_only: true,
        }
    }
}

impl FilterCriteria {
    /// Criteria that let every displayable record through
    pub fn show_all() -> Self {
        FilterCriteria {
            funded_only: false,
            unclaimed_only: false,
            unassigned_only: false,
            ..FilterCriteria::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_time_accepts_string_and_number() {
        let from_str: BountyRecord =
            serde_json::from_str(r#"{"id":"a","bountyMintTime":"1650000000"}"#).unwrap();
        let from_num: BountyRecord =
            serde_json::from_str(r#"{"id":"b","bountyMintTime":1650000000}"#).unwrap();

        assert_eq!(from_str.bounty_mint_time, 1650000000);
        assert_eq!(from_num.bounty_mint_time, 1650000000);
    }

    #[test]
    fn parses_indexer_shape() {
        let raw = r#"{
            "id": "I_1",
            "title": "fix bug",
            "body": "it crashes",
            "repoName": "testing",
            "owner": "MrPicklePinosaur",
            "labels": [{"name": "bug"}],
            "languages": [{"name": "Rust"}],
            "status": "OPEN",
            "deposits": [{"id": "d1", "tokenAddress": "0xabc", "value": "100"}],
            "assignees": {"nodes": []},
            "bountyMintTime": "100",
            "url": "https://github.com/gitbounties/testing/issues/1",
            "createdAt": "2022-04-01T12:00:00Z"
        }"#;
        let record: BountyRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.status, Some(BountyStatus::Open));
        assert_eq!(record.text(), "fix bugit crashes");
        assert!(record.is_funded().unwrap());
        assert!(!record.is_assigned());
        assert!(record.is_displayable());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn missing_fields_are_reported() {
        let record = BountyRecord {
            id: "broken".into(),
            ..Default::default()
        };

        assert_eq!(
            record.deposits().unwrap_err(),
            RecordError::MissingField {
                id: "broken".into(),
                field: "deposits"
            }
        );
        assert!(!record.is_displayable());
        assert!(!record.is_assigned());
        assert_eq!(record.text(), "");
    }

    #[test]
    fn tag_set_keeps_insertion_order_and_uniqueness() {
        let mut tags = TagSet::new();
        assert!(tags.insert("rust"));
        assert!(tags.insert("bug"));
        assert!(!tags.insert("rust"));

        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["rust", "bug"]);
        assert!(tags.remove("rust"));
        assert!(!tags.remove("rust"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn default_criteria_has_facets_on() {
        let criteria = FilterCriteria::default();
        assert!(criteria.funded_only && criteria.unclaimed_only && criteria.unassigned_only);
        assert!(criteria.search_text.is_empty() && criteria.tags.is_empty());
    }

    #[test]
    fn criteria_use_camel_case_keys() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"searchText":"rust","tags":["bug"],"fundedOnly":false,"unclaimedOnly":true,"unassignedOnly":true}"#,
        )
        .unwrap();
        assert_eq!(criteria.search_text, "rust");
        assert!(criteria.tags.contains("bug"));
        assert!(!criteria.funded_only);

        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["unassignedOnly"], true);
    }

    #[test]
    fn sort_order_maps_to_direction() {
        assert_eq!(SortOrder::Newest.direction(), FetchDirection::Desc);
        assert_eq!(SortOrder::Oldest.direction(), FetchDirection::Asc);
        assert_eq!(FetchDirection::Asc.sort_order(), SortOrder::Oldest);
        assert_eq!(FetchDirection::Desc.to_string(), "desc");
    }
}
