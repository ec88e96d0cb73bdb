//! Where bounty pages come from

use std::path::Path;

use anyhow::Context;
use gitbounties_listing::{BountyRecord, FetchDirection, Page, PageRequest};
use log::{debug, info, warn};
use serde_json::Value;

pub trait PageSource {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page>;
}

/// Read each item on its own, so one bad bounty doesn't take the rest of the
/// page down with it. Returns the readable records and how many were dropped.
fn read_records(items: Vec<Value>, origin: &str) -> (Vec<BountyRecord>, usize) {
    let total = items.len();
    let records: Vec<BountyRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping unreadable bounty #{i} from {origin}: {err}");
                None
            },
        })
        .collect();
    let skipped = total - records.len();

    (records, skipped)
}

/// Bounties held in memory, typically loaded from a json fixture
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<BountyRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<BountyRecord>) -> Self {
        MemorySource { records }
    }

    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Couldn't read fixture {}", path.display()))?;
        let items: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed fixture {}", path.display()))?;
        let (records, _) = read_records(items, &path.display().to_string());

        info!("Loaded {} bounties from {}", records.len(), path.display());

        Ok(MemorySource::new(records))
    }
}

impl PageSource for MemorySource {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page> {
        let mut sorted: Vec<&BountyRecord> = self.records.iter().collect();
        match request.direction {
            FetchDirection::Asc => sorted.sort_by_key(|r| r.bounty_mint_time),
            FetchDirection::Desc => {
                sorted.sort_by(|a, b| b.bounty_mint_time.cmp(&a.bounty_mint_time))
            },
        }

        let records: Vec<BountyRecord> = sorted
            .into_iter()
            .skip(request.skip)
            .take(request.first)
            .cloned()
            .collect();
        let complete = request.skip + records.len() >= self.records.len();

        Ok(Page {
            records,
            complete,
            skipped: 0,
        })
    }
}

/// Bounty feed served over http, paged with the indexer's `first`/`skip`/`orderDirection`
#[derive(Debug, Clone)]
pub struct RemoteSource {
    reqwest: reqwest::Client,
    url: String,
}

impl RemoteSource {
    pub fn new(reqwest: reqwest::Client, url: impl Into<String>) -> Self {
        RemoteSource {
            reqwest,
            url: url.into(),
        }
    }
}

impl PageSource for RemoteSource {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page> {
        let res = self
            .reqwest
            .get(&self.url)
            .header("User-Agent", "GitBounties")
            .header("Accept", "application/json")
            .query(&[
                ("first", request.first.to_string()),
                ("skip", request.skip.to_string()),
                ("orderDirection", request.direction.to_string()),
            ])
            .send()
            .await
            .context("Couldn't reach bounty feed")?
            .error_for_status()?;

        let items = res
            .json::<Vec<Value>>()
            .await
            .context("Malformed bounty feed response")?;
        let (records, skipped) = read_records(items, &self.url);

        debug!("Fetched {} bounties from {} ({skipped} skipped)", records.len(), self.url);

        // a short page tells the pagination it reached the end
        Ok(Page {
            records,
            complete: false,
            skipped,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Source {
    Memory(MemorySource),
    Remote(RemoteSource),
}

impl PageSource for Source {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page> {
        match self {
            Source::Memory(source) => source.fetch_page(request).await,
            Source::Remote(source) => source.fetch_page(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minted(id: &str, time: u64) -> BountyRecord {
        BountyRecord {
            id: id.into(),
            bounty_mint_time: time,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn memory_source_pages_in_direction() {
        let source = MemorySource::new(vec![minted("a", 200), minted("b", 100), minted("c", 300)]);

        let page = source
            .fetch_page(PageRequest {
                direction: FetchDirection::Desc,
                skip: 0,
                first: 2,
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!(!page.complete);

        let page = source
            .fetch_page(PageRequest {
                direction: FetchDirection::Asc,
                skip: 2,
                first: 2,
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
        assert!(page.complete);
    }

    #[tokio::test]
    async fn loads_bundled_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("bounties.json");
        let source = MemorySource::from_file(&path).await.unwrap();

        let page = source
            .fetch_page(PageRequest {
                direction: FetchDirection::Desc,
                skip: 0,
                first: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.records.len(), 4);
        assert_eq!(page.records[0].id, "I_kwDOJ4");
        assert!(page.complete);
    }

    #[test]
    fn bad_item_is_skipped_not_the_page() {
        let items: Vec<Value> = serde_json::from_str(
            r#"[
                {"id": "a", "bountyMintTime": "1650000000"},
                {"id": "b", "bountyMintTime": null},
                {"title": "no id"},
                {"id": "c", "bountyMintTime": 1650000001}
            ]"#,
        )
        .unwrap();

        let (records, skipped) = read_records(items, "test");
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(skipped, 2);
    }

    #[tokio::test]
    async fn fixture_with_bad_item_still_loads() {
        let path = std::env::temp_dir().join(format!(
            "gitbounties-explorer-{}.json",
            std::process::id()
        ));
        tokio::fs::write(
            &path,
            r#"[{"id": "a", "bountyMintTime": 2}, {"id": "b", "bountyMintTime": [1]}]"#,
        )
        .await
        .unwrap();

        let source = MemorySource::from_file(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let page = source
            .fetch_page(PageRequest {
                direction: FetchDirection::Asc,
                skip: 0,
                first: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "a");
        assert!(page.complete);
    }

    #[tokio::test]
    async fn missing_fixture_is_an_error() {
        let err = MemorySource::from_file(Path::new("does/not/exist.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
