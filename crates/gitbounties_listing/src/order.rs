use std::sync::Arc;

use log::debug;

use crate::model::{BountyRecord, FetchDirection, SortOrder};

/// What the order stage did with a page of records
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// Already in the requested order, records are returned untouched
    Unchanged(Vec<Arc<BountyRecord>>),
    /// Every page was loaded so the records were sorted locally
    Sorted(Vec<Arc<BountyRecord>>),
    /// Only part of the data is loaded; the caller has to drop the page and
    /// fetch again from the start in `direction`
    Refetch {
        records: Vec<Arc<BountyRecord>>,
        direction: FetchDirection,
    },
}

impl OrderOutcome {
    pub fn records(&self) -> &[Arc<BountyRecord>] {
        match self {
            OrderOutcome::Unchanged(records) | OrderOutcome::Sorted(records) => records,
            OrderOutcome::Refetch { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<Arc<BountyRecord>> {
        match self {
            OrderOutcome::Unchanged(records) | OrderOutcome::Sorted(records) => records,
            OrderOutcome::Refetch { records, .. } => records,
        }
    }
}

/// Order `records` by mint time.
///
/// Sorting a partially loaded list would be wrong since later pages may hold
/// bounties that belong in front, so in that case nothing is sorted and a
/// refetch is requested instead.
pub fn order(
    mut records: Vec<Arc<BountyRecord>>,
    target: SortOrder,
    current: SortOrder,
    complete: bool,
) -> OrderOutcome {
    if target == current {
        return OrderOutcome::Unchanged(records);
    }

    if !complete {
        debug!("Data incomplete, requesting refetch ordered {:?}", target);
        return OrderOutcome::Refetch {
            records,
            direction: target.direction(),
        };
    }

    // sort_by is stable, ties keep their loaded order
    match target {
        SortOrder::Newest => records.sort_by(|a, b| b.bounty_mint_time.cmp(&a.bounty_mint_time)),
        SortOrder::Oldest => records.sort_by(|a, b| a.bounty_mint_time.cmp(&b.bounty_mint_time)),
    }
    OrderOutcome::Sorted(records)
}
