//! State of the incrementally loaded record set backing the list.
//!
//! Fetching itself happens elsewhere: this only hands out [`FetchTicket`]s and
//! accepts the pages that come back for them.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    error::StalePage,
    model::{BountyRecord, FetchDirection},
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub direction: FetchDirection,
    /// Number of records already consumed from the source
    pub skip: usize,
    /// Page size
    pub first: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<BountyRecord>,
    /// Set by sources that know there is nothing after this page
    pub complete: bool,
    /// Items the source received but couldn't read as bounties
    pub skipped: usize,
}

/// A page request tagged with the generation of the record set it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    pub received: usize,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    records: Vec<Arc<BountyRecord>>,
    loading: bool,
    complete: bool,
    direction: FetchDirection,
    page_size: usize,
    generation: u64,
    /// Source items consumed so far, readable or not
    offset: usize,
    outstanding: Option<PageRequest>,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Pagination {
            records: vec![],
            loading: false,
            complete: false,
            direction: FetchDirection::default(),
            page_size: page_size.max(1),
            generation: 0,
            offset: 0,
            outstanding: None,
        }
    }

    pub fn records(&self) -> &[Arc<BountyRecord>] {
        &self.records
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn complete(&self) -> bool {
        self.complete
    }

    /// Direction the loaded records were fetched in
    pub fn direction(&self) -> FetchDirection {
        self.direction
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request the page after the ones already loaded.
    ///
    /// Returns `None` while a fetch is outstanding or once everything is loaded.
    pub fn get_more_data(&mut self, direction: FetchDirection) -> Option<FetchTicket> {
        if self.loading || self.complete {
            return None;
        }
        if !self.records.is_empty() && direction != self.direction {
            warn!(
                "Ignoring request for more data ordered {direction}, loaded data is ordered {}",
                self.direction
            );
            return None;
        }

        self.direction = direction;
        Some(self.issue(self.offset))
    }

    /// Throw away what is loaded and start over from the first page in `direction`.
    ///
    /// Any outstanding ticket becomes stale.
    pub fn get_new_data(&mut self, direction: FetchDirection) -> FetchTicket {
        self.generation += 1;
        self.records.clear();
        self.offset = 0;
        self.complete = false;
        self.direction = direction;

        debug!("Refetching from start ordered {direction} (generation {})", self.generation);

        self.issue(0)
    }

    fn issue(&mut self, skip: usize) -> FetchTicket {
        let request = PageRequest {
            direction: self.direction,
            skip,
            first: self.page_size,
        };
        self.loading = true;
        self.outstanding = Some(request);

        FetchTicket {
            generation: self.generation,
            request,
        }
    }

    fn check(&self, ticket: &FetchTicket) -> Result<(), StalePage> {
        if ticket.generation == self.generation && self.outstanding == Some(ticket.request) {
            Ok(())
        } else {
            Err(StalePage {
                ticket_generation: ticket.generation,
                current_generation: self.generation,
            })
        }
    }

    /// Append a page fetched for `ticket`
    pub fn apply(&mut self, ticket: &FetchTicket, page: Page) -> Result<PageOutcome, StalePage> {
        self.check(ticket)?;

        let received = page.records.len();
        let consumed = received + page.skipped;
        self.records
            .extend(page.records.into_iter().map(Arc::new));
        self.offset += consumed;
        self.loading = false;
        self.outstanding = None;
        // unreadable items still count towards a full page
        self.complete = page.complete || consumed < ticket.request.first;

        debug!(
            "Loaded {received} bounties ({} total, complete: {})",
            self.records.len(),
            self.complete
        );

        Ok(PageOutcome {
            received,
            complete: self.complete,
        })
    }

    /// The fetch for `ticket` failed; stop loading but keep `complete` as is
    pub fn fail(&mut self, ticket: &FetchTicket) -> Result<(), StalePage> {
        self.check(ticket)?;
        self.loading = false;
        self.outstanding = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, complete: bool) -> Page {
        Page {
            records: (0..n)
                .map(|i| BountyRecord {
                    id: i.to_string(),
                    ..Default::default()
                })
                .collect(),
            complete,
            skipped: 0,
        }
    }

    #[test]
    fn more_data_pages_forward() {
        let mut pagination = Pagination::new(2);

        let first = pagination.get_more_data(FetchDirection::Asc).unwrap();
        assert_eq!(first.request.skip, 0);
        assert_eq!(first.request.first, 2);
        assert!(pagination.loading());

        // only one fetch at a time
        assert!(pagination.get_more_data(FetchDirection::Asc).is_none());

        let outcome = pagination.apply(&first, page(2, false)).unwrap();
        assert_eq!(outcome, PageOutcome { received: 2, complete: false });

        let second = pagination.get_more_data(FetchDirection::Asc).unwrap();
        assert_eq!(second.request.skip, 2);

        let outcome = pagination.apply(&second, page(1, false)).unwrap();
        assert!(outcome.complete);
        assert_eq!(pagination.records().len(), 3);
        assert!(pagination.get_more_data(FetchDirection::Asc).is_none());
    }

    #[test]
    fn new_data_invalidates_outstanding_ticket() {
        let mut pagination = Pagination::new(2);
        let old = pagination.get_more_data(FetchDirection::Desc).unwrap();

        let fresh = pagination.get_new_data(FetchDirection::Asc);
        assert_eq!(fresh.generation, old.generation + 1);
        assert_eq!(pagination.direction(), FetchDirection::Asc);

        let stale = pagination.apply(&old, page(2, false)).unwrap_err();
        assert_eq!(stale.ticket_generation, old.generation);
        assert!(pagination.records().is_empty());
        assert!(pagination.loading());

        pagination.apply(&fresh, page(2, true)).unwrap();
        assert!(pagination.complete());
        assert!(!pagination.loading());
    }

    #[test]
    fn failure_keeps_completion_state() {
        let mut pagination = Pagination::new(2);
        let ticket = pagination.get_more_data(FetchDirection::Desc).unwrap();

        pagination.fail(&ticket).unwrap();
        assert!(!pagination.loading());
        assert!(!pagination.complete());

        // already settled
        assert!(pagination.fail(&ticket).is_err());
        assert!(pagination.get_more_data(FetchDirection::Desc).is_some());
    }

    #[test]
    fn direction_mismatch_is_refused() {
        let mut pagination = Pagination::new(2);
        let ticket = pagination.get_more_data(FetchDirection::Desc).unwrap();
        pagination.apply(&ticket, page(2, false)).unwrap();

        assert!(pagination.get_more_data(FetchDirection::Asc).is_none());
        assert!(!pagination.loading());
    }

    #[test]
    fn skipped_items_advance_the_offset() {
        let mut pagination = Pagination::new(3);
        let first = pagination.get_more_data(FetchDirection::Desc).unwrap();

        let outcome = pagination
            .apply(
                &first,
                Page {
                    skipped: 1,
                    ..page(2, false)
                },
            )
            .unwrap();
        assert_eq!(outcome, PageOutcome { received: 2, complete: false });
        assert_eq!(pagination.records().len(), 2);

        let second = pagination.get_more_data(FetchDirection::Desc).unwrap();
        assert_eq!(second.request.skip, 3);

        pagination.apply(&second, page(1, false)).unwrap();
        assert!(pagination.complete());

        let fresh = pagination.get_new_data(FetchDirection::Asc);
        assert_eq!(fresh.request.skip, 0);
    }
}
