//! The bounty list as a whole: criteria, sort order, loaded pages and the
//! scroll trigger, recombined on every UI event.
//!
//! Events never fetch anything themselves. When one needs data it returns a
//! [`FetchTicket`]; the host runs it and reports back with
//! [`BountyListView::page_arrived`] or [`BountyListView::page_failed`].

use std::{str::FromStr, sync::Arc};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::{StalePage, UnknownFacet},
    filter::filter,
    model::{BountyRecord, FetchDirection, FilterCriteria, SortOrder},
    order::{order, OrderOutcome},
    pagination::{FetchTicket, Page, Pagination},
    trigger::{Intersection, ObserverOptions, ScrollTrigger, TriggerState},
};

/// Whether typed text searches bounties or names a tag to add
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    #[default]
    Search,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Funded,
    Unclaimed,
    Unassigned,
}

impl FromStr for Facet {
    type Err = UnknownFacet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funded" => Ok(Facet::Funded),
            "unclaimed" => Ok(Facet::Unclaimed),
            "unassigned" => Ok(Facet::Unassigned),
            other => Err(UnknownFacet(other.to_owned())),
        }
    }
}

/// What a client needs to draw the list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub bounties: Vec<Arc<BountyRecord>>,
    pub criteria: FilterCriteria,
    pub sort_order: SortOrder,
    pub search_mode: SearchMode,
    pub tag_input: String,
    pub loading: bool,
    pub complete: bool,
    pub processed: bool,
    pub trigger: TriggerState,
}

#[derive(Debug, Clone)]
pub struct BountyListView {
    criteria: FilterCriteria,
    sort_order: SortOrder,
    search_mode: SearchMode,
    tag_input: String,
    pagination: Pagination,
    trigger: ScrollTrigger,
    displayed: Vec<Arc<BountyRecord>>,
    processed: bool,
}

impl Default for BountyListView {
    fn default() -> Self {
        BountyListView::new(Pagination::default(), ObserverOptions::default())
    }
}

impl BountyListView {
    pub fn new(pagination: Pagination, options: ObserverOptions) -> Self {
        BountyListView {
            criteria: FilterCriteria::default(),
            sort_order: SortOrder::default(),
            search_mode: SearchMode::default(),
            tag_input: String::new(),
            pagination,
            trigger: ScrollTrigger::new(options),
            displayed: vec![],
            processed: false,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn tag_input(&self) -> &str {
        &self.tag_input
    }

    pub fn displayed(&self) -> &[Arc<BountyRecord>] {
        &self.displayed
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.trigger.state()
    }

    pub fn processed(&self) -> bool {
        self.processed
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            bounties: self.displayed.clone(),
            criteria: self.criteria.clone(),
            sort_order: self.sort_order,
            search_mode: self.search_mode,
            tag_input: self.tag_input.clone(),
            loading: self.pagination.loading(),
            complete: self.pagination.complete(),
            processed: self.processed,
            trigger: self.trigger.state(),
        }
    }

    /// Fetch the first page
    pub fn load(&mut self) -> Option<FetchTicket> {
        self.pagination.get_more_data(self.sort_order.direction())
    }

    /// Recompute the displayed list from everything loaded so far.
    ///
    /// If nothing matches yet and more pages exist, asks for the next one rather
    /// than showing an empty list.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        let filtered = filter(self.pagination.records(), &self.criteria);
        let fetched_order = self.pagination.direction().sort_order();

        match order(
            filtered,
            self.sort_order,
            fetched_order,
            self.pagination.complete(),
        ) {
            OrderOutcome::Refetch { direction, .. } => return Some(self.restart(direction)),
            outcome => self.displayed = outcome.into_records(),
        }
        self.processed = true;

        if self.displayed.is_empty() && !self.pagination.complete() {
            debug!("No bounties match in loaded pages, fetching more");
            return self.pagination.get_more_data(self.sort_order.direction());
        }
        None
    }

    /// Drop what is loaded and query again from the start
    fn restart(&mut self, direction: FetchDirection) -> FetchTicket {
        self.displayed.clear();
        self.processed = false;
        self.trigger.reset();
        self.pagination.get_new_data(direction)
    }

    /// Typed text. In tag mode it is only held until [`Self::add_tag`].
    pub fn set_search_text(&mut self, text: &str) -> Option<FetchTicket> {
        match self.search_mode {
            SearchMode::Search => {
                self.criteria.search_text = text.to_owned();
                self.refresh()
            },
            SearchMode::Tags => {
                self.tag_input = text.to_owned();
                None
            },
        }
    }

    /// Add `tag`, or the pending tag input when `tag` is empty
    pub fn add_tag(&mut self, tag: &str) -> Option<FetchTicket> {
        let pending = std::mem::take(&mut self.tag_input);
        let tag = if tag.trim().is_empty() { pending.trim() } else { tag.trim() };

        if tag.is_empty() || !self.criteria.tags.insert(tag) {
            return None;
        }
        info!("Filtering by tag {tag}");
        self.refresh()
    }

    pub fn remove_tag(&mut self, tag: &str) -> Option<FetchTicket> {
        if !self.criteria.tags.remove(tag) {
            return None;
        }
        self.refresh()
    }

    /// Switching modes starts over with no text and no tags
    pub fn set_search_mode(&mut self, mode: SearchMode) -> Option<FetchTicket> {
        if mode == self.search_mode {
            return None;
        }
        self.search_mode = mode;
        self.tag_input.clear();
        self.criteria.search_text.clear();
        self.criteria.tags.clear();
        self.refresh()
    }

    pub fn toggle_facet(&mut self, facet: Facet) -> Option<FetchTicket> {
        let flag = match facet {
            Facet::Funded => &mut self.criteria.funded_only,
            Facet::Unclaimed => &mut self.criteria.unclaimed_only,
            Facet::Unassigned => &mut self.criteria.unassigned_only,
        };
        *flag = !*flag;
        debug!("Toggled {:?} facet to {}", facet, *flag);
        self.refresh()
    }

    /// Replace the criteria wholesale
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> Option<FetchTicket> {
        self.criteria = criteria;
        self.refresh()
    }

    /// Sort toggle. Supersedes any fetch in flight when a refetch is needed.
    pub fn sort(&mut self, target: SortOrder) -> Option<FetchTicket> {
        if target == self.sort_order {
            return None;
        }

        let displayed = std::mem::take(&mut self.displayed);
        let outcome = order(
            displayed,
            target,
            self.sort_order,
            self.pagination.complete(),
        );
        self.sort_order = target;

        match outcome {
            OrderOutcome::Refetch { direction, .. } => Some(self.restart(direction)),
            outcome => {
                self.displayed = outcome.into_records();
                None
            },
        }
    }

    /// Sentinel visibility report from the client
    pub fn sentinel_visible(&mut self, intersection: &Intersection) -> Option<FetchTicket> {
        if !self.processed || self.pagination.loading() || self.pagination.complete() {
            return None;
        }

        let direction = self.trigger.on_visible(intersection, self.sort_order)?;
        let ticket = self.pagination.get_more_data(direction);
        if ticket.is_none() {
            self.trigger.on_fetch_failed();
        }
        ticket
    }

    /// A page came back for `ticket`. May ask for yet another page.
    pub fn page_arrived(
        &mut self,
        ticket: &FetchTicket,
        page: Page,
    ) -> Result<Option<FetchTicket>, StalePage> {
        let outcome = self.pagination.apply(ticket, page)?;

        self.trigger.on_page_arrived(!outcome.complete);
        Ok(self.refresh())
    }

    pub fn page_failed(&mut self, ticket: &FetchTicket) -> Result<(), StalePage> {
        self.pagination.fail(ticket)?;
        self.trigger.on_fetch_failed();
        Ok(())
    }
}
