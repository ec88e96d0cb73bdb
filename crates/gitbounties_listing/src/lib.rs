//! Bounty list logic for GitBounties: which bounties to show, in what order,
//! and when to load more of them.

pub mod error;
pub mod filter;
pub mod model;
pub mod order;
pub mod pagination;
pub mod trigger;
pub mod view;

pub use error::{RecordError, StalePage, UnknownFacet};
pub use filter::{filter, matches};
pub use model::{
    Assignee, Assignees, BountyRecord, BountyStatus, Deposit, FetchDirection, FilterCriteria,
    SortOrder, Tag, TagSet,
};
pub use order::{order, OrderOutcome};
pub use pagination::{FetchTicket, Page, PageOutcome, PageRequest, Pagination, DEFAULT_PAGE_SIZE};
pub use trigger::{Intersection, ObserverOptions, ScrollTrigger, TriggerState};
pub use view::{BountyListView, Facet, SearchMode, ViewSnapshot};
