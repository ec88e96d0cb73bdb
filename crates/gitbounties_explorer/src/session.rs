use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use gitbounties_listing::{BountyListView, FetchTicket, ObserverOptions, Pagination};
use log::{debug, error, info};
use rand::Rng;
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{source::PageSource, AppState};

/// Open list views, keyed by session id
pub type Sessions = Arc<RwLock<HashMap<String, Session>>>;

/// A client's list view and when the client last used it
#[derive(Debug)]
pub struct Session {
    pub view: BountyListView,
    last_seen: Instant,
}

impl Session {
    pub fn new(view: BountyListView) -> Self {
        Session {
            view,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

/// Drop sessions nobody has used for `ttl`. Returns how many were dropped.
pub fn evict_idle(sessions: &mut HashMap<String, Session>, ttl: Duration, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|id, session| {
        let keep = session.idle_for(now) < ttl;
        if !keep {
            debug!("Session {id} idle for over {}s, closing it", ttl.as_secs());
        }
        keep
    });
    before - sessions.len()
}

/// Periodically close sessions idle for longer than `ttl`
pub fn spawn_sweeper(sessions: Sessions, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let evicted = evict_idle(&mut *sessions.write().await, ttl, Instant::now());
            if evicted > 0 {
                info!("Closed {evicted} idle sessions");
            }
        }
    })
}

pub fn new_session_id() -> String {
    hex::encode(rand::thread_rng().gen::<[u8; 16]>())
}

pub fn new_view(page_size: usize) -> BountyListView {
    BountyListView::new(Pagination::new(page_size), ObserverOptions::default())
}

/// Run `ticket` and any follow up fetch the view asks for.
///
/// The session lock is never held while a page is being fetched. Pages for a
/// session that was closed in the meantime are dropped.
pub async fn run_fetches(state: &AppState, id: &str, mut ticket: Option<FetchTicket>) {
    while let Some(current) = ticket.take() {
        let result = state.source.fetch_page(current.request).await;

        let mut sessions = state.sessions.write().await;
        let Some(Session { view, .. }) = sessions.get_mut(id) else {
            debug!("Session {id} closed before its page arrived, dropping it");
            return;
        };

        ticket = match result {
            Ok(page) => match view.page_arrived(&current, page) {
                Ok(next) => next,
                Err(stale) => {
                    debug!("[session {id}] {stale}");
                    None
                },
            },
            Err(err) => {
                error!("[session {id}] Failed fetching bounties: {err:#}");
                if let Err(stale) = view.page_failed(&current) {
                    debug!("[session {id}] {stale}");
                }
                None
            },
        };
    }
}
