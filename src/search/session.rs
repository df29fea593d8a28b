use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};

use super::{PartSummary, ProductDetail, SearchClient, SearchCriteria, SearchPage, SearchRequest};

/// Message posted by a worker thread when a request finishes.
enum SearchEvent {
    Page {
        generation: u64,
        result: Result<SearchPage>,
    },
    Product {
        url: String,
        result: Result<ProductDetail>,
    },
}

/// Progress of the product detail popup.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Idle,
    Loading(String),
    Loaded(ProductDetail),
    Failed(String),
}

/// Paged search state owned by the UI thread. Each new search bumps a
/// generation counter; pages that come back tagged with an older generation
/// are dropped, so a slow request can never overwrite a newer search.
pub struct SearchSession {
    client: Arc<dyn SearchClient>,
    region: String,
    page_size: u32,
    /// Takes effect at the next `start` so one search never mixes page sizes.
    next_page_size: u32,
    criteria: Option<SearchCriteria>,
    generation: u64,
    next_page: u32,
    total_pages: u32,
    results: Vec<PartSummary>,
    loading: bool,
    error: Option<String>,
    detail: DetailState,
    discarded: u64,
    sender: Sender<SearchEvent>,
    receiver: Receiver<SearchEvent>,
}

impl SearchSession {
    pub fn new(client: Arc<dyn SearchClient>, region: &str, page_size: u32) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            client,
            region: region.to_string(),
            page_size: page_size.max(1),
            next_page_size: page_size.max(1),
            criteria: None,
            generation: 0,
            next_page: 1,
            total_pages: 1,
            results: Vec::new(),
            loading: false,
            error: None,
            detail: DetailState::Idle,
            discarded: 0,
            sender,
            receiver,
        }
    }

    /// Begin a search. Repeating the active search is a no-op unless it has
    /// nothing to show yet. Returns whether a request was issued.
    pub fn start(&mut self, criteria: SearchCriteria) -> bool {
        let same = self.criteria.as_ref() == Some(&criteria);
        if same && (self.loading || !self.results.is_empty()) {
            return false;
        }

        self.reset();
        debug!(
            "starting search {} (generation {})",
            criteria.describe(),
            self.generation
        );
        self.criteria = Some(criteria);
        self.load_next_page()
    }

    /// Request the following page unless one is in flight or the last page
    /// has already been loaded.
    pub fn load_next_page(&mut self) -> bool {
        let Some(criteria) = self.criteria.clone() else {
            return false;
        };
        if self.loading || self.next_page > self.total_pages {
            return false;
        }

        let request = SearchRequest {
            criteria,
            page: self.next_page,
            page_size: self.page_size,
            region: self.region.clone(),
        };
        let generation = self.generation;
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        self.loading = true;
        self.error = None;

        thread::spawn(move || {
            let result = client.search(&request);
            // The session may be gone by now; nothing to report to.
            let _ = sender.send(SearchEvent::Page { generation, result });
        });
        true
    }

    /// Fetch extended details for one result in the background.
    pub fn request_detail(&mut self, url: &str) {
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let url = url.to_string();
        self.detail = DetailState::Loading(url.clone());

        thread::spawn(move || {
            let result = client.fetch_product(&url);
            let _ = sender.send(SearchEvent::Product { url, result });
        });
    }

    pub fn close_detail(&mut self) {
        self.detail = DetailState::Idle;
    }

    /// Forget the current search. Anything still in flight becomes stale.
    pub fn clear(&mut self) {
        self.reset();
        self.criteria = None;
    }

    /// Apply every finished request without blocking. Returns how many events
    /// changed visible state.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for the next event, then drain the rest.
    pub fn poll_timeout(&mut self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => usize::from(self.apply(event)) + self.poll(),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn set_region(&mut self, region: &str) {
        if self.region != region {
            self.region = region.to_string();
            self.clear();
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.next_page_size = page_size.max(1);
    }

    pub fn results(&self) -> &[PartSummary] {
        &self.results
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.criteria.is_some() && self.next_page <= self.total_pages
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    /// Pages dropped because a newer search had started.
    pub fn stale_discarded(&self) -> u64 {
        self.discarded
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.page_size = self.next_page_size;
        self.next_page = 1;
        self.total_pages = 1;
        self.results.clear();
        self.loading = false;
        self.error = None;
    }

    fn apply(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::Page { generation, result } => {
                if generation != self.generation {
                    debug!(
                        "discarding stale page (generation {generation}, current {})",
                        self.generation
                    );
                    self.discarded += 1;
                    return false;
                }
                self.loading = false;
                match result {
                    Ok(page) => {
                        self.total_pages = page.total_pages;
                        self.results.extend(page.results);
                        self.next_page += 1;
                    }
                    Err(err) => {
                        warn!("search failed: {err:#}");
                        self.error = Some(format!("Failed to load data: {err}"));
                    }
                }
                true
            }
            SearchEvent::Product { url, result } => {
                if self.detail != DetailState::Loading(url.clone()) {
                    return false;
                }
                self.detail = match result {
                    Ok(detail) => DetailState::Loaded(detail),
                    Err(err) => {
                        warn!("product lookup failed for {url}: {err:#}");
                        DetailState::Failed(format!("Failed to load product: {err}"))
                    }
                };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Serves canned pages; queries starting with "slow" wait before replying.
    struct ScriptedClient {
        total_pages: u32,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl ScriptedClient {
        fn new(total_pages: u32) -> Arc<Self> {
            Arc::new(Self {
                total_pages,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl SearchClient for ScriptedClient {
        fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
            self.requests.lock().unwrap().push(request.clone());
            let label = match &request.criteria {
                SearchCriteria::Query(text) => text.clone(),
                SearchCriteria::Category(key) => key.clone(),
            };
            if label.starts_with("slow") {
                thread::sleep(Duration::from_millis(150));
            }
            if label == "broken" {
                return Err(anyhow!("connection refused"));
            }
            Ok(SearchPage {
                results: vec![PartSummary {
                    name: format!("{label} p{}", request.page),
                    url: format!("https://p/{label}/{}", request.page),
                    price: "$1.00".to_string(),
                    image: None,
                }],
                page: request.page,
                total_pages: self.total_pages,
            })
        }

        fn fetch_product(&self, url: &str) -> Result<ProductDetail> {
            Ok(ProductDetail {
                name: url.to_string(),
                specs: Default::default(),
                price_list: Vec::new(),
                image: None,
                rating: None,
            })
        }
    }

    fn wait_idle(session: &mut SearchSession) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.is_loading() && Instant::now() < deadline {
            session.poll_timeout(Duration::from_millis(50));
        }
        assert!(!session.is_loading(), "search did not finish");
    }

    #[test]
    fn pages_accumulate_until_last() {
        let client = ScriptedClient::new(2);
        let mut session = SearchSession::new(client.clone(), "us", 5);

        assert!(session.start(SearchCriteria::Query("ssd".to_string())));
        assert!(!session.load_next_page(), "second request while loading");
        wait_idle(&mut session);
        assert!(session.has_more());

        assert!(session.load_next_page());
        wait_idle(&mut session);
        assert!(!session.has_more());
        assert!(!session.load_next_page());

        let names: Vec<&str> = session.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ssd p1", "ssd p2"]);
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].region, "us");
        assert_eq!(requests[1].page_size, 5);
    }

    #[test]
    fn page_size_changes_wait_for_next_search() {
        let client = ScriptedClient::new(3);
        let mut session = SearchSession::new(client.clone(), "us", 5);
        session.start(SearchCriteria::Query("hdd".to_string()));
        wait_idle(&mut session);

        session.set_page_size(10);
        assert!(session.load_next_page());
        wait_idle(&mut session);

        session.start(SearchCriteria::Query("nvme".to_string()));
        wait_idle(&mut session);

        let sizes: Vec<u32> = client
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.page_size)
            .collect();
        assert_eq!(sizes, vec![5, 5, 10]);
    }

    #[test]
    fn stale_results_are_discarded() {
        let client = ScriptedClient::new(3);
        let mut session = SearchSession::new(client, "us", 5);

        session.start(SearchCriteria::Query("slow gpu".to_string()));
        session.start(SearchCriteria::Category("cpu".to_string()));

        let deadline = Instant::now() + Duration::from_secs(5);
        while (session.is_loading() || session.stale_discarded() == 0) && Instant::now() < deadline
        {
            session.poll_timeout(Duration::from_millis(50));
        }

        assert_eq!(session.stale_discarded(), 1);
        let names: Vec<&str> = session.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["cpu p1"]);
    }

    #[test]
    fn repeating_a_loaded_search_is_ignored() {
        let client = ScriptedClient::new(1);
        let mut session = SearchSession::new(client.clone(), "us", 5);
        session.start(SearchCriteria::Query("psu".to_string()));
        wait_idle(&mut session);

        assert!(!session.start(SearchCriteria::Query("psu".to_string())));
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn failures_become_a_message() {
        let client = ScriptedClient::new(1);
        let mut session = SearchSession::new(client, "us", 5);
        session.start(SearchCriteria::Query("broken".to_string()));
        wait_idle(&mut session);

        assert!(session.results().is_empty());
        assert_eq!(
            session.error(),
            Some("Failed to load data: connection refused")
        );
        session.clear_error();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn clearing_invalidates_in_flight_work() {
        let client = ScriptedClient::new(1);
        let mut session = SearchSession::new(client, "us", 5);
        session.start(SearchCriteria::Query("slow fan".to_string()));
        session.clear();

        let deadline = Instant::now() + Duration::from_secs(5);
        while session.stale_discarded() == 0 && Instant::now() < deadline {
            session.poll_timeout(Duration::from_millis(50));
        }
        assert!(session.results().is_empty());
        assert!(session.criteria().is_none());
    }

    #[test]
    fn product_detail_loads_in_background() {
        let client = ScriptedClient::new(1);
        let mut session = SearchSession::new(client, "us", 5);
        session.request_detail("https://p/x");
        assert_eq!(
            session.detail(),
            &DetailState::Loading("https://p/x".to_string())
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while matches!(session.detail(), DetailState::Loading(_)) && Instant::now() < deadline {
            session.poll_timeout(Duration::from_millis(50));
        }
        assert!(matches!(session.detail(), DetailState::Loaded(d) if d.name == "https://p/x"));

        session.close_detail();
        assert_eq!(session.detail(), &DetailState::Idle);
    }
}
