//! Pagination state for one gallery session.
//!
//! Navigation is split into three steps so the network part can run on a
//! worker thread while the controller stays on the owning thread:
//!
//! - `GalleryController::begin` bumps the request generation and hands out a
//!   `LoadPlan` for the requested page.
//! - `LoadPlan::execute` performs every request the load needs (the page, the
//!   search back to the last page with items when the requested one is
//!   empty, the has-next probe and, once per session, page-count discovery).
//! - `GalleryController::apply` folds the `PageLoad` into the state unless a
//!   newer navigation has started since, in which case the load is stale.
//!
//! `navigate`, `open`, `next`, `previous` and `reload` chain the three steps
//! on the calling thread.
use serde::Serialize;
use tainacan::{CatalogError, CatalogItem, CollectionPage};
use tracing::{debug, info, warn};

use crate::discovery::{
    discover_total_pages, last_page_with_items, DiscoveryOptions, DiscoveryReport,
};
use crate::PageSource;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub discovery: DiscoveryOptions,
    /// Use the API's `total_pages` instead of probing when it is present.
    pub trust_reported_total: bool,
}

impl From<&galleryconfig::DiscoverySettings> for ControllerOptions {
    fn from(settings: &galleryconfig::DiscoverySettings) -> Self {
        Self {
            discovery: DiscoveryOptions::from(settings),
            trust_reported_total: settings.trust_reported_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub discovery_complete: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            has_next: true,
            has_prev: false,
            discovery_complete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum DisplayState {
    Loading,
    Items,
    Empty,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    page: u32,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone)]
pub struct LoadPlan {
    ticket: LoadTicket,
    discover: bool,
    options: ControllerOptions,
}

#[derive(Debug, Clone)]
pub struct SettledPage {
    pub page: CollectionPage,
    pub has_next: bool,
    pub discovery: Option<DiscoveryReport>,
    /// How many empty pages were skipped on the way back from the request.
    pub steps_back: u32,
}

#[derive(Debug, Clone)]
pub struct PageLoad {
    pub ticket: LoadTicket,
    pub outcome: Result<SettledPage, CatalogError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

impl LoadPlan {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn runs_discovery(&self) -> bool {
        self.discover
    }

    pub fn execute<S: PageSource + ?Sized>(self, source: &S) -> PageLoad {
        let outcome = self.settle(source);
        PageLoad {
            ticket: self.ticket,
            outcome,
        }
    }

    fn settle<S: PageSource + ?Sized>(&self, source: &S) -> Result<SettledPage, CatalogError> {
        let requested = self.ticket.page;
        let mut page = source.load_page(requested)?;
        if page.is_empty() && requested > 1 {
            let fallback = last_page_with_items(requested - 1, |candidate| source.probe(candidate))
                .unwrap_or(1);
            debug!(requested, fallback, "page is empty; stepping back");
            page = source.load_page(fallback)?;
            if page.is_empty() && fallback > 1 {
                // The collection shrank between the search and the load.
                page = source.load_page(1)?;
            }
        }
        let page_number = page.page_number;
        let steps_back = requested.saturating_sub(page_number);

        if page.is_empty() {
            return Ok(SettledPage {
                page,
                has_next: false,
                discovery: None,
                steps_back,
            });
        }

        let has_next = source.probe(page_number + 1).unwrap_or_else(|err| {
            debug!(page = page_number + 1, error = %err, "next-page probe failed; assuming last page");
            false
        });

        let discovery = if self.discover {
            Some(self.estimate_total(source, &page))
        } else {
            None
        };

        Ok(SettledPage {
            page,
            has_next,
            discovery,
            steps_back,
        })
    }

    fn estimate_total<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page: &CollectionPage,
    ) -> DiscoveryReport {
        if self.options.trust_reported_total {
            if let Some(total) = page.reported_total_pages {
                debug!(total, "using page count reported by the API");
                return DiscoveryReport {
                    total_pages: total,
                    last_valid_page: total,
                    probes: 0,
                };
            }
        }
        discover_total_pages(&self.options.discovery, |candidate| source.probe(candidate))
    }
}

#[derive(Debug)]
pub struct GalleryController {
    state: PaginationState,
    display: DisplayState,
    page: Option<CollectionPage>,
    generation: u64,
    /// Generation of the in-flight load that was asked to run discovery.
    discovery_owner: Option<u64>,
    options: ControllerOptions,
}

impl GalleryController {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            state: PaginationState::default(),
            display: DisplayState::Loading,
            page: None,
            generation: 0,
            discovery_owner: None,
            options,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn page(&self) -> Option<&CollectionPage> {
        self.page.as_ref()
    }

    pub fn items(&self) -> &[CatalogItem] {
        self.page.as_ref().map(|page| page.items.as_slice()).unwrap_or(&[])
    }

    pub fn next_page(&self) -> Option<u32> {
        self.state.has_next.then(|| self.state.current_page + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        self.state.has_prev.then(|| self.state.current_page - 1)
    }

    pub fn begin(&mut self, page: u32) -> LoadPlan {
        self.generation += 1;
        self.display = DisplayState::Loading;
        let ticket = LoadTicket {
            generation: self.generation,
            page: page.max(1),
        };
        let discover = !self.state.discovery_complete && self.discovery_owner.is_none();
        if discover {
            self.discovery_owner = Some(ticket.generation);
        }
        debug!(
            page = ticket.page,
            generation = ticket.generation,
            discover,
            "page load started"
        );
        LoadPlan {
            ticket,
            discover,
            options: self.options.clone(),
        }
    }

    pub fn apply(&mut self, load: PageLoad) -> ApplyOutcome {
        let PageLoad { ticket, outcome } = load;
        if self.discovery_owner == Some(ticket.generation) {
            // Whatever happened, the next load may run discovery if this one
            // did not finish it.
            self.discovery_owner = None;
        }
        if ticket.generation != self.generation {
            // Page-count discovery is session-wide, so a superseded load can
            // still settle it.
            if let Ok(SettledPage {
                discovery: Some(report),
                ..
            }) = &outcome
            {
                if !self.state.discovery_complete {
                    self.complete_discovery(report, 1);
                }
            }
            debug!(
                page = ticket.page,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale page load"
            );
            return ApplyOutcome::Stale;
        }

        match outcome {
            Err(err) => {
                warn!(page = ticket.page, error = %err, "page load failed");
                self.page = None;
                self.state.current_page = ticket.page;
                self.state.has_prev = ticket.page > 1;
                self.display = DisplayState::Error(err.to_string());
            }
            Ok(settled) if settled.page.is_empty() => {
                info!("collection has no items");
                self.state.current_page = 1;
                self.state.has_prev = false;
                self.state.has_next = false;
                self.page = Some(settled.page);
                self.display = DisplayState::Empty;
            }
            Ok(settled) => {
                let number = settled.page.page_number;
                let reached = if settled.has_next { number + 1 } else { number };
                self.state.current_page = number;
                self.state.has_prev = number > 1;
                self.state.has_next = settled.has_next;
                match settled.discovery {
                    Some(report) if !self.state.discovery_complete => {
                        self.complete_discovery(&report, reached);
                    }
                    _ => self.state.total_pages = self.state.total_pages.max(reached),
                }
                if settled.steps_back > 0 {
                    info!(
                        requested = ticket.page,
                        settled = number,
                        "requested page was past the end; showing the last page with items"
                    );
                }
                debug!(
                    page = number,
                    items = settled.page.items.len(),
                    total_pages = self.state.total_pages,
                    has_next = self.state.has_next,
                    "page load applied"
                );
                self.page = Some(settled.page);
                self.display = DisplayState::Items;
            }
        }
        ApplyOutcome::Applied
    }

    pub fn navigate<S: PageSource + ?Sized>(&mut self, source: &S, page: u32) -> ApplyOutcome {
        let plan = self.begin(page);
        let load = plan.execute(source);
        self.apply(load)
    }

    pub fn open<S: PageSource + ?Sized>(&mut self, source: &S) -> ApplyOutcome {
        self.navigate(source, 1)
    }

    pub fn reload<S: PageSource + ?Sized>(&mut self, source: &S) -> ApplyOutcome {
        self.navigate(source, self.state.current_page)
    }

    pub fn next<S: PageSource + ?Sized>(&mut self, source: &S) -> Option<ApplyOutcome> {
        let page = self.next_page()?;
        Some(self.navigate(source, page))
    }

    pub fn previous<S: PageSource + ?Sized>(&mut self, source: &S) -> Option<ApplyOutcome> {
        let page = self.previous_page()?;
        Some(self.navigate(source, page))
    }

    fn complete_discovery(&mut self, report: &DiscoveryReport, reached: u32) {
        self.state.total_pages = report.total_pages.max(reached).max(self.state.total_pages);
        self.state.discovery_complete = true;
        info!(
            total_pages = self.state.total_pages,
            probes = report.probes,
            "estimated collection page count"
        );
    }
}
