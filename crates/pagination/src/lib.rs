mod controller;
mod discovery;

pub use controller::{
    ApplyOutcome, ControllerOptions, DisplayState, GalleryController, LoadPlan, LoadTicket,
    PageLoad, PaginationState, SettledPage,
};
pub use discovery::{
    discover_total_pages, last_page_with_items, DiscoveryOptions, DiscoveryReport,
};

use tainacan::{CatalogError, CollectionPage, TainacanClient};

/// Where the controller gets its pages from. Page numbers are 1-based and
/// always refer to the gallery's own page size.
pub trait PageSource {
    fn load_page(&self, page: u32) -> Result<CollectionPage, CatalogError>;

    /// Cheap existence check for `page`; never needs the page's attachments.
    fn probe(&self, page: u32) -> Result<bool, CatalogError>;
}

impl PageSource for TainacanClient {
    fn load_page(&self, page: u32) -> Result<CollectionPage, CatalogError> {
        self.fetch_page(page, self.config().page_size)
    }

    fn probe(&self, page: u32) -> Result<bool, CatalogError> {
        TainacanClient::probe(self, page, self.config().page_size)
    }
}

impl<S: PageSource + ?Sized> PageSource for std::sync::Arc<S> {
    fn load_page(&self, page: u32) -> Result<CollectionPage, CatalogError> {
        (**self).load_page(page)
    }

    fn probe(&self, page: u32) -> Result<bool, CatalogError> {
        (**self).probe(page)
    }
}
