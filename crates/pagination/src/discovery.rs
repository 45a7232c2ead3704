//! Estimates how many pages a collection has when the API will not say.
//!
//! Probing walks an ascending list of candidate pages until one comes back
//! empty, then binary-searches a fixed window around the last non-empty
//! candidate. A failed probe reads as an empty page, so errors bias the
//! estimate low. The answer is wrong whenever the true last page sits outside
//! the search window (e.g. a gap of more than `window_above` pages between
//! the last non-empty candidate and the next one).
use tainacan::CatalogError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub candidates: Vec<u32>,
    pub window_below: u32,
    pub window_above: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            candidates: galleryconfig::DEFAULT_PROBE_CANDIDATES.to_vec(),
            window_below: 10,
            window_above: 20,
        }
    }
}

impl From<&galleryconfig::DiscoverySettings> for DiscoveryOptions {
    fn from(settings: &galleryconfig::DiscoverySettings) -> Self {
        Self {
            candidates: settings.candidates.clone(),
            window_below: settings.window_below,
            window_above: settings.window_above,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub total_pages: u32,
    /// Last candidate of the probing phase that had content, 0 if none did.
    pub last_valid_page: u32,
    pub probes: u32,
}

pub fn discover_total_pages<P>(options: &DiscoveryOptions, mut probe: P) -> DiscoveryReport
where
    P: FnMut(u32) -> Result<bool, CatalogError>,
{
    let mut probes = 0u32;
    let mut present = |page: u32| {
        probes += 1;
        match probe(page) {
            Ok(found) => found,
            Err(err) => {
                debug!(page, error = %err, "discovery probe failed; treating page as empty");
                false
            }
        }
    };

    let mut last_valid_page = 0;
    for &candidate in &options.candidates {
        if !present(candidate) {
            break;
        }
        last_valid_page = candidate;
    }

    let low = last_valid_page.saturating_sub(options.window_below).max(1);
    let high = last_valid_page.saturating_add(options.window_above);
    let found = search_last_present(low, high, &mut present);

    // A non-empty candidate is still known to exist if the window search
    // never hit a non-empty page (e.g. the collection shrank mid-search).
    let total_pages = found.unwrap_or(last_valid_page).max(1);
    debug!(total_pages, last_valid_page, probes, "page count discovery finished");
    DiscoveryReport {
        total_pages,
        last_valid_page,
        probes,
    }
}

/// Highest page in `1..=high` that still has items, assuming pages are
/// filled from the front. Costs at most `log2(high) + 1` probes; a failed
/// probe counts as an empty page.
pub fn last_page_with_items<P>(high: u32, mut probe: P) -> Option<u32>
where
    P: FnMut(u32) -> Result<bool, CatalogError>,
{
    search_last_present(1, high, &mut |page| {
        probe(page).unwrap_or_else(|err| {
            debug!(page, error = %err, "probe failed; treating page as empty");
            false
        })
    })
}

fn search_last_present<F>(mut low: u32, mut high: u32, present: &mut F) -> Option<u32>
where
    F: FnMut(u32) -> bool,
{
    let mut found = None;
    while low <= high {
        let mid = low + (high - low) / 2;
        if present(mid) {
            found = Some(mid);
            match mid.checked_add(1) {
                Some(next) => low = next,
                None => break,
            }
        } else {
            // `low >= 1`, so `mid >= 1`.
            high = mid - 1;
        }
    }
    found
}
