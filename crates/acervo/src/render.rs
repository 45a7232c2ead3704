use std::io::Write;

use anyhow::Result;
use pagination::{DiscoveryReport, DisplayState, GalleryController, PaginationState};
use serde::Serialize;
use tainacan::{cards_for_page, Card};

#[derive(Debug, Serialize)]
struct GalleryView<'a> {
    state: PaginationState,
    display: &'a DisplayState,
    cards: Vec<Card>,
}

pub fn write_gallery<W: Write>(
    out: &mut W,
    controller: &GalleryController,
    as_json: bool,
) -> Result<()> {
    let view = GalleryView {
        state: controller.state(),
        display: controller.display(),
        cards: controller.page().map(cards_for_page).unwrap_or_default(),
    };
    if as_json {
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    match view.display {
        DisplayState::Loading => writeln!(out, "Loading...")?,
        DisplayState::Empty => writeln!(out, "No items in this collection.")?,
        DisplayState::Error(message) => {
            writeln!(out, "Error: {message}")?;
            writeln!(out, "Retry with `r` (browse) or run the command again.")?;
        }
        DisplayState::Items => {
            if view.cards.is_empty() {
                writeln!(out, "No images on this page.")?;
            }
            for card in &view.cards {
                writeln!(out, "[{}] {}", card.key, card.caption)?;
                writeln!(out, "    {}", card.image_url)?;
                writeln!(out, "    alt: {}", card.alt_text)?;
            }
        }
    }
    writeln!(out, "{}", page_footer(&view.state))?;
    Ok(())
}

/// `Page N of M` plus the available moves.
pub fn page_footer(state: &PaginationState) -> String {
    let mut moves = Vec::new();
    if state.has_prev {
        moves.push("p: previous");
    }
    if state.has_next {
        moves.push("n: next");
    }
    let total = if state.discovery_complete || !state.has_next {
        state.total_pages.to_string()
    } else {
        format!("{}+", state.total_pages)
    };
    if moves.is_empty() {
        format!("Page {} of {}", state.current_page, total)
    } else {
        format!("Page {} of {}  ({})", state.current_page, total, moves.join(", "))
    }
}

pub fn write_discovery<W: Write>(
    out: &mut W,
    report: &DiscoveryReport,
    page_size: u32,
    as_json: bool,
) -> Result<()> {
    if as_json {
        let value = serde_json::json!({
            "totalPages": report.total_pages,
            "lastValidPage": report.last_valid_page,
            "probes": report.probes,
            "pageSize": page_size,
        });
        writeln!(out, "{value}")?;
    } else {
        writeln!(
            out,
            "about {} pages of {} items ({} probes)",
            report.total_pages, page_size, report.probes
        )?;
    }
    Ok(())
}
