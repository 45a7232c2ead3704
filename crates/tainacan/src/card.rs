//! Gallery cards: one per renderable image attachment of each item.
use serde::Serialize;

use crate::model::CollectionPage;

pub const FALLBACK_ALT_TEXT: &str = "Gallery image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub key: String,
    pub item_id: u64,
    pub attachment_id: u64,
    pub image_url: String,
    pub alt_text: String,
    pub caption: String,
}

pub fn cards_for_page(page: &CollectionPage) -> Vec<Card> {
    page.items
        .iter()
        .flat_map(|item| {
            let caption = if item.title.trim().is_empty() {
                format!("Image {}", item.id)
            } else {
                item.title.clone()
            };
            item.image_attachments().map(move |attachment| {
                let alt_text = attachment
                    .alt_text
                    .as_deref()
                    .filter(|alt| !alt.trim().is_empty())
                    .or_else(|| Some(attachment.title.as_str()).filter(|t| !t.trim().is_empty()))
                    .unwrap_or(FALLBACK_ALT_TEXT)
                    .to_string();
                Card {
                    key: format!("{}-{}", item.id, attachment.id),
                    item_id: item.id,
                    attachment_id: attachment.id,
                    image_url: attachment.url.clone(),
                    alt_text,
                    caption: caption.clone(),
                }
            })
        })
        .collect()
}
