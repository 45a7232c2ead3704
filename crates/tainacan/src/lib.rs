mod card;
mod model;
mod remote;

pub use card::{cards_for_page, Card, FALLBACK_ALT_TEXT};
pub use model::{Attachment, CatalogItem, CollectionPage, ItemsEnvelope, RawItem};
pub use remote::{
    assemble_page, decode_attachments, decode_items, CatalogConfig, CatalogError, TainacanClient,
};
