use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// One page of a collection as returned by a single items request, with the
/// attachments of every item already settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPage {
    pub page_number: u32,
    pub items: Vec<CatalogItem>,
    /// `total_pages` as reported by the API, when it reports one at all.
    pub reported_total_pages: Option<u32>,
}

impl CollectionPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub thumbnail_ref: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl CatalogItem {
    pub fn from_raw(raw: RawItem, attachments: Vec<Attachment>) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            thumbnail_ref: raw.thumbnail_ref,
            attachments,
        }
    }

    pub fn image_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|att| att.is_renderable())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub media_type: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.media_type == "image"
    }

    pub fn is_renderable(&self) -> bool {
        self.is_image() && !self.url.trim().is_empty()
    }
}

/// Body of `GET collection/{id}/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsEnvelope {
    pub items: Vec<RawItem>,
    #[serde(default, deserialize_with = "lenient_page_count")]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(
        default,
        rename = "_thumbnail_id",
        deserialize_with = "lenient_reference"
    )]
    pub thumbnail_ref: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
}

/// WordPress emits ids as numbers on some endpoints and numeric strings on
/// others.
fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Scalar::deserialize(deserializer)? {
        Scalar::Str(raw) => raw.trim().parse::<u64>().ok(),
        Scalar::Num(num) => num.as_u64(),
        Scalar::Bool(_) => None,
    };
    id.ok_or_else(|| de::Error::custom("expected a non-negative integer id"))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Scalar::Bool(_)) => String::new(),
        Some(Scalar::Str(raw)) => raw,
        Some(Scalar::Num(num)) => num.to_string(),
    })
}

fn lenient_reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Scalar::Bool(_)) => None,
        Some(Scalar::Str(raw)) if raw.trim().is_empty() => None,
        Some(Scalar::Str(raw)) => Some(raw),
        Some(Scalar::Num(num)) => Some(num.to_string()),
    })
}

fn lenient_page_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    let count = match value {
        None | Some(Scalar::Bool(_)) => None,
        Some(Scalar::Str(raw)) => raw.trim().parse::<u32>().ok(),
        Some(Scalar::Num(num)) => num.as_u64().and_then(|n| u32::try_from(n).ok()),
    };
    Ok(count.filter(|n| *n > 0))
}
