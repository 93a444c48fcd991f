//! Sound catalog types
//!
//! The catalog is the Sound File Store's own flat ledger of every file it has
//! copied into managed storage, independent of board membership.

use super::ids::CatalogId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audio file in managed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundCatalogEntry {
    pub id: CatalogId,
    /// Display name the sound was added under
    pub name: String,
    pub uri: String,
    pub category: String,
    #[serde(rename = "dateAdded")]
    pub date_added: DateTime<Utc>,
}

/// A page of the catalog, in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub sounds: Vec<SoundCatalogEntry>,
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl CatalogPage {
    /// Slice page `page` (1-based) of `limit` entries out of `all`
    pub fn slice(all: &[SoundCatalogEntry], page: usize, limit: usize) -> Self {
        if page == 0 || limit == 0 {
            return Self {
                sounds: Vec::new(),
                total: all.len(),
                page,
                limit,
                has_more: false,
            };
        }

        let start = (page - 1).saturating_mul(limit).min(all.len());
        let end = page.saturating_mul(limit).min(all.len());

        Self {
            sounds: all[start..end].to_vec(),
            total: all.len(),
            page,
            limit,
            has_more: page.saturating_mul(limit) < all.len(),
        }
    }
}
