//! Running per-item rating totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::clock::{stamp, LocalClock};
use crate::store::{self, decode_all, DocRef, DocumentStore, StoreResult, ITEM_RATINGS};

pub mod handlers;

/// `itemRatings/{item}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRating {
    pub item_name: String,
    pub total_ratings: u32,
    pub rating_sum: u32,
    pub average_rating: f64,
    #[serde(with = "stamp")]
    pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub total_ratings: u32,
    pub average_rating: f64,
    pub rating_sum: u32,
}

impl From<&ItemRating> for RatingSummary {
    fn from(r: &ItemRating) -> Self {
        Self {
            total_ratings: r.total_ratings,
            average_rating: r.average_rating,
            rating_sum: r.rating_sum,
        }
    }
}

/// Folds one rating into the item's aggregate. Ratings outside 1..=5 are ignored.
pub async fn update_item_rating(
    store: &dyn DocumentStore,
    clock: &LocalClock,
    item: &str,
    rating: u8,
) -> StoreResult<()> {
    if !(1..=5).contains(&rating) {
        return Ok(());
    }
    let doc = DocRef::new(ITEM_RATINGS, item);
    let mut tx = store.begin().await?;
    let current: Option<ItemRating> = store::load_tx(tx.as_mut(), &doc).await?;
    let (total, sum) = match current {
        Some(r) => (r.total_ratings + 1, r.rating_sum + u32::from(rating)),
        None => (1, u32::from(rating)),
    };
    let next = ItemRating {
        item_name: item.to_string(),
        total_ratings: total,
        rating_sum: sum,
        average_rating: f64::from(sum) / f64::from(total),
        last_updated: clock.now_utc(),
    };
    store::save_tx(tx.as_mut(), &doc, &next).await?;
    tx.commit().await?;
    debug!(item, rating, total, "rating recorded");
    Ok(())
}

pub async fn get_item_ratings(store: &dyn DocumentStore) -> StoreResult<BTreeMap<String, RatingSummary>> {
    let docs = store.query(ITEM_RATINGS, None, None).await?;
    let ratings: Vec<ItemRating> = decode_all(docs)?;
    Ok(ratings
        .iter()
        .map(|r| (r.item_name.clone(), RatingSummary::from(r)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::{date, offset};

    use crate::clock::ManualTime;
    use crate::store::memory::MemoryStore;

    fn clock() -> LocalClock {
        LocalClock::with_source(
            Arc::new(ManualTime::local(date!(2025 - 01 - 16), 12, offset!(+3))),
            offset!(+3),
        )
    }

    async fn rate_all(ratings: &[u8]) -> RatingSummary {
        let store = MemoryStore::new();
        let clock = clock();
        for r in ratings {
            update_item_rating(&store, &clock, "Latte", *r).await.unwrap();
        }
        get_item_ratings(&store).await.unwrap().remove("Latte").unwrap()
    }

    #[tokio::test]
    async fn aggregates_sum_count_and_mean() {
        let summary = rate_all(&[3, 5, 4]).await;
        assert_eq!(
            summary,
            RatingSummary {
                total_ratings: 3,
                average_rating: 4.0,
                rating_sum: 12,
            }
        );
    }

    #[tokio::test]
    async fn order_of_ratings_does_not_matter() {
        let expected = rate_all(&[3, 5, 4, 1]).await;
        for perm in [[1, 4, 5, 3], [5, 3, 1, 4], [4, 1, 3, 5]] {
            assert_eq!(rate_all(&perm).await, expected);
        }
    }

    #[tokio::test]
    async fn out_of_range_is_ignored() {
        let store = MemoryStore::new();
        let clock = clock();
        update_item_rating(&store, &clock, "Tea", 0).await.unwrap();
        update_item_rating(&store, &clock, "Tea", 6).await.unwrap();
        assert!(get_item_ratings(&store).await.unwrap().is_empty());
    }
}
