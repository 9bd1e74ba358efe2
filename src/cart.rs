//! Cart line management: merge-on-duplicate adds, ownership-checked
//! mutations, and bag reads.
//!
//! Mutations are serialized through a single async mutex so the add path's
//! existence check and subsequent write are atomic with respect to other
//! requests for the same (user, product) pair. The unique index on
//! `cart_lines (user_id, product_id)` backstops the same invariant at the
//! storage layer. Reads take no lock; a line added mid-aggregation may or may
//! not appear, which is acceptable for a single read.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::bag;
use crate::error::{CommerceError, Result};
use crate::models::{BagView, CartLine, LineView};
use crate::store::{CartStore, CatalogStore, RecordStore};

#[derive(Clone)]
pub struct CartManager {
    store: Arc<dyn RecordStore>,
    delivery_fee: Decimal,
    write_gate: Arc<Mutex<()>>,
}

impl CartManager {
    pub fn new(store: Arc<dyn RecordStore>, delivery_fee: Decimal) -> Self {
        Self {
            store,
            delivery_fee,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Adds a product to the user's bag. If a line for (user, product)
    /// already exists the quantities are merged into it; a second line is
    /// never created. Returns the resulting line with freshly computed
    /// amounts.
    pub async fn add_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<LineView> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity);
        }
        let _gate = self.write_gate.lock().await;

        self.store
            .get_product(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound)?;

        let line = match self.store.find_line(user_id, product_id).await? {
            Some(mut existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CommerceError::InvalidQuantity)?;
                existing.updated_at = Utc::now();
                self.store.update_line(&existing).await?;
                tracing::debug!(line_id = %existing.id, quantity = existing.quantity, "merged bag line");
                existing
            }
            None => {
                let line = CartLine::new(user_id, product_id, quantity);
                self.store.insert_line(&line).await?;
                tracing::debug!(line_id = %line.id, "created bag line");
                line
            }
        };

        bag::line_view(self.store.as_ref(), &line).await
    }

    /// Sets a line's quantity. Quantities below 1 are rejected; removal is a
    /// separate, explicit operation.
    pub async fn update_line(
        &self,
        line_id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> Result<LineView> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity);
        }
        let _gate = self.write_gate.lock().await;

        let mut line = self.owned_line(line_id, user_id).await?;
        line.quantity = quantity;
        line.updated_at = Utc::now();
        self.store.update_line(&line).await?;

        bag::line_view(self.store.as_ref(), &line).await
    }

    pub async fn remove_line(&self, line_id: Uuid, user_id: Uuid) -> Result<()> {
        let _gate = self.write_gate.lock().await;

        let line = self.owned_line(line_id, user_id).await?;
        self.store.delete_line(line.id).await?;
        Ok(())
    }

    pub async fn list_lines(&self, user_id: Uuid) -> Result<Vec<LineView>> {
        Ok(self.bag_details(user_id).await?.items)
    }

    pub async fn bag_details(&self, user_id: Uuid) -> Result<BagView> {
        bag::build_bag_view(self.store.as_ref(), user_id, self.delivery_fee).await
    }

    /// Existence check, then ownership check. Both run before any write so a
    /// failed mutation leaves the line untouched.
    async fn owned_line(&self, line_id: Uuid, user_id: Uuid) -> Result<CartLine> {
        let line = self
            .store
            .get_line(line_id)
            .await?
            .ok_or(CommerceError::LineNotFound)?;
        if line.user_id != user_id {
            return Err(CommerceError::Forbidden);
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::store::{CartStore, CatalogStore, MemStore};

    fn manager() -> (CartManager, Arc<MemStore>) {
        let store = Arc::new(MemStore::new());
        let manager = CartManager::new(store.clone(), Decimal::ZERO);
        (manager, store)
    }

    async fn seed_product(store: &MemStore, price: i64, discount: Option<i64>) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            brand: "Aster".into(),
            name: "Denim Jacket".into(),
            description: Some("Mid-wash".into()),
            price: Decimal::new(price, 0),
            discount_price: discount.map(|d| Decimal::new(d, 0)),
            category: "jackets".into(),
            image_url: "/static/images/jacket.jpg".into(),
            rating: 4.2,
            created_at: now,
            updated_at: now,
        };
        store.insert_product(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn duplicate_adds_merge_into_one_line() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 100, Some(80)).await;

        let first = manager.add_line(user, product.id, 2).await.unwrap();
        assert_eq!(first.item_total, Decimal::new(160, 0));
        assert_eq!(first.item_mrp, Decimal::new(200, 0));

        let merged = manager.add_line(user, product.id, 3).await.unwrap();
        assert_eq!(merged.id, first.id);
        assert_eq!(merged.quantity, 5);
        assert_eq!(merged.item_total, Decimal::new(400, 0));
        assert_eq!(merged.item_mrp, Decimal::new(500, 0));

        let lines = store.lines_for_user(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn bag_totals_for_discounted_product() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 100, Some(80)).await;

        manager.add_line(user, product.id, 2).await.unwrap();
        manager.add_line(user, product.id, 3).await.unwrap();

        let bag = manager.bag_details(user).await.unwrap();
        assert_eq!(bag.items.len(), 1);
        assert_eq!(bag.total_mrp, Decimal::new(500, 0));
        assert_eq!(bag.total_amount, Decimal::new(400, 0));
        assert_eq!(bag.total_discount, Decimal::new(100, 0));
        assert_eq!(bag.delivery_fee, Decimal::ZERO);
        assert_eq!(bag.final_total, Decimal::new(400, 0));
    }

    #[tokio::test]
    async fn add_rejects_unknown_product_and_bad_quantity() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();

        let err = manager.add_line(user, Uuid::now_v7(), 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductNotFound));

        let product = seed_product(&store, 50, None).await;
        let err = manager.add_line(user, product.id, 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity));
        assert!(store.lines_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_that_would_overflow_is_rejected() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 10, None).await;
        manager.add_line(user, product.id, i32::MAX).await.unwrap();

        let err = manager.add_line(user, product.id, 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity));

        let lines = store.lines_for_user(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn update_to_zero_is_rejected_and_leaves_quantity() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 100, Some(80)).await;
        let line = manager.add_line(user, product.id, 5).await.unwrap();

        let err = manager.update_line(line.id, user, 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity));

        let stored = store.get_line(line.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 5);
    }

    #[tokio::test]
    async fn update_sets_quantity_and_recomputes() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 60, None).await;
        let line = manager.add_line(user, product.id, 1).await.unwrap();

        let updated = manager.update_line(line.id, user, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.item_total, Decimal::new(240, 0));
        assert_eq!(updated.item_mrp, Decimal::new(240, 0));
        assert_eq!(store.get_line(line.id).await.unwrap().unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn other_users_cannot_touch_a_line() {
        let (manager, store) = manager();
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        let product = seed_product(&store, 100, None).await;
        let line = manager.add_line(owner, product.id, 2).await.unwrap();

        let err = manager.update_line(line.id, intruder, 9).await.unwrap_err();
        assert!(matches!(err, CommerceError::Forbidden));
        let err = manager.remove_line(line.id, intruder).await.unwrap_err();
        assert!(matches!(err, CommerceError::Forbidden));

        let stored = store.get_line(line.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
    }

    #[tokio::test]
    async fn remove_deletes_the_line() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let product = seed_product(&store, 100, None).await;
        let line = manager.add_line(user, product.id, 1).await.unwrap();

        manager.remove_line(line.id, user).await.unwrap();
        assert!(store.get_line(line.id).await.unwrap().is_none());

        let err = manager.remove_line(line.id, user).await.unwrap_err();
        assert!(matches!(err, CommerceError::LineNotFound));
    }

    #[tokio::test]
    async fn list_lines_is_empty_for_new_user() {
        let (manager, _store) = manager();
        let lines = manager.list_lines(Uuid::now_v7()).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn lines_keep_insertion_order() {
        let (manager, store) = manager();
        let user = Uuid::now_v7();
        let first = seed_product(&store, 10, None).await;
        let second = seed_product(&store, 20, None).await;

        manager.add_line(user, first.id, 1).await.unwrap();
        manager.add_line(user, second.id, 1).await.unwrap();
        // Merging into the first line must not reorder it.
        manager.add_line(user, first.id, 1).await.unwrap();

        let bag = manager.bag_details(user).await.unwrap();
        assert_eq!(bag.items[0].product_id, first.id);
        assert_eq!(bag.items[1].product_id, second.id);
    }
}
