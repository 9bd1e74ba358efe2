//! Bag aggregation: folding a user's cart lines into a consistent view.
//!
//! Views are rebuilt from live `CartLine` and `Product` data on every call
//! and never cached, so totals always reflect current catalog pricing.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{CommerceError, Result};
use crate::models::{BagView, CartLine, LineView};
use crate::pricing;
use crate::store::{CartStore, CatalogStore, RecordStore};

/// Resolves one line's product and computes its amounts.
///
/// A line whose product has been deleted since it was added yields
/// [`CommerceError::DanglingReference`] naming the offending line. Skipping
/// it instead would silently misstate what the user owes.
pub async fn line_view(store: &dyn RecordStore, line: &CartLine) -> Result<LineView> {
    let product = store
        .get_product(line.product_id)
        .await?
        .ok_or(CommerceError::DanglingReference {
            line_id: line.id,
            product_id: line.product_id,
        })?;

    let (item_total, item_mrp) =
        pricing::line_amounts(product.price, product.discount_price, line.quantity);

    Ok(LineView {
        id: line.id,
        product_id: line.product_id,
        quantity: line.quantity,
        product_name: product.name,
        product_brand: product.brand,
        product_image_url: product.image_url,
        product_price: product.price,
        product_discount_price: product.discount_price,
        item_total,
        item_mrp,
    })
}

/// Builds the full bag view for a user.
///
/// Lines come back from the store in creation order, so repeated reads of
/// unchanged state produce identical views. An empty bag is a valid bag with
/// all totals zero, not an error.
pub async fn build_bag_view(
    store: &dyn RecordStore,
    user_id: Uuid,
    delivery_fee: Decimal,
) -> Result<BagView> {
    let lines = store.lines_for_user(user_id).await?;

    let mut items = Vec::with_capacity(lines.len());
    let mut total_mrp = Decimal::ZERO;
    let mut total_amount = Decimal::ZERO;

    for line in &lines {
        let view = line_view(store, line).await?;
        total_mrp += view.item_mrp;
        total_amount += view.item_total;
        items.push(view);
    }

    let total_discount = total_mrp - total_amount;
    if total_discount.is_sign_negative() && !total_discount.is_zero() {
        // Can only happen if a product row violates discount_price <= price.
        return Err(CommerceError::Invariant(format!(
            "bag discount for user {user_id} is negative ({total_discount})"
        )));
    }

    Ok(BagView {
        user_id,
        items,
        total_mrp,
        total_discount,
        total_amount,
        delivery_fee,
        final_total: total_amount + delivery_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::store::{CartStore, CatalogStore, MemStore};
    use chrono::Utc;

    fn product(price: i64, discount: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            brand: "Aster".into(),
            name: "Linen Shirt".into(),
            description: None,
            price: Decimal::new(price, 0),
            discount_price: discount.map(|d| Decimal::new(d, 0)),
            category: "shirts".into(),
            image_url: "/static/images/shirt.jpg".into(),
            rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn empty_bag_is_all_zeroes() {
        let store = MemStore::new();
        let bag = build_bag_view(&store, Uuid::now_v7(), Decimal::ZERO)
            .await
            .unwrap();
        assert!(bag.items.is_empty());
        assert_eq!(bag.total_mrp, Decimal::ZERO);
        assert_eq!(bag.total_discount, Decimal::ZERO);
        assert_eq!(bag.total_amount, Decimal::ZERO);
        assert_eq!(bag.final_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn totals_are_sums_of_line_amounts() {
        let store = MemStore::new();
        let user = Uuid::now_v7();
        let discounted = product(100, Some(80));
        let plain = product(40, None);
        store.insert_product(&discounted).await.unwrap();
        store.insert_product(&plain).await.unwrap();
        store
            .insert_line(&CartLine::new(user, discounted.id, 2))
            .await
            .unwrap();
        store
            .insert_line(&CartLine::new(user, plain.id, 1))
            .await
            .unwrap();

        let bag = build_bag_view(&store, user, Decimal::ZERO).await.unwrap();
        assert_eq!(bag.items.len(), 2);
        assert_eq!(bag.total_mrp, Decimal::new(240, 0));
        assert_eq!(bag.total_amount, Decimal::new(200, 0));
        assert_eq!(bag.total_discount, Decimal::new(40, 0));
        assert_eq!(bag.final_total, Decimal::new(200, 0));

        let mrp_sum: Decimal = bag.items.iter().map(|i| i.item_mrp).sum();
        let total_sum: Decimal = bag.items.iter().map(|i| i.item_total).sum();
        assert_eq!(bag.total_mrp, mrp_sum);
        assert_eq!(bag.total_amount, total_sum);
    }

    #[tokio::test]
    async fn repeated_reads_agree() {
        let store = MemStore::new();
        let user = Uuid::now_v7();
        let p = product(55, Some(49));
        store.insert_product(&p).await.unwrap();
        store.insert_line(&CartLine::new(user, p.id, 3)).await.unwrap();

        let first = build_bag_view(&store, user, Decimal::ZERO).await.unwrap();
        let second = build_bag_view(&store, user, Decimal::ZERO).await.unwrap();
        assert_eq!(first.total_amount, second.total_amount);
        assert_eq!(first.total_mrp, second.total_mrp);
        assert_eq!(first.items.len(), second.items.len());
        assert_eq!(first.items[0].id, second.items[0].id);
    }

    #[tokio::test]
    async fn deleted_product_aborts_aggregation() {
        let store = MemStore::new();
        let user = Uuid::now_v7();
        let keep = product(30, None);
        let doomed = product(70, None);
        store.insert_product(&keep).await.unwrap();
        store.insert_product(&doomed).await.unwrap();
        store.insert_line(&CartLine::new(user, keep.id, 1)).await.unwrap();
        let dangling = CartLine::new(user, doomed.id, 2);
        store.insert_line(&dangling).await.unwrap();
        store.delete_product(doomed.id).await.unwrap();

        let err = build_bag_view(&store, user, Decimal::ZERO).await.unwrap_err();
        match err {
            CommerceError::DanglingReference { line_id, product_id } => {
                assert_eq!(line_id, dangling.id);
                assert_eq!(product_id, doomed.id);
            }
            other => panic!("expected DanglingReference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn discount_above_price_surfaces_as_invariant_violation() {
        let store = MemStore::new();
        let user = Uuid::now_v7();
        // A row like this can only enter through a backend without the
        // discount_price <= price constraint.
        let corrupt = product(50, Some(80));
        store.insert_product(&corrupt).await.unwrap();
        store
            .insert_line(&CartLine::new(user, corrupt.id, 1))
            .await
            .unwrap();

        let err = build_bag_view(&store, user, Decimal::ZERO).await.unwrap_err();
        assert!(matches!(err, CommerceError::Invariant(_)));
    }

    #[tokio::test]
    async fn delivery_fee_is_added_to_final_total() {
        let store = MemStore::new();
        let user = Uuid::now_v7();
        let p = product(100, None);
        store.insert_product(&p).await.unwrap();
        store.insert_line(&CartLine::new(user, p.id, 1)).await.unwrap();

        let bag = build_bag_view(&store, user, Decimal::new(15, 0)).await.unwrap();
        assert_eq!(bag.total_amount, Decimal::new(100, 0));
        assert_eq!(bag.delivery_fee, Decimal::new(15, 0));
        assert_eq!(bag.final_total, Decimal::new(115, 0));
    }
}
