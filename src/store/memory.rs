//! In-memory store used by tests and for dependency-free local runs.
//!
//! Same contract as the PostgreSQL backend; every operation takes the single
//! store mutex, which also makes the merge and counter operations atomic.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::membership;
use crate::models::{
    ApplicationReview, ApplicationStatus, CartLineEntity, CreateMembershipApplicationEntity,
    CreateOrderEntity, CreateProductEntity, CreateSaleEntity, MembershipApplicationEntity,
    OrderEntity, OrderLineEntity, OrderLineInput, OrderStatus, ProductEntity, SaleEntity,
    UpdateProductEntity,
};

#[derive(Debug, Default)]
struct MemInner {
    products: Vec<ProductEntity>,
    cart_lines: Vec<CartLineEntity>,
    orders: Vec<OrderEntity>,
    order_lines: Vec<OrderLineEntity>,
    applications: Vec<MembershipApplicationEntity>,
    sales: Vec<SaleEntity>,
    member_sequence: i64,
}

#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, MemInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn list_products(&self) -> StoreResult<Vec<ProductEntity>> {
        Ok(self.locked().products.clone())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<ProductEntity>> {
        Ok(self
            .locked()
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    async fn create_product(&self, product: CreateProductEntity) -> StoreResult<ProductEntity> {
        let created = ProductEntity {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image: product.image,
            potency: product.potency,
            effects: product.effects,
            featured: product.featured,
            in_stock: product.in_stock,
            stock: product.stock,
            created_at: Utc::now(),
        };
        self.locked().products.push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProductEntity,
    ) -> StoreResult<ProductEntity> {
        let mut inner = self.locked();
        let product = inner
            .products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(category) = changes.category {
            product.category = category;
        }
        if let Some(image) = changes.image {
            product.image = image;
        }
        if let Some(potency) = changes.potency {
            product.potency = Some(potency);
        }
        if let Some(effects) = changes.effects {
            product.effects = Some(effects);
        }
        if let Some(featured) = changes.featured {
            product.featured = featured;
        }
        if let Some(in_stock) = changes.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }

        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        self.locked().products.retain(|product| product.id != id);
        Ok(())
    }

    async fn clear_products(&self) -> StoreResult<()> {
        self.locked().products.clear();
        Ok(())
    }

    async fn decrement_stock(&self, id: Uuid, quantity: i32) -> StoreResult<ProductEntity> {
        let mut inner = self.locked();
        let product = inner
            .products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or(StoreError::NotFound)?;

        product.stock = (product.stock - quantity).max(0);
        Ok(product.clone())
    }

    async fn cart_lines(&self, user_id: &str) -> StoreResult<Vec<CartLineEntity>> {
        Ok(self
            .locked()
            .cart_lines
            .iter()
            .filter(|line| line.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_cart_line(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartLineEntity> {
        let mut inner = self.locked();

        if let Some(line) = inner
            .cart_lines
            .iter_mut()
            .find(|line| line.user_id == user_id && line.product_id == product_id)
        {
            line.quantity += quantity;
            return Ok(line.clone());
        }

        let line = CartLineEntity {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            product_id,
            quantity,
            created_at: Utc::now(),
        };
        inner.cart_lines.push(line.clone());
        Ok(line)
    }

    async fn set_cart_quantity(
        &self,
        line_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartLineEntity> {
        let mut inner = self.locked();
        let line = inner
            .cart_lines
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(StoreError::NotFound)?;

        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove_cart_line(&self, line_id: Uuid) -> StoreResult<()> {
        self.locked().cart_lines.retain(|line| line.id != line_id);
        Ok(())
    }

    async fn clear_cart(&self, user_id: &str) -> StoreResult<()> {
        self.locked().cart_lines.retain(|line| line.user_id != user_id);
        Ok(())
    }

    async fn create_order(
        &self,
        order: CreateOrderEntity,
        lines: Vec<OrderLineInput>,
    ) -> StoreResult<OrderEntity> {
        let mut inner = self.locked();
        let now = Utc::now();

        let created = OrderEntity {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            payment_method: order.payment_method,
            order_reference: order.order_reference,
            customer_info: order.customer_info,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(created.clone());

        for line in lines {
            inner.order_lines.push(OrderLineEntity {
                id: Uuid::new_v4(),
                order_id: created.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.price,
            });
        }

        Ok(created)
    }

    async fn orders_for(&self, user_id: Option<&str>) -> StoreResult<Vec<OrderEntity>> {
        Ok(self
            .locked()
            .orders
            .iter()
            .filter(|order| order.user_id.as_deref() == user_id)
            .cloned()
            .collect())
    }

    async fn set_order_status_by_reference(
        &self,
        reference: &str,
        status: OrderStatus,
    ) -> StoreResult<OrderEntity> {
        let mut inner = self.locked();
        let order = inner
            .orders
            .iter_mut()
            .find(|order| order.order_reference.as_deref() == Some(reference))
            .ok_or(StoreError::NotFound)?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<OrderEntity>> {
        Ok(self
            .locked()
            .orders
            .iter()
            .filter(|order| statuses.contains(&order.status))
            .cloned()
            .collect())
    }

    async fn create_application(
        &self,
        application: CreateMembershipApplicationEntity,
    ) -> StoreResult<MembershipApplicationEntity> {
        let now = Utc::now();
        let created = MembershipApplicationEntity {
            id: Uuid::new_v4(),
            first_name: application.first_name,
            last_name: application.last_name,
            email: application.email,
            phone: application.phone,
            date_of_birth: application.date_of_birth,
            id_number: application.id_number,
            address: application.address,
            emergency_contact: application.emergency_contact,
            emergency_phone: application.emergency_phone,
            medical_conditions: application.medical_conditions,
            preferred_products: application.preferred_products,
            id_document_url: application.id_document_url,
            profile_picture_url: application.profile_picture_url,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
            reviewed_at: None,
            reviewed_by: None,
            notes: None,
            member_number: None,
            membership_tier: None,
            member_since: None,
            expiry_date: None,
            card_payload: None,
            card_generated: false,
        };
        self.locked().applications.push(created.clone());
        Ok(created)
    }

    async fn list_applications(&self) -> StoreResult<Vec<MembershipApplicationEntity>> {
        Ok(self.locked().applications.clone())
    }

    async fn get_application(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<MembershipApplicationEntity>> {
        Ok(self
            .locked()
            .applications
            .iter()
            .find(|application| application.id == id)
            .cloned())
    }

    async fn review_application(
        &self,
        id: Uuid,
        review: ApplicationReview,
    ) -> StoreResult<MembershipApplicationEntity> {
        let mut inner = self.locked();
        let now = Utc::now();

        let position = inner
            .applications
            .iter()
            .position(|application| application.id == id)
            .ok_or(StoreError::NotFound)?;

        let issue_card = review.status == Some(ApplicationStatus::Approved)
            && inner.applications[position].status != ApplicationStatus::Approved;

        let issued = if issue_card {
            inner.member_sequence += 1;
            Some(membership::issue(inner.member_sequence, now))
        } else {
            None
        };

        let application = &mut inner.applications[position];
        if let Some(status) = review.status {
            application.status = status;
        }
        if let Some(reviewed_by) = review.reviewed_by {
            application.reviewed_by = Some(reviewed_by);
        }
        if let Some(notes) = review.notes {
            application.notes = Some(notes);
        }
        application.reviewed_at = Some(now);
        application.updated_at = now;

        if let Some(issued) = issued {
            application.member_number = Some(issued.member_number);
            application.membership_tier = Some(membership::MEMBERSHIP_TIER.to_string());
            application.member_since = Some(issued.member_since);
            application.expiry_date = Some(issued.expiry_date);
            application.card_payload = Some(issued.card_payload);
            application.card_generated = true;
        }

        Ok(application.clone())
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<()> {
        self.locked()
            .applications
            .retain(|application| application.id != id);
        Ok(())
    }

    async fn find_member(&self, query: &str) -> StoreResult<Option<MembershipApplicationEntity>> {
        let normalized = query.to_lowercase();
        Ok(self
            .locked()
            .applications
            .iter()
            .find(|application| {
                application.status == ApplicationStatus::Approved
                    && (application.member_number.as_deref() == Some(query)
                        || application.email.to_lowercase() == normalized)
            })
            .cloned())
    }

    async fn verify_member(
        &self,
        member_number: &str,
    ) -> StoreResult<Option<MembershipApplicationEntity>> {
        Ok(self
            .locked()
            .applications
            .iter()
            .find(|application| {
                application.status == ApplicationStatus::Approved
                    && application.member_number.as_deref() == Some(member_number)
            })
            .cloned())
    }

    async fn create_sale(&self, sale: CreateSaleEntity) -> StoreResult<SaleEntity> {
        let created = SaleEntity {
            id: Uuid::new_v4(),
            total: sale.total,
            customer_name: sale.customer_name,
            payment_method: sale.payment_method,
            items: sale.items,
            sold_at: sale.sold_at,
            created_at: Utc::now(),
        };
        self.locked().sales.push(created.clone());
        Ok(created)
    }

    async fn sales_today(&self) -> StoreResult<Vec<SaleEntity>> {
        let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        Ok(self
            .locked()
            .sales
            .iter()
            .filter(|sale| sale.sold_at >= start && sale.sold_at < end)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn product(stock: i32) -> CreateProductEntity {
        CreateProductEntity {
            name: "Golden Teacher".to_string(),
            description: "Classic cultivar".to_string(),
            price: Decimal::new(12_50, 2),
            category: "dried".to_string(),
            image: "/images/golden-teacher.jpg".to_string(),
            potency: Some("moderate".to_string()),
            effects: Some(vec!["calm".to_string()]),
            featured: false,
            in_stock: true,
            stock,
        }
    }

    fn application(email: &str) -> CreateMembershipApplicationEntity {
        CreateMembershipApplicationEntity {
            first_name: "Thandi".to_string(),
            last_name: "Nkosi".to_string(),
            email: email.to_string(),
            phone: "+27 82 000 0000".to_string(),
            date_of_birth: "1990-04-12".to_string(),
            id_number: "9004125800087".to_string(),
            address: None,
            emergency_contact: None,
            emergency_phone: None,
            medical_conditions: None,
            preferred_products: None,
            id_document_url: None,
            profile_picture_url: None,
        }
    }

    fn approval() -> ApplicationReview {
        ApplicationReview {
            status: Some(ApplicationStatus::Approved),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn adding_same_product_twice_merges_into_one_line() {
        let store = MemStore::new();
        let product_id = Uuid::new_v4();

        store.add_cart_line("user-1", product_id, 2).await.unwrap();
        let merged = store.add_cart_line("user-1", product_id, 3).await.unwrap();

        assert_eq!(merged.quantity, 5);
        assert_eq!(store.cart_lines("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cart_lines_are_scoped_per_identity() {
        let store = MemStore::new();
        let product_id = Uuid::new_v4();

        store.add_cart_line("user-1", product_id, 1).await.unwrap();
        store.add_cart_line("user-2", product_id, 4).await.unwrap();

        assert_eq!(store.cart_lines("user-1").await.unwrap()[0].quantity, 1);
        assert_eq!(store.cart_lines("user-2").await.unwrap()[0].quantity, 4);
    }

    #[tokio::test]
    async fn updating_an_unknown_cart_line_is_not_found() {
        let store = MemStore::new();
        let result = store.set_cart_quantity(Uuid::new_v4(), 2).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn stock_decrement_clamps_at_zero() {
        let store = MemStore::new();
        let created = store.create_product(product(3)).await.unwrap();

        let updated = store.decrement_stock(created.id, 5).await.unwrap();

        assert_eq!(updated.stock, 0);
    }

    #[tokio::test]
    async fn decrementing_a_missing_product_is_not_found() {
        let store = MemStore::new();
        let result = store.decrement_stock(Uuid::new_v4(), 1).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn third_approval_gets_sequence_003() {
        let store = MemStore::new();
        let mut last = None;
        for i in 0..3 {
            let created = store
                .create_application(application(&format!("member{i}@example.com")))
                .await
                .unwrap();
            last = Some(store.review_application(created.id, approval()).await.unwrap());
        }

        let approved = last.unwrap();
        let year = Utc::now().year();
        assert_eq!(approved.member_number.as_deref(), Some(&*format!("MS-{year}-003")));
        assert_eq!(approved.membership_tier.as_deref(), Some("GOLD"));
        assert!(approved.card_generated);

        let member_since = approved.member_since.unwrap();
        let expiry = approved.expiry_date.unwrap();
        assert_eq!(expiry - member_since, Duration::days(180));
    }

    #[tokio::test]
    async fn second_approval_keeps_the_issued_member_number() {
        let store = MemStore::new();
        let created = store
            .create_application(application("repeat@example.com"))
            .await
            .unwrap();

        let first = store.review_application(created.id, approval()).await.unwrap();
        let second = store.review_application(created.id, approval()).await.unwrap();

        assert_eq!(first.member_number, second.member_number);
        assert_eq!(first.member_since, second.member_since);
        assert_eq!(first.expiry_date, second.expiry_date);
    }

    #[tokio::test]
    async fn rejection_issues_no_card() {
        let store = MemStore::new();
        let created = store
            .create_application(application("rejected@example.com"))
            .await
            .unwrap();

        let rejected = store
            .review_application(
                created.id,
                ApplicationReview {
                    status: Some(ApplicationStatus::Rejected),
                    reviewed_by: Some("staff-1".to_string()),
                    notes: Some("incomplete documents".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert!(rejected.member_number.is_none());
        assert!(!rejected.card_generated);
        assert_eq!(rejected.reviewed_by.as_deref(), Some("staff-1"));
        assert!(rejected.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn member_lookup_is_case_insensitive_on_email() {
        let store = MemStore::new();
        let created = store
            .create_application(application("A@B.com"))
            .await
            .unwrap();
        store.review_application(created.id, approval()).await.unwrap();

        let by_email = store.find_member("a@b.com").await.unwrap();
        assert!(by_email.is_some());

        let number = by_email.unwrap().member_number.unwrap();
        assert!(store.find_member(&number).await.unwrap().is_some());
        assert!(store.verify_member(&number).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lookup_never_exposes_pending_applications() {
        let store = MemStore::new();
        store
            .create_application(application("pending@example.com"))
            .await
            .unwrap();

        assert!(store
            .find_member("pending@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn order_is_created_with_its_lines() {
        let store = MemStore::new();
        let order = CreateOrderEntity {
            user_id: None,
            total: Decimal::new(25_50, 2),
            status: OrderStatus::Pending,
            payment_method: None,
            order_reference: None,
            customer_info: Some(json!({"name": "Guest"})),
        };
        let lines = vec![
            OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: 2,
                price: Decimal::new(10_00, 2),
            },
            OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
                price: Decimal::new(5_50, 2),
            },
        ];

        let created = store.create_order(order, lines).await.unwrap();

        assert_eq!(created.total, Decimal::new(25_50, 2));
        assert_eq!(store.locked().order_lines.len(), 2);
        assert_eq!(store.orders_for(None).await.unwrap().len(), 1);
        assert!(store.orders_for(Some("user-1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn eft_orders_are_tracked_by_reference() {
        let store = MemStore::new();
        let order = CreateOrderEntity {
            user_id: None,
            total: Decimal::new(80_00, 2),
            status: OrderStatus::PendingPayment,
            payment_method: Some("EFT".to_string()),
            order_reference: Some("TMH-1".to_string()),
            customer_info: None,
        };
        store.create_order(order, Vec::new()).await.unwrap();

        let confirmed = store
            .set_order_status_by_reference("TMH-1", OrderStatus::PaymentSubmitted)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::PaymentSubmitted);

        let missing = store
            .set_order_status_by_reference("unknown-ref", OrderStatus::PaymentSubmitted)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound)));

        let visible = store
            .orders_with_status(&OrderStatus::EFT_VISIBLE)
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);

        let fulfilled = store
            .set_order_status_by_reference("TMH-1", OrderStatus::Fulfilled)
            .await
            .unwrap();
        assert_eq!(fulfilled.status, OrderStatus::Fulfilled);
        assert!(store
            .orders_with_status(&OrderStatus::EFT_VISIBLE)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn todays_sales_include_fresh_sales() {
        let store = MemStore::new();
        store
            .create_sale(CreateSaleEntity {
                total: Decimal::new(30_00, 2),
                customer_name: None,
                payment_method: "cash".to_string(),
                items: json!([]),
                sold_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(store.sales_today().await.unwrap().len(), 1);
    }
}
