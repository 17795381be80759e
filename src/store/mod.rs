//! Storage abstraction over the service's entities.
//!
//! One trait, two interchangeable backends selected by configuration:
//! [`PgStore`] for production and [`MemStore`] for tests and local
//! development. Card issuance is derived in [`crate::membership`] and shared
//! by both backends, so they only differ in plumbing.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemStore;
pub use postgres::PgStore;

use crate::models::{
    ApplicationReview, CartLineEntity, CreateMembershipApplicationEntity, CreateOrderEntity,
    CreateProductEntity, CreateSaleEntity, MembershipApplicationEntity, OrderEntity,
    OrderLineInput, OrderStatus, ProductEntity, SaleEntity, UpdateProductEntity,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::NotFound,
            other => StoreError::Backend(other.into()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Catalog
    async fn list_products(&self) -> StoreResult<Vec<ProductEntity>>;
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<ProductEntity>>;
    async fn create_product(&self, product: CreateProductEntity) -> StoreResult<ProductEntity>;
    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProductEntity,
    ) -> StoreResult<ProductEntity>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<()>;
    async fn clear_products(&self) -> StoreResult<()>;
    /// Decrement stock by `quantity`, clamping at zero.
    async fn decrement_stock(&self, id: Uuid, quantity: i32) -> StoreResult<ProductEntity>;

    // Cart (persistent identities; guest lines live in `GuestCart`)
    async fn cart_lines(&self, user_id: &str) -> StoreResult<Vec<CartLineEntity>>;
    /// Merge-add: an existing (identity, product) line gains `quantity`,
    /// otherwise a new line is created. Atomic per backend.
    async fn add_cart_line(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartLineEntity>;
    async fn set_cart_quantity(&self, line_id: Uuid, quantity: i32)
        -> StoreResult<CartLineEntity>;
    async fn remove_cart_line(&self, line_id: Uuid) -> StoreResult<()>;
    async fn clear_cart(&self, user_id: &str) -> StoreResult<()>;

    // Orders
    /// Persist an order together with its lines in one atomic step.
    async fn create_order(
        &self,
        order: CreateOrderEntity,
        lines: Vec<OrderLineInput>,
    ) -> StoreResult<OrderEntity>;
    /// Orders owned by the given identity; `None` lists ownerless (guest)
    /// orders.
    async fn orders_for(&self, user_id: Option<&str>) -> StoreResult<Vec<OrderEntity>>;
    async fn set_order_status_by_reference(
        &self,
        reference: &str,
        status: OrderStatus,
    ) -> StoreResult<OrderEntity>;
    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<OrderEntity>>;

    // Membership
    async fn create_application(
        &self,
        application: CreateMembershipApplicationEntity,
    ) -> StoreResult<MembershipApplicationEntity>;
    async fn list_applications(&self) -> StoreResult<Vec<MembershipApplicationEntity>>;
    async fn get_application(&self, id: Uuid)
        -> StoreResult<Option<MembershipApplicationEntity>>;
    /// Apply a review. The transition into `approved` allocates the next
    /// member number atomically and issues the card exactly once; an
    /// application that is already approved keeps its card.
    async fn review_application(
        &self,
        id: Uuid,
        review: ApplicationReview,
    ) -> StoreResult<MembershipApplicationEntity>;
    async fn delete_application(&self, id: Uuid) -> StoreResult<()>;
    /// Approved members only, by exact member number or case-normalized
    /// email.
    async fn find_member(&self, query: &str) -> StoreResult<Option<MembershipApplicationEntity>>;
    /// Approved members only, by exact member number (staff verification).
    async fn verify_member(
        &self,
        member_number: &str,
    ) -> StoreResult<Option<MembershipApplicationEntity>>;

    // POS sales
    async fn create_sale(&self, sale: CreateSaleEntity) -> StoreResult<SaleEntity>;
    async fn sales_today(&self) -> StoreResult<Vec<SaleEntity>>;
}
