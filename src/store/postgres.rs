//! PostgreSQL-backed store.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use diesel::{
    define_sql_function, BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods,
    OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::DbPool;
use crate::membership;
use crate::models::{
    ApplicationReview, ApplicationStatus, CartLineEntity, CreateCartLineEntity,
    CreateMembershipApplicationEntity, CreateOrderEntity, CreateOrderLineEntity,
    CreateProductEntity, CreateSaleEntity, MembershipApplicationEntity, OrderEntity,
    OrderLineInput, OrderStatus, ProductEntity, SaleEntity, UpdateMembershipApplicationEntity,
    UpdateProductEntity,
};
use crate::schema::{
    cart_lines, member_counter, membership_applications, order_lines, orders, products, sales,
};

define_sql_function! {
    /// `GREATEST`, used for clamped stock decrements.
    fn greatest(a: diesel::sql_types::Integer, b: diesel::sql_types::Integer) -> diesel::sql_types::Integer;
}

define_sql_function! {
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_products(&self) -> StoreResult<Vec<ProductEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let items = products::table
            .select(ProductEntity::as_select())
            .order(products::created_at.desc())
            .load(conn)
            .await
            .context("Failed to load products")?;

        Ok(items)
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<ProductEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let product = products::table
            .find(id)
            .select(ProductEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to load product")?;

        Ok(product)
    }

    async fn create_product(&self, product: CreateProductEntity) -> StoreResult<ProductEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let created = diesel::insert_into(products::table)
            .values(product)
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create product")?;

        Ok(created)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProductEntity,
    ) -> StoreResult<ProductEntity> {
        if changes.is_empty() {
            return self.get_product(id).await?.ok_or(StoreError::NotFound);
        }

        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let updated = diesel::update(products::table.find(id))
            .set(changes)
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        diesel::delete(products::table.find(id))
            .execute(conn)
            .await
            .context("Failed to delete product")?;

        Ok(())
    }

    async fn clear_products(&self) -> StoreResult<()> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        diesel::delete(products::table)
            .execute(conn)
            .await
            .context("Failed to clear products")?;

        Ok(())
    }

    async fn decrement_stock(&self, id: Uuid, quantity: i32) -> StoreResult<ProductEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let updated = diesel::update(products::table.find(id))
            .set(products::stock.eq(greatest(products::stock - quantity, 0)))
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(updated)
    }

    async fn cart_lines(&self, user_id: &str) -> StoreResult<Vec<CartLineEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let lines = cart_lines::table
            .filter(cart_lines::user_id.eq(user_id))
            .select(CartLineEntity::as_select())
            .order(cart_lines::created_at.asc())
            .load(conn)
            .await
            .context("Failed to load cart lines")?;

        Ok(lines)
    }

    async fn add_cart_line(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartLineEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let line = diesel::insert_into(cart_lines::table)
            .values(CreateCartLineEntity {
                user_id: user_id.to_string(),
                product_id,
                quantity,
            })
            .on_conflict((cart_lines::user_id, cart_lines::product_id))
            .do_update()
            .set(cart_lines::quantity.eq(cart_lines::quantity + quantity))
            .returning(CartLineEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to upsert cart line")?;

        Ok(line)
    }

    async fn set_cart_quantity(
        &self,
        line_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartLineEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let line = diesel::update(cart_lines::table.find(line_id))
            .set(cart_lines::quantity.eq(quantity))
            .returning(CartLineEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(line)
    }

    async fn remove_cart_line(&self, line_id: Uuid) -> StoreResult<()> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        diesel::delete(cart_lines::table.find(line_id))
            .execute(conn)
            .await
            .context("Failed to remove cart line")?;

        Ok(())
    }

    async fn clear_cart(&self, user_id: &str) -> StoreResult<()> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id)))
            .execute(conn)
            .await
            .context("Failed to clear cart")?;

        Ok(())
    }

    async fn create_order(
        &self,
        order: CreateOrderEntity,
        lines: Vec<OrderLineInput>,
    ) -> StoreResult<OrderEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let created = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let created: OrderEntity = diesel::insert_into(orders::table)
                        .values(order)
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    let rows: Vec<CreateOrderLineEntity> = lines
                        .into_iter()
                        .map(|line| CreateOrderLineEntity {
                            order_id: created.id,
                            product_id: line.product_id,
                            quantity: line.quantity,
                            unit_price: line.price,
                        })
                        .collect();

                    if !rows.is_empty() {
                        diesel::insert_into(order_lines::table)
                            .values(rows)
                            .execute(conn)
                            .await
                            .context("Failed to create order lines")?;
                    }

                    Ok::<OrderEntity, StoreError>(created)
                })
            })
            .await?;

        Ok(created)
    }

    async fn orders_for(&self, user_id: Option<&str>) -> StoreResult<Vec<OrderEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let found = match user_id {
            Some(user_id) => {
                orders::table
                    .filter(orders::user_id.eq(user_id))
                    .select(OrderEntity::as_select())
                    .order(orders::created_at.desc())
                    .load(conn)
                    .await
            }
            None => {
                orders::table
                    .filter(orders::user_id.is_null())
                    .select(OrderEntity::as_select())
                    .order(orders::created_at.desc())
                    .load(conn)
                    .await
            }
        }
        .context("Failed to load orders")?;

        Ok(found)
    }

    async fn set_order_status_by_reference(
        &self,
        reference: &str,
        status: OrderStatus,
    ) -> StoreResult<OrderEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let updated = diesel::update(orders::table.filter(orders::order_reference.eq(reference)))
            .set((orders::status.eq(status), orders::updated_at.eq(Utc::now())))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(updated)
    }

    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<OrderEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let found = orders::table
            .filter(orders::status.eq_any(statuses.to_vec()))
            .select(OrderEntity::as_select())
            .order(orders::created_at.desc())
            .load(conn)
            .await
            .context("Failed to load orders by status")?;

        Ok(found)
    }

    async fn create_application(
        &self,
        application: CreateMembershipApplicationEntity,
    ) -> StoreResult<MembershipApplicationEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let created = diesel::insert_into(membership_applications::table)
            .values(application)
            .returning(MembershipApplicationEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create membership application")?;

        Ok(created)
    }

    async fn list_applications(&self) -> StoreResult<Vec<MembershipApplicationEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let applications = membership_applications::table
            .select(MembershipApplicationEntity::as_select())
            .order(membership_applications::created_at.desc())
            .load(conn)
            .await
            .context("Failed to load membership applications")?;

        Ok(applications)
    }

    async fn get_application(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<MembershipApplicationEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let application = membership_applications::table
            .find(id)
            .select(MembershipApplicationEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to load membership application")?;

        Ok(application)
    }

    async fn review_application(
        &self,
        id: Uuid,
        review: ApplicationReview,
    ) -> StoreResult<MembershipApplicationEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let updated = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    // Row lock so a concurrent review of the same application
                    // observes the issued card instead of issuing again.
                    let current: MembershipApplicationEntity = membership_applications::table
                        .find(id)
                        .for_update()
                        .first(conn)
                        .await?;

                    let now = Utc::now();
                    let mut changes = UpdateMembershipApplicationEntity {
                        status: review.status,
                        updated_at: Some(now),
                        reviewed_at: Some(now),
                        reviewed_by: review.reviewed_by,
                        notes: review.notes,
                        ..Default::default()
                    };

                    if review.status == Some(ApplicationStatus::Approved)
                        && current.status != ApplicationStatus::Approved
                    {
                        let sequence: i64 = diesel::update(member_counter::table)
                            .set(member_counter::value.eq(member_counter::value + 1))
                            .returning(member_counter::value)
                            .get_result(conn)
                            .await
                            .context("Failed to allocate a member number")?;

                        let issued = membership::issue(sequence, now);
                        changes.member_number = Some(issued.member_number);
                        changes.membership_tier = Some(membership::MEMBERSHIP_TIER.to_string());
                        changes.member_since = Some(issued.member_since);
                        changes.expiry_date = Some(issued.expiry_date);
                        changes.card_payload = Some(issued.card_payload);
                        changes.card_generated = Some(true);
                    }

                    let updated = diesel::update(membership_applications::table.find(id))
                        .set(changes)
                        .returning(MembershipApplicationEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to update membership application")?;

                    Ok::<MembershipApplicationEntity, StoreError>(updated)
                })
            })
            .await?;

        Ok(updated)
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<()> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        diesel::delete(membership_applications::table.find(id))
            .execute(conn)
            .await
            .context("Failed to delete membership application")?;

        Ok(())
    }

    async fn find_member(&self, query: &str) -> StoreResult<Option<MembershipApplicationEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let member = membership_applications::table
            .filter(membership_applications::status.eq(ApplicationStatus::Approved))
            .filter(
                membership_applications::member_number.eq(query).or(lower(
                    membership_applications::email,
                )
                .eq(query.to_lowercase())
                .nullable()),
            )
            .select(MembershipApplicationEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to look up member")?;

        Ok(member)
    }

    async fn verify_member(
        &self,
        member_number: &str,
    ) -> StoreResult<Option<MembershipApplicationEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let member = membership_applications::table
            .filter(membership_applications::status.eq(ApplicationStatus::Approved))
            .filter(membership_applications::member_number.eq(member_number))
            .select(MembershipApplicationEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to verify member")?;

        Ok(member)
    }

    async fn create_sale(&self, sale: CreateSaleEntity) -> StoreResult<SaleEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let created = diesel::insert_into(sales::table)
            .values(sale)
            .returning(SaleEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create sale")?;

        Ok(created)
    }

    async fn sales_today(&self) -> StoreResult<Vec<SaleEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection")?;

        let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        let found = sales::table
            .filter(sales::sold_at.ge(start))
            .filter(sales::sold_at.lt(end))
            .select(SaleEntity::as_select())
            .order(sales::sold_at.desc())
            .load(conn)
            .await
            .context("Failed to load today's sales")?;

        Ok(found)
    }
}
