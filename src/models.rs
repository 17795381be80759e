use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::{AsChangeset, Insertable, Queryable};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::Selectable;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Raised when a status literal does not belong to the state machine it is
/// being applied to.
#[derive(Debug, Error)]
#[error("`{0}` is not a recognized status")]
pub struct InvalidStatus(pub String);

// Order status

/// Closed set of order states. Stored as text but validated on every
/// transition, including the EFT paths.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow, ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PendingPayment,
    PaymentSubmitted,
    PaymentConfirmed,
    Cancelled,
    Fulfilled,
}

impl OrderStatus {
    /// Statuses surfaced by the EFT order listing.
    pub const EFT_VISIBLE: [OrderStatus; 3] = [
        OrderStatus::PendingPayment,
        OrderStatus::PaymentSubmitted,
        OrderStatus::PaymentConfirmed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PaymentSubmitted => "payment_submitted",
            OrderStatus::PaymentConfirmed => "payment_confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Fulfilled => "fulfilled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "pending_payment" => Ok(OrderStatus::PendingPayment),
            "payment_submitted" => Ok(OrderStatus::PaymentSubmitted),
            "payment_confirmed" => Ok(OrderStatus::PaymentConfirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl ToSql<Text, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for OrderStatus {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        Ok(std::str::from_utf8(value.as_bytes())?.parse()?)
    }
}

// Membership application status

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow, ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl ToSql<Text, Pg> for ApplicationStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ApplicationStatus {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        Ok(std::str::from_utf8(value.as_bytes())?.parse()?)
    }
}

// Products

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProductEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image: String,
    pub potency: Option<String>,
    pub effects: Option<Vec<String>>,
    pub featured: bool,
    pub in_stock: bool,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductEntity {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub potency: Option<String>,
    #[serde(default)]
    pub effects: Option<Vec<String>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock: i32,
}

/// Partial product update; absent fields are left untouched.
#[derive(AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProductEntity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub potency: Option<String>,
    pub effects: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub stock: Option<i32>,
}

impl UpdateProductEntity {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.potency.is_none()
            && self.effects.is_none()
            && self.featured.is_none()
            && self.in_stock.is_none()
            && self.stock.is_none()
    }
}

// Cart lines

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::cart_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct CartLineEntity {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cart_lines)]
pub struct CreateCartLineEntity {
    pub user_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
}

// Orders

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct OrderEntity {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub order_reference: Option<String>,
    pub customer_info: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub user_id: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub order_reference: Option<String>,
    pub customer_info: Option<Value>,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct OrderLineEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_lines)]
pub struct CreateOrderLineEntity {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One checkout line as supplied by the client. `price` is the unit price
/// the client saw; it is captured verbatim on the order line.
#[derive(Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// Contact snapshot embedded in an order at checkout time.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

// Membership applications

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::membership_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct MembershipApplicationEntity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub id_number: String,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_conditions: Option<String>,
    pub preferred_products: Option<Vec<String>>,
    pub id_document_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
    pub member_number: Option<String>,
    pub membership_tier: Option<String>,
    pub member_since: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub card_payload: Option<Value>,
    pub card_generated: bool,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::membership_applications)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipApplicationEntity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub id_number: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub preferred_products: Option<Vec<String>>,
    #[serde(default)]
    pub id_document_url: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// Changeset applied by the review flow. Only populated fields are written,
/// so a notes-only review never clobbers issued card data.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::membership_applications)]
pub struct UpdateMembershipApplicationEntity {
    pub status: Option<ApplicationStatus>,
    pub updated_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
    pub member_number: Option<String>,
    pub membership_tier: Option<String>,
    pub member_since: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub card_payload: Option<Value>,
    pub card_generated: Option<bool>,
}

/// Input to the review operation, as decided by an administrator.
#[derive(Debug, Clone, Default)]
pub struct ApplicationReview {
    pub status: Option<ApplicationStatus>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

// POS sales

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SaleEntity {
    pub id: Uuid,
    pub total: Decimal,
    pub customer_name: Option<String>,
    pub payment_method: String,
    pub items: Value,
    pub sold_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::sales)]
pub struct CreateSaleEntity {
    pub total: Decimal,
    pub customer_name: Option<String>,
    pub payment_method: String,
    pub items: Value,
    pub sold_at: DateTime<Utc>,
}

/// One sold line as recorded at the till, including a name snapshot so the
/// sale stays readable after the product is edited or deleted.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_roundtrips_through_text() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::PendingPayment,
            OrderStatus::PaymentSubmitted,
            OrderStatus::PaymentConfirmed,
            OrderStatus::Cancelled,
            OrderStatus::Fulfilled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().expect("literal should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_order_status_is_rejected() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "`shipped` is not a recognized status");
    }

    #[test]
    fn application_status_rejects_bogus_literal() {
        assert!("bogus".parse::<ApplicationStatus>().is_err());
        assert_eq!(
            "approved".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Approved
        );
    }

    #[test]
    fn empty_product_update_is_detected() {
        assert!(UpdateProductEntity::default().is_empty());
        let update = UpdateProductEntity {
            stock: Some(3),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
