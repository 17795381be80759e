//! Process-local cart for unauthenticated visitors.
//!
//! Guest lines never touch the durable store: they live for as long as the
//! process does and are shared by everyone presenting the guest identity.
//! The store is an explicit handle owned by [`crate::state::AppState`], not
//! a module-level singleton, so tests can create isolated instances.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::models::CartLineEntity;

/// Identity sentinel for visitors without a session.
pub const GUEST_IDENTITY: &str = "guest";

#[derive(Debug, Clone, Default)]
pub struct GuestCart {
    lines: Arc<Mutex<Vec<CartLineEntity>>>,
}

impl GuestCart {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<CartLineEntity>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `quantity` of a product, merging into an existing line if the
    /// product is already in the cart.
    pub fn add(&self, product_id: Uuid, quantity: i32) -> CartLineEntity {
        let mut lines = self.locked();

        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity += quantity;
            return line.clone();
        }

        let line = CartLineEntity {
            id: Uuid::new_v4(),
            user_id: GUEST_IDENTITY.to_string(),
            product_id,
            quantity,
            created_at: Utc::now(),
        };
        lines.push(line.clone());
        line
    }

    pub fn lines(&self) -> Vec<CartLineEntity> {
        self.locked().clone()
    }

    /// Set a line's quantity directly. Returns `None` when the line is not a
    /// guest line (the caller then falls through to the durable store).
    pub fn set_quantity(&self, line_id: Uuid, quantity: i32) -> Option<CartLineEntity> {
        let mut lines = self.locked();
        let line = lines.iter_mut().find(|line| line.id == line_id)?;
        line.quantity = quantity;
        Some(line.clone())
    }

    /// Remove a line; `false` when no guest line matched.
    pub fn remove(&self, line_id: Uuid) -> bool {
        let mut lines = self.locked();
        let before = lines.len();
        lines.retain(|line| line.id != line_id);
        lines.len() < before
    }

    pub fn clear(&self) {
        self.locked().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_same_product_twice_merges_quantities() {
        let cart = GuestCart::new();
        let product = Uuid::new_v4();

        let first = cart.add(product, 2);
        let second = cart.add(product, 3);

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn distinct_products_get_distinct_lines() {
        let cart = GuestCart::new();
        cart.add(Uuid::new_v4(), 1);
        cart.add(Uuid::new_v4(), 1);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn set_quantity_overwrites_rather_than_merges() {
        let cart = GuestCart::new();
        let line = cart.add(Uuid::new_v4(), 2);

        let updated = cart.set_quantity(line.id, 7).expect("line exists");
        assert_eq!(updated.quantity, 7);
        assert!(cart.set_quantity(Uuid::new_v4(), 1).is_none());
    }

    #[test]
    fn remove_and_clear_empty_the_cart() {
        let cart = GuestCart::new();
        let line = cart.add(Uuid::new_v4(), 1);
        cart.add(Uuid::new_v4(), 1);

        assert!(cart.remove(line.id));
        assert!(!cart.remove(line.id));
        assert_eq!(cart.lines().len(), 1);

        cart.clear();
        assert!(cart.lines().is_empty());
    }
}
