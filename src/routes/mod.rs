pub mod carts;
pub mod eft;
pub mod memberships;
pub mod orders;
pub mod payments;
pub mod pos;
pub mod products;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// All route modules merged into one router, used by `main` and by the
/// HTTP-level tests.
pub fn api_router() -> OpenApiRouter<AppState> {
    products::routes_with_openapi()
        .merge(carts::routes_with_openapi())
        .merge(orders::routes_with_openapi())
        .merge(pos::routes_with_openapi())
        .merge(memberships::routes_with_openapi())
        .merge(eft::routes_with_openapi())
        .merge(payments::routes_with_openapi())
}
