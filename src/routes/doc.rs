use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        applications::{ApplicationRequest, ApplicationSubmitted, DeletionRequested, MyRequests},
        cart::{AddToCartRequest, CartList},
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        profile::{ProfileResponse, UpdateProfileRequest},
    },
    models::{AccountDeletionRequest, CartItem, Order, OrderItem, Part, RoleApplication, User},
    response::{ApiResponse, Meta},
    routes::{applications, auth, cart, health, orders, params, parts, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        parts::list_parts,
        parts::get_part,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        applications::my_requests,
        applications::apply_admin,
        applications::apply_support,
        applications::apply_seller,
        applications::request_deletion,
        profile::get_profile,
        profile::update_profile
    ),
    components(
        schemas(
            User,
            Part,
            CartItem,
            Order,
            OrderItem,
            RoleApplication,
            AccountDeletionRequest,
            AddToCartRequest,
            CartList,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            ApplicationRequest,
            ApplicationSubmitted,
            DeletionRequested,
            MyRequests,
            UpdateProfileRequest,
            ProfileResponse,
            parts::PartList,
            params::Pagination,
            params::PartQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Part>,
            ApiResponse<parts::PartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<MyRequests>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Parts", description = "Parts catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Applications", description = "Role application and deletion request endpoints"),
        (name = "Profile", description = "Profile endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
