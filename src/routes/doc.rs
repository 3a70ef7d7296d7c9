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
        auth::{
            LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, TokenPair, VerifyResponse,
        },
        items::{CategoryTree, ConformanceReport, ItemList, RecentItemList},
    },
    models::{
        CategoryNode, CategoryRef, DetailImage, InvariantViolation, ItemDetail, ItemDetails,
        ItemImage, ItemSummary, RecentItem, SizeVariant, UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, items},
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
        items::list_items,
        items::list_recent_items,
        items::get_item,
        items::check_conformance,
        categories::list_categories,
        auth::register,
        auth::login,
        auth::refresh,
        auth::verify
    ),
    components(
        schemas(
            ItemDetail,
            CategoryRef,
            ItemDetails,
            SizeVariant,
            ItemImage,
            DetailImage,
            InvariantViolation,
            ItemSummary,
            RecentItem,
            CategoryNode,
            UserProfile,
            ItemList,
            RecentItemList,
            CategoryTree,
            ConformanceReport,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            LoginResponse,
            TokenPair,
            VerifyResponse,
            Meta,
            ApiResponse<ItemDetail>,
            ApiResponse<ItemList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Items", description = "Catalog item endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_catalog_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/items",
            "/api/items/recent",
            "/api/items/{item_id}",
            "/api/categories",
            "/api/auth/verify",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemas = &doc.components.expect("components").schemas;
        assert!(schemas.contains_key("ItemDetail"));
    }
}
