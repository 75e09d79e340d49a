use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{read_envelope, EndpointError},
    id::ProductId,
    products::{self, Category, Product},
};
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Fetch the whole catalogue.
pub async fn list_products(api: &Storefront) -> Result<Vec<Product>, EndpointError> {
    let response = api.send(ApiRequest::get("/api/users/products")).await?;
    let products = read_products(response).await?;

    log::debug!("Fetched {} products", products.len());

    Ok(products)
}

/// Fetch only the products for a particular animal.
pub async fn products_by_category(
    api: &Storefront,
    category: &Category,
) -> Result<Vec<Product>, EndpointError> {
    let path = format!("/api/users/products/category/{}", category);
    let response = api.send(ApiRequest::get(path)).await?;

    read_products(response).await
}

/// Read a list of products, skipping any which are unusable.
pub(crate) async fn read_products(
    response: Response,
) -> Result<Vec<Product>, EndpointError> {
    let entries: Value = read_envelope(response).await?.data.unwrap_or(Value::Null);

    Ok(products::products_from_entries(&entries))
}

/// Look up a single product, returning `None` if it doesn't exist.
pub async fn product_details(
    api: &Storefront,
    id: &ProductId,
) -> Result<Option<Product>, EndpointError> {
    let path = format!("/api/users/products/{}", id);

    match api.send(ApiRequest::get(path)).await {
        Ok(response) => Ok(read_envelope(response).await?.data),
        Err(EndpointError::Rejected { status, .. })
            if status == StatusCode::NOT_FOUND =>
        {
            Ok(None)
        },
        Err(e) => Err(e),
    }
}
