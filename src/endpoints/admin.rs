//! Endpoints only available to the store's administrator.

use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{read_data, read_data_or_default, read_envelope, EndpointError},
    id::{OrderId, ProductId, UserId},
    orders::{Order, OrderStatus},
    products::{Product, ProductForm, ProductFormError},
    utils,
};
use reqwest::StatusCode;
use serde_derive::{Deserialize, Serialize};

/// A registered shopper, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, deserialize_with = "utils::lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "utils::lenient_string")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_products_sold: u64,
    #[serde(default)]
    pub total_revenue: f64,
}

pub async fn users(api: &Storefront) -> Result<Vec<AdminUser>, EndpointError> {
    let response = api.send(ApiRequest::get("/api/admin/users")).await?;

    read_data_or_default(response).await
}

pub async fn stats(api: &Storefront) -> Result<AdminStats, EndpointError> {
    let response = api.send(ApiRequest::get("/api/admin/stats")).await?;
    let data: StatsData = read_data(response).await?;

    Ok(data.stats.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct StatsData {
    stats: Option<AdminStats>,
}

/// Every order placed in the store.
pub async fn orders(api: &Storefront) -> Result<Vec<Order>, EndpointError> {
    let response = api.send(ApiRequest::get("/api/admin/orders")).await?;

    read_data_or_default(response).await
}

pub async fn update_order_status(
    api: &Storefront,
    order: &OrderId,
    status: &OrderStatus,
) -> Result<(), EndpointError> {
    let path = format!("/api/admin/orders/{}", order);
    let request = ApiRequest::put(path).json(&StatusData { status })?;

    api.send(request).await?;
    log::info!("Order {} is now \"{}\"", order, status);

    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusData<'a> {
    status: &'a OrderStatus,
}

pub async fn product(api: &Storefront, id: &ProductId) -> Result<Product, EndpointError> {
    let path = format!("/api/admin/products/{}", id);
    let response = api.send(ApiRequest::get(path)).await?;

    read_data(response).await
}

/// Add a new product to the catalogue.
pub async fn create_product(
    api: &Storefront,
    form: ProductForm,
) -> Result<(), ProductUploadError> {
    form.validate()?;

    let request = ApiRequest::post("/api/admin/products").product_form(form);
    let response = api.send(request).await?;

    if response.status() != StatusCode::CREATED {
        let envelope = read_envelope::<serde_json::Value>(response).await?;
        return Err(EndpointError::Unsuccessful {
            message: envelope.message,
        }
        .into());
    }

    log::info!("Uploaded a new product");
    Ok(())
}

/// Replace an existing product's details. The form must carry the product's
/// ID.
pub async fn update_product(
    api: &Storefront,
    form: ProductForm,
) -> Result<(), ProductUploadError> {
    form.validate()?;
    let id = form.id.clone().ok_or(ProductUploadError::MissingId)?;

    let request = ApiRequest::put("/api/admin/products").product_form(form);
    api.send(request).await?;
    log::info!("Updated product {}", id);

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ProductUploadError {
    #[error("{0}")]
    Invalid(#[from] ProductFormError),
    #[error("Only existing products can be updated")]
    MissingId,
    #[error("Unable to upload the product")]
    Endpoint(#[from] EndpointError),
}
