use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{cart::ProductData, products::read_products, EndpointError},
    id::{ProductId, UserId},
    products::Product,
};

pub async fn get_wishlist(
    api: &Storefront,
    user_id: &UserId,
) -> Result<Vec<Product>, EndpointError> {
    let path = format!("/api/users/{}/wishlist", user_id);
    let response = api.send(ApiRequest::get(path)).await?;

    read_products(response).await
}

pub async fn add_to_wishlist(
    api: &Storefront,
    user_id: &UserId,
    product: &ProductId,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/wishlist", user_id);
    let request = ApiRequest::post(path).json(&ProductData { product })?;

    api.send(request).await?;
    Ok(())
}

pub async fn remove_from_wishlist(
    api: &Storefront,
    user_id: &UserId,
    product: &ProductId,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/wishlist/{}", user_id, product);

    api.send(ApiRequest::delete(path)).await?;
    Ok(())
}
