use crate::{
    cart::Cart,
    client::{ApiRequest, Storefront},
    endpoints::{read_envelope, EndpointError},
    id::{CartItemId, ProductId, UserId},
};
use serde_derive::Serialize;
use serde_json::Value;

/// Fetch a shopper's cart. Entries which don't describe a usable product are
/// silently dropped (see [`Cart::from_entries()`]).
pub async fn get_cart(api: &Storefront, user_id: &UserId) -> Result<Cart, EndpointError> {
    let path = format!("/api/users/{}/cart", user_id);
    let response = api.send(ApiRequest::get(path)).await?;

    let entries: Value = read_envelope(response).await?.data.unwrap_or(Value::Null);

    Ok(Cart::from_entries(&entries))
}

pub async fn add_to_cart(
    api: &Storefront,
    user_id: &UserId,
    product: &ProductId,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/cart", user_id);
    let request = ApiRequest::post(path).json(&ProductData { product })?;

    api.send(request).await?;
    Ok(())
}

pub async fn remove_from_cart(
    api: &Storefront,
    user_id: &UserId,
    product: &ProductId,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/cart/{}", user_id, product);

    api.send(ApiRequest::delete(path)).await?;
    Ok(())
}

/// Bump a cart entry's quantity up or down by `change`.
pub async fn change_quantity(
    api: &Storefront,
    user_id: &UserId,
    item: &CartItemId,
    change: i32,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/cart", user_id);
    let request = ApiRequest::put(path).json(&QuantityData {
        id: item,
        quantity_change: change,
    })?;

    api.send(request).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub(crate) struct ProductData<'a> {
    #[serde(rename = "productID")]
    pub(crate) product: &'a ProductId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuantityData<'a> {
    id: &'a CartItemId,
    quantity_change: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, session::MemoryStore};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap());

        Storefront::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn broken_entries_are_dropped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/cart")
            .with_status(200)
            .with_body(r#"{"status":"success","data":[
                {"_id":"c1","product":{"_id":"p1","title":"Kibble","price":500},"quantity":2},
                {"_id":"c2","product":null,"quantity":1},
                {"_id":"c3","product":{"_id":"p3","price":"free"},"quantity":1}
            ]}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let cart = get_cart(&api, &UserId::from("u1")).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.dropped(), 2);
        assert_eq!(cart.total(), 1000.0);
    }

    #[tokio::test]
    async fn a_missing_cart_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/cart")
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let cart = get_cart(&api, &UserId::from("u1")).await.unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn add_sends_the_product_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/u1/cart")
            .match_body(Matcher::Json(json!({ "productID": "p1" })))
            .with_status(200)
            .create_async()
            .await;
        let api = storefront(&server);

        add_to_cart(&api, &UserId::from("u1"), &ProductId::from("p1"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn remove_uses_the_product_in_the_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/users/u1/cart/p1")
            .with_status(200)
            .create_async()
            .await;
        let api = storefront(&server);

        remove_from_cart(&api, &UserId::from("u1"), &ProductId::from("p1"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn quantity_changes_are_relative() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/users/u1/cart")
            .match_body(Matcher::Json(json!({ "id": "c1", "quantityChange": -1 })))
            .with_status(200)
            .create_async()
            .await;
        let api = storefront(&server);

        change_quantity(&api, &UserId::from("u1"), &CartItemId::from("c1"), -1)
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
