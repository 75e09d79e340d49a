use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{read_data_or_default, EndpointError},
    id::{OrderId, UserId},
    orders::Order,
};
use reqwest::StatusCode;
use serde_derive::Deserialize;

const NO_ORDERS: &str = "You have no orders";

/// Fetch a shopper's order history.
///
/// The backend reports "no orders" as an error, which is translated into an
/// empty list here.
pub async fn list_orders(
    api: &Storefront,
    user_id: &UserId,
) -> Result<Vec<Order>, EndpointError> {
    let path = format!("/api/users/{}/orders", user_id);

    match api.send(ApiRequest::get(path)).await {
        Ok(response) => read_data_or_default(response).await,
        Err(e) if has_no_orders(&e) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn has_no_orders(error: &EndpointError) -> bool {
    error.status() == Some(StatusCode::NOT_FOUND)
        || error.server_message() == Some(NO_ORDERS)
}

/// The outcome of a successful cancellation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cancellation {
    pub message: Option<String>,
    /// What will happen to the money, for orders that were already paid.
    pub refund_status: Option<String>,
}

/// Cancel an order. Use [`Order::mark_cancelled()`] to update a local copy
/// afterwards.
pub async fn cancel_order(
    api: &Storefront,
    user_id: &UserId,
    order: &OrderId,
) -> Result<Cancellation, EndpointError> {
    let path = format!("/api/users/{}/orders/{}/cancel", user_id, order);
    let response = api.send(ApiRequest::put(path)).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);
    let body: CancelResponse = serde_json::from_str(&body)?;

    if !body.success {
        return Err(EndpointError::Unsuccessful {
            message: body.message,
        });
    }

    log::info!("Cancelled order {}", order);

    Ok(Cancellation {
        message: body.message,
        refund_status: body.data.and_then(|d| d.refund_status),
    })
}

#[derive(Debug, Deserialize)]
struct CancelResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<CancelData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelData {
    refund_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, orders::OrderStatus, session::MemoryStore};
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap());

        Storefront::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn fetch_order_history() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/orders")
            .with_status(200)
            .with_body(r#"{"status":"success","data":[
                {"_id":"o1","status":"Shipped","total_amount":1598,"products":[]}
            ]}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let got = list_orders(&api, &UserId::from("u1")).await.unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn not_found_means_no_orders() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/orders")
            .with_status(404)
            .create_async()
            .await;
        let api = storefront(&server);

        let got = list_orders(&api, &UserId::from("u1")).await.unwrap();

        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn the_no_orders_message_means_no_orders() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/orders")
            .with_status(400)
            .with_body(r#"{"message":"You have no orders"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let got = list_orders(&api, &UserId::from("u1")).await.unwrap();

        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn other_failures_are_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/u1/orders")
            .with_status(400)
            .with_body(r#"{"message":"Bad user"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = list_orders(&api, &UserId::from("u1")).await.unwrap_err();

        assert_eq!(err.user_message(), "Bad user");
    }

    #[tokio::test]
    async fn cancellations_report_the_refund() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/users/u1/orders/o1/cancel")
            .with_status(200)
            .with_body(r#"{"success":true,"message":"Order cancelled","data":{"refundStatus":"Refund initiated"}}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let got = cancel_order(&api, &UserId::from("u1"), &OrderId::from("o1"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(got.refund_status.as_deref(), Some("Refund initiated"));
    }

    #[tokio::test]
    async fn unsuccessful_cancellations_are_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/api/users/u1/orders/o1/cancel")
            .with_status(200)
            .with_body(r#"{"success":false,"message":"Order already shipped"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = cancel_order(&api, &UserId::from("u1"), &OrderId::from("o1"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Order already shipped");
    }
}
