use crate::{
    checkout::CheckoutDetails,
    client::{ApiRequest, Storefront},
    endpoints::{read_envelope, EndpointError},
    id::UserId,
};
use serde_derive::{Deserialize, Serialize};

/// Place a cash-on-delivery order for everything in the shopper's cart.
pub async fn place_cod_order(
    api: &Storefront,
    user_id: &UserId,
    details: &CheckoutDetails,
) -> Result<(), EndpointError> {
    let path = format!("/api/users/{}/cod-order", user_id);
    let request = ApiRequest::post(path).json(&details.payload())?;
    let response = api.send(request).await?;

    read_envelope::<serde_json::Value>(response)
        .await?
        .require_success()?;
    log::info!("Placed a cash-on-delivery order");

    Ok(())
}

/// An order registered with the payment gateway, waiting to be paid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    /// The gateway's public key.
    pub key: String,
    /// The amount due, in rupees.
    pub amount: f64,
    pub currency: String,
    pub order_id: String,
}

impl PaymentOrder {
    /// The gateway works in the smallest currency unit.
    pub fn amount_in_paise(&self) -> u64 { (self.amount * 100.0).round() as u64 }
}

/// Start an online payment for the shopper's cart.
pub async fn create_payment(
    api: &Storefront,
    user_id: &UserId,
) -> Result<PaymentOrder, EndpointError> {
    let path = format!("/api/users/{}/payment", user_id);
    let response = api.send(ApiRequest::post(path)).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);

    // unlike everything else, the payment details aren't wrapped in "data"
    let created: PaymentCreated = serde_json::from_str(&body)?;
    if created.status.as_deref() != Some("success") {
        return Err(EndpointError::Unsuccessful {
            message: created.message,
        });
    }

    created.order.ok_or(EndpointError::MissingData)
}

#[derive(Debug, Deserialize)]
struct PaymentCreated {
    status: Option<String>,
    message: Option<String>,
    #[serde(flatten)]
    order: Option<PaymentOrder>,
}

/// What the payment gateway hands back once the shopper has paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

/// Have the backend check the gateway's signature and turn the paid cart
/// into an order.
pub async fn verify_payment(
    api: &Storefront,
    payment: &GatewayResponse,
    details: &CheckoutDetails,
) -> Result<(), EndpointError> {
    let data = VerifyData {
        payment,
        delivery: details.payload(),
    };
    let request = ApiRequest::post("/api/users/payment/verify").json(&data)?;
    let response = api.send(request).await?;

    read_envelope::<serde_json::Value>(response)
        .await?
        .require_success()?;
    log::info!("Payment {} verified", payment.razorpay_payment_id);

    Ok(())
}

#[derive(Debug, Serialize)]
struct VerifyData<'a> {
    #[serde(flatten)]
    payment: &'a GatewayResponse,
    #[serde(flatten)]
    delivery: crate::checkout::DeliveryPayload<'a>,
}

/// Tell the backend the shopper has returned from a successful payment.
pub async fn payment_success(api: &Storefront) -> Result<(), EndpointError> {
    api.send(ApiRequest::get("/api/users/payment/success")).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checkout::CheckoutForm, config::Config, orders::PaymentMethod,
        session::MemoryStore,
    };
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap());

        Storefront::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    fn details() -> CheckoutDetails {
        CheckoutForm {
            full_name: String::from("Asha Rao"),
            phone_number: String::from("9876543210"),
            email: String::from("asha@example.com"),
            street_address: String::from("12 MG Road"),
            city: String::from("Bengaluru"),
            state: String::from("Karnataka"),
            pincode: String::from("560001"),
            special_instructions: String::new(),
            payment_method: PaymentMethod::Cod,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn cod_orders_send_the_delivery_details() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/u1/cod-order")
            .match_body(Matcher::PartialJson(json!({
                "shippingAddress": { "fullName": "Asha Rao", "country": "India" },
                "phoneNumber": "9876543210",
                "specialInstructions": "",
            })))
            .with_status(201)
            .with_body(r#"{"status":"success","message":"Order placed"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        place_cod_order(&api, &UserId::from("u1"), &details()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_cod_orders_keep_the_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/users/u1/cod-order")
            .with_status(200)
            .with_body(r#"{"status":"error","message":"Cart is empty"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = place_cod_order(&api, &UserId::from("u1"), &details())
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Cart is empty");
    }

    #[tokio::test]
    async fn payment_orders_are_read_from_the_top_level() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/users/u1/payment")
            .with_status(200)
            .with_body(r#"{"status":"success","key":"rzp_test","amount":549.5,"currency":"INR","orderId":"order_9A"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let got = create_payment(&api, &UserId::from("u1")).await.unwrap();

        assert_eq!(
            got,
            PaymentOrder {
                key: String::from("rzp_test"),
                amount: 549.5,
                currency: String::from("INR"),
                order_id: String::from("order_9A"),
            }
        );
        assert_eq!(got.amount_in_paise(), 54950);
    }

    #[tokio::test]
    async fn verification_merges_gateway_and_delivery_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/payment/verify")
            .match_body(Matcher::PartialJson(json!({
                "razorpay_payment_id": "pay_1",
                "razorpay_order_id": "order_9A",
                "razorpay_signature": "sig",
                "phoneNumber": "9876543210",
            })))
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;
        let api = storefront(&server);
        let payment = GatewayResponse {
            razorpay_payment_id: String::from("pay_1"),
            razorpay_order_id: String::from("order_9A"),
            razorpay_signature: String::from("sig"),
        };

        verify_payment(&api, &payment, &details()).await.unwrap();

        mock.assert_async().await;
    }
}
