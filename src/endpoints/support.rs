use crate::{
    client::{ApiRequest, Storefront},
    endpoints::EndpointError,
    id::{OrderId, UserId},
};
use serde_derive::{Deserialize, Serialize};

/// Send the support team a message about an order.
pub async fn contact_support(
    api: &Storefront,
    user_id: &UserId,
    order: &OrderId,
    message: &str,
) -> Result<(), EndpointError> {
    let subject = format!("Support for Order #{}", order.short_reference());
    let data = Data {
        user_id,
        order_id: order,
        message,
        subject: &subject,
    };
    let request = ApiRequest::post("/api/support/contact").json(&data)?;
    let response = api.send(request).await?;

    let body = response.text().await?;
    let body: Acknowledgement = serde_json::from_str(&body)?;

    if body.success {
        Ok(())
    } else {
        Err(EndpointError::Unsuccessful {
            message: body.message,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    user_id: &'a UserId,
    order_id: &'a OrderId,
    message: &'a str,
    subject: &'a str,
}

#[derive(Debug, Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    success: bool,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, session::MemoryStore};
    use mockito::Matcher;
    use std::sync::Arc;
    use url::Url;

    #[tokio::test]
    async fn the_subject_names_the_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/support/contact")
            .match_body(Matcher::Json(serde_json::json!({
                "userId": "u1",
                "orderId": "64f1c2ab9e77d0a1b2c3d4e5",
                "message": "Where is my parcel?",
                "subject": "Support for Order #C3D4E5",
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;
        let config = Config::new(Url::parse(&server.url()).unwrap());
        let api = Storefront::new(config, Arc::new(MemoryStore::new())).unwrap();

        contact_support(
            &api,
            &UserId::from("u1"),
            &OrderId::from("64f1c2ab9e77d0a1b2c3d4e5"),
            "Where is my parcel?",
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }
}
