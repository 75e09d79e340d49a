use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{read_envelope, EndpointError},
    validation::{self, Registration, ValidationError},
};
use serde_derive::Serialize;

/// Create a new shopper account. The backend emails a one-time password
/// which must be passed to [`verify_otp()`] before the account can log in.
pub async fn register(
    api: &Storefront,
    registration: &Registration,
) -> Result<(), EndpointError> {
    let request = ApiRequest::post("/api/users/register").json(registration)?;
    let response = api.send(request).await?;

    read_envelope::<serde_json::Value>(response)
        .await?
        .require_success()?;
    log::info!("Registered {}, awaiting verification", registration.email);

    Ok(())
}

/// Confirm an email address with the code the backend sent to it.
pub async fn verify_otp(
    api: &Storefront,
    email: &str,
    otp: &str,
) -> Result<(), OtpError> {
    validation::validate_otp(otp)?;

    let data = VerifyData { email, otp };
    let request = ApiRequest::post("/api/users/verify-otp")
        .json(&data)
        .map_err(EndpointError::from)?;

    let result = match api.send(request).await {
        Ok(response) => read_envelope::<serde_json::Value>(response)
            .await
            .and_then(|envelope| envelope.require_success()),
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => {
            log::info!("Verified {}", email);
            Ok(())
        },
        Err(e) => Err(OtpError::from_endpoint(e)),
    }
}

/// Ask for a fresh verification code to be emailed out.
pub async fn resend_otp(api: &Storefront, email: &str) -> Result<(), EndpointError> {
    let request =
        ApiRequest::post("/api/users/resend-otp").json(&ResendData { email })?;
    let response = api.send(request).await?;

    read_envelope::<serde_json::Value>(response)
        .await?
        .require_success()?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct VerifyData<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Serialize)]
struct ResendData<'a> {
    email: &'a str,
}

/// Errors returned by [`verify_otp()`].
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    #[error("Verification code has expired. Please request a new one.")]
    Expired,
    #[error("Invalid verification code. Please try again.")]
    Rejected,
    #[error("Verification failed")]
    Endpoint(#[from] EndpointError),
}

impl OtpError {
    fn from_endpoint(error: EndpointError) -> OtpError {
        let message = error.server_message().unwrap_or_default();

        if message.contains("expired") {
            OtpError::Expired
        } else if message.contains("Invalid") {
            OtpError::Rejected
        } else {
            OtpError::Endpoint(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, session::MemoryStore};
    use mockito::Matcher;
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap());

        Storefront::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn register_a_new_shopper() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/register")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": "Passw0rd",
            })))
            .with_status(201)
            .with_body(r#"{"status":"success","message":"Verification code sent"}"#)
            .create_async()
            .await;
        let api = storefront(&server);
        let registration =
            validation::validate_registration("Asha", "asha@example.com", "Passw0rd")
                .unwrap();

        register(&api, &registration).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expired_codes_are_recognised() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/users/verify-otp")
            .with_status(400)
            .with_body(r#"{"message":"OTP has expired"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = verify_otp(&api, "asha@example.com", "123456").await.unwrap_err();

        assert!(matches!(err, OtpError::Expired));
    }

    #[tokio::test]
    async fn wrong_codes_are_recognised() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/users/verify-otp")
            .with_status(400)
            .with_body(r#"{"message":"Invalid OTP"}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = verify_otp(&api, "asha@example.com", "654321").await.unwrap_err();

        assert!(matches!(err, OtpError::Rejected));
    }

    #[tokio::test]
    async fn short_codes_are_rejected_locally() {
        let server = mockito::Server::new_async().await;
        let api = storefront(&server);

        let err = verify_otp(&api, "asha@example.com", "123").await.unwrap_err();

        assert!(matches!(err, OtpError::Invalid(ValidationError::InvalidOtp)));
    }
}
