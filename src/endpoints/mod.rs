//! The storefront backend's endpoints.

pub mod admin;
mod cart;
mod checkout;
mod login;
mod logout;
mod orders;
mod products;
mod refresh;
mod register;
mod support;
mod wishlist;

pub use cart::{add_to_cart, change_quantity, get_cart, remove_from_cart};
pub use checkout::{
    create_payment, payment_success, place_cod_order, verify_payment,
    GatewayResponse, PaymentOrder,
};
pub use login::{login, LoginError};
pub use logout::logout;
pub use orders::{cancel_order, list_orders, Cancellation};
pub use products::{list_products, product_details, products_by_category};
pub use refresh::refresh_session;
pub use register::{register, resend_otp, verify_otp, OtpError};
pub use support::contact_support;
pub use wishlist::{add_to_wishlist, get_wishlist, remove_from_wishlist};

use crate::session::{EntryPoint, StoreError};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] reqwest::Error),
    #[error("Unable to construct the request URL")]
    Url(#[from] url::ParseError),
    /// Unable to parse the JSON in the response.
    #[error("Unable to parse the response")]
    Json(#[from] serde_json::Error),
    /// The server responded with an error status.
    #[error("The server rejected the request with {}", status)]
    Rejected { status: StatusCode, body: ErrorBody },
    /// The server said the request didn't succeed, despite the status code.
    #[error("The request was unsuccessful")]
    Unsuccessful { message: Option<String> },
    #[error("The response didn't contain any data")]
    MissingData,
    /// The session expired and couldn't be refreshed. The local session has
    /// been cleared.
    #[error("Session expired. Please login again")]
    SessionExpired { entry_point: EntryPoint },
    #[error("Please login to continue")]
    NotLoggedIn,
    #[error("Unable to access the local session")]
    Store(#[from] StoreError),
}

impl EndpointError {
    /// The HTTP status the server responded with, if we got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EndpointError::Rejected { status, .. } => Some(*status),
            EndpointError::HttpClient(e) => e.status(),
            _ => None,
        }
    }

    /// The server's explanation for rejecting the request, if it gave one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            EndpointError::Rejected { body, .. } => body.message.as_deref(),
            EndpointError::Unsuccessful { message } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, EndpointError::SessionExpired { .. })
    }

    /// A message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            EndpointError::Rejected { status, body } => match &body.message {
                Some(message) => message.clone(),
                None => format!("Server error: {}", status.as_u16()),
            },
            EndpointError::HttpClient(e)
                if e.is_connect() || e.is_timeout() || e.is_request() =>
            {
                String::from("Network error: Unable to connect to server. Please check if the server is running.")
            },
            EndpointError::Unsuccessful {
                message: Some(message),
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The body the backend sends along with an error status.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub requires_registration: bool,
}

/// The wrapper around every successful response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) status: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) data: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// Fail unless the server explicitly said the request succeeded.
    pub(crate) fn require_success(self) -> Result<Self, EndpointError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(EndpointError::Unsuccessful {
                message: self.message,
            })
        }
    }
}

pub(crate) async fn read_envelope<T>(
    response: Response,
) -> Result<Envelope<T>, EndpointError>
where
    T: DeserializeOwned,
{
    let body = response.text().await?;
    log::trace!("Response: {}", body);

    if body.trim().is_empty() {
        return Ok(Envelope {
            status: None,
            message: None,
            data: None,
        });
    }

    serde_json::from_str(&body).map_err(EndpointError::from)
}

/// Read the envelope's `data`, which must be present.
pub(crate) async fn read_data<T>(response: Response) -> Result<T, EndpointError>
where
    T: DeserializeOwned,
{
    read_envelope(response)
        .await?
        .data
        .ok_or(EndpointError::MissingData)
}

/// Read the envelope's `data`, treating a missing or `null` payload as the
/// default (e.g. an empty list).
pub(crate) async fn read_data_or_default<T>(
    response: Response,
) -> Result<T, EndpointError>
where
    T: DeserializeOwned + Default,
{
    Ok(read_envelope(response).await?.data.unwrap_or_default())
}

/// Does this response carry data at all?
pub fn is_valid_response(body: &serde_json::Value) -> bool {
    matches!(body.get("data"), Some(data) if !data.is_null())
}
