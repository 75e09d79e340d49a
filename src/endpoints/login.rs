use crate::{
    client::{ApiRequest, Storefront},
    endpoints::{read_envelope, EndpointError, ErrorBody},
    id::UserId,
    session::{Role, Session, StoreError},
    validation::{self, ValidationError},
};
use reqwest::StatusCode;
use serde_derive::{Deserialize, Serialize};

/// Authenticate with the storefront and remember the new [`Session`].
///
/// The configured admin email logs in through the admin endpoint, everyone
/// else is a shopper.
pub async fn login(
    api: &Storefront,
    email: &str,
    password: &str,
) -> Result<Session, LoginError> {
    let credentials = validation::validate_login(email, password)?;
    let role = if api.config().is_admin_email(&credentials.email) {
        Role::Admin
    } else {
        Role::User
    };

    let data = Data {
        email: &credentials.email,
        password: &credentials.password,
    };
    let request = ApiRequest::post(role.login_path())
        .json(&data)
        .map_err(EndpointError::from)?;

    let response = match api.send(request).await {
        Ok(response) => response,
        Err(EndpointError::Rejected { status, body }) => {
            return Err(LoginError::from_rejection(status, body));
        },
        Err(other) => return Err(other.into()),
    };

    let envelope = read_envelope::<LoginResponse>(response).await?;
    log::trace!("Parsed response: {:#?}", envelope);

    let session = match envelope.data {
        Some(data) if envelope.status.as_deref() == Some("success") => {
            interpret_response(role, &credentials.email, data)?
        },
        _ => return Err(LoginError::BadResponse),
    };

    api.store().save(&session)?;
    log::info!("Logged in as {} ({})", session.name, role);

    Ok(session)
}

fn interpret_response(
    role: Role,
    email: &str,
    response: LoginResponse,
) -> Result<Session, LoginError> {
    let LoginResponse {
        user_id,
        name,
        email: returned_email,
        jwt_token,
    } = response;

    match role {
        Role::Admin => Ok(Session::admin(
            name.as_deref().unwrap_or("Admin"),
            email,
            jwt_token,
        )),
        Role::User => {
            let user_id = user_id.ok_or(LoginError::MissingUserId)?;
            let mut session = Session::user(
                user_id,
                name.as_deref().unwrap_or("User"),
                returned_email.as_deref().unwrap_or(email),
            );
            session.token = jwt_token;

            Ok(session)
        },
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct LoginResponse {
    #[serde(rename = "userID")]
    user_id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
    jwt_token: Option<String>,
}

#[derive(Copy, Clone, Serialize)]
struct Data<'a> {
    email: &'a str,
    password: &'a str,
}

/// Possible errors that may be returned by [`login()`].
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    /// Nobody has registered with that email address.
    #[error("Email not registered. Please sign up to create an account.")]
    NotRegistered,
    /// The account exists, but the email still needs to be verified with a
    /// one-time password.
    #[error("Please verify your email before logging in.")]
    VerificationRequired,
    /// A catch-all for when the server rejects a login request and we can't
    /// figure out a more specific error.
    #[error("Login was rejected by the server ({}): {}", status, message)]
    RejectedByServer { status: StatusCode, message: String },
    #[error("User ID not received from server")]
    MissingUserId,
    #[error("Invalid response structure from server")]
    BadResponse,
    #[error("Unable to send the login request")]
    Endpoint(#[from] EndpointError),
    #[error("Unable to save the session")]
    Store(#[from] StoreError),
}

impl LoginError {
    fn from_rejection(status: StatusCode, body: ErrorBody) -> LoginError {
        if status == StatusCode::NOT_FOUND && body.requires_registration {
            return LoginError::NotRegistered;
        }
        if status == StatusCode::UNAUTHORIZED && body.requires_verification {
            return LoginError::VerificationRequired;
        }

        let message = match body.message {
            Some(message) => message,
            None if status == StatusCode::UNAUTHORIZED => {
                String::from("Invalid email or password")
            },
            None if status == StatusCode::BAD_REQUEST => {
                String::from("Invalid input data")
            },
            None if status.is_server_error() => {
                String::from("Server error. Please try again later.")
            },
            None => String::from("Login failed"),
        };

        LoginError::RejectedByServer { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, session::MemoryStore};
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap())
            .with_admin_email("admin@motlupets.in");

        Storefront::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn shoppers_need_a_user_id() {
        let response = LoginResponse {
            user_id: None,
            name: Some(String::from("Asha")),
            email: None,
            jwt_token: None,
        };

        let err = interpret_response(Role::User, "asha@example.com", response)
            .unwrap_err();

        assert!(matches!(err, LoginError::MissingUserId));
    }

    #[test]
    fn names_and_emails_have_fallbacks() {
        let response = LoginResponse {
            user_id: Some(UserId::from("u1")),
            name: None,
            email: None,
            jwt_token: None,
        };

        let got =
            interpret_response(Role::User, "asha@example.com", response).unwrap();

        assert_eq!(got, Session::user(UserId::from("u1"), "User", "asha@example.com"));
    }

    #[test]
    fn rejections_are_classified() {
        let unverified = ErrorBody {
            requires_verification: true,
            ..Default::default()
        };
        let unregistered = ErrorBody {
            requires_registration: true,
            ..Default::default()
        };

        assert!(matches!(
            LoginError::from_rejection(StatusCode::UNAUTHORIZED, unverified),
            LoginError::VerificationRequired
        ));
        assert!(matches!(
            LoginError::from_rejection(StatusCode::NOT_FOUND, unregistered),
            LoginError::NotRegistered
        ));
        match LoginError::from_rejection(StatusCode::UNAUTHORIZED, ErrorBody::default()) {
            LoginError::RejectedByServer { message, .. } => {
                assert_eq!(message, "Invalid email or password")
            },
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn shopper_login_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/login")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "email": "asha@example.com",
                "password": "Passw0rd",
            })))
            .with_status(200)
            .with_body(r#"{"status":"success","message":"Login successful","data":{"userID":"u1","name":"Asha","email":"asha@example.com"}}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let session = login(&api, " Asha@Example.com", "Passw0rd").await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.user_id, Some(UserId::from("u1")));
        assert_eq!(api.session().unwrap(), Some(session));
    }

    #[tokio::test]
    async fn the_admin_email_uses_the_admin_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/admin/login")
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"name":"Root","jwt_token":"t0k3n"}}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let session = login(&api, "admin@motlupets.in", "secret").await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.token.as_deref(), Some("t0k3n"));
    }

    #[tokio::test]
    async fn unverified_accounts_are_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/users/login")
            .with_status(401)
            .with_body(r#"{"message":"Please verify your email","requiresVerification":true}"#)
            .create_async()
            .await;
        let api = storefront(&server);

        let err = login(&api, "new@example.com", "Passw0rd").await.unwrap_err();

        assert!(matches!(err, LoginError::VerificationRequired));
        assert_eq!(api.session().unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_server() {
        let server = mockito::Server::new_async().await;
        let api = storefront(&server);

        let err = login(&api, "not-an-email", "Passw0rd").await.unwrap_err();

        assert!(matches!(err, LoginError::Invalid(ValidationError::InvalidEmail)));
    }
}
