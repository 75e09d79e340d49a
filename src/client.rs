//! The HTTP plumbing shared by every endpoint.
//!
//! Every request goes through [`Storefront::send()`], which attaches the
//! cached bearer token and transparently refreshes an expired session once
//! before giving up.

use crate::{
    config::Config,
    endpoints::{EndpointError, ErrorBody},
    products::{ProductForm, ProductImage},
    session::{Role, Session, SessionStore, StoreError},
};
use reqwest::{
    multipart::{Form, Part},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::Serialize;
use serde_derive::Deserialize;
use std::sync::Arc;

/// Requests which must never kick off a session refresh, either because they
/// establish a session in the first place or because they *are* the refresh.
const REFRESH_EXEMPT: &[&str] = &[
    "/api/users/login",
    "/api/admin/login",
    "/api/users/register",
    "/api/users/verify-otp",
    "/api/users/resend-otp",
    "/api/users/refresh-token",
    "/api/admin/refresh-token",
];

/// A description of a request which can be rebuilt as many times as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Payload,
    retried: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Empty,
    Json(serde_json::Value),
    Product(ProductForm),
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body: Payload::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self { ApiRequest::new(Method::GET, path) }

    pub fn post(path: impl Into<String>) -> Self { ApiRequest::new(Method::POST, path) }

    pub fn put(path: impl Into<String>) -> Self { ApiRequest::new(Method::PUT, path) }

    pub fn delete(path: impl Into<String>) -> Self {
        ApiRequest::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(
        mut self,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        self.body = Payload::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a product upload as a multipart form.
    pub fn product_form(mut self, form: ProductForm) -> Self {
        self.body = Payload::Product(form);
        self
    }

    pub fn method(&self) -> &Method { &self.method }

    pub fn path(&self) -> &str { &self.path }

    /// Has this request already been replayed after a session refresh?
    pub fn is_retry(&self) -> bool { self.retried }

    /// Is this one of the requests that may not trigger a refresh?
    pub fn is_refresh_exempt(&self) -> bool {
        REFRESH_EXEMPT.contains(&self.path.as_str())
    }

    fn into_retry(self) -> Self {
        ApiRequest {
            retried: true,
            ..self
        }
    }

    fn build(&self, builder: RequestBuilder) -> Result<RequestBuilder, reqwest::Error> {
        match &self.body {
            Payload::Empty => Ok(builder),
            Payload::Json(body) => Ok(builder.json(body)),
            Payload::Product(form) => Ok(builder.multipart(multipart(form)?)),
        }
    }
}

fn multipart(product: &ProductForm) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();

    for (name, value) in product.text_fields() {
        form = form.text(name, value);
    }

    form = match &product.image {
        ProductImage::Url(url) => form.text("image", url.clone()),
        ProductImage::File {
            filename,
            mime_type,
            contents,
        } => {
            let part = Part::bytes(contents.clone())
                .file_name(filename.clone())
                .mime_str(mime_type)?;
            form.part("image", part)
        },
    };

    Ok(form)
}

/// Should this response trigger a silent session refresh?
///
/// Only authorization failures qualify, and never for a request that was
/// already replayed or one that is part of logging in.
pub fn needs_refresh(request: &ApiRequest, status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
        && !request.is_retry()
        && !request.is_refresh_exempt()
}

/// A connection to the storefront backend.
#[derive(Clone)]
pub struct Storefront {
    client: Client,
    config: Config,
    store: Arc<dyn SessionStore>,
}

impl Storefront {
    pub fn new(
        config: Config,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, reqwest::Error> {
        // the backend keeps its session in cookies, so we need to remember
        // them between requests
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Storefront::with_client(client, config, store))
    }

    /// Use an existing HTTP client. It should have a cookie store enabled.
    pub fn with_client(
        client: Client,
        config: Config,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Storefront {
            client,
            config,
            store,
        }
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn store(&self) -> &dyn SessionStore { &*self.store }

    /// The locally cached session, if any.
    pub fn session(&self) -> Result<Option<Session>, StoreError> { self.store.load() }

    /// The role of whoever is logged in, assuming a shopper when nobody is.
    pub fn role(&self) -> Result<Role, StoreError> {
        Ok(self.session()?.map(|s| s.role).unwrap_or_default())
    }

    /// Send a request, refreshing the session and replaying the request once
    /// if the backend says we aren't authorized.
    ///
    /// If the refresh fails, the local session is cleared and
    /// [`EndpointError::SessionExpired`] says where to send the user.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, EndpointError> {
        let response = self.execute(&request).await?;

        if !needs_refresh(&request, response.status()) {
            return check_status(response).await;
        }

        let role = self.role()?;
        log::warn!(
            "\"{}\" was rejected as unauthorized, refreshing the {} session",
            request.path(),
            role
        );

        if let Err(e) = self.refresh(role).await {
            log::warn!("Unable to refresh the session: {}", e);
            if let Err(e) = self.store.clear() {
                log::error!("Unable to forget the expired session: {}", e);
            }

            return Err(EndpointError::SessionExpired {
                entry_point: role.expired_entry_point(),
            });
        }

        let retry = request.into_retry();
        let response = self.execute(&retry).await?;

        check_status(response).await
    }

    /// Ask the backend to re-issue the session cookies for this role.
    pub(crate) async fn refresh(&self, role: Role) -> Result<(), EndpointError> {
        let request = ApiRequest::post(role.refresh_path());
        let response = check_status(self.execute(&request).await?).await?;

        let body = response.text().await?;
        log::trace!("Response: {}", body);

        // some deployments hand out a new bearer token as well
        if let Ok(refreshed) = serde_json::from_str::<RefreshEnvelope>(&body) {
            if let Some(token) = refreshed.data.and_then(|d| d.jwt_token) {
                if let Some(mut session) = self.store.load()? {
                    session.token = Some(token);
                    self.store.save(&session)?;
                }
            }
        }

        log::debug!("Refreshed the {} session", role);
        Ok(())
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Response, EndpointError> {
        let url = self.config.url(request.path())?;

        log::debug!("Sending a {} request to {}", request.method(), url);
        log::trace!("Payload: {:#?}", request.body);

        let mut builder = self.client.request(request.method().clone(), url);
        if let Some(token) = self.session()?.and_then(|s| s.token) {
            builder = builder.bearer_auth(token);
        }

        let response = match request.build(builder)?.send().await {
            Ok(response) => response,
            Err(e) => {
                diagnose(&e, &self.config);
                return Err(e.into());
            },
        };

        log::trace!("Headers: {:#?}", response.headers());

        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!(
                "Server error from \"{}\", there may be a database connection issue",
                request.path()
            );
        }

        Ok(response)
    }
}

/// Log a hint about why the backend couldn't be reached.
fn diagnose(error: &reqwest::Error, config: &Config) {
    if error.is_timeout() {
        log::error!("Request timeout - server may be down or slow");
    } else if error.is_connect() {
        log::error!(
            "Network error - please check if the server is running on {}",
            config.base_url
        );
    }
}

/// Turn an unsuccessful response into an [`EndpointError::Rejected`],
/// keeping whatever the server said about it.
pub(crate) async fn check_status(response: Response) -> Result<Response, EndpointError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::trace!("Error response ({}): {}", status, body);

    let body: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

    Err(EndpointError::Rejected { status, body })
}

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    data: Option<RefreshData>,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    jwt_token: Option<String>,
}
