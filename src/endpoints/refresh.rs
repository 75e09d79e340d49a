use crate::{client::Storefront, endpoints::EndpointError, session::Role};

/// Ask the backend to re-issue the session cookies for `role`.
///
/// [`Storefront::send()`] already does this automatically when a request is
/// rejected as unauthorized; this is for refreshing ahead of time.
pub async fn refresh_session(
    api: &Storefront,
    role: Role,
) -> Result<(), EndpointError> {
    api.refresh(role).await
}
