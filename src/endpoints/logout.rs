use crate::{
    client::{ApiRequest, Storefront},
    endpoints::EndpointError,
    session::EntryPoint,
};

/// Tell the server to invalidate the current session, logging the user out.
///
/// The local session is forgotten even if the server couldn't be reached,
/// so the only errors come from clearing the local store. Returns where the
/// user should be taken next.
pub async fn logout(api: &Storefront) -> Result<EntryPoint, EndpointError> {
    let role = api.role()?;

    match api.send(ApiRequest::post(role.logout_path())).await {
        Ok(_) => log::info!("Logged out"),
        Err(e) => log::warn!("The logout request failed, continuing anyway: {}", e),
    }

    api.store().clear()?;

    Ok(role.logout_entry_point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        id::UserId,
        session::{MemoryStore, Session},
    };
    use std::sync::Arc;
    use url::Url;

    fn storefront(server: &mockito::Server, session: Session) -> Storefront {
        let config = Config::new(Url::parse(&server.url()).unwrap());

        Storefront::new(config, Arc::new(MemoryStore::with_session(session)))
            .unwrap()
    }

    #[tokio::test]
    async fn shoppers_go_back_to_the_login_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/users/logout")
            .with_status(200)
            .create_async()
            .await;
        let api = storefront(
            &server,
            Session::user(UserId::from("u1"), "Asha", "asha@example.com"),
        );

        let next = logout(&api).await.unwrap();

        mock.assert_async().await;
        assert_eq!(next, EntryPoint::Login);
        assert_eq!(api.session().unwrap(), None);
    }

    #[tokio::test]
    async fn admins_are_logged_out_even_when_the_server_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/admin/logout")
            .with_status(500)
            .create_async()
            .await;
        let api = storefront(&server, Session::admin("Root", "root@example.com", None));

        let next = logout(&api).await.unwrap();

        assert_eq!(next, EntryPoint::Home);
        assert_eq!(api.session().unwrap(), None);
    }
}
