//! Client-side state for a single shopper.
//!
//! [`Shop`] owns the connection to the backend plus the cached catalogue,
//! cart, wishlist and login status, and keeps them consistent as the
//! shopper does things. Every mutation goes to the server first and the
//! affected list is re-fetched afterwards.
//!
//! Whenever the backend reports that the session expired and couldn't be
//! refreshed, all of the cached state is thrown away.

use crate::{
    cart::Cart,
    checkout::{CheckoutError, OrderSummary},
    client::Storefront,
    endpoints::{self, admin, EndpointError, LoginError},
    id::{CartItemId, ProductId, UserId},
    products::Product,
    session::{EntryPoint, Role, Session, StoreError},
};
use reqwest::StatusCode;

pub struct Shop {
    api: Storefront,
    session: Option<Session>,
    logged_in: bool,
    products: Vec<Product>,
    cart: Cart,
    wishlist: Vec<Product>,
}

impl Shop {
    pub fn new(api: Storefront) -> Self {
        Shop {
            api,
            session: None,
            logged_in: false,
            products: Vec::new(),
            cart: Cart::default(),
            wishlist: Vec::new(),
        }
    }

    pub fn api(&self) -> &Storefront { &self.api }

    pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

    pub fn is_logged_in(&self) -> bool { self.logged_in }

    pub fn products(&self) -> &[Product] { &self.products }

    pub fn cart(&self) -> &Cart { &self.cart }

    pub fn wishlist(&self) -> &[Product] { &self.wishlist }

    /// Adopt the cached session without asking the server about it,
    /// returning whether it looks like a usable login.
    pub fn restore_session(&mut self) -> Result<bool, StoreError> {
        match self.api.session()? {
            Some(session) if session.is_logged_in() => {
                self.handle_login_success(session);
            },
            _ => self.reset(),
        }

        Ok(self.logged_in)
    }

    /// Work out whether the cached session is still good by making a
    /// request that needs it.
    ///
    /// Only an authorization failure logs the user out. Any other failure
    /// leaves them logged in with the cached session.
    pub async fn check_authentication(&mut self) -> Result<bool, EndpointError> {
        if !self.restore_session()? {
            return Ok(false);
        }

        let outcome = match self.session.as_ref().map(|s| (s.role, s.user_id.clone())) {
            Some((Role::User, Some(user_id))) => {
                endpoints::get_cart(&self.api, &user_id).await.map(Some)
            },
            _ => admin::users(&self.api).await.map(|_| None),
        };

        match outcome {
            Ok(Some(cart)) => self.cart = cart,
            Ok(None) => {},
            Err(e) if e.is_session_expired() => {
                log::info!("The cached session has expired");
                self.reset();
            },
            Err(e) if e.status() == Some(StatusCode::UNAUTHORIZED) => {
                log::info!("The cached session was rejected: {}", e);
                self.api.store().clear()?;
                self.reset();
            },
            Err(e) => {
                log::warn!("Unable to check the cached session: {}", e);
            },
        }

        Ok(self.logged_in)
    }

    /// Log in, returning the page the user should land on.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<EntryPoint, LoginError> {
        let session = endpoints::login(&self.api, email, password).await?;
        let landing = session.role.landing_entry_point();

        self.handle_login_success(session);

        Ok(landing)
    }

    /// Adopt a freshly created session.
    pub fn handle_login_success(&mut self, session: Session) {
        log::debug!("Adopting the session for {}", session.name);

        self.session = Some(session);
        self.logged_in = true;
    }

    /// Log out and forget everything about the user. The local state is
    /// cleared even when the server couldn't be told.
    pub async fn logout(&mut self) -> Result<EntryPoint, EndpointError> {
        let next = endpoints::logout(&self.api).await;
        self.reset();

        next
    }

    pub async fn fetch_products(&mut self) -> Result<(), EndpointError> {
        match endpoints::list_products(&self.api).await {
            Ok(products) => {
                self.products = products;
                Ok(())
            },
            Err(e) => {
                self.products.clear();
                Err(self.observe(e))
            },
        }
    }

    /// Reload the cart, skipping any entries that are no longer valid.
    pub async fn fetch_cart(&mut self) -> Result<(), EndpointError> {
        let user_id = match self.user_id() {
            Some(user_id) => user_id,
            None => {
                self.cart.clear();
                return Ok(());
            },
        };

        match endpoints::get_cart(&self.api, &user_id).await {
            Ok(cart) => {
                self.cart = cart;
                Ok(())
            },
            Err(e) => {
                self.cart.clear();
                Err(self.observe(e))
            },
        }
    }

    pub async fn fetch_wishlist(&mut self) -> Result<(), EndpointError> {
        let user_id = match self.user_id() {
            Some(user_id) if self.logged_in => user_id,
            _ => return Ok(()),
        };

        match endpoints::get_wishlist(&self.api, &user_id).await {
            Ok(wishlist) => {
                self.wishlist = wishlist;
                Ok(())
            },
            Err(e) => {
                self.wishlist.clear();
                Err(self.observe(e))
            },
        }
    }

    pub async fn add_to_cart(&mut self, product: &ProductId) -> Result<(), EndpointError> {
        let user_id = self.require_user()?;

        if let Err(e) = endpoints::add_to_cart(&self.api, &user_id, product).await {
            return Err(self.observe(e));
        }

        self.fetch_cart().await
    }

    pub async fn remove_from_cart(
        &mut self,
        product: &ProductId,
    ) -> Result<(), EndpointError> {
        let user_id = self.require_user()?;

        if let Err(e) = endpoints::remove_from_cart(&self.api, &user_id, product).await {
            return Err(self.observe(e));
        }

        self.fetch_cart().await
    }

    pub async fn change_quantity(
        &mut self,
        item: &CartItemId,
        change: i32,
    ) -> Result<(), EndpointError> {
        let user_id = self.require_user()?;

        if let Err(e) =
            endpoints::change_quantity(&self.api, &user_id, item, change).await
        {
            return Err(self.observe(e));
        }

        self.fetch_cart().await
    }

    pub async fn add_to_wishlist(
        &mut self,
        product: &ProductId,
    ) -> Result<(), EndpointError> {
        let user_id = self.require_user()?;

        if let Err(e) = endpoints::add_to_wishlist(&self.api, &user_id, product).await {
            return Err(self.observe(e));
        }

        self.fetch_wishlist().await
    }

    pub async fn remove_from_wishlist(
        &mut self,
        product: &ProductId,
    ) -> Result<(), EndpointError> {
        let user_id = self.require_user()?;

        if let Err(e) =
            endpoints::remove_from_wishlist(&self.api, &user_id, product).await
        {
            return Err(self.observe(e));
        }

        self.fetch_wishlist().await
    }

    /// The value of every valid line in the cart.
    pub fn total_price(&self) -> f64 { self.cart.total() }

    pub fn is_in_cart(&self, product: &ProductId) -> bool { self.cart.contains(product) }

    pub fn is_in_wishlist(&self, product: &ProductId) -> bool {
        self.wishlist.iter().any(|p| &p.id == product)
    }

    /// Make sure the shopper can check out, and work out what they'll pay.
    pub fn begin_checkout(&self) -> Result<OrderSummary, CheckoutError> {
        if self.user_id().is_none() {
            return Err(CheckoutError::NotLoggedIn);
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(OrderSummary::for_subtotal(self.total_price()))
    }

    /// Called when the shopper comes back from a successful payment.
    pub async fn confirm_payment(&mut self) -> Result<(), EndpointError> {
        if let Err(e) = endpoints::payment_success(&self.api).await {
            return Err(self.observe(e));
        }

        self.cart.clear();
        Ok(())
    }

    fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().and_then(|s| s.user_id.clone())
    }

    fn require_user(&self) -> Result<UserId, EndpointError> {
        self.user_id().ok_or(EndpointError::NotLoggedIn)
    }

    /// Drop all cached state if the error means the session is gone.
    fn observe(&mut self, error: EndpointError) -> EndpointError {
        if error.is_session_expired() {
            self.reset();
        }

        error
    }

    fn reset(&mut self) {
        self.session = None;
        self.logged_in = false;
        self.cart.clear();
        self.wishlist.clear();
    }
}
