//! Cart, wishlist and saved-for-later state stored in the session.
//!
//! The stores are owned by the visitor's session: each is serialized under
//! its own key and loaded per request. There is no cross-device sync.

use tonewood_core::cart::Cart;
use tonewood_core::wishlist::{SavedForLater, Wishlist};
use tower_sessions::Session;

/// Session keys for storefront state.
pub mod keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for items moved out of the cart to buy later.
    pub const SAVED_FOR_LATER: &str = "saved_for_later";
}

/// Typed access to the session-owned stores.
///
/// Missing keys read as empty stores.
pub struct SessionStores<'a> {
    session: &'a Session,
}

impl<'a> SessionStores<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Load the cart.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be read.
    pub async fn cart(&self) -> Result<Cart, tower_sessions::session::Error> {
        Ok(self.session.get(keys::CART).await?.unwrap_or_default())
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be written.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CART, cart).await
    }

    /// Load the wishlist.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be read.
    pub async fn wishlist(&self) -> Result<Wishlist, tower_sessions::session::Error> {
        Ok(self.session.get(keys::WISHLIST).await?.unwrap_or_default())
    }

    /// Persist the wishlist.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be written.
    pub async fn save_wishlist(
        &self,
        wishlist: &Wishlist,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::WISHLIST, wishlist).await
    }

    /// Load saved-for-later items.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be read.
    pub async fn saved_for_later(&self) -> Result<SavedForLater, tower_sessions::session::Error> {
        Ok(self
            .session
            .get(keys::SAVED_FOR_LATER)
            .await?
            .unwrap_or_default())
    }

    /// Persist saved-for-later items.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the session cannot be written.
    pub async fn save_saved_for_later(
        &self,
        saved: &SavedForLater,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::SAVED_FOR_LATER, saved).await
    }
}
