//! Sign-in and sign-out.

use cartwheel_storefront::{SessionToken, ShopState};

use super::CliError;

/// Persist `token` and switch to the user's stored cart.
///
/// The local cart is kept if the backend will not return one.
pub async fn login(state: &ShopState, token: &str) -> Result<(), CliError> {
    let token = SessionToken::new(token).ok_or(CliError::InvalidArgument {
        field: "token",
        reason: "must not be empty",
    })?;

    state.set_token(token.clone())?;
    if let Err(e) = state.load_user_cart(&token).await {
        tracing::warn!(error = %e, "Signed in but the stored cart could not be loaded");
    }

    #[allow(clippy::print_stdout)]
    {
        println!("{} item(s) in cart.", state.cart_count());
    }
    Ok(())
}

/// Remove the stored token and empty the cart.
///
/// The confirmation arrives as a notice.
pub fn logout(state: &ShopState) -> Result<(), CliError> {
    state.sign_out()?;
    Ok(())
}
