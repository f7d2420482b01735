// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod adapter;
pub mod oidc;
pub mod options;
pub mod rollup;
pub mod session;
pub mod signin;

pub use adapter::{Adapter, Capabilities, StoreAdapter};
pub use oidc::{OidcClient, TokenSet};
pub use options::{AuthOptions, SessionStrategy};
pub use rollup::{rollup, OAuthUserConfig, RollupProvider, UserinfoClient};
pub use session::{resolve_session, SessionUser};
pub use signin::{complete_sign_in, SignInLocks};
