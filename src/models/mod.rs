// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod profile;
pub mod session;
pub mod user;

pub use account::{AccountRef, AccountType, LinkedAccount, LinkedAccountRecord};
pub use profile::{Profile, ProfileExtensions, RollupProfile};
pub use session::{AdapterSession, SessionPatch, VerificationToken};
pub use user::{NewUser, User, UserFields, UserPatch};
