//! # Warden (Identity & Ban State Authority)
//!
//! `warden` is the authoritative record of users and bans for a game client
//! and its administrative panel. Clients authenticate through a third-party
//! OAuth provider or submit identity claims directly; every login binds the
//! account to a hardware fingerprint, is checked against the ban list, and is
//! announced to an external webhook channel.
//!
//! ## Record sets
//!
//! Users and bans live in two independent JSON files, one object per set,
//! keyed by the provider-issued identity id. All mutations to a set are
//! serialized through a single exclusive owner so concurrent logins and
//! admin actions can never lose updates; reads serve the latest committed
//! snapshot without blocking.
//!
//! ## Hardware binding
//!
//! Repeat logins are checked against the bound fingerprint under one of two
//! configurable policies: `strict` rejects a mismatch outright, `lenient`
//! rebinds to the incoming value, last writer wins.
//!
//! ## Sessions & roles
//!
//! Sessions are in-memory, hashed-token credentials with a default and an
//! extended "remember me" lifetime. The identity matching the configured
//! owner id gets the `owner` role at issuance; owner-only panel routes check
//! that capability once at handler entry, before touching any record set.

pub mod api;
pub mod bans;
pub mod captcha;
pub mod cli;
pub mod ledger;
pub mod notify;
pub mod oauth;
pub mod session;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
