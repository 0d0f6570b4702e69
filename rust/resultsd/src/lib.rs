//! Data access and session layer for the results application.
//!
//! [`client::ResultsClient`] is the facade callers use: sign-in/sign-up,
//! role checks, whole-collection save/get, cleanup and live listeners. It is
//! written against two seams, [`store::DataStore`] and
//! [`auth::AuthProvider`], with workspace-backed implementations of both.
//! The `resultsd` binary serves the facade over JSON lines via [`ipc`].

pub mod auth;
pub mod backup;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod store;
pub mod subscription;

pub use auth::{AuthProvider, Identity, LocalAuth};
pub use client::{
    AuthEvent, AuthOutcome, CleanupReport, Collection, ConnectionState, ResultsClient, Role,
    SignUpProfile, UserRecord,
};
pub use error::{AuthError, StoreError};
pub use store::{DataStore, DbPath, SqliteStore};
pub use subscription::Subscription;
