//! Session-aware REST gateway for the admin console: single-flight token refresh, fingerprinted
//! requests, role-gated navigation, and route guards.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig,
		gateway::{Gateway, ReqwestGateway},
		http::ReqwestHttpClient,
		session::SessionHandle,
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a [`ClientConfig`] pointing at a mock server base URL with the `/api` prefix.
	pub fn test_config(base_url: &str) -> ClientConfig {
		let base = Url::parse(base_url).expect("Mock server base URL should parse.");

		ClientConfig::new(base, "/api")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store and a fresh session, returning the
	/// store and session handles so tests can inspect side effects.
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestGateway, Arc<MemoryStore>, SessionHandle) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let session = SessionHandle::default();
		let gateway = Gateway::with_http_client(
			test_config(base_url),
			session.clone(),
			store,
			ReqwestHttpClient::new().expect("Cookie-enabled reqwest client should build."),
		);

		(gateway, store_backend, session)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
