// SPDX-License-Identifier: Apache-2.0

//! Asset browsing and selection for imgix sources.
//!
//! The crate is built around [`controller::Controller`], a state machine that
//! turns source selection, paging and searching into at most one outbound
//! asset query per transition, and applies the results in order.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod notices;
pub mod query;
pub mod session;
pub mod upload;
pub mod urls;

pub use config::{AppConfig, Credentials};
pub use controller::{Action, Applied, Controller, FetchRequest, Snapshot};
pub use error::ApiError;
pub use fetch::{CollectionApi, ImgixClient};
pub use models::asset::Asset;
pub use models::page::PageInfo;
pub use models::payload::RawCollectionPayload;
pub use models::source::Source;
pub use notices::{ErrorKind, ErrorQueue, ErrorRecord};
pub use query::{AssetQuery, PAGE_SIZE};
pub use session::{Session, SessionHandle};
