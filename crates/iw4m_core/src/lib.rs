//! Typed access to an IW4MAdmin web console.
//!
//! Pages are fetched through a [`SessionGateway`], parsed into a
//! [`Document`](document::Document) and walked by the extractors under
//! [`extract`]. [`Console`] ties the pieces together.

pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod request;

pub use console::{ClientLookup, Console, ConsoleSummary, FoundClient};
pub use error::{ConsoleError, Result};
pub use gateway::{CancelFlag, ConsoleClient, FetchControl, SessionGateway};
pub use request::FindPlayerQuery;
