#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod block;
mod chain;
mod clock;
pub mod config;
mod error;
pub mod http;
mod verify;

pub use block::{Block, BlockHash};
pub use chain::{Blockchain, GENESIS_DATA, SUBMISSION_WINDOW, StarRequest, Violation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ChainError;
pub use verify::{AcceptAll, SignatureVerifier};
