//! Core domain types shared by every component of the custodial transaction
//! orchestrator: key material, origin transactions, dispatch statuses,
//! outbound events and amount arithmetic.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod amount;
pub use amount::{bump_approval, parse_amount, AmountError};

pub mod dispatch;
pub use dispatch::DispatchStatus;

pub mod event;
pub use event::Event;

pub mod keypair;
pub use keypair::KeyPair;

pub mod otx;
pub use otx::{Otx, OtxType};
