//! Services backed by the database layer.

#![allow(missing_docs)]

pub mod catalog;
pub mod identity;
pub mod tally_cache;
pub mod vote_ledger;

pub use catalog::CatalogService;
pub use identity::{IdentityProvider, IdentityProviderService, ProfileIdentityProvider, Voter};
pub use tally_cache::{
    NoOpInvalidator, TallyCache, TallyMiss, ViewInvalidator, ViewInvalidatorService,
};
pub use vote_ledger::{LedgerSubmitter, VoteLedgerService};
