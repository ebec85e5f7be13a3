//! # Tokr Client
//!
//! A Rust client library for the tokr programs on Solana: cap tables, investment DAO governance,
//! identity verification and permissioned lists.
//!
//! Every program is driven the same way: derive the program addresses from typed seeds, encode
//! the instruction arguments with the program's schema, and assemble an instruction with the
//! accounts in the exact order the program expects. Signing and sending is left to a
//! [`Submitter`], reading accounts to an [`AccountSource`].
//!
//! ## Features
//!
//! - **Address Derivation**: Program-derived addresses computed exactly as the runtime does
//! - **Schema Codec**: Instruction and account layouts declared once as static schemas
//! - **Domain Adapters**: One builder per on-chain instruction of each program
//! - **Async Support**: Optional async client behind the `async` feature
//!
//! ## Usage
//!
//! ```rust
//! use tokr_client::config::{Cluster, ProgramRegistry};
//! use tokr_client::permissioned_list::PermissionedList;
//! use solana_sdk::pubkey::Pubkey;
//!
//! let registry = ProgramRegistry::for_cluster(Cluster::Devnet);
//! let list = PermissionedList::from_registry(&registry);
//!
//! // Add a user to the signer's list
//! let signer = Pubkey::new_unique();
//! let user = Pubkey::new_unique();
//! let ix = list.add_user_instruction(&signer, &user).unwrap();
//! assert_eq!(ix.accounts.len(), 5);
//! ```

pub mod cap_table;
pub mod codec;
pub mod config;
pub mod error;
pub mod governance;
pub mod identity;
pub mod instruction;
pub mod pda;
pub mod permissioned_list;
pub mod seeds;
pub mod submit;
pub mod token;

#[cfg(feature = "async")]
pub mod client;

// Re-export commonly used types
pub use cap_table::{CapTable, CapTableEntry, CapTableProgram, CapTableService};
pub use codec::{ArgumentRecord, Schema, Value};
pub use config::{Cluster, Domain, ProgramRegistry};
pub use error::{TokrError, TokrResult};
pub use governance::{Governance, GovernanceProgramVersion};
pub use identity::{IdentityRecord, IdentityStatus, IdentityVerification};
pub use pda::DerivedAddress;
pub use permissioned_list::PermissionedList;
pub use seeds::Seed;
pub use submit::{AccountSource, Submitter, TokenAccountSource};

/// Ids of the native programs the adapters reference
pub mod ids {
    use solana_sdk::pubkey::Pubkey;

    pub use solana_sdk_ids::{system_program, sysvar};

    /// SPL token program
    pub const TOKEN_PROGRAM_ID: Pubkey =
        Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

    /// SPL associated token account program
    pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
        Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
}
