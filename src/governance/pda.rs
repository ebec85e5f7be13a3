//! Governance program addresses

use solana_sdk::pubkey::Pubkey;

use crate::error::TokrResult;
use crate::pda::{derive, DerivedAddress};
use crate::seeds::{
    Seed, SEED_ACCOUNT_GOVERNANCE, SEED_GOVERNANCE, SEED_MINT_GOVERNANCE, SEED_NATIVE_TREASURY,
    SEED_PROGRAM_GOVERNANCE, SEED_REALM_CONFIG, SEED_TOKEN_GOVERNANCE,
};

use super::GovernanceProgramVersion;

/// What a governance account governs, selects its seed prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GovernanceKind {
    /// Any account
    Account,
    /// Mint authority of a token mint
    Mint,
    /// Owner of a token account
    Token,
    /// Upgrade authority of a program
    Program,
}

impl GovernanceKind {
    pub fn seed(&self) -> &'static str {
        match self {
            GovernanceKind::Account => SEED_ACCOUNT_GOVERNANCE,
            GovernanceKind::Mint => SEED_MINT_GOVERNANCE,
            GovernanceKind::Token => SEED_TOKEN_GOVERNANCE,
            GovernanceKind::Program => SEED_PROGRAM_GOVERNANCE,
        }
    }
}

/// Get the realm PDA
///
/// # Arguments
/// * `program_id` - Governance program
/// * `name` - Realm name, at most 32 bytes
pub fn get_realm_pda(program_id: &Pubkey, name: &str) -> TokrResult<DerivedAddress> {
    derive(program_id, &[Seed::utf8(SEED_GOVERNANCE), Seed::utf8(name)])
}

/// Get the PDA holding the deposited governing tokens of `governing_token_mint`
pub fn get_governing_token_holding_pda(
    program_id: &Pubkey,
    realm: &Pubkey,
    governing_token_mint: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_GOVERNANCE),
            Seed::from(realm),
            Seed::from(governing_token_mint),
        ],
    )
}

/// Get the token owner record PDA of `governing_token_owner`
pub fn get_token_owner_record_pda(
    program_id: &Pubkey,
    realm: &Pubkey,
    governing_token_mint: &Pubkey,
    governing_token_owner: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_GOVERNANCE),
            Seed::from(realm),
            Seed::from(governing_token_mint),
            Seed::from(governing_token_owner),
        ],
    )
}

/// Get the realm config PDA (voter weight addins)
pub fn get_realm_config_pda(program_id: &Pubkey, realm: &Pubkey) -> TokrResult<DerivedAddress> {
    derive(program_id, &[Seed::utf8(SEED_REALM_CONFIG), Seed::from(realm)])
}

/// Get the governance PDA for `governed` inside `realm`
///
/// # Arguments
/// * `program_id` - Governance program
/// * `kind` - What is governed, selects the seed prefix
/// * `realm` - Realm the governance belongs to
/// * `governed` - Governed account, mint, token account or program
pub fn get_governance_pda(
    program_id: &Pubkey,
    kind: GovernanceKind,
    realm: &Pubkey,
    governed: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[Seed::utf8(kind.seed()), Seed::from(realm), Seed::from(governed)],
    )
}

/// Get the PDA of proposal number `index` of `governance`
pub fn get_proposal_pda(
    program_id: &Pubkey,
    governance: &Pubkey,
    governing_token_mint: &Pubkey,
    index: u32,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_GOVERNANCE),
            Seed::from(governance),
            Seed::from(governing_token_mint),
            Seed::from(index),
        ],
    )
}

pub fn get_signatory_record_pda(
    program_id: &Pubkey,
    proposal: &Pubkey,
    signatory: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_GOVERNANCE),
            Seed::from(proposal),
            Seed::from(signatory),
        ],
    )
}

/// Get the proposal transaction PDA
///
/// Version 1 programs have a single option per proposal and leave `option_index` out of the
/// seeds.
pub fn get_proposal_transaction_pda(
    program_id: &Pubkey,
    version: GovernanceProgramVersion,
    proposal: &Pubkey,
    option_index: u8,
    index: u16,
) -> TokrResult<DerivedAddress> {
    let mut seeds = vec![Seed::utf8(SEED_GOVERNANCE), Seed::from(proposal)];
    if version == GovernanceProgramVersion::V2 {
        seeds.push(Seed::from(option_index));
    }
    seeds.push(Seed::from(index));
    derive(program_id, &seeds)
}

pub fn get_vote_record_pda(
    program_id: &Pubkey,
    proposal: &Pubkey,
    token_owner_record: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_GOVERNANCE),
            Seed::from(proposal),
            Seed::from(token_owner_record),
        ],
    )
}

/// Get the SOL treasury PDA of `governance`
pub fn get_native_treasury_pda(
    program_id: &Pubkey,
    governance: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[Seed::utf8(SEED_NATIVE_TREASURY), Seed::from(governance)],
    )
}
