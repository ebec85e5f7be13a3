//! Program Derived Address (PDA) utilities
//!
//! Derivation is implemented here rather than delegated to `Pubkey::find_program_address` so that
//! seed limits and exhausted bump searches surface as [`TokrError`] values instead of panics.
//! The result is byte-identical to the runtime's own routine.

use curve25519_dalek::edwards::CompressedEdwardsY;
use log::{debug, trace};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

use crate::codec::Value;
use crate::error::{TokrError, TokrResult};
use crate::ids::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::seeds::*;

/// Maximum number of seeds, bump included
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// A program derived address and the bump that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

impl From<DerivedAddress> for (Pubkey, u8) {
    fn from(derived: DerivedAddress) -> Self {
        (derived.address, derived.bump)
    }
}

/// Whether 32 bytes decompress to a point on the ed25519 curve
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

fn check_seeds(seeds: &[&[u8]], reserved: usize) -> TokrResult<()> {
    let count = seeds.len() + reserved;
    if count > MAX_SEEDS {
        return Err(TokrError::MaxSeedsExceeded {
            count,
            max: MAX_SEEDS,
        });
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(TokrError::MaxSeedLengthExceeded {
            index,
            len: seed.len(),
            max: MAX_SEED_LEN,
        });
    }
    Ok(())
}

fn hash_candidate(seeds: &[&[u8]], bump: Option<u8>, program_id: &Pubkey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    if let Some(bump) = bump {
        hasher.update([bump]);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

/// Compute the address for an exact seed list, bump included if any
///
/// # Returns
/// The address, or [`TokrError::OnCurveAddress`] if the candidate has a private key
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> TokrResult<Pubkey> {
    check_seeds(seeds, 0)?;
    let candidate = hash_candidate(seeds, None, program_id);
    if is_on_curve(&candidate) {
        return Err(TokrError::OnCurveAddress);
    }
    Ok(Pubkey::new_from_array(candidate))
}

/// Search bumps 255..=0 and return the first candidate accepted by `off_curve`
pub(crate) fn find_with<F>(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    off_curve: F,
) -> TokrResult<DerivedAddress>
where
    F: Fn(&[u8; 32]) -> bool,
{
    check_seeds(seeds, 1)?;

    for bump in (0..=u8::MAX).rev() {
        let candidate = hash_candidate(seeds, Some(bump), program_id);
        if off_curve(&candidate) {
            let address = Pubkey::new_from_array(candidate);
            debug!(
                "Derived {} from {} seeds under {} (bump {})",
                address,
                seeds.len(),
                program_id,
                bump
            );
            return Ok(DerivedAddress { address, bump });
        }
        trace!("Bump {} is on curve, trying next", bump);
    }

    Err(TokrError::AddressDerivationExhausted)
}

/// Find the canonical program address for raw seed bytes
///
/// # Arguments
/// * `seeds` - Ordered seed byte strings, without the bump
/// * `program_id` - Owning program
///
/// # Returns
/// The address and the largest bump that yields an off-curve candidate
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> TokrResult<DerivedAddress> {
    find_with(seeds, program_id, |candidate| !is_on_curve(candidate))
}

/// Derive the program address for typed seeds
///
/// # Arguments
/// * `program_id` - Owning program
/// * `seeds` - Ordered typed seeds, encoded with [`Seed::encode`]
pub fn derive(program_id: &Pubkey, seeds: &[Seed]) -> TokrResult<DerivedAddress> {
    let encoded: Vec<Vec<u8>> = seeds.iter().map(Seed::encode).collect();
    let chunks: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
    find_program_address(&chunks, program_id)
}

/// Derive the program address for seeds given as codec values
pub fn derive_from_values(program_id: &Pubkey, values: &[Value]) -> TokrResult<DerivedAddress> {
    derive(program_id, &seeds_from_values(values)?)
}

/// Get the associated token account of `wallet` for `mint`
///
/// # Arguments
/// * `wallet` - Token account owner
/// * `mint` - Token mint
///
/// # Returns
/// The associated token account address and bump
pub fn get_associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> TokrResult<DerivedAddress> {
    derive(
        &ASSOCIATED_TOKEN_PROGRAM_ID,
        &[
            Seed::from(wallet),
            Seed::from(TOKEN_PROGRAM_ID),
            Seed::from(mint),
        ],
    )
}

/// Get the identity record PDA for a subject within a group
///
/// # Arguments
/// * `program_id` - Identity verification program
/// * `group` - Group (issuer scope) the record belongs to
/// * `subject` - Verified wallet
///
/// # Returns
/// The record address and bump
pub fn get_identity_record_pda(
    program_id: &Pubkey,
    group: &Pubkey,
    subject: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(
        program_id,
        &[
            Seed::utf8(SEED_IDENTITY),
            Seed::from(group),
            Seed::from(subject),
        ],
    )
}

/// Get the permissioned list PDA owned by `authority`
pub fn get_list_pda(program_id: &Pubkey, authority: &Pubkey) -> TokrResult<DerivedAddress> {
    derive(program_id, &[Seed::utf8(SEED_LIST), Seed::from(authority)])
}

/// Get the entry PDA marking `user` as a member of `list`
pub fn get_list_entry_pda(
    program_id: &Pubkey,
    list: &Pubkey,
    user: &Pubkey,
) -> TokrResult<DerivedAddress> {
    derive(program_id, &[Seed::from(list), Seed::from(user)])
}
