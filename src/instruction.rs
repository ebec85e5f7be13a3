//! Instruction assembly and Anchor discriminators

use log::debug;
use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::codec::{encode, ArgumentRecord, Schema};
use crate::error::{TokrError, TokrResult};

/// Helper function to compute Anchor instruction discriminator
/// Discriminator is the first 8 bytes of SHA256("global:instruction_name")
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

/// Anchor account discriminator, the first 8 bytes of SHA256("account:AccountName")
pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", namespace, name);
    let hash_result = hash(preimage.as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash_result.to_bytes()[..8]);
    discriminator
}

/// Assemble an instruction
///
/// Accounts are kept exactly in the given order with the given flags.
///
/// # Arguments
/// * `program_id` - Target program, must not be the default key
/// * `accounts` - Ordered account references
/// * `data` - Encoded instruction data
pub fn build(
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
) -> TokrResult<Instruction> {
    if program_id == Pubkey::default() {
        return Err(TokrError::InvalidProgramId(
            "instruction target program id is empty".to_string(),
        ));
    }

    debug!(
        "Built instruction for {}: {} accounts, {} data bytes",
        program_id,
        accounts.len(),
        data.len()
    );

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// Encode `args` with `schema` and assemble the instruction
pub fn build_with_schema(
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    schema: &Schema,
    args: &ArgumentRecord,
) -> TokrResult<Instruction> {
    let data = encode(schema, args)?;
    build(program_id, accounts, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_discriminator() {
        let expected = hash(b"global:add_user").to_bytes();
        assert_eq!(instruction_discriminator("add_user").to_vec(), expected[..8].to_vec());
        assert_ne!(
            instruction_discriminator("add_user"),
            instruction_discriminator("remove_user")
        );
    }

    #[test]
    fn test_account_discriminator() {
        let expected = hash(b"account:IdentityRecord").to_bytes();
        assert_eq!(account_discriminator("IdentityRecord").to_vec(), expected[..8].to_vec());
    }

    #[test]
    fn test_build_preserves_accounts() {
        let program_id = Pubkey::new_unique();
        let accounts = vec![
            AccountMeta::new(Pubkey::new_unique(), true),
            AccountMeta::new_readonly(Pubkey::new_unique(), false),
        ];
        let ix = build(program_id, accounts.clone(), vec![1, 2, 3]).unwrap();
        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts, accounts);
        assert_eq!(ix.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_build_rejects_default_program() {
        assert!(matches!(
            build(Pubkey::default(), vec![], vec![]),
            Err(TokrError::InvalidProgramId(_))
        ));
    }
}
