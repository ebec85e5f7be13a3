//! SPL token, associated token account and system program instructions
//!
//! Only the handful the investment DAO setup needs: allocating and initializing mints, creating
//! associated token accounts, minting and dropping a mint authority. Layouts are declared as
//! schemas like every other program in the crate.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_sdk_ids::{system_program, sysvar};

use crate::cap_table::MINT_LEN;
use crate::codec::{ArgumentRecord, Field, FieldType, Prefix, Schema};
use crate::error::TokrResult;
use crate::ids::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::instruction::build_with_schema;
use crate::pda::get_associated_token_address;

/// Rent-exempt balance of an 82-byte mint account at the default rent
pub const MINT_RENT_EXEMPT_LAMPORTS: u64 = 1_461_600;

static OPTIONAL_PUBKEY: FieldType = FieldType::PublicKey;

pub static CREATE_ACCOUNT: Schema = Schema::new(
    "CreateAccount",
    Prefix::Index(0),
    &[
        Field::new("lamports", FieldType::U64),
        Field::new("space", FieldType::U64),
        Field::new("owner", FieldType::PublicKey),
    ],
);

pub static INITIALIZE_MINT: Schema = Schema::new(
    "InitializeMint",
    Prefix::Tag(0),
    &[
        Field::new("decimals", FieldType::U8),
        Field::new("mint_authority", FieldType::PublicKey),
        Field::new("freeze_authority", FieldType::Option(&OPTIONAL_PUBKEY)),
    ],
);

pub static SET_AUTHORITY: Schema = Schema::new(
    "SetAuthority",
    Prefix::Tag(6),
    &[
        Field::new("authority_type", FieldType::U8),
        Field::new("new_authority", FieldType::Option(&OPTIONAL_PUBKEY)),
    ],
);

pub static MINT_TO: Schema = Schema::new(
    "MintTo",
    Prefix::Tag(7),
    &[Field::new("amount", FieldType::U64)],
);

pub static CREATE_ASSOCIATED_TOKEN_ACCOUNT: Schema =
    Schema::new("CreateAssociatedTokenAccount", Prefix::Tag(0), &[]);

/// Authority slot changed by SetAuthority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityType {
    MintTokens,
    FreezeAccount,
    AccountOwner,
    CloseAccount,
}

impl AuthorityType {
    pub fn code(self) -> u8 {
        match self {
            AuthorityType::MintTokens => 0,
            AuthorityType::FreezeAccount => 1,
            AuthorityType::AccountOwner => 2,
            AuthorityType::CloseAccount => 3,
        }
    }
}

/// Allocate `space` bytes at `new_account`, owned by `owner`
///
/// Both `payer` and `new_account` sign.
pub fn create_account_instruction(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> TokrResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*new_account, true),
    ];
    let record = ArgumentRecord::new()
        .with("lamports", lamports)
        .with("space", space)
        .with("owner", owner);
    build_with_schema(system_program::ID, accounts, &CREATE_ACCOUNT, &record)
}

pub fn initialize_mint_instruction(
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> TokrResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*mint, false),
        AccountMeta::new_readonly(sysvar::rent::ID, false),
    ];
    let record = ArgumentRecord::new()
        .with("decimals", decimals)
        .with("mint_authority", mint_authority)
        .with("freeze_authority", freeze_authority);
    build_with_schema(TOKEN_PROGRAM_ID, accounts, &INITIALIZE_MINT, &record)
}

/// Create and initialize a mint in two instructions, rent paid by `payer`
pub fn create_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    rent_lamports: u64,
    decimals: u8,
    mint_authority: &Pubkey,
) -> TokrResult<[Instruction; 2]> {
    Ok([
        create_account_instruction(payer, mint, rent_lamports, MINT_LEN as u64, &TOKEN_PROGRAM_ID)?,
        initialize_mint_instruction(mint, decimals, mint_authority, None)?,
    ])
}

pub fn mint_to_instruction(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> TokrResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*mint, false),
        AccountMeta::new(*destination, false),
        AccountMeta::new_readonly(*authority, true),
    ];
    let record = ArgumentRecord::new().with("amount", amount);
    build_with_schema(TOKEN_PROGRAM_ID, accounts, &MINT_TO, &record)
}

/// Change or remove (`None`) an authority of a mint or token account
pub fn set_authority_instruction(
    account: &Pubkey,
    current_authority: &Pubkey,
    authority_type: AuthorityType,
    new_authority: Option<&Pubkey>,
) -> TokrResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*account, false),
        AccountMeta::new_readonly(*current_authority, true),
    ];
    let record = ArgumentRecord::new()
        .with("authority_type", authority_type.code())
        .with("new_authority", new_authority);
    build_with_schema(TOKEN_PROGRAM_ID, accounts, &SET_AUTHORITY, &record)
}

/// Create the associated token account of `wallet` for `mint`
///
/// `wallet` may be a program address. Returns the instruction and the account address.
pub fn create_associated_token_account_instruction(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> TokrResult<(Instruction, Pubkey)> {
    let address = get_associated_token_address(wallet, mint)?.address;
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(address, false),
        AccountMeta::new_readonly(*wallet, false),
        AccountMeta::new_readonly(*mint, false),
        AccountMeta::new_readonly(system_program::ID, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
    ];
    let ix = build_with_schema(
        ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts,
        &CREATE_ASSOCIATED_TOKEN_ACCOUNT,
        &ArgumentRecord::new(),
    )?;
    Ok((ix, address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshSerialize;

    #[test]
    fn test_create_account_layout() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let ix = create_account_instruction(&payer, &mint, 1_000, 82, &TOKEN_PROGRAM_ID).unwrap();

        assert_eq!(ix.program_id, system_program::ID);
        assert_eq!(
            ix.accounts,
            vec![AccountMeta::new(payer, true), AccountMeta::new(mint, true)]
        );

        let mut expected = 0u32.to_le_bytes().to_vec();
        1_000u64.serialize(&mut expected).unwrap();
        82u64.serialize(&mut expected).unwrap();
        expected.extend_from_slice(TOKEN_PROGRAM_ID.as_ref());
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn test_create_mint_instructions() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let [create, init] =
            create_mint_instructions(&owner, &mint, MINT_RENT_EXEMPT_LAMPORTS, 0, &owner).unwrap();

        assert_eq!(create.data[12..20], (MINT_LEN as u64).to_le_bytes());
        assert_eq!(init.program_id, TOKEN_PROGRAM_ID);
        assert_eq!(init.accounts[1].pubkey, sysvar::rent::ID);

        let mut expected = vec![0u8, 0];
        expected.extend_from_slice(owner.as_ref());
        expected.push(0);
        assert_eq!(init.data, expected);
    }

    #[test]
    fn test_mint_to_and_set_authority() {
        let mint = Pubkey::new_unique();
        let destination = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        let mint_to = mint_to_instruction(&mint, &destination, &authority, 500).unwrap();
        let mut expected = vec![7u8];
        expected.extend_from_slice(&500u64.to_le_bytes());
        assert_eq!(mint_to.data, expected);
        assert_eq!(mint_to.accounts[2], AccountMeta::new_readonly(authority, true));

        let fixed =
            set_authority_instruction(&mint, &authority, AuthorityType::MintTokens, None).unwrap();
        assert_eq!(fixed.data, vec![6, 0, 0]);

        let moved = set_authority_instruction(
            &mint,
            &authority,
            AuthorityType::MintTokens,
            Some(&destination),
        )
        .unwrap();
        assert_eq!(moved.data[..3], [6, 0, 1]);
        assert_eq!(&moved.data[3..], destination.as_ref());
    }

    #[test]
    fn test_create_associated_token_account() {
        let payer = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let (ix, address) =
            create_associated_token_account_instruction(&payer, &wallet, &mint).unwrap();
        assert_eq!(
            address,
            Pubkey::find_program_address(
                &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
                &ASSOCIATED_TOKEN_PROGRAM_ID,
            )
            .0
        );
        assert_eq!(ix.program_id, ASSOCIATED_TOKEN_PROGRAM_ID);
        assert_eq!(ix.accounts[1], AccountMeta::new(address, false));
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(wallet, false));
        assert_eq!(ix.data, vec![0]);
    }
}
