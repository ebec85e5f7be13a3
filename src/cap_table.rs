//! Cap table adapter
//!
//! The cap table program exposes one `generate` instruction returning a [`CapTable`] as return
//! data. The same table can be computed client side from the SPL token accounts of a mint, which
//! is what [`CapTableService`] does.

use log::{debug, warn};
use serde_json::json;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::codec::{decode, encode, ArgumentRecord, Field, FieldType, Prefix, Schema, Value};
use crate::config::ProgramRegistry;
use crate::error::{TokrError, TokrResult};
use crate::instruction::build_with_schema;
use crate::submit::{AccountSource, TokenAccountSource};

/// Size of an SPL token account
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Size of an SPL mint
pub const MINT_LEN: usize = 82;

/// Percentages are expressed in parts per million of the issued supply
pub const PERCENT_SCALE: u64 = 1_000_000;

pub static GENERATE: Schema = Schema::new("generate", Prefix::Anchor("generate"), &[]);

pub static CAP_TABLE_ENTRY: Schema = Schema::new(
    "CapTableEntry",
    Prefix::None,
    &[
        Field::new("holder", FieldType::PublicKey),
        Field::new("tokens_held", FieldType::U64),
        Field::new("percent_held", FieldType::U64),
    ],
);

/// Return data of `generate`
pub static CAP_TABLE: Schema = Schema::new(
    "CapTable",
    Prefix::None,
    &[
        Field::new("entries", FieldType::Vec(&FieldType::Record(&CAP_TABLE_ENTRY))),
        Field::new("authorized_supply", FieldType::U64),
        Field::new("reserved_supply", FieldType::U64),
    ],
);

/// The fields of an SPL token account the cap table needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccount {
    /// Read mint, owner and amount from raw token account data
    pub fn unpack(address: Pubkey, data: &[u8]) -> TokrResult<Self> {
        if data.len() < TOKEN_ACCOUNT_LEN {
            return Err(TokrError::InvalidAccountData(format!(
                "token account {} is {} bytes, expected {}",
                address,
                data.len(),
                TOKEN_ACCOUNT_LEN
            )));
        }
        Ok(Self {
            address,
            mint: read_pubkey(&data[0..32]),
            owner: read_pubkey(&data[32..64]),
            amount: read_u64(&data[64..72]),
        })
    }
}

fn read_pubkey(bytes: &[u8]) -> Pubkey {
    let mut key = [0u8; 32];
    key.copy_from_slice(bytes);
    Pubkey::new_from_array(key)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Total supply recorded in raw mint account data
pub fn mint_supply(mint: &Pubkey, data: &[u8]) -> TokrResult<u64> {
    if data.len() < MINT_LEN {
        return Err(TokrError::InvalidAccountData(format!(
            "mint {} is {} bytes, expected {}",
            mint,
            data.len(),
            MINT_LEN
        )));
    }
    Ok(read_u64(&data[36..44]))
}

/// Read the decimals of a raw SPL mint account
pub fn mint_decimals(mint: &Pubkey, data: &[u8]) -> TokrResult<u8> {
    if data.len() < MINT_LEN {
        return Err(TokrError::InvalidAccountData(format!(
            "mint {} is {} bytes, expected {}",
            mint,
            data.len(),
            MINT_LEN
        )));
    }
    Ok(data[44])
}

/// One holder's position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapTableEntry {
    pub holder: Pubkey,
    pub tokens_held: u64,
    /// Parts per million of the issued supply
    pub percent_held: u64,
}

impl CapTableEntry {
    /// Percentage with four decimals, e.g. `16.6666%`
    pub fn formatted_percentage(&self) -> String {
        format!(
            "{}.{:04}%",
            self.percent_held / 10_000,
            self.percent_held % 10_000
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapTable {
    pub entries: Vec<CapTableEntry>,
    /// Total minted tokens, held by both holders and the treasury stock account
    pub authorized_supply: u64,
    /// Tokens still held in the treasury stock account
    pub reserved_supply: u64,
}

impl CapTable {
    /// Authorized less reserved supply
    pub fn outstanding_supply(&self) -> u64 {
        self.authorized_supply.saturating_sub(self.reserved_supply)
    }

    /// Decode the return data of `generate`
    pub fn decode(data: &[u8]) -> TokrResult<Self> {
        let record = decode(&CAP_TABLE, data)?;
        let entries = record
            .list("entries")?
            .iter()
            .map(|value| match value {
                Value::Record(entry) => Ok(CapTableEntry {
                    holder: entry.pubkey("holder")?,
                    tokens_held: entry.u64("tokens_held")?,
                    percent_held: entry.u64("percent_held")?,
                }),
                other => Err(TokrError::DeserializationError {
                    schema: CAP_TABLE.name,
                    reason: format!("entry is a {}", other.kind()),
                }),
            })
            .collect::<TokrResult<Vec<_>>>()?;

        Ok(Self {
            entries,
            authorized_supply: record.u64("authorized_supply")?,
            reserved_supply: record.u64("reserved_supply")?,
        })
    }

    /// Encode in the layout `generate` returns
    pub fn encode(&self) -> TokrResult<Vec<u8>> {
        let entries = self.entries.iter().map(|entry| {
            ArgumentRecord::new()
                .with("holder", entry.holder)
                .with("tokens_held", entry.tokens_held)
                .with("percent_held", entry.percent_held)
        });
        let record = ArgumentRecord::new()
            .with("entries", Value::list(entries))
            .with("authorized_supply", self.authorized_supply)
            .with("reserved_supply", self.reserved_supply);
        encode(&CAP_TABLE, &record)
    }

    /// Snapshot as JSON
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "reservedSupply": self.reserved_supply,
            "authorizedSupply": self.authorized_supply,
            "outstandingSupply": self.outstanding_supply(),
            "entries": self.entries.iter().map(|entry| json!({
                "holder": entry.holder.to_string(),
                "tokensHeld": entry.tokens_held,
                "percentHeld": entry.formatted_percentage(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// Build a cap table from the token accounts of `mint`
///
/// Accounts of other mints, accounts owned by `excluded_owners` and empty accounts are skipped.
/// Percentages are relative to the issued supply; an issued supply of zero yields zero percent.
pub fn compute_cap_table(
    mint: &Pubkey,
    accounts: &[TokenAccount],
    authorized_supply: u64,
    reserved_supply: u64,
    excluded_owners: &[Pubkey],
) -> CapTable {
    let issued = authorized_supply.saturating_sub(reserved_supply);

    let entries = accounts
        .iter()
        .filter(|account| account.mint == *mint)
        .filter(|account| !excluded_owners.contains(&account.owner))
        .filter(|account| account.amount > 0)
        .map(|account| CapTableEntry {
            holder: account.owner,
            tokens_held: account.amount,
            percent_held: parts_per_million(account.amount, issued),
        })
        .collect();

    CapTable {
        entries,
        authorized_supply,
        reserved_supply,
    }
}

fn parts_per_million(held: u64, issued: u64) -> u64 {
    if issued == 0 {
        return 0;
    }
    let ppm = u128::from(held) * u128::from(PERCENT_SCALE) / u128::from(issued);
    u64::try_from(ppm).unwrap_or(u64::MAX)
}

/// Instruction builder for the cap table program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapTableProgram {
    program_id: Pubkey,
}

impl CapTableProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn from_registry(registry: &ProgramRegistry) -> Self {
        Self::new(registry.cap_table)
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Ask the program for the cap table of `mint`
    pub fn generate_instruction(&self, mint: &Pubkey) -> TokrResult<Instruction> {
        let accounts = vec![AccountMeta::new_readonly(*mint, false)];
        build_with_schema(self.program_id, accounts, &GENERATE, &ArgumentRecord::new())
    }
}

/// Computes cap tables from chain state
pub struct CapTableService<S> {
    source: S,
}

impl<S> CapTableService<S>
where
    S: AccountSource + TokenAccountSource,
{
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Cap table for `mint`
    ///
    /// # Arguments
    /// * `mint` - SPL token mint
    /// * `treasury_stock_account` - Token account holding the unissued supply
    /// * `excluded_owners` - Owners left out of the entries
    pub fn get_cap_table_for_mint(
        &self,
        mint: &Pubkey,
        treasury_stock_account: &Pubkey,
        excluded_owners: &[Pubkey],
    ) -> TokrResult<CapTable> {
        let mint_data = self
            .source
            .fetch(mint)?
            .ok_or(TokrError::AccountNotFound(*mint))?;
        let authorized_supply = mint_supply(mint, &mint_data)?;

        let reserved_supply = match self.source.fetch(treasury_stock_account)? {
            Some(data) => TokenAccount::unpack(*treasury_stock_account, &data)?.amount,
            None => {
                warn!(
                    "Treasury stock account {} not found, treating reserved supply as 0",
                    treasury_stock_account
                );
                0
            }
        };

        let accounts = self.source.token_accounts(mint)?;
        debug!(
            "Computing cap table for {} from {} token accounts",
            mint,
            accounts.len()
        );

        Ok(compute_cap_table(
            mint,
            &accounts,
            authorized_supply,
            reserved_supply,
            excluded_owners,
        ))
    }
}
