//! Permissioned list adapter
//!
//! An authority owns at most one list, at `["list", authority]`. Membership of a user is the
//! existence of the entry account `[list, user]`; entries carry no data beyond the discriminator.
//! None of the list instructions take arguments.

use log::info;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solana_sdk_ids::system_program;

use crate::codec::{decode, ArgumentRecord, Field, FieldType, Prefix, Schema};
use crate::config::ProgramRegistry;
use crate::error::TokrResult;
use crate::instruction::build_with_schema;
use crate::pda::{get_list_entry_pda, get_list_pda, DerivedAddress};
use crate::submit::{AccountSource, Submitter};

pub static CREATE_LIST: Schema = Schema::new("create_list", Prefix::Anchor("create_list"), &[]);
pub static DELETE_LIST: Schema = Schema::new("delete_list", Prefix::Anchor("delete_list"), &[]);
pub static ADD_USER: Schema = Schema::new("add_user", Prefix::Anchor("add_user"), &[]);
pub static REMOVE_USER: Schema = Schema::new("remove_user", Prefix::Anchor("remove_user"), &[]);

pub static LIST_METADATA: Schema = Schema::new(
    "ListMetadata",
    Prefix::AnchorAccount("ListMetadata"),
    &[Field::new("authority", FieldType::PublicKey)],
);

pub static ENTRY_METADATA: Schema =
    Schema::new("EntryMetadata", Prefix::AnchorAccount("EntryMetadata"), &[]);

/// Decoded list account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMetadata {
    pub authority: Pubkey,
}

impl ListMetadata {
    pub fn decode(data: &[u8]) -> TokrResult<Self> {
        let record = decode(&LIST_METADATA, data)?;
        Ok(Self {
            authority: record.pubkey("authority")?,
        })
    }
}

/// Instruction builders for the permissioned list program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionedList {
    program_id: Pubkey,
}

impl PermissionedList {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn from_registry(registry: &ProgramRegistry) -> Self {
        Self::new(registry.permissioned_list)
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// List owned by `authority`
    pub fn list_address(&self, authority: &Pubkey) -> TokrResult<DerivedAddress> {
        get_list_pda(&self.program_id, authority)
    }

    /// Entry of `user` in the list owned by `authority`
    pub fn entry_address(&self, authority: &Pubkey, user: &Pubkey) -> TokrResult<DerivedAddress> {
        let list = self.list_address(authority)?;
        get_list_entry_pda(&self.program_id, &list.address, user)
    }

    pub fn create_list_instruction(&self, signer: &Pubkey) -> TokrResult<Instruction> {
        let list = self.list_address(signer)?;

        let accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(list.address, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ];

        build_with_schema(self.program_id, accounts, &CREATE_LIST, &ArgumentRecord::new())
    }

    pub fn delete_list_instruction(&self, signer: &Pubkey) -> TokrResult<Instruction> {
        let list = self.list_address(signer)?;

        let accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(list.address, false),
        ];

        build_with_schema(self.program_id, accounts, &DELETE_LIST, &ArgumentRecord::new())
    }

    /// Add `user` to the signer's list
    ///
    /// # Arguments
    /// * `signer` - List authority and rent payer for the entry
    /// * `user` - Wallet to add
    pub fn add_user_instruction(&self, signer: &Pubkey, user: &Pubkey) -> TokrResult<Instruction> {
        let list = self.list_address(signer)?;
        let entry = get_list_entry_pda(&self.program_id, &list.address, user)?;

        let accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(list.address, false),
            AccountMeta::new(entry.address, false),
            AccountMeta::new_readonly(*user, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ];

        build_with_schema(self.program_id, accounts, &ADD_USER, &ArgumentRecord::new())
    }

    /// Remove `user` from the signer's list, closing the entry to the signer
    pub fn remove_user_instruction(
        &self,
        signer: &Pubkey,
        user: &Pubkey,
    ) -> TokrResult<Instruction> {
        let list = self.list_address(signer)?;
        let entry = get_list_entry_pda(&self.program_id, &list.address, user)?;

        let accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(list.address, false),
            AccountMeta::new(entry.address, false),
            AccountMeta::new(*user, false),
        ];

        build_with_schema(self.program_id, accounts, &REMOVE_USER, &ArgumentRecord::new())
    }

    /// Fetch the list owned by `authority`
    pub fn fetch_list<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        authority: &Pubkey,
    ) -> TokrResult<Option<ListMetadata>> {
        let list = self.list_address(authority)?;
        source
            .fetch(&list.address)?
            .map(|data| ListMetadata::decode(&data))
            .transpose()
    }

    /// Whether `user` has an entry in the list owned by `authority`
    pub fn is_user_on_list<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        authority: &Pubkey,
        user: &Pubkey,
    ) -> TokrResult<bool> {
        let entry = self.entry_address(authority, user)?;
        Ok(source.fetch(&entry.address)?.is_some())
    }

    pub fn create_list<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        signer: &Keypair,
    ) -> TokrResult<Signature> {
        let ix = self.create_list_instruction(&signer.pubkey())?;
        submitter.submit(&[ix], &[signer])
    }

    pub fn delete_list<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        signer: &Keypair,
    ) -> TokrResult<Signature> {
        let ix = self.delete_list_instruction(&signer.pubkey())?;
        submitter.submit(&[ix], &[signer])
    }

    pub fn add_user<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        signer: &Keypair,
        user: &Pubkey,
    ) -> TokrResult<Signature> {
        info!("Adding user {} to list of {}", user, signer.pubkey());
        let ix = self.add_user_instruction(&signer.pubkey(), user)?;
        submitter.submit(&[ix], &[signer])
    }

    pub fn remove_user<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        signer: &Keypair,
        user: &Pubkey,
    ) -> TokrResult<Signature> {
        info!("Removing user {} from list of {}", user, signer.pubkey());
        let ix = self.remove_user_instruction(&signer.pubkey(), user)?;
        submitter.submit(&[ix], &[signer])
    }
}
