//! Identity verification adapter
//!
//! Each verified wallet (the subject) has one record per group, holding three independent
//! statuses: investor accreditation, AML and KYC. The program enforces who may change them; this
//! module only builds the instructions and reads the records back.

use log::warn;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solana_sdk_ids::system_program;

use crate::codec::{decode, ArgumentRecord, Field, FieldType, Prefix, Schema, Value, Variant};
use crate::config::ProgramRegistry;
use crate::error::{TokrError, TokrResult};
use crate::instruction::build_with_schema;
use crate::pda::{get_identity_record_pda, DerivedAddress};
use crate::submit::{AccountSource, Submitter};

/// Size of an identity record account
pub const IDENTITY_RECORD_LEN: usize = 8 + 3 + 1 + 32;

/// Verification status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IdentityStatus {
    #[default]
    Initial = 0,
    Started = 1,
    Approved = 2,
    Denied = 3,
}

impl IdentityStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Collapse the three sub-statuses into one
    ///
    /// Denied wins over everything, then all-initial is initial, all-approved is approved, and
    /// any other mix is started.
    pub fn combine(ia: Self, aml: Self, kyc: Self) -> Self {
        let all = [ia, aml, kyc];
        if all.contains(&IdentityStatus::Denied) {
            IdentityStatus::Denied
        } else if all.iter().all(|s| *s == IdentityStatus::Initial) {
            IdentityStatus::Initial
        } else if all.iter().all(|s| *s == IdentityStatus::Approved) {
            IdentityStatus::Approved
        } else {
            IdentityStatus::Started
        }
    }
}

impl TryFrom<u8> for IdentityStatus {
    type Error = TokrError;

    fn try_from(code: u8) -> TokrResult<Self> {
        match code {
            0 => Ok(IdentityStatus::Initial),
            1 => Ok(IdentityStatus::Started),
            2 => Ok(IdentityStatus::Approved),
            3 => Ok(IdentityStatus::Denied),
            other => Err(TokrError::UnknownStatus(other)),
        }
    }
}

impl std::fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IdentityStatus::Initial => "initial",
            IdentityStatus::Started => "started",
            IdentityStatus::Approved => "approved",
            IdentityStatus::Denied => "denied",
        };
        f.write_str(name)
    }
}

/// Which sub-status an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Investor accreditation
    Ia,
    Aml,
    Kyc,
}

const STATUS: FieldType = FieldType::Enum(&[
    Variant::unit("Initial"),
    Variant::unit("Started"),
    Variant::unit("Approved"),
    Variant::unit("Denied"),
]);

const GROUP_FIELDS: &[Field] = &[
    Field::new("bump", FieldType::U8),
    Field::new("group", FieldType::PublicKey),
];

const STATUS_FIELDS: &[Field] = &[
    Field::new("bump", FieldType::U8),
    Field::new("group", FieldType::PublicKey),
    Field::new("status", STATUS),
];

pub static CREATE_RECORD: Schema =
    Schema::new("create_record", Prefix::Anchor("create_record"), GROUP_FIELDS);
pub static APPROVE: Schema = Schema::new("approve", Prefix::Anchor("approve"), GROUP_FIELDS);
pub static DENY: Schema = Schema::new("deny", Prefix::Anchor("deny"), GROUP_FIELDS);
pub static UPDATE_IA_STATUS: Schema = Schema::new(
    "update_ia_status",
    Prefix::Anchor("update_ia_status"),
    STATUS_FIELDS,
);
pub static UPDATE_AML_STATUS: Schema = Schema::new(
    "update_aml_status",
    Prefix::Anchor("update_aml_status"),
    STATUS_FIELDS,
);
pub static UPDATE_KYC_STATUS: Schema = Schema::new(
    "update_kyc_status",
    Prefix::Anchor("update_kyc_status"),
    STATUS_FIELDS,
);
pub static TRANSFER_AUTHORITY: Schema = Schema::new(
    "transfer_authority",
    Prefix::Anchor("transfer_authority"),
    GROUP_FIELDS,
);
pub static DELETE_RECORD: Schema =
    Schema::new("delete_record", Prefix::Anchor("delete_record"), GROUP_FIELDS);

/// On-chain layout of an identity record
pub static IDENTITY_RECORD: Schema = Schema::new(
    "IdentityRecord",
    Prefix::AnchorAccount("IdentityRecord"),
    &[
        Field::new("bump", FieldType::U8),
        Field::new("ia_status", STATUS),
        Field::new("aml_status", STATUS),
        Field::new("kyc_status", STATUS),
        Field::new("authority", FieldType::PublicKey),
    ],
);

impl StatusKind {
    fn schema(self) -> &'static Schema {
        match self {
            StatusKind::Ia => &UPDATE_IA_STATUS,
            StatusKind::Aml => &UPDATE_AML_STATUS,
            StatusKind::Kyc => &UPDATE_KYC_STATUS,
        }
    }
}

/// A decoded identity record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRecord {
    pub bump: u8,
    pub ia_status: IdentityStatus,
    pub aml_status: IdentityStatus,
    pub kyc_status: IdentityStatus,
    /// Account allowed to update the statuses
    pub authority: Pubkey,
}

impl IdentityRecord {
    /// Decode raw account data, discriminator included
    pub fn decode(data: &[u8]) -> TokrResult<Self> {
        let record = decode(&IDENTITY_RECORD, data)?;
        Ok(Self {
            bump: record.u8("bump")?,
            ia_status: IdentityStatus::try_from(record.variant("ia_status")?.0)?,
            aml_status: IdentityStatus::try_from(record.variant("aml_status")?.0)?,
            kyc_status: IdentityStatus::try_from(record.variant("kyc_status")?.0)?,
            authority: record.pubkey("authority")?,
        })
    }

    /// Combined status of the three checks
    pub fn status(&self) -> IdentityStatus {
        IdentityStatus::combine(self.ia_status, self.aml_status, self.kyc_status)
    }

    /// True once every check is approved
    pub fn is_verified(&self) -> bool {
        self.ia_status == IdentityStatus::Approved
            && self.aml_status == IdentityStatus::Approved
            && self.kyc_status == IdentityStatus::Approved
    }
}

fn group_args(bump: u8, group: &Pubkey) -> ArgumentRecord {
    ArgumentRecord::new().with("bump", bump).with("group", group)
}

/// Instruction builders and record lookups for the identity verification program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityVerification {
    program_id: Pubkey,
}

impl IdentityVerification {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn from_registry(registry: &ProgramRegistry) -> Self {
        Self::new(registry.identity_verification)
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Record address of `subject` within `group`
    pub fn record_address(&self, group: &Pubkey, subject: &Pubkey) -> TokrResult<DerivedAddress> {
        get_identity_record_pda(&self.program_id, group, subject)
    }

    /// Create the signer's own record in `group`
    ///
    /// # Arguments
    /// * `signer` - Subject of the record and rent payer
    /// * `group` - Group the record belongs to
    /// * `authority` - Account that will be allowed to update the record
    pub fn create_record_instruction(
        &self,
        signer: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
    ) -> TokrResult<Instruction> {
        let record = self.record_address(group, signer)?;

        let accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(record.address, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(*authority, false),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &CREATE_RECORD,
            &group_args(record.bump, group),
        )
    }

    fn authority_instruction(
        &self,
        schema: &Schema,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
        status: Option<IdentityStatus>,
    ) -> TokrResult<Instruction> {
        let record = self.record_address(group, subject)?;

        let accounts = vec![
            AccountMeta::new(record.address, false),
            AccountMeta::new_readonly(*subject, false),
            AccountMeta::new_readonly(*authority, true),
        ];

        let mut args = group_args(record.bump, group);
        if let Some(status) = status {
            args.insert("status", Value::unit_variant(status.code()));
        }

        build_with_schema(self.program_id, accounts, schema, &args)
    }

    /// Approve every check of the record at once
    pub fn approve_instruction(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
    ) -> TokrResult<Instruction> {
        self.authority_instruction(&APPROVE, subject, group, authority, None)
    }

    /// Deny every check of the record at once
    pub fn deny_instruction(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
    ) -> TokrResult<Instruction> {
        self.authority_instruction(&DENY, subject, group, authority, None)
    }

    /// Set one sub-status of the record
    pub fn update_status_instruction(
        &self,
        kind: StatusKind,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Instruction> {
        self.authority_instruction(kind.schema(), subject, group, authority, Some(status))
    }

    /// Set the accreditation status
    pub fn update_ia_status(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Instruction> {
        self.update_status_instruction(StatusKind::Ia, subject, group, authority, status)
    }

    /// Set the AML status
    pub fn update_aml_status(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Instruction> {
        self.update_status_instruction(StatusKind::Aml, subject, group, authority, status)
    }

    /// Set the KYC status
    pub fn update_kyc_status(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        authority: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Instruction> {
        self.update_status_instruction(StatusKind::Kyc, subject, group, authority, status)
    }

    /// Hand the update authority of a record to another account
    ///
    /// # Arguments
    /// * `subject` - Subject of the record
    /// * `group` - Group the record belongs to
    /// * `transfer_from` - Current authority (must sign)
    /// * `transfer_to` - New authority
    pub fn transfer_authority_instruction(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        transfer_from: &Pubkey,
        transfer_to: &Pubkey,
    ) -> TokrResult<Instruction> {
        let record = self.record_address(group, subject)?;

        let accounts = vec![
            AccountMeta::new(record.address, false),
            AccountMeta::new_readonly(*subject, false),
            AccountMeta::new_readonly(*transfer_to, false),
            AccountMeta::new_readonly(*transfer_from, true),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &TRANSFER_AUTHORITY,
            &group_args(record.bump, group),
        )
    }

    /// Close a record, returning its rent to the subject
    pub fn delete_record_instruction(
        &self,
        subject: &Pubkey,
        group: &Pubkey,
        signer: &Pubkey,
    ) -> TokrResult<Instruction> {
        let record = self.record_address(group, subject)?;

        let accounts = vec![
            AccountMeta::new(record.address, false),
            AccountMeta::new(*signer, true),
            AccountMeta::new(*subject, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &DELETE_RECORD,
            &group_args(record.bump, group),
        )
    }

    /// Fetch and decode the record of `subject` in `group`
    ///
    /// # Returns
    /// `None` when the record does not exist
    pub fn fetch_record<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        group: &Pubkey,
        subject: &Pubkey,
    ) -> TokrResult<Option<IdentityRecord>> {
        let record = self.record_address(group, subject)?;
        match source.fetch(&record.address)? {
            Some(data) => IdentityRecord::decode(&data).map(Some),
            None => {
                warn!("No identity record for {} in group {}", subject, group);
                Ok(None)
            }
        }
    }

    /// Whether `subject` is fully verified in `group`, false when no record exists
    pub fn is_verified<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        group: &Pubkey,
        subject: &Pubkey,
    ) -> TokrResult<bool> {
        Ok(self
            .fetch_record(source, group, subject)?
            .map(|record| record.is_verified())
            .unwrap_or(false))
    }

    /// Create and submit the signer's record
    pub fn create_record<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        signer: &Keypair,
        group: &Pubkey,
        authority: &Pubkey,
    ) -> TokrResult<Signature> {
        let ix = self.create_record_instruction(&signer.pubkey(), group, authority)?;
        submitter.submit(&[ix], &[signer])
    }

    /// Build and submit a sub-status update signed by the record authority
    pub fn update_status<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        authority: &Keypair,
        kind: StatusKind,
        subject: &Pubkey,
        group: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Signature> {
        let ix =
            self.update_status_instruction(kind, subject, group, &authority.pubkey(), status)?;
        submitter.submit(&[ix], &[authority])
    }
}
