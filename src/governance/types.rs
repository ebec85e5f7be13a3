//! Governance argument types and their wire schemas
//!
//! The governance program is a native (non-Anchor) program: every instruction starts with a
//! one-byte variant tag of its instruction enum, followed by the borsh encoded variant fields.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::codec::{ArgumentRecord, Field, FieldType, Prefix, Schema, Value, Variant};
use crate::config::GovernanceConfigParams;
use crate::error::{TokrError, TokrResult};

use super::GovernanceProgramVersion;

// ============================================================
// === Field types ============================================
// ============================================================

const VOTE_THRESHOLD_PERCENTAGE: FieldType = FieldType::Enum(&[
    Variant::new("YesVote", &[Field::new("0", FieldType::U8)]),
    Variant::new("Quorum", &[Field::new("0", FieldType::U8)]),
]);

const VOTE_TIPPING: FieldType = FieldType::Enum(&[
    Variant::unit("Strict"),
    Variant::unit("Early"),
    Variant::unit("Disabled"),
]);

const MINT_MAX_VOTE_WEIGHT_SOURCE: FieldType = FieldType::Enum(&[
    Variant::new("SupplyFraction", &[Field::new("0", FieldType::U64)]),
    Variant::new("Absolute", &[Field::new("0", FieldType::U64)]),
]);

const VOTE_TYPE: FieldType = FieldType::Enum(&[
    Variant::unit("SingleChoice"),
    Variant::new("MultiChoice", &[Field::new("0", FieldType::U16)]),
]);

static VOTE_CHOICE_RECORD: FieldType = FieldType::Record(&VOTE_CHOICE);

static VOTE_APPROVE_FIELDS: [Field; 1] = [Field::new("0", FieldType::Vec(&VOTE_CHOICE_RECORD))];

const VOTE: FieldType = FieldType::Enum(&[
    Variant::new("Approve", &VOTE_APPROVE_FIELDS),
    Variant::unit("Deny"),
    Variant::unit("Abstain"),
    Variant::unit("Veto"),
]);

const YES_NO_VOTE: FieldType = FieldType::Enum(&[Variant::unit("Yes"), Variant::unit("No")]);

const SET_REALM_AUTHORITY_ACTION: FieldType = FieldType::Enum(&[
    Variant::unit("SetUnchecked"),
    Variant::unit("SetChecked"),
    Variant::unit("Remove"),
]);

pub static VOTE_CHOICE: Schema = Schema::new(
    "VoteChoice",
    Prefix::None,
    &[
        Field::new("rank", FieldType::U8),
        Field::new("weight_percentage", FieldType::U8),
    ],
);

pub static GOVERNANCE_CONFIG: Schema = Schema::new(
    "GovernanceConfig",
    Prefix::None,
    &[
        Field::new("vote_threshold_percentage", VOTE_THRESHOLD_PERCENTAGE),
        Field::new("min_community_weight_to_create_proposal", FieldType::U64),
        Field::new("min_transaction_hold_up_time", FieldType::U32),
        Field::new("max_voting_time", FieldType::U32),
        Field::new("vote_tipping", VOTE_TIPPING),
        Field::new("proposal_cool_off_time", FieldType::U32),
        Field::new("min_council_weight_to_create_proposal", FieldType::U64),
    ],
);

pub static REALM_CONFIG_ARGS: Schema = Schema::new(
    "RealmConfigArgs",
    Prefix::None,
    &[
        Field::new("use_council_mint", FieldType::Bool),
        Field::new("min_community_weight_to_create_governance", FieldType::U64),
        Field::new(
            "community_mint_max_vote_weight_source",
            MINT_MAX_VOTE_WEIGHT_SOURCE,
        ),
        Field::new("use_community_voter_weight_addin", FieldType::Bool),
        Field::new("use_max_community_voter_weight_addin", FieldType::Bool),
    ],
);

pub static ACCOUNT_META_DATA: Schema = Schema::new(
    "AccountMetaData",
    Prefix::None,
    &[
        Field::new("pubkey", FieldType::PublicKey),
        Field::new("is_signer", FieldType::Bool),
        Field::new("is_writable", FieldType::Bool),
    ],
);

pub static INSTRUCTION_DATA: Schema = Schema::new(
    "InstructionData",
    Prefix::None,
    &[
        Field::new("program_id", FieldType::PublicKey),
        Field::new(
            "accounts",
            FieldType::Vec(&FieldType::Record(&ACCOUNT_META_DATA)),
        ),
        Field::new("data", FieldType::Bytes),
    ],
);

// ============================================================
// === Instruction schemas ====================================
// ============================================================

pub static CREATE_REALM: Schema = Schema::new(
    "CreateRealm",
    Prefix::Tag(0),
    &[
        Field::new("name", FieldType::String),
        Field::new("config_args", FieldType::Record(&REALM_CONFIG_ARGS)),
    ],
);

pub static DEPOSIT_GOVERNING_TOKENS: Schema = Schema::new(
    "DepositGoverningTokens",
    Prefix::Tag(1),
    &[Field::new("amount", FieldType::U64)],
);

pub static CREATE_ACCOUNT_GOVERNANCE: Schema = Schema::new(
    "CreateAccountGovernance",
    Prefix::Tag(4),
    &[Field::new("config", FieldType::Record(&GOVERNANCE_CONFIG))],
);

pub static CREATE_PROPOSAL: Schema = Schema::new(
    "CreateProposal",
    Prefix::Tag(6),
    &[
        Field::new("name", FieldType::String),
        Field::new("description_link", FieldType::String),
        Field::new("vote_type", VOTE_TYPE),
        Field::new("options", FieldType::Vec(&FieldType::String)),
        Field::new("use_deny_option", FieldType::Bool),
    ],
);

pub static ADD_SIGNATORY: Schema = Schema::new(
    "AddSignatory",
    Prefix::Tag(7),
    &[Field::new("signatory", FieldType::PublicKey)],
);

pub static INSERT_TRANSACTION: Schema = Schema::new(
    "InsertTransaction",
    Prefix::Tag(9),
    &[
        Field::new("option_index", FieldType::U8),
        Field::new("index", FieldType::U16),
        Field::new("hold_up_time", FieldType::U32),
        Field::new(
            "instructions",
            FieldType::Vec(&FieldType::Record(&INSTRUCTION_DATA)),
        ),
    ],
);

pub static CANCEL_PROPOSAL: Schema = Schema::new("CancelProposal", Prefix::Tag(11), &[]);

pub static SIGN_OFF_PROPOSAL: Schema = Schema::new("SignOffProposal", Prefix::Tag(12), &[]);

pub static CAST_VOTE_V1: Schema = Schema::new(
    "CastVote",
    Prefix::Tag(13),
    &[Field::new("vote", YES_NO_VOTE)],
);

pub static CAST_VOTE_V2: Schema = Schema::new(
    "CastVote",
    Prefix::Tag(13),
    &[Field::new("vote", VOTE)],
);

pub static FINALIZE_VOTE: Schema = Schema::new("FinalizeVote", Prefix::Tag(14), &[]);

pub static CREATE_MINT_GOVERNANCE: Schema = Schema::new(
    "CreateMintGovernance",
    Prefix::Tag(17),
    &[
        Field::new("config", FieldType::Record(&GOVERNANCE_CONFIG)),
        Field::new("transfer_mint_authorities", FieldType::Bool),
    ],
);

pub static SET_GOVERNANCE_CONFIG: Schema = Schema::new(
    "SetGovernanceConfig",
    Prefix::Tag(19),
    &[Field::new("config", FieldType::Record(&GOVERNANCE_CONFIG))],
);

pub static FLAG_TRANSACTION_ERROR: Schema =
    Schema::new("FlagTransactionError", Prefix::Tag(20), &[]);

pub static SET_REALM_AUTHORITY_V1: Schema = Schema::new(
    "SetRealmAuthority",
    Prefix::Tag(21),
    &[Field::new(
        "new_realm_authority",
        FieldType::Option(&FieldType::PublicKey),
    )],
);

pub static SET_REALM_AUTHORITY_V2: Schema = Schema::new(
    "SetRealmAuthority",
    Prefix::Tag(21),
    &[Field::new("action", SET_REALM_AUTHORITY_ACTION)],
);

pub static DEPOSIT_CAPITAL: Schema = Schema::new(
    "DepositCapital",
    Prefix::Tag(26),
    &[
        Field::new("amount", FieldType::U64),
        Field::new("decimals", FieldType::U8),
    ],
);

/// CastVote payload layout for a program version
pub fn cast_vote_schema(version: GovernanceProgramVersion) -> &'static Schema {
    match version {
        GovernanceProgramVersion::V1 => &CAST_VOTE_V1,
        GovernanceProgramVersion::V2 => &CAST_VOTE_V2,
    }
}

/// SetRealmAuthority payload layout for a program version
pub fn set_realm_authority_schema(version: GovernanceProgramVersion) -> &'static Schema {
    match version {
        GovernanceProgramVersion::V1 => &SET_REALM_AUTHORITY_V1,
        GovernanceProgramVersion::V2 => &SET_REALM_AUTHORITY_V2,
    }
}

// ============================================================
// === Account schemas ========================================
// ============================================================

pub static REALM_CONFIG: Schema = Schema::new(
    "RealmConfig",
    Prefix::None,
    &[
        Field::new("use_community_voter_weight_addin", FieldType::Bool),
        Field::new("use_max_community_voter_weight_addin", FieldType::Bool),
        Field::new("reserved", FieldType::FixedBytes(6)),
        Field::new("min_community_weight_to_create_governance", FieldType::U64),
        Field::new(
            "community_mint_max_vote_weight_source",
            MINT_MAX_VOTE_WEIGHT_SOURCE,
        ),
        Field::new("council_mint", FieldType::Option(&FieldType::PublicKey)),
    ],
);

pub static REALM_ACCOUNT: Schema = Schema::new(
    "Realm",
    Prefix::None,
    &[
        Field::new("account_type", FieldType::U8),
        Field::new("community_mint", FieldType::PublicKey),
        Field::new("config", FieldType::Record(&REALM_CONFIG)),
        Field::new("reserved", FieldType::FixedBytes(6)),
        Field::new("voting_proposal_count", FieldType::U16),
        Field::new("authority", FieldType::Option(&FieldType::PublicKey)),
        Field::new("name", FieldType::String),
    ],
);

pub static GOVERNANCE_ACCOUNT: Schema = Schema::new(
    "Governance",
    Prefix::None,
    &[
        Field::new("account_type", FieldType::U8),
        Field::new("realm", FieldType::PublicKey),
        Field::new("governed_account", FieldType::PublicKey),
        Field::new("proposals_count", FieldType::U32),
        Field::new("config", FieldType::Record(&GOVERNANCE_CONFIG)),
        Field::new("reserved", FieldType::FixedBytes(6)),
        Field::new("voting_proposal_count", FieldType::U16),
    ],
);

// ============================================================
// === Typed arguments ========================================
// ============================================================

fn single(value: impl Into<Value>) -> ArgumentRecord {
    ArgumentRecord::new().with("0", value)
}

fn unknown_variant(schema: &'static str, field: &str, variant: u8) -> TokrError {
    TokrError::SchemaMismatch {
        schema,
        field: field.to_string(),
        expected: "known variant".to_string(),
        found: format!("variant {}", variant),
    }
}

/// Vote threshold a proposal must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteThresholdPercentage {
    /// Percentage of yes votes against the max voter weight
    YesVote(u8),
    /// Percentage of all votes cast against the max voter weight
    Quorum(u8),
}

impl VoteThresholdPercentage {
    pub fn to_value(&self) -> Value {
        match self {
            VoteThresholdPercentage::YesVote(pct) => Value::variant(0, single(*pct)),
            VoteThresholdPercentage::Quorum(pct) => Value::variant(1, single(*pct)),
        }
    }

    fn from_value(variant: u8, fields: &ArgumentRecord) -> TokrResult<Self> {
        let pct = fields.u8("0")?;
        match variant {
            0 => Ok(VoteThresholdPercentage::YesVote(pct)),
            1 => Ok(VoteThresholdPercentage::Quorum(pct)),
            other => Err(unknown_variant(
                GOVERNANCE_CONFIG.name,
                "vote_threshold_percentage",
                other,
            )),
        }
    }
}

/// When a vote may end before its voting time elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteTipping {
    /// Tip once the outcome can no longer change
    #[default]
    Strict,
    /// Tip as soon as the threshold is reached
    Early,
    /// Always run the full voting time
    Disabled,
}

impl VoteTipping {
    pub fn code(self) -> u8 {
        match self {
            VoteTipping::Strict => 0,
            VoteTipping::Early => 1,
            VoteTipping::Disabled => 2,
        }
    }
}

impl TryFrom<u8> for VoteTipping {
    type Error = TokrError;

    fn try_from(code: u8) -> TokrResult<Self> {
        match code {
            0 => Ok(VoteTipping::Strict),
            1 => Ok(VoteTipping::Early),
            2 => Ok(VoteTipping::Disabled),
            other => Err(TokrError::Config(format!("unknown vote tipping {}", other))),
        }
    }
}

/// Voting rules of a governance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceConfig {
    pub vote_threshold_percentage: VoteThresholdPercentage,
    pub min_community_weight_to_create_proposal: u64,
    /// Seconds
    pub min_transaction_hold_up_time: u32,
    /// Seconds
    pub max_voting_time: u32,
    pub vote_tipping: VoteTipping,
    /// Seconds
    pub proposal_cool_off_time: u32,
    pub min_council_weight_to_create_proposal: u64,
}

impl GovernanceConfig {
    pub fn to_record(&self) -> ArgumentRecord {
        ArgumentRecord::new()
            .with(
                "vote_threshold_percentage",
                self.vote_threshold_percentage.to_value(),
            )
            .with(
                "min_community_weight_to_create_proposal",
                self.min_community_weight_to_create_proposal,
            )
            .with(
                "min_transaction_hold_up_time",
                self.min_transaction_hold_up_time,
            )
            .with("max_voting_time", self.max_voting_time)
            .with(
                "vote_tipping",
                Value::unit_variant(self.vote_tipping.code()),
            )
            .with("proposal_cool_off_time", self.proposal_cool_off_time)
            .with(
                "min_council_weight_to_create_proposal",
                self.min_council_weight_to_create_proposal,
            )
    }

    pub fn from_record(record: &ArgumentRecord) -> TokrResult<Self> {
        let (threshold, threshold_fields) = record.variant("vote_threshold_percentage")?;
        Ok(Self {
            vote_threshold_percentage: VoteThresholdPercentage::from_value(
                threshold,
                threshold_fields,
            )?,
            min_community_weight_to_create_proposal: record
                .u64("min_community_weight_to_create_proposal")?,
            min_transaction_hold_up_time: record.u32("min_transaction_hold_up_time")?,
            max_voting_time: record.u32("max_voting_time")?,
            vote_tipping: VoteTipping::try_from(record.variant("vote_tipping")?.0)?,
            proposal_cool_off_time: record.u32("proposal_cool_off_time")?,
            min_council_weight_to_create_proposal: record
                .u64("min_council_weight_to_create_proposal")?,
        })
    }
}

impl TryFrom<&GovernanceConfigParams> for GovernanceConfig {
    type Error = TokrError;

    fn try_from(params: &GovernanceConfigParams) -> TokrResult<Self> {
        Ok(Self {
            vote_threshold_percentage: VoteThresholdPercentage::YesVote(
                params.vote_threshold_percentage,
            ),
            min_community_weight_to_create_proposal: params
                .min_community_tokens_to_create_proposal,
            min_transaction_hold_up_time: params.min_instruction_hold_up_time,
            max_voting_time: params.max_voting_time,
            vote_tipping: VoteTipping::try_from(params.vote_tipping)?,
            proposal_cool_off_time: params.proposal_cool_off_time,
            min_council_weight_to_create_proposal: params.min_council_tokens_to_create_proposal,
        })
    }
}

/// How the max vote weight of the community mint is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintMaxVoteWeightSource {
    /// Fraction of the supply, scaled by [`MintMaxVoteWeightSource::SUPPLY_FRACTION_BASE`]
    SupplyFraction(u64),
    /// Fixed vote weight
    Absolute(u64),
}

impl MintMaxVoteWeightSource {
    pub const SUPPLY_FRACTION_BASE: u64 = 10_000_000_000;

    /// The whole supply counts
    pub const FULL_SUPPLY_FRACTION: Self = MintMaxVoteWeightSource::SupplyFraction(
        MintMaxVoteWeightSource::SUPPLY_FRACTION_BASE,
    );

    pub fn to_value(&self) -> Value {
        match self {
            MintMaxVoteWeightSource::SupplyFraction(v) => Value::variant(0, single(*v)),
            MintMaxVoteWeightSource::Absolute(v) => Value::variant(1, single(*v)),
        }
    }

    fn from_value(variant: u8, fields: &ArgumentRecord) -> TokrResult<Self> {
        let v = fields.u64("0")?;
        match variant {
            0 => Ok(MintMaxVoteWeightSource::SupplyFraction(v)),
            1 => Ok(MintMaxVoteWeightSource::Absolute(v)),
            other => Err(unknown_variant(
                REALM_CONFIG.name,
                "community_mint_max_vote_weight_source",
                other,
            )),
        }
    }
}

impl Default for MintMaxVoteWeightSource {
    fn default() -> Self {
        Self::FULL_SUPPLY_FRACTION
    }
}

/// Realm configuration passed to CreateRealm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmConfigArgs {
    pub use_council_mint: bool,
    pub min_community_weight_to_create_governance: u64,
    pub community_mint_max_vote_weight_source: MintMaxVoteWeightSource,
    pub use_community_voter_weight_addin: bool,
    pub use_max_community_voter_weight_addin: bool,
}

impl RealmConfigArgs {
    pub fn to_record(&self) -> ArgumentRecord {
        ArgumentRecord::new()
            .with("use_council_mint", self.use_council_mint)
            .with(
                "min_community_weight_to_create_governance",
                self.min_community_weight_to_create_governance,
            )
            .with(
                "community_mint_max_vote_weight_source",
                self.community_mint_max_vote_weight_source.to_value(),
            )
            .with(
                "use_community_voter_weight_addin",
                self.use_community_voter_weight_addin,
            )
            .with(
                "use_max_community_voter_weight_addin",
                self.use_max_community_voter_weight_addin,
            )
    }
}

/// Realm authority change mode (program version 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRealmAuthorityAction {
    /// Set without checking the new authority is a governance of the realm
    SetUnchecked,
    /// Set, the new authority must be a governance of the realm
    SetChecked,
    /// Remove the authority
    Remove,
}

impl SetRealmAuthorityAction {
    pub fn code(self) -> u8 {
        match self {
            SetRealmAuthorityAction::SetUnchecked => 0,
            SetRealmAuthorityAction::SetChecked => 1,
            SetRealmAuthorityAction::Remove => 2,
        }
    }
}

/// Weighted choice of a multi-option vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteChoice {
    pub rank: u8,
    pub weight_percentage: u8,
}

impl VoteChoice {
    /// All of the voter's weight on the first option
    pub const FULL: Self = VoteChoice {
        rank: 0,
        weight_percentage: 100,
    };
}

/// A vote cast on a proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vote {
    Approve(Vec<VoteChoice>),
    Deny,
    Abstain,
    Veto,
}

impl Vote {
    /// Full weight approval of a single option proposal
    pub fn yes() -> Self {
        Vote::Approve(vec![VoteChoice::FULL])
    }

    /// Value for the given program version
    ///
    /// Version 1 only knows yes/no: a full weight approval of the single option becomes yes and
    /// a denial no.
    pub fn to_value(&self, version: GovernanceProgramVersion) -> TokrResult<Value> {
        match version {
            GovernanceProgramVersion::V1 => match self {
                Vote::Approve(choices) if choices[..] == [VoteChoice::FULL] => {
                    Ok(Value::unit_variant(0))
                }
                Vote::Deny => Ok(Value::unit_variant(1)),
                other => Err(TokrError::SchemaMismatch {
                    schema: CAST_VOTE_V1.name,
                    field: "vote".to_string(),
                    expected: "yes or no".to_string(),
                    found: format!("{:?}", other),
                }),
            },
            GovernanceProgramVersion::V2 => Ok(match self {
                Vote::Approve(choices) => Value::variant(
                    0,
                    single(Value::list(choices.iter().map(|choice| {
                        ArgumentRecord::new()
                            .with("rank", choice.rank)
                            .with("weight_percentage", choice.weight_percentage)
                    }))),
                ),
                Vote::Deny => Value::unit_variant(1),
                Vote::Abstain => Value::unit_variant(2),
                Vote::Veto => Value::unit_variant(3),
            }),
        }
    }
}

/// Proposal vote type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteType {
    #[default]
    SingleChoice,
    /// Up to n choices
    MultiChoice(u16),
}

impl VoteType {
    pub fn to_value(&self) -> Value {
        match self {
            VoteType::SingleChoice => Value::unit_variant(0),
            VoteType::MultiChoice(n) => Value::variant(1, single(*n)),
        }
    }
}

/// Account of an instruction stored in a proposal transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMetaData {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Instruction stored in a proposal transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionData {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMetaData>,
    pub data: Vec<u8>,
}

impl InstructionData {
    pub fn to_value(&self) -> Value {
        let accounts = self.accounts.iter().map(|meta| {
            ArgumentRecord::new()
                .with("pubkey", meta.pubkey)
                .with("is_signer", meta.is_signer)
                .with("is_writable", meta.is_writable)
        });
        Value::Record(
            ArgumentRecord::new()
                .with("program_id", self.program_id)
                .with("accounts", Value::list(accounts))
                .with("data", Value::bytes(self.data.clone())),
        )
    }
}

impl From<&Instruction> for InstructionData {
    fn from(ix: &Instruction) -> Self {
        Self {
            program_id: ix.program_id,
            accounts: ix
                .accounts
                .iter()
                .map(|meta| AccountMetaData {
                    pubkey: meta.pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: ix.data.clone(),
        }
    }
}

// ============================================================
// === Decoded accounts =======================================
// ============================================================

/// Decoded realm account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Realm {
    pub account_type: u8,
    pub community_mint: Pubkey,
    pub council_mint: Option<Pubkey>,
    pub min_community_weight_to_create_governance: u64,
    pub community_mint_max_vote_weight_source: MintMaxVoteWeightSource,
    pub use_community_voter_weight_addin: bool,
    pub use_max_community_voter_weight_addin: bool,
    pub voting_proposal_count: u16,
    pub authority: Option<Pubkey>,
    pub name: String,
}

fn optional_pubkey(value: Option<&Value>) -> Option<Pubkey> {
    match value {
        Some(Value::Option(Some(inner))) => match inner.as_ref() {
            Value::PublicKey(key) => Some(*key),
            _ => None,
        },
        _ => None,
    }
}

impl Realm {
    pub fn decode(data: &[u8]) -> TokrResult<Self> {
        let record = crate::codec::decode(&REALM_ACCOUNT, data)?;
        let config = record.record("config")?;
        let (source, source_fields) = config.variant("community_mint_max_vote_weight_source")?;
        let name = match record.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => String::new(),
        };

        Ok(Self {
            account_type: record.u8("account_type")?,
            community_mint: record.pubkey("community_mint")?,
            council_mint: optional_pubkey(config.get("council_mint")),
            min_community_weight_to_create_governance: config
                .u64("min_community_weight_to_create_governance")?,
            community_mint_max_vote_weight_source: MintMaxVoteWeightSource::from_value(
                source,
                source_fields,
            )?,
            use_community_voter_weight_addin: config.bool("use_community_voter_weight_addin")?,
            use_max_community_voter_weight_addin: config
                .bool("use_max_community_voter_weight_addin")?,
            voting_proposal_count: record.u16("voting_proposal_count")?,
            authority: optional_pubkey(record.get("authority")),
            name,
        })
    }
}

/// Decoded governance account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceAccount {
    pub account_type: u8,
    pub realm: Pubkey,
    pub governed_account: Pubkey,
    /// Number of proposals created, also the index of the next one
    pub proposals_count: u32,
    pub config: GovernanceConfig,
    pub voting_proposal_count: u16,
}

impl GovernanceAccount {
    pub fn decode(data: &[u8]) -> TokrResult<Self> {
        let record = crate::codec::decode(&GOVERNANCE_ACCOUNT, data)?;
        Ok(Self {
            account_type: record.u8("account_type")?,
            realm: record.pubkey("realm")?,
            governed_account: record.pubkey("governed_account")?,
            proposals_count: record.u32("proposals_count")?,
            config: GovernanceConfig::from_record(record.record("config")?)?,
            voting_proposal_count: record.u16("voting_proposal_count")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use borsh::BorshSerialize;

    fn sample_config() -> GovernanceConfig {
        GovernanceConfig {
            vote_threshold_percentage: VoteThresholdPercentage::YesVote(60),
            min_community_weight_to_create_proposal: 1,
            min_transaction_hold_up_time: 0,
            max_voting_time: 259_200,
            vote_tipping: VoteTipping::Strict,
            proposal_cool_off_time: 0,
            min_council_weight_to_create_proposal: 1,
        }
    }

    #[test]
    fn test_governance_config_layout() {
        let data = encode(&GOVERNANCE_CONFIG, &sample_config().to_record()).unwrap();

        let mut expected = vec![0u8, 60];
        1u64.serialize(&mut expected).unwrap();
        0u32.serialize(&mut expected).unwrap();
        259_200u32.serialize(&mut expected).unwrap();
        expected.push(0);
        0u32.serialize(&mut expected).unwrap();
        1u64.serialize(&mut expected).unwrap();
        assert_eq!(data, expected);

        let decoded = decode(&GOVERNANCE_CONFIG, &data).unwrap();
        assert_eq!(GovernanceConfig::from_record(&decoded).unwrap(), sample_config());
    }

    #[test]
    fn test_config_from_params() {
        let params = GovernanceConfigParams {
            vote_threshold_percentage: 51,
            vote_tipping: 1,
            ..GovernanceConfigParams::default()
        };
        let config = GovernanceConfig::try_from(&params).unwrap();
        assert_eq!(
            config.vote_threshold_percentage,
            VoteThresholdPercentage::YesVote(51)
        );
        assert_eq!(config.vote_tipping, VoteTipping::Early);

        let bad = GovernanceConfigParams {
            vote_tipping: 7,
            ..GovernanceConfigParams::default()
        };
        assert!(GovernanceConfig::try_from(&bad).is_err());
    }

    #[test]
    fn test_vote_encodings_per_version() {
        let v2 = ArgumentRecord::new().with("vote", Vote::yes().to_value(GovernanceProgramVersion::V2).unwrap());
        assert_eq!(
            encode(&CAST_VOTE_V2, &v2).unwrap(),
            vec![13, 0, 1, 0, 0, 0, 0, 100]
        );

        let v1 = ArgumentRecord::new().with("vote", Vote::Deny.to_value(GovernanceProgramVersion::V1).unwrap());
        assert_eq!(encode(&CAST_VOTE_V1, &v1).unwrap(), vec![13, 1]);

        assert!(Vote::Veto.to_value(GovernanceProgramVersion::V1).is_err());
    }

    #[test]
    fn test_v1_approve_requires_single_full_choice() {
        assert_eq!(
            Vote::yes().to_value(GovernanceProgramVersion::V1).unwrap(),
            Value::unit_variant(0)
        );

        let partial = Vote::Approve(vec![VoteChoice {
            rank: 0,
            weight_percentage: 40,
        }]);
        let multi = Vote::Approve(vec![
            VoteChoice::FULL,
            VoteChoice {
                rank: 1,
                weight_percentage: 100,
            },
        ]);
        for vote in [partial, multi, Vote::Approve(vec![])] {
            assert!(matches!(
                vote.to_value(GovernanceProgramVersion::V1),
                Err(TokrError::SchemaMismatch { field, .. }) if field == "vote"
            ));
            assert!(vote.to_value(GovernanceProgramVersion::V2).is_ok());
        }
    }

    #[test]
    fn test_unknown_variant_index_is_rejected() {
        let record = sample_config()
            .to_record()
            .with("vote_threshold_percentage", Value::variant(5, single(60u8)));
        assert!(matches!(
            GovernanceConfig::from_record(&record),
            Err(TokrError::SchemaMismatch { field, .. }) if field == "vote_threshold_percentage"
        ));

        assert!(matches!(
            MintMaxVoteWeightSource::from_value(2, &single(1u64)),
            Err(TokrError::SchemaMismatch { .. })
        ));
        assert_eq!(
            MintMaxVoteWeightSource::from_value(1, &single(7u64)).unwrap(),
            MintMaxVoteWeightSource::Absolute(7)
        );
    }

    #[test]
    fn test_full_supply_fraction() {
        let record = RealmConfigArgs {
            use_council_mint: true,
            min_community_weight_to_create_governance: 5,
            community_mint_max_vote_weight_source: MintMaxVoteWeightSource::default(),
            use_community_voter_weight_addin: false,
            use_max_community_voter_weight_addin: false,
        }
        .to_record();
        let data = encode(&REALM_CONFIG_ARGS, &record).unwrap();

        let mut expected = vec![1u8];
        5u64.serialize(&mut expected).unwrap();
        expected.push(0);
        10_000_000_000u64.serialize(&mut expected).unwrap();
        expected.extend_from_slice(&[0, 0]);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_instruction_data_from_instruction() {
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![solana_sdk::instruction::AccountMeta::new(
                Pubkey::new_unique(),
                true,
            )],
            data: vec![1, 2, 3],
        };
        let stored = InstructionData::from(&ix);
        assert_eq!(stored.accounts[0].pubkey, ix.accounts[0].pubkey);
        assert!(stored.accounts[0].is_signer && stored.accounts[0].is_writable);

        let record = match stored.to_value() {
            Value::Record(record) => record,
            other => panic!("expected record, got {:?}", other),
        };
        let data = encode(&INSTRUCTION_DATA, &record).unwrap();
        assert_eq!(data.len(), 32 + 4 + 34 + 4 + 3);
    }

    #[test]
    fn test_governance_account_decode() {
        let realm = Pubkey::new_unique();
        let governed = Pubkey::new_unique();
        let record = ArgumentRecord::new()
            .with("account_type", 18u8)
            .with("realm", realm)
            .with("governed_account", governed)
            .with("proposals_count", 3u32)
            .with("config", sample_config().to_record())
            .with("reserved", Value::FixedBytes(vec![0; 6]))
            .with("voting_proposal_count", 1u16);
        let mut data = encode(&GOVERNANCE_ACCOUNT, &record).unwrap();
        data.extend_from_slice(&[0u8; 32]);

        let account = GovernanceAccount::decode(&data).unwrap();
        assert_eq!(account.realm, realm);
        assert_eq!(account.governed_account, governed);
        assert_eq!(account.proposals_count, 3);
        assert_eq!(account.config, sample_config());
    }

    #[test]
    fn test_realm_account_decode() {
        let community_mint = Pubkey::new_unique();
        let council_mint = Pubkey::new_unique();
        let config = ArgumentRecord::new()
            .with("use_community_voter_weight_addin", false)
            .with("use_max_community_voter_weight_addin", false)
            .with("reserved", Value::FixedBytes(vec![0; 6]))
            .with("min_community_weight_to_create_governance", 100u64)
            .with(
                "community_mint_max_vote_weight_source",
                MintMaxVoteWeightSource::FULL_SUPPLY_FRACTION.to_value(),
            )
            .with("council_mint", Some(council_mint));
        let record = ArgumentRecord::new()
            .with("account_type", 16u8)
            .with("community_mint", community_mint)
            .with("config", config)
            .with("reserved", Value::FixedBytes(vec![0; 6]))
            .with("voting_proposal_count", 0u16)
            .with("authority", Option::<Pubkey>::None)
            .with("name", "Fund I");
        let data = encode(&REALM_ACCOUNT, &record).unwrap();

        let realm = Realm::decode(&data).unwrap();
        assert_eq!(realm.community_mint, community_mint);
        assert_eq!(realm.council_mint, Some(council_mint));
        assert_eq!(realm.authority, None);
        assert_eq!(realm.name, "Fund I");
        assert_eq!(
            realm.community_mint_max_vote_weight_source,
            MintMaxVoteWeightSource::FULL_SUPPLY_FRACTION
        );
    }
}
