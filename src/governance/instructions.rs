//! Governance instruction builders
//!
//! Account lists follow the program's processors exactly; optional trailing accounts (council
//! mint, voter weight addins) are appended only when given.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_sdk_ids::{system_program, sysvar};

use crate::codec::{ArgumentRecord, Value};
use crate::error::{TokrError, TokrResult};
use crate::ids::TOKEN_PROGRAM_ID;
use crate::instruction::build_with_schema;

use super::pda::{
    get_governance_pda, get_governing_token_holding_pda, get_proposal_pda,
    get_proposal_transaction_pda, get_realm_config_pda, get_realm_pda, get_signatory_record_pda,
    get_token_owner_record_pda, get_vote_record_pda, GovernanceKind,
};
use super::types::{
    cast_vote_schema, set_realm_authority_schema, GovernanceConfig, InstructionData,
    MintMaxVoteWeightSource, RealmConfigArgs, SetRealmAuthorityAction, Vote, VoteType,
    ADD_SIGNATORY, CANCEL_PROPOSAL, CREATE_ACCOUNT_GOVERNANCE, CREATE_MINT_GOVERNANCE,
    CREATE_PROPOSAL, CREATE_REALM, DEPOSIT_GOVERNING_TOKENS, FINALIZE_VOTE,
    FLAG_TRANSACTION_ERROR, INSERT_TRANSACTION, SET_GOVERNANCE_CONFIG, SIGN_OFF_PROPOSAL,
};
use super::{Governance, GovernanceProgramVersion};

/// Arguments for creating a realm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRealmArgs {
    /// Realm name, also its address seed
    pub name: String,
    pub community_mint: Pubkey,
    pub council_mint: Option<Pubkey>,
    pub min_community_weight_to_create_governance: u64,
    pub community_mint_max_vote_weight_source: MintMaxVoteWeightSource,
    /// Community voter weight addin program
    pub community_voter_weight_addin: Option<Pubkey>,
    /// Max community voter weight addin program
    pub max_community_voter_weight_addin: Option<Pubkey>,
}

impl CreateRealmArgs {
    pub fn config_args(&self) -> RealmConfigArgs {
        RealmConfigArgs {
            use_council_mint: self.council_mint.is_some(),
            min_community_weight_to_create_governance: self
                .min_community_weight_to_create_governance,
            community_mint_max_vote_weight_source: self.community_mint_max_vote_weight_source,
            use_community_voter_weight_addin: self.community_voter_weight_addin.is_some(),
            use_max_community_voter_weight_addin: self.max_community_voter_weight_addin.is_some(),
        }
    }
}

/// Arguments for creating a proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProposalArgs {
    pub name: String,
    /// Link to the proposal description
    pub description_link: String,
    pub vote_type: VoteType,
    pub options: Vec<String>,
    /// Whether a "deny" option is added
    pub use_deny_option: bool,
}

impl CreateProposalArgs {
    /// Yes/no proposal with one "Approve" option
    pub fn single_choice(name: impl Into<String>, description_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description_link: description_link.into(),
            vote_type: VoteType::SingleChoice,
            options: vec!["Approve".to_string()],
            use_deny_option: true,
        }
    }

    fn to_record(&self) -> ArgumentRecord {
        ArgumentRecord::new()
            .with("name", self.name.as_str())
            .with("description_link", self.description_link.as_str())
            .with("vote_type", self.vote_type.to_value())
            .with("options", Value::list(self.options.iter().map(String::as_str)))
            .with("use_deny_option", self.use_deny_option)
    }
}

/// Accounts of a proposal being created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateProposalAccounts {
    pub realm: Pubkey,
    pub governance: Pubkey,
    /// Token owner record of the proposal owner
    pub proposal_owner_record: Pubkey,
    pub governing_token_mint: Pubkey,
    /// Owner or delegate of the proposal owner record
    pub governance_authority: Pubkey,
    pub payer: Pubkey,
    pub voter_weight_record: Option<Pubkey>,
}

/// Accounts of a vote being cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastVoteAccounts {
    pub realm: Pubkey,
    pub governance: Pubkey,
    pub proposal: Pubkey,
    pub proposal_owner_record: Pubkey,
    /// Token owner record of the voter
    pub voter_token_owner_record: Pubkey,
    /// Owner or delegate of the voter's record
    pub governance_authority: Pubkey,
    pub governing_token_mint: Pubkey,
    pub payer: Pubkey,
    pub voter_weight_record: Option<Pubkey>,
    pub max_voter_weight_record: Option<Pubkey>,
}

fn config_args(config: &GovernanceConfig) -> ArgumentRecord {
    ArgumentRecord::new().with("config", config.to_record())
}

fn push_optional(accounts: &mut Vec<AccountMeta>, account: Option<&Pubkey>) {
    if let Some(account) = account {
        accounts.push(AccountMeta::new_readonly(*account, false));
    }
}

impl Governance {
    /// Create a realm with its community (and optional council) token holdings
    ///
    /// # Arguments
    /// * `realm_authority` - Initial authority of the realm
    /// * `payer` - Rent payer
    /// * `args` - Realm creation arguments
    pub fn create_realm_instruction(
        &self,
        realm_authority: &Pubkey,
        payer: &Pubkey,
        args: &CreateRealmArgs,
    ) -> TokrResult<Instruction> {
        let realm = get_realm_pda(&self.program_id, &args.name)?;
        let community_holding =
            get_governing_token_holding_pda(&self.program_id, &realm.address, &args.community_mint)?;

        let mut accounts = vec![
            AccountMeta::new(realm.address, false),
            AccountMeta::new_readonly(*realm_authority, false),
            AccountMeta::new_readonly(args.community_mint, false),
            AccountMeta::new(community_holding.address, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
        ];

        if let Some(council_mint) = &args.council_mint {
            let council_holding =
                get_governing_token_holding_pda(&self.program_id, &realm.address, council_mint)?;
            accounts.push(AccountMeta::new_readonly(*council_mint, false));
            accounts.push(AccountMeta::new(council_holding.address, false));
        }

        if args.community_voter_weight_addin.is_some()
            || args.max_community_voter_weight_addin.is_some()
        {
            let realm_config = get_realm_config_pda(&self.program_id, &realm.address)?;
            accounts.push(AccountMeta::new(realm_config.address, false));
            push_optional(&mut accounts, args.community_voter_weight_addin.as_ref());
            push_optional(&mut accounts, args.max_community_voter_weight_addin.as_ref());
        }

        let record = ArgumentRecord::new()
            .with("name", args.name.as_str())
            .with("config_args", args.config_args().to_record());

        build_with_schema(self.program_id, accounts, &CREATE_REALM, &record)
    }

    /// Deposit governing tokens, creating the owner's token owner record on first deposit
    ///
    /// # Arguments
    /// * `realm` - Realm to deposit into
    /// * `governing_token_source` - Token account the tokens are taken from
    /// * `governing_token_mint` - Community or council mint
    /// * `governing_token_owner` - Owner of the resulting voting power (signer)
    /// * `transfer_authority` - Authority of the source account (signer)
    /// * `payer` - Rent payer
    /// * `amount` - Token amount in base units
    #[allow(clippy::too_many_arguments)]
    pub fn deposit_governing_tokens_instruction(
        &self,
        realm: &Pubkey,
        governing_token_source: &Pubkey,
        governing_token_mint: &Pubkey,
        governing_token_owner: &Pubkey,
        transfer_authority: &Pubkey,
        payer: &Pubkey,
        amount: u64,
    ) -> TokrResult<Instruction> {
        let holding = get_governing_token_holding_pda(&self.program_id, realm, governing_token_mint)?;
        let token_owner_record = get_token_owner_record_pda(
            &self.program_id,
            realm,
            governing_token_mint,
            governing_token_owner,
        )?;

        let accounts = vec![
            AccountMeta::new_readonly(*realm, false),
            AccountMeta::new(holding.address, false),
            AccountMeta::new(*governing_token_source, false),
            AccountMeta::new_readonly(*governing_token_owner, true),
            AccountMeta::new_readonly(*transfer_authority, true),
            AccountMeta::new(token_owner_record.address, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &DEPOSIT_GOVERNING_TOKENS,
            &ArgumentRecord::new().with("amount", amount),
        )
    }

    /// Create an account governance over `governed`
    ///
    /// # Arguments
    /// * `realm` - Realm of the governance
    /// * `governed` - Account to govern
    /// * `token_owner_record` - Record proving the creator's voting weight
    /// * `payer` - Rent payer
    /// * `create_authority` - Owner or delegate of the token owner record
    /// * `voter_weight_record` - Addin voter weight record, if the realm uses one
    /// * `config` - Voting rules
    #[allow(clippy::too_many_arguments)]
    pub fn create_governance_instruction(
        &self,
        realm: &Pubkey,
        governed: &Pubkey,
        token_owner_record: &Pubkey,
        payer: &Pubkey,
        create_authority: &Pubkey,
        voter_weight_record: Option<&Pubkey>,
        config: &GovernanceConfig,
    ) -> TokrResult<Instruction> {
        let governance =
            get_governance_pda(&self.program_id, GovernanceKind::Account, realm, governed)?;
        let realm_config = get_realm_config_pda(&self.program_id, realm)?;

        let mut accounts = vec![
            AccountMeta::new_readonly(*realm, false),
            AccountMeta::new(governance.address, false),
            AccountMeta::new_readonly(*governed, false),
            AccountMeta::new_readonly(*token_owner_record, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(*create_authority, true),
            AccountMeta::new_readonly(realm_config.address, false),
        ];
        push_optional(&mut accounts, voter_weight_record);

        build_with_schema(
            self.program_id,
            accounts,
            &CREATE_ACCOUNT_GOVERNANCE,
            &config_args(config),
        )
    }

    /// Create a mint governance, optionally handing it the mint and freeze authorities
    ///
    /// # Arguments
    /// * `realm` - Realm of the governance
    /// * `mint` - Governed mint
    /// * `mint_authority` - Current mint authority (signer)
    /// * `token_owner_record` - Record proving the creator's voting weight
    /// * `payer` - Rent payer
    /// * `create_authority` - Owner or delegate of the token owner record
    /// * `config` - Voting rules
    /// * `transfer_mint_authorities` - Move the mint authorities to the governance
    #[allow(clippy::too_many_arguments)]
    pub fn create_mint_governance_instruction(
        &self,
        realm: &Pubkey,
        mint: &Pubkey,
        mint_authority: &Pubkey,
        token_owner_record: &Pubkey,
        payer: &Pubkey,
        create_authority: &Pubkey,
        config: &GovernanceConfig,
        transfer_mint_authorities: bool,
    ) -> TokrResult<Instruction> {
        let governance = get_governance_pda(&self.program_id, GovernanceKind::Mint, realm, mint)?;
        let realm_config = get_realm_config_pda(&self.program_id, realm)?;

        let accounts = vec![
            AccountMeta::new_readonly(*realm, false),
            AccountMeta::new(governance.address, false),
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(*mint_authority, true),
            AccountMeta::new_readonly(*token_owner_record, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(*create_authority, true),
            AccountMeta::new_readonly(realm_config.address, false),
        ];

        let record = config_args(config).with("transfer_mint_authorities", transfer_mint_authorities);
        build_with_schema(self.program_id, accounts, &CREATE_MINT_GOVERNANCE, &record)
    }

    /// Create proposal number `proposal_index` of a governance
    ///
    /// `proposal_index` is the governance's current `proposals_count`.
    pub fn create_proposal_instruction(
        &self,
        accounts: &CreateProposalAccounts,
        proposal_index: u32,
        args: &CreateProposalArgs,
    ) -> TokrResult<Instruction> {
        let proposal = get_proposal_pda(
            &self.program_id,
            &accounts.governance,
            &accounts.governing_token_mint,
            proposal_index,
        )?;
        let realm_config = get_realm_config_pda(&self.program_id, &accounts.realm)?;

        let mut metas = vec![
            AccountMeta::new_readonly(accounts.realm, false),
            AccountMeta::new(proposal.address, false),
            AccountMeta::new(accounts.governance, false),
            AccountMeta::new(accounts.proposal_owner_record, false),
            AccountMeta::new_readonly(accounts.governing_token_mint, false),
            AccountMeta::new_readonly(accounts.governance_authority, true),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(realm_config.address, false),
        ];
        push_optional(&mut metas, accounts.voter_weight_record.as_ref());

        build_with_schema(self.program_id, metas, &CREATE_PROPOSAL, &args.to_record())
    }

    /// Add a signatory who must sign off before voting starts
    pub fn add_signatory_instruction(
        &self,
        proposal: &Pubkey,
        token_owner_record: &Pubkey,
        governance_authority: &Pubkey,
        payer: &Pubkey,
        signatory: &Pubkey,
    ) -> TokrResult<Instruction> {
        let signatory_record = get_signatory_record_pda(&self.program_id, proposal, signatory)?;

        let accounts = vec![
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*token_owner_record, false),
            AccountMeta::new_readonly(*governance_authority, true),
            AccountMeta::new(signatory_record.address, false),
            AccountMeta::new_readonly(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &ADD_SIGNATORY,
            &ArgumentRecord::new().with("signatory", signatory),
        )
    }

    pub fn cancel_proposal_instruction(
        &self,
        proposal: &Pubkey,
        proposal_owner_record: &Pubkey,
        governance_authority: &Pubkey,
    ) -> TokrResult<Instruction> {
        let accounts = vec![
            AccountMeta::new(*proposal, false),
            AccountMeta::new(*proposal_owner_record, false),
            AccountMeta::new_readonly(*governance_authority, true),
        ];

        build_with_schema(self.program_id, accounts, &CANCEL_PROPOSAL, &ArgumentRecord::new())
    }

    /// Sign off a draft proposal
    ///
    /// The proposal owner signs off directly through its token owner record; any other signatory
    /// goes through its signatory record.
    pub fn sign_off_proposal_instruction(
        &self,
        realm: &Pubkey,
        governance: &Pubkey,
        proposal: &Pubkey,
        signatory: &Pubkey,
        proposal_owner_record: Option<&Pubkey>,
    ) -> TokrResult<Instruction> {
        let mut accounts = vec![
            AccountMeta::new(*realm, false),
            AccountMeta::new(*governance, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*signatory, true),
        ];

        match proposal_owner_record {
            Some(record) => accounts.push(AccountMeta::new_readonly(*record, false)),
            None => {
                let signatory_record =
                    get_signatory_record_pda(&self.program_id, proposal, signatory)?;
                accounts.push(AccountMeta::new(signatory_record.address, false));
            }
        }

        build_with_schema(self.program_id, accounts, &SIGN_OFF_PROPOSAL, &ArgumentRecord::new())
    }

    /// Store instructions to execute if option `option_index` passes
    ///
    /// # Arguments
    /// * `governance` - Governance of the proposal
    /// * `proposal` - Draft proposal
    /// * `token_owner_record` - Proposal owner record
    /// * `governance_authority` - Owner or delegate of the record (signer)
    /// * `payer` - Rent payer
    /// * `position` - (option index, transaction index)
    /// * `hold_up_time` - Seconds between vote success and execution
    /// * `instructions` - Instructions executed together
    #[allow(clippy::too_many_arguments)]
    pub fn insert_transaction_instruction(
        &self,
        governance: &Pubkey,
        proposal: &Pubkey,
        token_owner_record: &Pubkey,
        governance_authority: &Pubkey,
        payer: &Pubkey,
        position: (u8, u16),
        hold_up_time: u32,
        instructions: &[Instruction],
    ) -> TokrResult<Instruction> {
        let (option_index, index) = position;
        let proposal_transaction = get_proposal_transaction_pda(
            &self.program_id,
            self.version,
            proposal,
            option_index,
            index,
        )?;

        let accounts = vec![
            AccountMeta::new_readonly(*governance, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*token_owner_record, false),
            AccountMeta::new_readonly(*governance_authority, true),
            AccountMeta::new(proposal_transaction.address, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
        ];

        let stored = instructions
            .iter()
            .map(|ix| InstructionData::from(ix).to_value());
        let record = ArgumentRecord::new()
            .with("option_index", option_index)
            .with("index", index)
            .with("hold_up_time", hold_up_time)
            .with("instructions", Value::list(stored));

        build_with_schema(self.program_id, accounts, &INSERT_TRANSACTION, &record)
    }

    /// Cast a vote, encoded for the adapter's program version
    pub fn cast_vote_instruction(
        &self,
        accounts: &CastVoteAccounts,
        vote: &Vote,
    ) -> TokrResult<Instruction> {
        let vote_record = get_vote_record_pda(
            &self.program_id,
            &accounts.proposal,
            &accounts.voter_token_owner_record,
        )?;
        let realm_config = get_realm_config_pda(&self.program_id, &accounts.realm)?;

        let mut metas = vec![
            AccountMeta::new(accounts.realm, false),
            AccountMeta::new(accounts.governance, false),
            AccountMeta::new(accounts.proposal, false),
            AccountMeta::new(accounts.proposal_owner_record, false),
            AccountMeta::new(accounts.voter_token_owner_record, false),
            AccountMeta::new_readonly(accounts.governance_authority, true),
            AccountMeta::new(vote_record.address, false),
            AccountMeta::new_readonly(accounts.governing_token_mint, false),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(realm_config.address, false),
        ];
        push_optional(&mut metas, accounts.voter_weight_record.as_ref());
        push_optional(&mut metas, accounts.max_voter_weight_record.as_ref());

        let record = ArgumentRecord::new().with("vote", vote.to_value(self.version)?);
        build_with_schema(self.program_id, metas, cast_vote_schema(self.version), &record)
    }

    /// Close voting once the voting time has elapsed
    pub fn finalize_vote_instruction(
        &self,
        realm: &Pubkey,
        governance: &Pubkey,
        proposal: &Pubkey,
        proposal_owner_record: &Pubkey,
        governing_token_mint: &Pubkey,
        max_voter_weight_record: Option<&Pubkey>,
    ) -> TokrResult<Instruction> {
        let realm_config = get_realm_config_pda(&self.program_id, realm)?;

        let mut accounts = vec![
            AccountMeta::new(*realm, false),
            AccountMeta::new(*governance, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new(*proposal_owner_record, false),
            AccountMeta::new_readonly(*governing_token_mint, false),
            AccountMeta::new_readonly(realm_config.address, false),
        ];
        push_optional(&mut accounts, max_voter_weight_record);

        build_with_schema(self.program_id, accounts, &FINALIZE_VOTE, &ArgumentRecord::new())
    }

    /// Mark a failing proposal transaction so the proposal can complete
    pub fn flag_transaction_error_instruction(
        &self,
        proposal: &Pubkey,
        token_owner_record: &Pubkey,
        governance_authority: &Pubkey,
        proposal_transaction: &Pubkey,
    ) -> TokrResult<Instruction> {
        let accounts = vec![
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*token_owner_record, false),
            AccountMeta::new_readonly(*governance_authority, true),
            AccountMeta::new(*proposal_transaction, false),
        ];

        build_with_schema(
            self.program_id,
            accounts,
            &FLAG_TRANSACTION_ERROR,
            &ArgumentRecord::new(),
        )
    }

    /// Replace the voting rules of a governance
    ///
    /// Only the governance itself may sign, so this instruction is meant to be inserted into
    /// one of its proposals.
    pub fn set_governance_config_instruction(
        &self,
        governance: &Pubkey,
        config: &GovernanceConfig,
    ) -> TokrResult<Instruction> {
        let accounts = vec![AccountMeta::new(*governance, true)];
        build_with_schema(
            self.program_id,
            accounts,
            &SET_GOVERNANCE_CONFIG,
            &config_args(config),
        )
    }

    /// Change or remove the realm authority
    ///
    /// Version 1 programs take the new authority as an optional argument; version 2 programs
    /// take an action and the new authority as an account.
    pub fn set_realm_authority_instruction(
        &self,
        realm: &Pubkey,
        realm_authority: &Pubkey,
        new_realm_authority: Option<&Pubkey>,
        action: SetRealmAuthorityAction,
    ) -> TokrResult<Instruction> {
        let schema = set_realm_authority_schema(self.version);
        let new_realm_authority = match action {
            SetRealmAuthorityAction::Remove => None,
            _ => Some(new_realm_authority.ok_or_else(|| TokrError::SchemaMismatch {
                schema: schema.name,
                field: "new_realm_authority".to_string(),
                expected: "publicKey".to_string(),
                found: "none".to_string(),
            })?),
        };

        let mut accounts = vec![
            AccountMeta::new(*realm, false),
            AccountMeta::new_readonly(*realm_authority, true),
        ];

        let record = match self.version {
            GovernanceProgramVersion::V1 => ArgumentRecord::new()
                .with("new_realm_authority", new_realm_authority.copied()),
            GovernanceProgramVersion::V2 => {
                if let Some(new_authority) = new_realm_authority {
                    accounts.push(AccountMeta::new_readonly(*new_authority, false));
                }
                ArgumentRecord::new().with("action", Value::unit_variant(action.code()))
            }
        };

        build_with_schema(self.program_id, accounts, schema, &record)
    }
}
