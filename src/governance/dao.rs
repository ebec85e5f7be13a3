//! Investment DAO setup and capital deposits
//!
//! An investment DAO is a realm whose community mint is the LP token and whose council mint is
//! a single delegate token. Three governances sit in it:
//! * the LP governance, which becomes the realm authority and holds the capital supply
//! * the delegate mint governance, which holds the LP treasury stock
//! * the distribution mint governance, which holds the capital paid out to LPs
//!
//! Setting one up takes four transactions, submitted in order:
//! 1. allocate and initialize the LP, delegate and distribution mints
//! 2. create the delegate's token account and mint the single delegate token to it
//! 3. create the realm and its governances, then deposit the delegate token
//! 4. create the treasury token accounts, mint the LP supply into the treasury stock and fix it

use log::info;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solana_sdk_ids::{system_program, sysvar};

use crate::cap_table::mint_decimals;
use crate::codec::ArgumentRecord;
use crate::config::{DepositCapitalAccounts, InvestmentDaoConfig};
use crate::error::{TokrError, TokrResult};
use crate::ids::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::instruction::build_with_schema;
use crate::pda::{get_associated_token_address, get_identity_record_pda};
use crate::submit::{AccountSource, Submitter};
use crate::token::{
    create_associated_token_account_instruction, create_mint_instructions, mint_to_instruction,
    set_authority_instruction, AuthorityType, MINT_RENT_EXEMPT_LAMPORTS,
};

use super::instructions::CreateRealmArgs;
use super::pda::{get_governance_pda, get_realm_pda, get_token_owner_record_pda, GovernanceKind};
use super::types::{
    GovernanceConfig, MintMaxVoteWeightSource, SetRealmAuthorityAction, DEPOSIT_CAPITAL,
};
use super::Governance;

/// Community weight needed to create a governance, high enough that LPs never can
pub const LP_MIN_COMMUNITY_WEIGHT_TO_CREATE_GOVERNANCE: u64 = 1_000_000 * 1_000_000_000;

/// Delegate tokens minted to and deposited for the delegate at setup
pub const DELEGATE_DEPOSIT_AMOUNT: u64 = 1;

/// Decimals of the three DAO mints
pub const DAO_MINT_DECIMALS: u8 = 0;

/// Arguments for setting up an investment DAO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentDaoArgs {
    /// Realm name
    pub name: String,
    /// Creator, initial realm authority and mint authority of the three mints
    pub owner: Pubkey,
    /// Holder of the delegate token
    pub delegate: Pubkey,
    /// LP token mint (community mint)
    pub lp_mint: Pubkey,
    /// Delegate token mint (council mint)
    pub delegate_mint: Pubkey,
    pub distribution_mint: Pubkey,
    /// Capital token mint
    pub usdc_mint: Pubkey,
    /// Voting rules shared by the three governances
    pub config: GovernanceConfig,
    /// LP tokens minted into the treasury stock, the maximum raise
    pub lp_token_supply: u64,
    /// Lamports funding each new mint account
    pub mint_rent_lamports: u64,
}

impl InvestmentDaoArgs {
    /// Arguments from a create-dao parameter file
    pub fn from_config(
        config: &InvestmentDaoConfig,
        owner: Pubkey,
        delegate: Pubkey,
        lp_mint: Pubkey,
        delegate_mint: Pubkey,
        distribution_mint: Pubkey,
    ) -> TokrResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            owner,
            delegate,
            lp_mint,
            delegate_mint,
            distribution_mint,
            usdc_mint: config.usdc_mint()?,
            config: GovernanceConfig::try_from(&config.governance)?,
            lp_token_supply: config.details.max_raise,
            mint_rent_lamports: MINT_RENT_EXEMPT_LAMPORTS,
        })
    }
}

/// Fresh keypairs of the three DAO mints, which sign their own allocation
#[derive(Debug)]
pub struct InvestmentDaoMints {
    pub lp_mint: Keypair,
    pub delegate_mint: Keypair,
    pub distribution_mint: Keypair,
}

impl InvestmentDaoMints {
    pub fn generate() -> Self {
        Self {
            lp_mint: Keypair::new(),
            delegate_mint: Keypair::new(),
            distribution_mint: Keypair::new(),
        }
    }

    fn matches(&self, args: &InvestmentDaoArgs) -> bool {
        self.lp_mint.pubkey() == args.lp_mint
            && self.delegate_mint.pubkey() == args.delegate_mint
            && self.distribution_mint.pubkey() == args.distribution_mint
    }
}

/// Signers of the four setup batches, in batch order
///
/// Fails with `Config` when a keypair does not match its address in `args`.
pub fn investment_dao_signers<'a>(
    owner: &'a Keypair,
    delegate: &'a Keypair,
    mints: &'a InvestmentDaoMints,
    args: &InvestmentDaoArgs,
) -> TokrResult<[Vec<&'a Keypair>; 4]> {
    if owner.pubkey() != args.owner || delegate.pubkey() != args.delegate {
        return Err(TokrError::Config(
            "owner and delegate keypairs do not match the DAO arguments".to_string(),
        ));
    }
    if !mints.matches(args) {
        return Err(TokrError::Config(
            "mint keypairs do not match the DAO arguments".to_string(),
        ));
    }

    let realm = if owner.pubkey() == delegate.pubkey() {
        vec![owner]
    } else {
        vec![owner, delegate]
    };
    Ok([
        vec![
            owner,
            &mints.lp_mint,
            &mints.delegate_mint,
            &mints.distribution_mint,
        ],
        vec![owner],
        realm,
        vec![owner],
    ])
}

/// Every address created by the investment DAO setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvestmentDaoAddresses {
    pub realm: Pubkey,
    /// Delegate's council token owner record
    pub delegate_token_owner_record: Pubkey,
    pub limited_partner_governance: Pubkey,
    pub delegate_mint_governance: Pubkey,
    pub distribution_mint_governance: Pubkey,
    /// Capital token account of the LP governance
    pub capital_supply_treasury: Pubkey,
    /// LP token account of the delegate mint governance
    pub treasury_stock_treasury: Pubkey,
    /// Capital token account of the distribution mint governance
    pub distribution_treasury: Pubkey,
}

/// Arguments for a capital deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCapitalArgs {
    pub identity_verification_program_id: Pubkey,
    pub realm: Pubkey,
    /// Owner of the capital holding account
    pub capital_governance: Pubkey,
    /// Owner of the LP token holding account
    pub lp_governance: Pubkey,
    /// Depositor, must hold an identity record in the realm
    pub capital_token_authority: Pubkey,
    pub capital_token_account: Pubkey,
    pub capital_token_mint: Pubkey,
    /// Receives the LP tokens
    pub lp_token_account: Pubkey,
    pub lp_token_mint: Pubkey,
    pub delegate_token_mint: Pubkey,
    pub amount: u64,
    /// Decimals of the capital mint
    pub decimals: u8,
}

impl DepositCapitalArgs {
    /// Deposit from `depositor`'s associated token accounts
    ///
    /// Capital goes to the LP governance; LP tokens come out of the delegate mint governance's
    /// treasury stock.
    pub fn from_accounts(
        accounts: &DepositCapitalAccounts,
        depositor: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> TokrResult<Self> {
        Ok(Self {
            identity_verification_program_id: accounts.identity_verification_program_id,
            realm: accounts.realm,
            capital_governance: accounts.lp_governance,
            lp_governance: accounts.delegate_mint_governance,
            capital_token_authority: *depositor,
            capital_token_account: get_associated_token_address(depositor, &accounts.usdc_mint)?
                .address,
            capital_token_mint: accounts.usdc_mint,
            lp_token_account: get_associated_token_address(depositor, &accounts.lp_mint)?.address,
            lp_token_mint: accounts.lp_mint,
            delegate_token_mint: accounts.delegate_token_mint,
            amount,
            decimals,
        })
    }
}

impl Governance {
    /// Derive every address of an investment DAO without building instructions
    pub fn investment_dao_addresses(
        &self,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<InvestmentDaoAddresses> {
        let realm = get_realm_pda(&self.program_id, &args.name)?.address;
        let delegate_token_owner_record =
            get_token_owner_record_pda(&self.program_id, &realm, &args.delegate_mint, &args.delegate)?
                .address;
        let limited_partner_governance =
            get_governance_pda(&self.program_id, GovernanceKind::Account, &realm, &args.lp_mint)?
                .address;
        let delegate_mint_governance =
            get_governance_pda(&self.program_id, GovernanceKind::Mint, &realm, &args.delegate_mint)?
                .address;
        let distribution_mint_governance = get_governance_pda(
            &self.program_id,
            GovernanceKind::Mint,
            &realm,
            &args.distribution_mint,
        )?
        .address;

        Ok(InvestmentDaoAddresses {
            realm,
            delegate_token_owner_record,
            limited_partner_governance,
            delegate_mint_governance,
            distribution_mint_governance,
            capital_supply_treasury: get_associated_token_address(
                &limited_partner_governance,
                &args.usdc_mint,
            )?
            .address,
            treasury_stock_treasury: get_associated_token_address(
                &delegate_mint_governance,
                &args.lp_mint,
            )?
            .address,
            distribution_treasury: get_associated_token_address(
                &distribution_mint_governance,
                &args.usdc_mint,
            )?
            .address,
        })
    }

    /// Allocate and initialize the LP, delegate and distribution mints, owner as mint authority
    ///
    /// Signers: the owner and the three mint keypairs.
    pub fn mint_setup_instructions(&self, args: &InvestmentDaoArgs) -> TokrResult<Vec<Instruction>> {
        let mut instructions = Vec::with_capacity(6);
        for mint in [&args.lp_mint, &args.delegate_mint, &args.distribution_mint] {
            instructions.extend(create_mint_instructions(
                &args.owner,
                mint,
                args.mint_rent_lamports,
                DAO_MINT_DECIMALS,
                &args.owner,
            )?);
        }
        Ok(instructions)
    }

    /// Create the delegate's token account and mint the delegate token to it
    ///
    /// Signer: the owner.
    pub fn delegate_token_instructions(
        &self,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<Vec<Instruction>> {
        let (create_ata, delegate_ata) = create_associated_token_account_instruction(
            &args.owner,
            &args.delegate,
            &args.delegate_mint,
        )?;
        Ok(vec![
            create_ata,
            mint_to_instruction(
                &args.delegate_mint,
                &delegate_ata,
                &args.owner,
                DELEGATE_DEPOSIT_AMOUNT,
            )?,
        ])
    }

    /// Realm instructions of an investment DAO, in execution order
    ///
    /// 1. create the realm (LP community mint, delegate council mint)
    /// 2. create the LP governance
    /// 3. create the delegate mint governance
    /// 4. create the distribution mint governance
    /// 5. hand the realm authority to the LP governance
    /// 6. deposit the delegate token, creating the delegate's token owner record
    ///
    /// The governances are created by the owner as realm authority, so the delegate's token
    /// owner record need not exist yet. Signers: the owner and the delegate.
    pub fn create_realm_instructions(
        &self,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<(Vec<Instruction>, InvestmentDaoAddresses)> {
        let addresses = self.investment_dao_addresses(args)?;
        let owner = &args.owner;
        let delegate = &args.delegate;

        let realm_args = CreateRealmArgs {
            name: args.name.clone(),
            community_mint: args.lp_mint,
            council_mint: Some(args.delegate_mint),
            min_community_weight_to_create_governance: LP_MIN_COMMUNITY_WEIGHT_TO_CREATE_GOVERNANCE,
            community_mint_max_vote_weight_source: MintMaxVoteWeightSource::FULL_SUPPLY_FRACTION,
            community_voter_weight_addin: None,
            max_community_voter_weight_addin: None,
        };
        let delegate_ata = get_associated_token_address(delegate, &args.delegate_mint)?.address;

        let instructions = vec![
            self.create_realm_instruction(owner, owner, &realm_args)?,
            self.create_governance_instruction(
                &addresses.realm,
                &args.lp_mint,
                &addresses.delegate_token_owner_record,
                owner,
                owner,
                None,
                &args.config,
            )?,
            self.create_mint_governance_instruction(
                &addresses.realm,
                &args.delegate_mint,
                owner,
                &addresses.delegate_token_owner_record,
                owner,
                owner,
                &args.config,
                true,
            )?,
            self.create_mint_governance_instruction(
                &addresses.realm,
                &args.distribution_mint,
                owner,
                &addresses.delegate_token_owner_record,
                owner,
                owner,
                &args.config,
                true,
            )?,
            self.set_realm_authority_instruction(
                &addresses.realm,
                owner,
                Some(&addresses.limited_partner_governance),
                SetRealmAuthorityAction::SetChecked,
            )?,
            self.deposit_governing_tokens_instruction(
                &addresses.realm,
                &delegate_ata,
                &args.delegate_mint,
                delegate,
                delegate,
                delegate,
                DELEGATE_DEPOSIT_AMOUNT,
            )?,
        ];

        Ok((instructions, addresses))
    }

    /// Create the three treasury token accounts, mint the LP supply into the treasury stock and
    /// remove the LP mint authority so the supply is fixed
    ///
    /// Signer: the owner.
    pub fn treasury_instructions(
        &self,
        args: &InvestmentDaoArgs,
        addresses: &InvestmentDaoAddresses,
    ) -> TokrResult<Vec<Instruction>> {
        let owner = &args.owner;
        let (capital_supply, _) = create_associated_token_account_instruction(
            owner,
            &addresses.limited_partner_governance,
            &args.usdc_mint,
        )?;
        let (treasury_stock, _) = create_associated_token_account_instruction(
            owner,
            &addresses.delegate_mint_governance,
            &args.lp_mint,
        )?;
        let (distribution, _) = create_associated_token_account_instruction(
            owner,
            &addresses.distribution_mint_governance,
            &args.usdc_mint,
        )?;

        Ok(vec![
            capital_supply,
            treasury_stock,
            distribution,
            mint_to_instruction(
                &args.lp_mint,
                &addresses.treasury_stock_treasury,
                owner,
                args.lp_token_supply,
            )?,
            set_authority_instruction(&args.lp_mint, owner, AuthorityType::MintTokens, None)?,
        ])
    }

    /// Every instruction setting up an investment DAO, one batch per transaction
    ///
    /// Batches: mints, delegate token, realm, treasury. Each must land before the next is sent.
    pub fn create_investment_dao_instructions(
        &self,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<(Vec<Vec<Instruction>>, InvestmentDaoAddresses)> {
        let (realm, addresses) = self.create_realm_instructions(args)?;
        let batches = vec![
            self.mint_setup_instructions(args)?,
            self.delegate_token_instructions(args)?,
            realm,
            self.treasury_instructions(args, &addresses)?,
        ];
        Ok((batches, addresses))
    }

    /// Set up an investment DAO, one transaction per batch
    ///
    /// # Returns
    /// The signatures of the four transactions and the DAO addresses
    pub fn create_investment_dao<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
        owner: &Keypair,
        delegate: &Keypair,
        mints: &InvestmentDaoMints,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<(Vec<Signature>, InvestmentDaoAddresses)> {
        let signers = investment_dao_signers(owner, delegate, mints, args)?;
        let (batches, addresses) = self.create_investment_dao_instructions(args)?;
        info!("Creating investment DAO '{}' at {}", args.name, addresses.realm);

        let mut signatures = Vec::with_capacity(batches.len());
        for (instructions, signers) in batches.iter().zip(&signers) {
            signatures.push(submitter.submit(instructions, signers)?);
        }
        Ok((signatures, addresses))
    }

    /// Exchange capital for LP tokens
    ///
    /// The depositor needs an identity record in the realm (group = realm); the program checks
    /// it is verified.
    pub fn deposit_capital_instruction(&self, args: &DepositCapitalArgs) -> TokrResult<Instruction> {
        let capital_holding =
            get_associated_token_address(&args.capital_governance, &args.capital_token_mint)?;
        let lp_holding = get_associated_token_address(&args.lp_governance, &args.lp_token_mint)?;
        let identity_record = get_identity_record_pda(
            &args.identity_verification_program_id,
            &args.realm,
            &args.capital_token_authority,
        )?;

        let accounts = vec![
            AccountMeta::new_readonly(args.realm, false),
            AccountMeta::new(args.lp_governance, false),
            AccountMeta::new(args.capital_token_authority, true),
            AccountMeta::new(args.capital_token_account, false),
            AccountMeta::new(capital_holding.address, false),
            AccountMeta::new(args.lp_token_account, false),
            AccountMeta::new(lp_holding.address, false),
            AccountMeta::new_readonly(args.lp_token_mint, false),
            AccountMeta::new_readonly(args.delegate_token_mint, false),
            AccountMeta::new_readonly(identity_record.address, false),
            AccountMeta::new_readonly(args.identity_verification_program_id, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            // the program creates the depositor's LP token account when missing
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
        ];

        let record = ArgumentRecord::new()
            .with("amount", args.amount)
            .with("decimals", args.decimals);
        build_with_schema(self.program_id, accounts, &DEPOSIT_CAPITAL, &record)
    }

    /// Deposit `amount` of capital from the depositor's associated token account
    ///
    /// The capital mint's decimals are read through `source`.
    pub fn deposit_capital<S, A>(
        &self,
        submitter: &S,
        source: &A,
        depositor: &Keypair,
        accounts: &DepositCapitalAccounts,
        amount: u64,
    ) -> TokrResult<Signature>
    where
        S: Submitter + ?Sized,
        A: AccountSource + ?Sized,
    {
        let mint_data = source
            .fetch(&accounts.usdc_mint)?
            .ok_or(TokrError::AccountNotFound(accounts.usdc_mint))?;
        let decimals = mint_decimals(&accounts.usdc_mint, &mint_data)?;

        let args =
            DepositCapitalArgs::from_accounts(accounts, &depositor.pubkey(), amount, decimals)?;
        info!(
            "Depositing {} capital into realm {} from {}",
            amount,
            accounts.realm,
            depositor.pubkey()
        );

        let ix = self.deposit_capital_instruction(&args)?;
        submitter.submit(&[ix], &[depositor])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cap_table::MINT_LEN;
    use crate::governance::types::{VoteThresholdPercentage, VoteTipping};
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct RecordingSubmitter {
        calls: RefCell<Vec<(Vec<Instruction>, Vec<Pubkey>)>>,
    }

    impl Submitter for RecordingSubmitter {
        fn submit(
            &self,
            instructions: &[Instruction],
            signers: &[&Keypair],
        ) -> TokrResult<Signature> {
            self.calls.borrow_mut().push((
                instructions.to_vec(),
                signers.iter().map(|s| s.pubkey()).collect(),
            ));
            Ok(Signature::default())
        }
    }

    struct Accounts(HashMap<Pubkey, Vec<u8>>);

    impl AccountSource for Accounts {
        fn fetch(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>> {
            Ok(self.0.get(address).cloned())
        }
    }

    fn dao_args(owner: Pubkey, delegate: Pubkey) -> InvestmentDaoArgs {
        InvestmentDaoArgs {
            name: "Fund I".to_string(),
            owner,
            delegate,
            lp_mint: Pubkey::new_unique(),
            delegate_mint: Pubkey::new_unique(),
            distribution_mint: Pubkey::new_unique(),
            usdc_mint: Pubkey::new_unique(),
            config: GovernanceConfig {
                vote_threshold_percentage: VoteThresholdPercentage::YesVote(60),
                min_community_weight_to_create_proposal: 1,
                min_transaction_hold_up_time: 0,
                max_voting_time: 259_200,
                vote_tipping: VoteTipping::Strict,
                proposal_cool_off_time: 0,
                min_council_weight_to_create_proposal: 1,
            },
            lp_token_supply: 1_000_000,
            mint_rent_lamports: MINT_RENT_EXEMPT_LAMPORTS,
        }
    }

    #[test]
    fn test_create_realm_instructions_order() {
        let program_id = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let delegate = Pubkey::new_unique();
        let args = dao_args(owner, delegate);

        let (instructions, addresses) = Governance::new(program_id)
            .create_realm_instructions(&args)
            .unwrap();

        let tags: Vec<u8> = instructions.iter().map(|ix| ix.data[0]).collect();
        assert_eq!(tags, vec![0, 4, 17, 17, 21, 1]);
        assert!(instructions.iter().all(|ix| ix.program_id == program_id));

        assert_eq!(instructions[0].accounts[0].pubkey, addresses.realm);
        assert_eq!(
            instructions[1].accounts[1].pubkey,
            addresses.limited_partner_governance
        );
        assert_eq!(instructions[2].accounts[1].pubkey, addresses.delegate_mint_governance);
        assert_eq!(
            instructions[3].accounts[1].pubkey,
            addresses.distribution_mint_governance
        );
        assert_eq!(
            instructions[4].accounts[2].pubkey,
            addresses.limited_partner_governance
        );
        assert_eq!(instructions[5].accounts[5].pubkey, addresses.delegate_token_owner_record);

        // governances are created by the owner as realm authority
        for ix in &instructions[1..4] {
            assert!(ix
                .accounts
                .iter()
                .any(|meta| meta.pubkey == owner && meta.is_signer));
            assert!(!ix
                .accounts
                .iter()
                .any(|meta| meta.pubkey == delegate && meta.is_signer));
        }
    }

    #[test]
    fn test_investment_dao_batches() {
        let program_id = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let delegate = Pubkey::new_unique();
        let args = dao_args(owner, delegate);

        let (batches, addresses) = Governance::new(program_id)
            .create_investment_dao_instructions(&args)
            .unwrap();
        assert_eq!(batches.len(), 4);

        let shape = |batch: &Vec<Instruction>| -> Vec<(Pubkey, u8)> {
            batch.iter().map(|ix| (ix.program_id, ix.data[0])).collect()
        };

        assert_eq!(
            shape(&batches[0]),
            vec![
                (system_program::ID, 0),
                (TOKEN_PROGRAM_ID, 0),
                (system_program::ID, 0),
                (TOKEN_PROGRAM_ID, 0),
                (system_program::ID, 0),
                (TOKEN_PROGRAM_ID, 0),
            ]
        );
        let created: Vec<Pubkey> = batches[0]
            .iter()
            .step_by(2)
            .map(|ix| ix.accounts[1].pubkey)
            .collect();
        assert_eq!(
            created,
            vec![args.lp_mint, args.delegate_mint, args.distribution_mint]
        );

        assert_eq!(
            shape(&batches[1]),
            vec![(ASSOCIATED_TOKEN_PROGRAM_ID, 0), (TOKEN_PROGRAM_ID, 7)]
        );
        let delegate_ata = get_associated_token_address(&delegate, &args.delegate_mint)
            .unwrap()
            .address;
        assert_eq!(batches[1][1].accounts[1].pubkey, delegate_ata);
        assert_eq!(batches[1][1].data[1..], DELEGATE_DEPOSIT_AMOUNT.to_le_bytes());

        let realm_tags: Vec<u8> = batches[2].iter().map(|ix| ix.data[0]).collect();
        assert_eq!(realm_tags, vec![0, 4, 17, 17, 21, 1]);
        assert!(batches[2].iter().all(|ix| ix.program_id == program_id));

        assert_eq!(
            shape(&batches[3]),
            vec![
                (ASSOCIATED_TOKEN_PROGRAM_ID, 0),
                (ASSOCIATED_TOKEN_PROGRAM_ID, 0),
                (ASSOCIATED_TOKEN_PROGRAM_ID, 0),
                (TOKEN_PROGRAM_ID, 7),
                (TOKEN_PROGRAM_ID, 6),
            ]
        );
        let treasuries: Vec<Pubkey> = batches[3][..3]
            .iter()
            .map(|ix| ix.accounts[1].pubkey)
            .collect();
        assert_eq!(
            treasuries,
            vec![
                addresses.capital_supply_treasury,
                addresses.treasury_stock_treasury,
                addresses.distribution_treasury,
            ]
        );
        assert_eq!(batches[3][3].accounts[1].pubkey, addresses.treasury_stock_treasury);
        assert_eq!(batches[3][3].data[1..], 1_000_000u64.to_le_bytes());
        assert_eq!(batches[3][4].accounts[0].pubkey, args.lp_mint);
        assert_eq!(batches[3][4].data, vec![6, 0, 0]);
    }

    #[test]
    fn test_investment_dao_addresses() {
        let program_id = Pubkey::new_unique();
        let args = dao_args(Pubkey::new_unique(), Pubkey::new_unique());
        let addresses = Governance::new(program_id)
            .investment_dao_addresses(&args)
            .unwrap();

        let realm = get_realm_pda(&program_id, "Fund I").unwrap().address;
        assert_eq!(addresses.realm, realm);
        assert_eq!(
            addresses.capital_supply_treasury,
            get_associated_token_address(&addresses.limited_partner_governance, &args.usdc_mint)
                .unwrap()
                .address
        );
        assert_eq!(
            addresses.treasury_stock_treasury,
            get_associated_token_address(&addresses.delegate_mint_governance, &args.lp_mint)
                .unwrap()
                .address
        );
        assert_ne!(addresses.capital_supply_treasury, addresses.distribution_treasury);
    }

    fn args_for(
        owner: &Keypair,
        delegate: &Keypair,
        mints: &InvestmentDaoMints,
    ) -> InvestmentDaoArgs {
        InvestmentDaoArgs {
            lp_mint: mints.lp_mint.pubkey(),
            delegate_mint: mints.delegate_mint.pubkey(),
            distribution_mint: mints.distribution_mint.pubkey(),
            ..dao_args(owner.pubkey(), delegate.pubkey())
        }
    }

    #[test]
    fn test_create_investment_dao_signers() {
        let owner = Keypair::new();
        let delegate = Keypair::new();
        let mints = InvestmentDaoMints::generate();
        let args = args_for(&owner, &delegate, &mints);
        let submitter = RecordingSubmitter {
            calls: RefCell::new(vec![]),
        };

        let (signatures, _) = Governance::new(Pubkey::new_unique())
            .create_investment_dao(&submitter, &owner, &delegate, &mints, &args)
            .unwrap();
        assert_eq!(signatures.len(), 4);

        let calls = submitter.calls.borrow();
        let sizes: Vec<usize> = calls.iter().map(|(ixs, _)| ixs.len()).collect();
        assert_eq!(sizes, vec![6, 2, 6, 5]);
        assert_eq!(
            calls[0].1,
            vec![
                owner.pubkey(),
                mints.lp_mint.pubkey(),
                mints.delegate_mint.pubkey(),
                mints.distribution_mint.pubkey(),
            ]
        );
        assert_eq!(calls[1].1, vec![owner.pubkey()]);
        assert_eq!(calls[2].1, vec![owner.pubkey(), delegate.pubkey()]);
        assert_eq!(calls[3].1, vec![owner.pubkey()]);
    }

    #[test]
    fn test_create_investment_dao_rejects_foreign_keypairs() {
        let owner = Keypair::new();
        let delegate = Keypair::new();
        let mints = InvestmentDaoMints::generate();
        let args = args_for(&owner, &delegate, &mints);
        let submitter = RecordingSubmitter {
            calls: RefCell::new(vec![]),
        };
        let governance = Governance::new(Pubkey::new_unique());

        let stranger = Keypair::new();
        assert!(matches!(
            governance.create_investment_dao(&submitter, &stranger, &delegate, &mints, &args),
            Err(TokrError::Config(_))
        ));

        let other_mints = InvestmentDaoMints::generate();
        assert!(matches!(
            governance.create_investment_dao(&submitter, &owner, &delegate, &other_mints, &args),
            Err(TokrError::Config(_))
        ));
        assert!(submitter.calls.borrow().is_empty());
    }

    fn deposit_accounts() -> DepositCapitalAccounts {
        DepositCapitalAccounts {
            governance_program_id: Pubkey::new_unique(),
            identity_verification_program_id: Pubkey::new_unique(),
            usdc_mint: Pubkey::new_unique(),
            realm: Pubkey::new_unique(),
            lp_governance: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            delegate_mint_governance: Pubkey::new_unique(),
            delegate_token_mint: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_deposit_capital_accounts() {
        let accounts = deposit_accounts();
        let depositor = Pubkey::new_unique();
        let args = DepositCapitalArgs::from_accounts(&accounts, &depositor, 500, 6).unwrap();

        let ix = Governance::new(accounts.governance_program_id)
            .deposit_capital_instruction(&args)
            .unwrap();

        assert_eq!(ix.accounts.len(), 15);
        assert_eq!(ix.accounts[1], AccountMeta::new(accounts.delegate_mint_governance, false));
        assert_eq!(ix.accounts[2], AccountMeta::new(depositor, true));
        assert_eq!(
            ix.accounts[4].pubkey,
            get_associated_token_address(&accounts.lp_governance, &accounts.usdc_mint)
                .unwrap()
                .address
        );
        assert_eq!(
            ix.accounts[6].pubkey,
            get_associated_token_address(&accounts.delegate_mint_governance, &accounts.lp_mint)
                .unwrap()
                .address
        );
        assert_eq!(
            ix.accounts[9].pubkey,
            get_identity_record_pda(
                &accounts.identity_verification_program_id,
                &accounts.realm,
                &depositor
            )
            .unwrap()
            .address
        );
        assert_eq!(ix.accounts[14].pubkey, ASSOCIATED_TOKEN_PROGRAM_ID);

        let mut expected = vec![26];
        expected.extend_from_slice(&500u64.to_le_bytes());
        expected.push(6);
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn test_deposit_capital_reads_decimals() {
        let accounts = deposit_accounts();
        let mut mint = vec![0u8; MINT_LEN];
        mint[44] = 6;
        let source = Accounts(HashMap::from([(accounts.usdc_mint, mint)]));
        let submitter = RecordingSubmitter {
            calls: RefCell::new(vec![]),
        };
        let depositor = Keypair::new();
        let governance = Governance::new(accounts.governance_program_id);

        governance
            .deposit_capital(&submitter, &source, &depositor, &accounts, 100)
            .unwrap();
        assert_eq!(*submitter.calls.borrow()[0].0[0].data.last().unwrap(), 6);

        let empty = Accounts(HashMap::new());
        assert!(matches!(
            governance.deposit_capital(&submitter, &empty, &depositor, &accounts, 100),
            Err(TokrError::AccountNotFound(_))
        ));
    }
}
