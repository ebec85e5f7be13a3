//! Async client helpers for the tokr programs
//!
//! This module mirrors the blocking adapters over the nonblocking RPC client: account reads are
//! fetched and decoded, and the submitting flows build the same instructions and send each batch
//! as one confirmed transaction.
//!
//! # Features
//! This module is only available with the `async` feature enabled.

use log::{info, warn};
use solana_account_decoder_client_types::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};

use crate::{
    cap_table::{
        compute_cap_table, mint_decimals, mint_supply, CapTable, TokenAccount, MINT_LEN,
    },
    config::{DepositCapitalAccounts, ProgramRegistry},
    error::{TokrError, TokrResult},
    governance::{
        dao::investment_dao_signers, DepositCapitalArgs, Governance, GovernanceAccount,
        InvestmentDaoAddresses, InvestmentDaoArgs, InvestmentDaoMints, Realm,
    },
    identity::{IdentityRecord, IdentityStatus, IdentityVerification, StatusKind},
    ids::TOKEN_PROGRAM_ID,
    permissioned_list::{ListMetadata, PermissionedList},
    submit::{confirmed_send_config, sign_transaction, token_account_filters},
};

/// High-level async client for the tokr programs
pub struct TokrClient {
    /// RPC client for communicating with Solana
    pub rpc: RpcClient,
    /// Program ids of the target cluster
    pub registry: ProgramRegistry,
}

impl TokrClient {
    /// Create a client, inferring the program registry from the RPC URL
    pub fn new(rpc_url: String) -> Self {
        let registry = ProgramRegistry::for_rpc_url(&rpc_url);
        Self {
            rpc: RpcClient::new(rpc_url),
            registry,
        }
    }

    /// Create a client with an explicit program registry
    pub fn new_with_registry(rpc_url: String, registry: ProgramRegistry) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url),
            registry,
        }
    }

    /// Create a client with an existing RpcClient
    pub fn from_rpc_client(rpc: RpcClient) -> Self {
        let registry = ProgramRegistry::for_rpc_url(&rpc.url());
        Self { rpc, registry }
    }

    pub fn identity(&self) -> IdentityVerification {
        IdentityVerification::from_registry(&self.registry)
    }

    pub fn permissioned_list(&self) -> PermissionedList {
        PermissionedList::from_registry(&self.registry)
    }

    /// Fails with `MissingProgram` when the cluster has no governance deployment
    pub fn governance(&self) -> TokrResult<Governance> {
        Governance::from_registry(&self.registry)
    }

    /// Fetch raw account data, `None` when the account does not exist
    pub async fn fetch_account(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;

        match response.value {
            Some(account) => Ok(Some(account.data)),
            None => {
                warn!("Account {} not found", address);
                Ok(None)
            }
        }
    }

    async fn fetch_required(&self, address: &Pubkey) -> TokrResult<Vec<u8>> {
        self.fetch_account(address)
            .await?
            .ok_or(TokrError::AccountNotFound(*address))
    }

    /// Fetch and decode the identity record of `subject` in `group`
    pub async fn get_identity_record(
        &self,
        group: &Pubkey,
        subject: &Pubkey,
    ) -> TokrResult<Option<IdentityRecord>> {
        let record = self.identity().record_address(group, subject)?;
        self.fetch_account(&record.address)
            .await?
            .map(|data| IdentityRecord::decode(&data))
            .transpose()
    }

    /// Fetch the list owned by `authority`
    pub async fn get_list(&self, authority: &Pubkey) -> TokrResult<Option<ListMetadata>> {
        let list = self.permissioned_list().list_address(authority)?;
        self.fetch_account(&list.address)
            .await?
            .map(|data| ListMetadata::decode(&data))
            .transpose()
    }

    /// Whether `user` is on the list owned by `authority`
    pub async fn is_user_on_list(&self, authority: &Pubkey, user: &Pubkey) -> TokrResult<bool> {
        let entry = self.permissioned_list().entry_address(authority, user)?;
        Ok(self.fetch_account(&entry.address).await?.is_some())
    }

    /// Fetch and decode a realm account
    pub async fn get_realm(&self, realm: &Pubkey) -> TokrResult<Realm> {
        Realm::decode(&self.fetch_required(realm).await?)
    }

    /// Fetch and decode a governance account
    pub async fn get_governance(&self, governance: &Pubkey) -> TokrResult<GovernanceAccount> {
        GovernanceAccount::decode(&self.fetch_required(governance).await?)
    }

    /// Every SPL token account of `mint`
    pub async fn get_token_accounts(&self, mint: &Pubkey) -> TokrResult<Vec<TokenAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(token_account_filters(mint)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&TOKEN_PROGRAM_ID, config)
            .await?;
        info!("Fetched {} token accounts for mint {}", accounts.len(), mint);

        accounts
            .into_iter()
            .map(|(address, account)| TokenAccount::unpack(address, &account.data))
            .collect()
    }

    /// Cap table for `mint`, see [`crate::cap_table::CapTableService`]
    ///
    /// # Arguments
    /// * `mint` - SPL token mint
    /// * `treasury_stock_account` - Token account holding the unissued supply
    /// * `excluded_owners` - Owners left out of the entries
    pub async fn get_cap_table_for_mint(
        &self,
        mint: &Pubkey,
        treasury_stock_account: &Pubkey,
        excluded_owners: &[Pubkey],
    ) -> TokrResult<CapTable> {
        let authorized_supply = mint_supply(mint, &self.fetch_required(mint).await?)?;

        let reserved_supply = match self.fetch_account(treasury_stock_account).await? {
            Some(data) => TokenAccount::unpack(*treasury_stock_account, &data)?.amount,
            None => 0,
        };

        let accounts = self.get_token_accounts(mint).await?;
        Ok(compute_cap_table(
            mint,
            &accounts,
            authorized_supply,
            reserved_supply,
            excluded_owners,
        ))
    }

    /// Create the signer's identity record in `group`
    pub async fn create_identity_record(
        &self,
        signer: &Keypair,
        group: &Pubkey,
        authority: &Pubkey,
    ) -> TokrResult<Signature> {
        let ix = self
            .identity()
            .create_record_instruction(&signer.pubkey(), group, authority)?;
        self.send_and_confirm_transaction(&[ix], &[signer]).await
    }

    /// Update one sub-status of a record, signed by its authority
    pub async fn update_identity_status(
        &self,
        authority: &Keypair,
        kind: StatusKind,
        subject: &Pubkey,
        group: &Pubkey,
        status: IdentityStatus,
    ) -> TokrResult<Signature> {
        let ix = self.identity().update_status_instruction(
            kind,
            subject,
            group,
            &authority.pubkey(),
            status,
        )?;
        self.send_and_confirm_transaction(&[ix], &[authority]).await
    }

    /// Add `user` to the signer's list
    pub async fn add_user(&self, signer: &Keypair, user: &Pubkey) -> TokrResult<Signature> {
        let ix = self
            .permissioned_list()
            .add_user_instruction(&signer.pubkey(), user)?;
        self.send_and_confirm_transaction(&[ix], &[signer]).await
    }

    /// Remove `user` from the signer's list
    pub async fn remove_user(&self, signer: &Keypair, user: &Pubkey) -> TokrResult<Signature> {
        let ix = self
            .permissioned_list()
            .remove_user_instruction(&signer.pubkey(), user)?;
        self.send_and_confirm_transaction(&[ix], &[signer]).await
    }

    /// Set up an investment DAO, one confirmed transaction per batch
    ///
    /// Mint accounts are funded with the cluster's rent-exempt minimum rather than
    /// `args.mint_rent_lamports`.
    ///
    /// # Arguments
    /// * `owner` - Realm creator, mint authority and fee payer
    /// * `delegate` - Holder of the delegate token
    /// * `mints` - Keypairs of the three new mints
    /// * `args` - DAO arguments
    pub async fn create_investment_dao(
        &self,
        owner: &Keypair,
        delegate: &Keypair,
        mints: &InvestmentDaoMints,
        args: &InvestmentDaoArgs,
    ) -> TokrResult<(Vec<Signature>, InvestmentDaoAddresses)> {
        let signers = investment_dao_signers(owner, delegate, mints, args)?;

        let args = InvestmentDaoArgs {
            mint_rent_lamports: self.rpc.get_minimum_balance_for_rent_exemption(MINT_LEN).await?,
            ..args.clone()
        };
        let (batches, addresses) = self.governance()?.create_investment_dao_instructions(&args)?;
        info!("Creating investment DAO '{}' at {}", args.name, addresses.realm);

        let mut signatures = Vec::with_capacity(batches.len());
        for (instructions, signers) in batches.iter().zip(&signers) {
            signatures.push(self.send_and_confirm_transaction(instructions, signers).await?);
        }
        Ok((signatures, addresses))
    }

    /// Deposit `amount` of capital from the depositor's associated token account
    pub async fn deposit_capital(
        &self,
        depositor: &Keypair,
        accounts: &DepositCapitalAccounts,
        amount: u64,
    ) -> TokrResult<Signature> {
        let governance = Governance::new(accounts.governance_program_id)
            .with_version(self.registry.governance_version);
        let decimals = mint_decimals(
            &accounts.usdc_mint,
            &self.fetch_required(&accounts.usdc_mint).await?,
        )?;

        let args =
            DepositCapitalArgs::from_accounts(accounts, &depositor.pubkey(), amount, decimals)?;
        let ix = governance.deposit_capital_instruction(&args)?;
        self.send_and_confirm_transaction(&[ix], &[depositor]).await
    }

    /// Helper function to send and confirm a transaction
    async fn send_and_confirm_transaction(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> TokrResult<Signature> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = sign_transaction(instructions, signers, recent_blockhash)?;

        let signature = self
            .rpc
            .send_and_confirm_transaction_with_spinner_and_config(
                &transaction,
                CommitmentConfig::confirmed(),
                confirmed_send_config(),
            )
            .await?;
        info!("Submitted {} instructions: {}", instructions.len(), signature);
        Ok(signature)
    }
}
