//! Collaborators the adapters consume
//!
//! Submission and account fetches are the only blocking points of the crate. They are traits so
//! services can run against the blocking [`RpcClient`] or an in-memory fake.
//!
//! Errors from these collaborators are passed through unchanged; nothing here retries.

use log::{info, warn};
use solana_account_decoder_client_types::UiAccountEncoding;
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::cap_table::{TokenAccount, TOKEN_ACCOUNT_LEN};
use crate::error::{TokrError, TokrResult};
use crate::ids::TOKEN_PROGRAM_ID;

/// Signs and sends instructions as one atomic transaction
///
/// Implementations must keep the instructions in the given order. The first signer pays fees.
pub trait Submitter {
    fn submit(&self, instructions: &[Instruction], signers: &[&Keypair]) -> TokrResult<Signature>;
}

/// Raw account data lookup
pub trait AccountSource {
    /// `None` when the account does not exist
    fn fetch(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>>;
}

/// Enumerates the SPL token accounts of a mint
pub trait TokenAccountSource {
    fn token_accounts(&self, mint: &Pubkey) -> TokrResult<Vec<TokenAccount>>;
}

impl<T: Submitter + ?Sized> Submitter for &T {
    fn submit(&self, instructions: &[Instruction], signers: &[&Keypair]) -> TokrResult<Signature> {
        (**self).submit(instructions, signers)
    }
}

impl<T: AccountSource + ?Sized> AccountSource for &T {
    fn fetch(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>> {
        (**self).fetch(address)
    }
}

impl<T: TokenAccountSource + ?Sized> TokenAccountSource for &T {
    fn token_accounts(&self, mint: &Pubkey) -> TokrResult<Vec<TokenAccount>> {
        (**self).token_accounts(mint)
    }
}

/// Build and sign a transaction paid by the first signer
pub fn sign_transaction(
    instructions: &[Instruction],
    signers: &[&Keypair],
    recent_blockhash: solana_sdk::hash::Hash,
) -> TokrResult<Transaction> {
    let payer = signers
        .first()
        .ok_or_else(|| TokrError::Submission("at least one signer is required".to_string()))?;

    let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
    transaction
        .try_sign(signers, recent_blockhash)
        .map_err(|e| TokrError::Submission(e.to_string()))?;
    Ok(transaction)
}

/// Send settings shared by the blocking and async clients: preflight at confirmed commitment
pub fn confirmed_send_config() -> RpcSendTransactionConfig {
    RpcSendTransactionConfig {
        skip_preflight: false,
        preflight_commitment: Some(CommitmentConfig::confirmed().commitment),
        ..Default::default()
    }
}

/// Filters selecting the token accounts of `mint`
pub fn token_account_filters(mint: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(TOKEN_ACCOUNT_LEN as u64),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, mint.to_bytes().to_vec())),
    ]
}

impl Submitter for RpcClient {
    fn submit(&self, instructions: &[Instruction], signers: &[&Keypair]) -> TokrResult<Signature> {
        let recent_blockhash = self.get_latest_blockhash()?;
        let transaction = sign_transaction(instructions, signers, recent_blockhash)?;

        let signature = self.send_and_confirm_transaction_with_spinner_and_config(
            &transaction,
            CommitmentConfig::confirmed(),
            confirmed_send_config(),
        )?;
        info!(
            "Submitted {} instructions: {}",
            instructions.len(),
            signature
        );
        Ok(signature)
    }
}

impl AccountSource for RpcClient {
    fn fetch(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>> {
        let response = self.get_account_with_commitment(address, self.commitment())?;
        match response.value {
            Some(account) => {
                info!("Fetched {} ({} bytes)", address, account.data.len());
                Ok(Some(account.data))
            }
            None => {
                warn!("Account {} not found", address);
                Ok(None)
            }
        }
    }
}

impl TokenAccountSource for RpcClient {
    fn token_accounts(&self, mint: &Pubkey) -> TokrResult<Vec<TokenAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(token_account_filters(mint)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self.get_program_accounts_with_config(&TOKEN_PROGRAM_ID, config)?;
        info!("Fetched {} token accounts for mint {}", accounts.len(), mint);

        accounts
            .into_iter()
            .map(|(address, account)| TokenAccount::unpack(address, &account.data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;

    #[test]
    fn test_confirmed_send_config() {
        let config = confirmed_send_config();
        assert!(!config.skip_preflight);
        assert_eq!(
            config.preflight_commitment,
            Some(CommitmentConfig::confirmed().commitment)
        );
        assert_eq!(config.max_retries, None);
    }

    #[test]
    fn test_sign_transaction_keeps_order() {
        let payer = Keypair::new();
        let program_id = Pubkey::new_unique();
        let instructions: Vec<Instruction> = (0u8..3)
            .map(|i| Instruction {
                program_id,
                accounts: vec![AccountMeta::new(payer.pubkey(), true)],
                data: vec![i],
            })
            .collect();

        let tx = sign_transaction(
            &instructions,
            &[&payer],
            solana_sdk::hash::Hash::new_unique(),
        )
        .unwrap();

        let data: Vec<Vec<u8>> = tx
            .message
            .instructions
            .iter()
            .map(|ix| ix.data.clone())
            .collect();
        assert_eq!(data, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(tx.message.account_keys[0], payer.pubkey());
    }

    #[test]
    fn test_sign_transaction_requires_signer() {
        let result = sign_transaction(&[], &[], solana_sdk::hash::Hash::default());
        assert!(matches!(result, Err(TokrError::Submission(_))));
    }

    #[test]
    fn test_token_account_filters() {
        let mint = Pubkey::new_unique();
        let filters = token_account_filters(&mint);
        assert_eq!(filters.len(), 2);
        assert!(matches!(filters[0], RpcFilterType::DataSize(165)));
    }
}
