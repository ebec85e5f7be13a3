#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tokr_client::cap_table::{TokenAccount, MINT_LEN, TOKEN_ACCOUNT_LEN};
use tokr_client::{AccountSource, Submitter, TokenAccountSource, TokrResult};

/// Records every submitted batch instead of sending it
#[derive(Default)]
pub struct RecordingSubmitter {
    pub batches: RefCell<Vec<Vec<Instruction>>>,
    pub signers: RefCell<Vec<Vec<Pubkey>>>,
}

impl Submitter for RecordingSubmitter {
    fn submit(&self, instructions: &[Instruction], signers: &[&Keypair]) -> TokrResult<Signature> {
        self.batches.borrow_mut().push(instructions.to_vec());
        self.signers
            .borrow_mut()
            .push(signers.iter().map(|s| s.pubkey()).collect());
        Ok(Signature::new_unique())
    }
}

/// In-memory accounts keyed by address
#[derive(Default)]
pub struct InMemoryChain {
    pub accounts: HashMap<Pubkey, Vec<u8>>,
}

impl InMemoryChain {
    pub fn insert(&mut self, address: Pubkey, data: Vec<u8>) {
        self.accounts.insert(address, data);
    }

    /// Add a mint with the given supply and decimals
    pub fn add_mint(&mut self, mint: Pubkey, supply: u64, decimals: u8) {
        let mut data = vec![0u8; MINT_LEN];
        data[36..44].copy_from_slice(&supply.to_le_bytes());
        data[44] = decimals;
        self.insert(mint, data);
    }

    /// Add a token account and return its address
    pub fn add_token_account(&mut self, mint: Pubkey, owner: Pubkey, amount: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[0..32].copy_from_slice(mint.as_ref());
        data[32..64].copy_from_slice(owner.as_ref());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        self.insert(address, data);
        address
    }
}

impl AccountSource for InMemoryChain {
    fn fetch(&self, address: &Pubkey) -> TokrResult<Option<Vec<u8>>> {
        Ok(self.accounts.get(address).cloned())
    }
}

impl TokenAccountSource for InMemoryChain {
    fn token_accounts(&self, mint: &Pubkey) -> TokrResult<Vec<TokenAccount>> {
        self.accounts
            .iter()
            .filter(|(_, data)| data.len() == TOKEN_ACCOUNT_LEN && &data[0..32] == mint.as_ref())
            .map(|(address, data)| TokenAccount::unpack(*address, data))
            .collect()
    }
}
