mod common;

use common::{InMemoryChain, RecordingSubmitter};
use solana_sdk::{
    instruction::AccountMeta, pubkey::Pubkey, signature::Keypair, signer::Signer,
};
use solana_sdk_ids::system_program;
use tokr_client::codec::{encode, ArgumentRecord, Value};
use tokr_client::config::{Cluster, InvestmentDaoConfig, ProgramRegistry};
use tokr_client::governance::{InvestmentDaoArgs, InvestmentDaoMints};
use tokr_client::identity::{StatusKind, IDENTITY_RECORD};
use tokr_client::instruction::instruction_discriminator;
use tokr_client::{
    CapTableService, Governance, IdentityStatus, IdentityVerification, PermissionedList,
    TokrError,
};

#[test]
fn add_user_submits_one_instruction_in_program_order() {
    let registry = ProgramRegistry::for_cluster(Cluster::Localnet);
    let list = PermissionedList::from_registry(&registry);
    let submitter = RecordingSubmitter::default();
    let signer = Keypair::new();
    let user = Pubkey::new_unique();

    list.add_user(&submitter, &signer, &user).unwrap();

    let batches = submitter.batches.borrow();
    assert_eq!(batches.len(), 1);
    let ix = &batches[0][0];
    assert_eq!(ix.program_id, registry.permissioned_list);

    let list_pda = list.list_address(&signer.pubkey()).unwrap().address;
    let entry = list.entry_address(&signer.pubkey(), &user).unwrap().address;
    assert_eq!(
        ix.accounts,
        vec![
            AccountMeta::new(signer.pubkey(), true),
            AccountMeta::new(list_pda, false),
            AccountMeta::new(entry, false),
            AccountMeta::new_readonly(user, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ]
    );
    assert_eq!(ix.data, instruction_discriminator("add_user").to_vec());
    assert_eq!(submitter.signers.borrow()[0], vec![signer.pubkey()]);
}

#[test]
fn membership_is_entry_existence() {
    let list = PermissionedList::new(Pubkey::new_unique());
    let authority = Pubkey::new_unique();
    let member = Pubkey::new_unique();
    let outsider = Pubkey::new_unique();

    let mut chain = InMemoryChain::default();
    let entry = list.entry_address(&authority, &member).unwrap().address;
    chain.insert(entry, vec![0u8; 8]);

    assert!(list.is_user_on_list(&chain, &authority, &member).unwrap());
    assert!(!list.is_user_on_list(&chain, &authority, &outsider).unwrap());
}

#[test]
fn investment_dao_batch_keeps_order() {
    let config = InvestmentDaoConfig::from_json_str(
        r#"{
            "cluster": "http://127.0.0.1:8899",
            "owner": "~/.config/solana/id.json",
            "name": "Fund I",
            "governanceProgramId": "5xaMNNRZ5hKFTs45Y39ALQXVoXdrPAcRAY6cBqz1qc6R",
            "usdcMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "governance": { "voteThresholdPercentage": 51 }
        }"#,
    )
    .unwrap();

    let owner = Keypair::new();
    let mints = InvestmentDaoMints::generate();
    let args = InvestmentDaoArgs::from_config(
        &config,
        owner.pubkey(),
        owner.pubkey(),
        mints.lp_mint.pubkey(),
        mints.delegate_mint.pubkey(),
        mints.distribution_mint.pubkey(),
    )
    .unwrap();

    let governance = Governance::new(config.governance_program_id().unwrap());
    let (expected, _) = governance.create_investment_dao_instructions(&args).unwrap();

    let submitter = RecordingSubmitter::default();
    let (signatures, addresses) = governance
        .create_investment_dao(&submitter, &owner, &owner, &mints, &args)
        .unwrap();
    assert_eq!(signatures.len(), 4);

    let batches = submitter.batches.borrow();
    assert_eq!(*batches, expected);

    let signers = submitter.signers.borrow();
    assert_eq!(signers[0].len(), 4);
    assert!(signers[0].contains(&mints.lp_mint.pubkey()));
    for batch_signers in &signers[1..] {
        assert_eq!(*batch_signers, vec![owner.pubkey()]);
    }

    let realm_tags: Vec<u8> = batches[2].iter().map(|ix| ix.data[0]).collect();
    assert_eq!(realm_tags, vec![0, 4, 17, 17, 21, 1]);
    assert_eq!(batches[2][0].accounts[0].pubkey, addresses.realm);

    // the LP supply lands in the treasury stock before the mint authority is dropped
    let treasury = &batches[3];
    assert_eq!(treasury[3].accounts[1].pubkey, addresses.treasury_stock_treasury);
    assert_eq!(treasury[3].data[1..], config.details.max_raise.to_le_bytes());
    assert_eq!(treasury[4].data[0], 6);
}

#[test]
fn cap_table_from_token_accounts() {
    let mint = Pubkey::new_unique();
    let treasury_owner = Pubkey::new_unique();
    let holders = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];

    let mut chain = InMemoryChain::default();
    chain.add_mint(mint, 1_000, 0);
    let treasury = chain.add_token_account(mint, treasury_owner, 100);
    chain.add_token_account(mint, holders[0], 150);
    chain.add_token_account(mint, holders[1], 300);
    chain.add_token_account(mint, holders[2], 450);
    chain.add_token_account(mint, Pubkey::new_unique(), 0);
    chain.add_token_account(Pubkey::new_unique(), holders[0], 999);

    let service = CapTableService::new(&chain);
    let table = service
        .get_cap_table_for_mint(&mint, &treasury, &[treasury_owner])
        .unwrap();

    assert_eq!(table.authorized_supply, 1_000);
    assert_eq!(table.reserved_supply, 100);
    assert_eq!(table.outstanding_supply(), 900);
    assert_eq!(table.entries.len(), 3);

    let first = table
        .entries
        .iter()
        .find(|entry| entry.holder == holders[0])
        .unwrap();
    assert_eq!(first.tokens_held, 150);
    assert_eq!(first.formatted_percentage(), "16.6666%");

    let total: u64 = table.entries.iter().map(|entry| entry.percent_held).sum();
    assert!(total <= 1_000_000);
}

#[test]
fn cap_table_missing_mint() {
    let chain = InMemoryChain::default();
    let service = CapTableService::new(&chain);
    let mint = Pubkey::new_unique();

    assert!(matches!(
        service.get_cap_table_for_mint(&mint, &Pubkey::new_unique(), &[]),
        Err(TokrError::AccountNotFound(address)) if address == mint
    ));
}

#[test]
fn identity_record_lifecycle() {
    let registry = ProgramRegistry::for_cluster(Cluster::Devnet);
    let identity = IdentityVerification::from_registry(&registry);
    let submitter = RecordingSubmitter::default();
    let subject = Keypair::new();
    let authority = Keypair::new();
    let group = Pubkey::new_unique();

    identity
        .create_record(&submitter, &subject, &group, &authority.pubkey())
        .unwrap();
    identity
        .update_status(
            &submitter,
            &authority,
            StatusKind::Aml,
            &subject.pubkey(),
            &group,
            IdentityStatus::Approved,
        )
        .unwrap();

    let batches = submitter.batches.borrow();
    assert_eq!(batches.len(), 2);
    assert_eq!(
        batches[1][0].data[..8],
        instruction_discriminator("update_aml_status")
    );
    assert_eq!(submitter.signers.borrow()[1], vec![authority.pubkey()]);

    let record_address = identity
        .record_address(&group, &subject.pubkey())
        .unwrap();
    let mut chain = InMemoryChain::default();
    assert!(!identity
        .is_verified(&chain, &group, &subject.pubkey())
        .unwrap());

    let approved = Value::unit_variant(IdentityStatus::Approved.code());
    let data = encode(
        &IDENTITY_RECORD,
        &ArgumentRecord::new()
            .with("bump", record_address.bump)
            .with("ia_status", approved.clone())
            .with("aml_status", approved.clone())
            .with("kyc_status", approved)
            .with("authority", authority.pubkey()),
    )
    .unwrap();
    chain.insert(record_address.address, data);

    let record = identity
        .fetch_record(&chain, &group, &subject.pubkey())
        .unwrap()
        .unwrap();
    assert_eq!(record.status(), IdentityStatus::Approved);
    assert!(identity
        .is_verified(&chain, &group, &subject.pubkey())
        .unwrap());
}

#[test]
fn governance_requires_a_deployment() {
    let mainnet = ProgramRegistry::for_cluster(Cluster::Mainnet);
    assert!(matches!(
        Governance::from_registry(&mainnet),
        Err(TokrError::MissingProgram("governance"))
    ));
}
