//! Example: PDA Derivation
//!
//! This example derives the addresses used by the tokr programs on devnet.
//!
//! To run this example:
//! ```
//! cargo run --example pda_derivation
//! ```

use solana_sdk::pubkey::Pubkey;
use tokr_client::config::{Cluster, ProgramRegistry};
use tokr_client::governance::pda::{get_realm_pda, get_token_owner_record_pda};
use tokr_client::governance::{Governance, GovernanceKind};
use tokr_client::{pda, IdentityVerification, PermissionedList, TokrResult};

fn main() -> TokrResult<()> {
    println!("Tokr Client Example: PDA Derivation\n");

    let registry = ProgramRegistry::for_cluster(Cluster::Devnet);
    let wallet = Pubkey::new_unique();
    let group = Pubkey::new_unique();
    println!("Wallet: {}", wallet);
    println!("Group:  {}\n", group);

    // Identity record of the wallet in the group
    let identity = IdentityVerification::from_registry(&registry);
    let record = identity.record_address(&group, &wallet)?;
    println!("Identity Record PDA:");
    println!("  Address: {}", record.address);
    println!("  Bump: {}\n", record.bump);

    // Permissioned list owned by the wallet and an entry in it
    let list = PermissionedList::from_registry(&registry);
    let list_pda = list.list_address(&wallet)?;
    println!("List PDA:");
    println!("  Address: {}", list_pda.address);
    println!("  Bump: {}\n", list_pda.bump);

    let user = Pubkey::new_unique();
    let entry = list.entry_address(&wallet, &user)?;
    println!("List Entry PDA (user {}):", user);
    println!("  Address: {}", entry.address);
    println!("  Bump: {}\n", entry.bump);

    // Governance realm and its token owner record
    let governance = Governance::from_registry(&registry)?;
    let realm = get_realm_pda(&governance.program_id(), "Fund I")?;
    println!("Realm PDA (\"Fund I\"):");
    println!("  Address: {}", realm.address);
    println!("  Bump: {}\n", realm.bump);

    let council_mint = Pubkey::new_unique();
    let token_owner_record =
        get_token_owner_record_pda(&governance.program_id(), &realm.address, &council_mint, &wallet)?;
    println!("Token Owner Record PDA:");
    println!("  Address: {}", token_owner_record.address);
    println!("  Bump: {}\n", token_owner_record.bump);

    let mint_governance = tokr_client::governance::pda::get_governance_pda(
        &governance.program_id(),
        GovernanceKind::Mint,
        &realm.address,
        &council_mint,
    )?;
    println!("Mint Governance PDA:");
    println!("  Address: {}", mint_governance.address);
    println!("  Bump: {}\n", mint_governance.bump);

    // Associated token account of the wallet
    let ata = pda::get_associated_token_address(&wallet, &council_mint)?;
    println!("Associated Token Account:");
    println!("  Address: {}", ata.address);
    println!("  Bump: {}", ata.bump);

    println!("\nAll PDAs derived successfully!");
    Ok(())
}
