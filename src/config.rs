//! Program registry and typed parameter files
//!
//! Adapters never look up program ids on their own. A [`ProgramRegistry`] is built once, from a
//! cluster preset or a JSON file, and each adapter receives the id it targets at construction.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{TokrError, TokrResult};
use crate::governance::GovernanceProgramVersion;

/// Target cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Mainnet,
    Devnet,
    Localnet,
}

impl Cluster {
    /// Infer the cluster from an RPC URL
    ///
    /// Any URL mentioning "mainnet" is mainnet, then "devnet" is devnet, everything else is
    /// localnet.
    pub fn from_rpc_url(url: &str) -> Self {
        if url.contains("mainnet") {
            Cluster::Mainnet
        } else if url.contains("devnet") {
            Cluster::Devnet
        } else {
            Cluster::Localnet
        }
    }

    /// Public RPC endpoint for the cluster
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cluster::Mainnet => "mainnet",
            Cluster::Devnet => "devnet",
            Cluster::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Cluster {
    type Err = TokrError;

    fn from_str(s: &str) -> TokrResult<Self> {
        match s {
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "devnet" => Ok(Cluster::Devnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(TokrError::Config(format!("unknown cluster '{}'", other))),
        }
    }
}

/// The on-chain programs a registry maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    CapTable,
    Governance,
    IdentityVerification,
    PermissionedList,
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::CapTable => "cap-table",
            Domain::Governance => "governance",
            Domain::IdentityVerification => "identity-verification",
            Domain::PermissionedList => "permissioned-list",
        }
    }
}

/// Program ids for every domain on one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRegistry {
    pub cap_table: Pubkey,
    /// Not deployed on every cluster
    pub governance: Option<Pubkey>,
    pub identity_verification: Pubkey,
    pub permissioned_list: Pubkey,
    pub governance_version: GovernanceProgramVersion,
}

/// JSON shape of a registry file, every field optional on top of the cluster preset
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryFile {
    cluster: Option<Cluster>,
    cap_table: Option<String>,
    governance: Option<String>,
    identity_verification: Option<String>,
    permissioned_list: Option<String>,
    governance_version: Option<GovernanceProgramVersion>,
}

impl ProgramRegistry {
    /// Deployed program ids for `cluster`
    pub fn for_cluster(cluster: Cluster) -> Self {
        let (cap_table, governance, identity_verification, permissioned_list) = match cluster {
            Cluster::Mainnet => (
                "capHECuaWKqRXjprrW2nQ6MEsVi73rpUBCBfCWuffyN",
                None,
                "idv2F375xYuz2K7a7LxcrkhgWbPsJgpuWD3XLW1AFdD",
                "permXeEzAzbSbtDS6CZxodr6iP3fP8B8Gvid1vXMpvM",
            ),
            Cluster::Devnet => (
                "35dT31cxMxdXjURjEvRfj4c3vZPXXdvDX6zpeF4YRckn",
                Some("GTesTBiEWE32WHXXE2S4XbZvA5CrEc4xs6ZgRe895dP"),
                "5WJNeGKQQJMaTCPgtXhmsiEK4bA6dLT94smLFmTU8Gh9",
                "Hwh92WNAfui11wsSEgkyowFEkG3Kb6ALTQrTTQSxfL26",
            ),
            Cluster::Localnet => (
                "6H6qFBGye34eGAGE926hXeVc7Di7konqMFrD3nBPxmmX",
                Some("5xaMNNRZ5hKFTs45Y39ALQXVoXdrPAcRAY6cBqz1qc6R"),
                "3YC2irJKAzmuqeg2Qf9v8YBb1ufGmYTuvggxqv4bCyST",
                "9rMCpctTpKwaM1Wd6ppAgRLhbb9X3kJnZvzCrzy5kiDC",
            ),
        };

        Self {
            cap_table: Pubkey::from_str_const(cap_table),
            governance: governance.map(Pubkey::from_str_const),
            identity_verification: Pubkey::from_str_const(identity_verification),
            permissioned_list: Pubkey::from_str_const(permissioned_list),
            governance_version: GovernanceProgramVersion::default(),
        }
    }

    /// Registry for the cluster an RPC URL points at
    pub fn for_rpc_url(url: &str) -> Self {
        Self::for_cluster(Cluster::from_rpc_url(url))
    }

    /// Parse a registry from JSON
    ///
    /// Fields that are absent keep the preset of `cluster` (localnet when not given).
    pub fn from_json_str(json: &str) -> TokrResult<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let mut registry = Self::for_cluster(file.cluster.unwrap_or(Cluster::Localnet));

        if let Some(id) = file.cap_table {
            registry.cap_table = parse_pubkey("capTable", &id)?;
        }
        if let Some(id) = file.governance {
            registry.governance = Some(parse_pubkey("governance", &id)?);
        }
        if let Some(id) = file.identity_verification {
            registry.identity_verification = parse_pubkey("identityVerification", &id)?;
        }
        if let Some(id) = file.permissioned_list {
            registry.permissioned_list = parse_pubkey("permissionedList", &id)?;
        }
        if let Some(version) = file.governance_version {
            registry.governance_version = version;
        }
        Ok(registry)
    }

    /// Load a registry JSON file
    pub fn from_file(path: impl AsRef<Path>) -> TokrResult<Self> {
        let json = read_config_file(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Program id for `domain`
    pub fn program_id(&self, domain: Domain) -> TokrResult<Pubkey> {
        match domain {
            Domain::CapTable => Ok(self.cap_table),
            Domain::Governance => self
                .governance
                .ok_or(TokrError::MissingProgram(domain.name())),
            Domain::IdentityVerification => Ok(self.identity_verification),
            Domain::PermissionedList => Ok(self.permissioned_list),
        }
    }
}

fn read_config_file(path: &Path) -> TokrResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TokrError::Config(format!("unable to read {}: {}", path.display(), e)))
}

/// Parse a base58 public key from a config field
pub fn parse_pubkey(field: &str, value: &str) -> TokrResult<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| TokrError::Config(format!("{} is not a valid public key: {}", field, e)))
}

/// Voting rules for every governance created by the investment DAO setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceConfigParams {
    /// Yes-vote threshold in percent
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold_percentage: u8,
    #[serde(default = "default_min_tokens")]
    pub min_community_tokens_to_create_proposal: u64,
    /// Seconds between a vote succeeding and its transactions becoming executable
    #[serde(default)]
    pub min_instruction_hold_up_time: u32,
    /// Seconds
    #[serde(default = "default_max_voting_time")]
    pub max_voting_time: u32,
    /// 0 strict, 1 early, 2 disabled
    #[serde(default)]
    pub vote_tipping: u8,
    /// Seconds
    #[serde(default)]
    pub proposal_cool_off_time: u32,
    #[serde(default = "default_min_tokens")]
    pub min_council_tokens_to_create_proposal: u64,
}

fn default_vote_threshold() -> u8 {
    60
}

fn default_min_tokens() -> u64 {
    1
}

fn default_max_voting_time() -> u32 {
    3 * 24 * 60 * 60
}

impl Default for GovernanceConfigParams {
    fn default() -> Self {
        Self {
            vote_threshold_percentage: default_vote_threshold(),
            min_community_tokens_to_create_proposal: default_min_tokens(),
            min_instruction_hold_up_time: 0,
            max_voting_time: default_max_voting_time(),
            vote_tipping: 0,
            proposal_cool_off_time: 0,
            min_council_tokens_to_create_proposal: default_min_tokens(),
        }
    }
}

/// Fundraise figures of an investment DAO
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoDetails {
    /// LP token supply minted into the treasury stock account
    pub max_raise: u64,
}

/// Parameters of the create-dao command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentDaoConfig {
    /// RPC URL of the target cluster
    pub cluster: String,
    /// Keypair path of the realm owner
    pub owner: String,
    /// Realm name
    pub name: String,
    pub governance_program_id: String,
    pub usdc_mint: String,
    #[serde(default)]
    pub details: DaoDetails,
    #[serde(default)]
    pub governance: GovernanceConfigParams,
}

impl InvestmentDaoConfig {
    pub fn from_json_str(json: &str) -> TokrResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TokrResult<Self> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    fn validate(&self) -> TokrResult<()> {
        if self.name.is_empty() {
            return Err(TokrError::Config("name must not be empty".to_string()));
        }
        if self.name.len() > 32 {
            return Err(TokrError::Config(format!(
                "realm name '{}' is longer than 32 bytes",
                self.name
            )));
        }
        if self.governance.vote_threshold_percentage > 100 {
            return Err(TokrError::Config(
                "voteThresholdPercentage must be at most 100".to_string(),
            ));
        }
        if self.governance.vote_tipping > 2 {
            return Err(TokrError::Config(
                "voteTipping must be 0, 1 or 2".to_string(),
            ));
        }
        self.governance_program_id()?;
        self.usdc_mint()?;
        Ok(())
    }

    pub fn governance_program_id(&self) -> TokrResult<Pubkey> {
        parse_pubkey("governanceProgramId", &self.governance_program_id)
    }

    pub fn usdc_mint(&self) -> TokrResult<Pubkey> {
        parse_pubkey("usdcMint", &self.usdc_mint)
    }

    pub fn cluster(&self) -> Cluster {
        Cluster::from_rpc_url(&self.cluster)
    }
}

/// Parameters of the deposit-capital command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositCapitalConfig {
    pub cluster: String,
    pub owner: String,
    pub governance_program_id: String,
    pub identity_verification_program_id: String,
    pub usdc_mint: String,
    pub realm: String,
    pub lp_governance: String,
    pub lp_mint: String,
    pub delegate_mint_governance: String,
    pub delegate_token_mint: String,
    /// Capital amount in whole tokens
    pub amount: u64,
}

/// [`DepositCapitalConfig`] with every key parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCapitalAccounts {
    pub governance_program_id: Pubkey,
    pub identity_verification_program_id: Pubkey,
    pub usdc_mint: Pubkey,
    pub realm: Pubkey,
    pub lp_governance: Pubkey,
    pub lp_mint: Pubkey,
    pub delegate_mint_governance: Pubkey,
    pub delegate_token_mint: Pubkey,
}

impl DepositCapitalConfig {
    pub fn from_json_str(json: &str) -> TokrResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.accounts()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TokrResult<Self> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    pub fn accounts(&self) -> TokrResult<DepositCapitalAccounts> {
        Ok(DepositCapitalAccounts {
            governance_program_id: parse_pubkey(
                "governanceProgramId",
                &self.governance_program_id,
            )?,
            identity_verification_program_id: parse_pubkey(
                "identityVerificationProgramId",
                &self.identity_verification_program_id,
            )?,
            usdc_mint: parse_pubkey("usdcMint", &self.usdc_mint)?,
            realm: parse_pubkey("realm", &self.realm)?,
            lp_governance: parse_pubkey("lpGovernance", &self.lp_governance)?,
            lp_mint: parse_pubkey("lpMint", &self.lp_mint)?,
            delegate_mint_governance: parse_pubkey(
                "delegateMintGovernance",
                &self.delegate_mint_governance,
            )?,
            delegate_token_mint: parse_pubkey("delegateTokenMint", &self.delegate_token_mint)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_from_rpc_url() {
        assert_eq!(
            Cluster::from_rpc_url("https://api.mainnet-beta.solana.com"),
            Cluster::Mainnet
        );
        assert_eq!(
            Cluster::from_rpc_url("https://api.devnet.solana.com"),
            Cluster::Devnet
        );
        assert_eq!(
            Cluster::from_rpc_url("http://127.0.0.1:8899"),
            Cluster::Localnet
        );
        assert_eq!(
            Cluster::from_rpc_url("https://rpc.mydomain.io"),
            Cluster::Localnet
        );
        assert_eq!(
            Cluster::from_rpc_url("https://rpc.developer-node.io"),
            Cluster::Localnet
        );
        assert_eq!("mainnet-beta".parse::<Cluster>().unwrap(), Cluster::Mainnet);
        assert!("testnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_mainnet_has_no_governance_program() {
        let registry = ProgramRegistry::for_cluster(Cluster::Mainnet);
        assert!(matches!(
            registry.program_id(Domain::Governance),
            Err(TokrError::MissingProgram("governance"))
        ));
        assert_eq!(
            registry.program_id(Domain::IdentityVerification).unwrap(),
            Pubkey::from_str("idv2F375xYuz2K7a7LxcrkhgWbPsJgpuWD3XLW1AFdD").unwrap()
        );
    }

    #[test]
    fn test_registry_json_overrides_preset() {
        let custom = Pubkey::new_unique();
        let json = format!(
            r#"{{"cluster": "devnet", "permissionedList": "{}", "governanceVersion": 1}}"#,
            custom
        );
        let registry = ProgramRegistry::from_json_str(&json).unwrap();
        let devnet = ProgramRegistry::for_cluster(Cluster::Devnet);

        assert_eq!(registry.permissioned_list, custom);
        assert_eq!(registry.cap_table, devnet.cap_table);
        assert_eq!(registry.governance_version, GovernanceProgramVersion::V1);
    }

    #[test]
    fn test_registry_json_rejects_bad_key() {
        let result = ProgramRegistry::from_json_str(r#"{"capTable": "not-a-key"}"#);
        assert!(matches!(result, Err(TokrError::Config(_))));
    }

    #[test]
    fn test_investment_dao_config_defaults() {
        let json = format!(
            r#"{{
                "cluster": "https://api.devnet.solana.com",
                "owner": "~/.config/solana/id.json",
                "name": "Fund I",
                "governanceProgramId": "{}",
                "usdcMint": "{}",
                "details": {{"maxRaise": 1000000}},
                "governance": {{"voteThresholdPercentage": 51}}
            }}"#,
            Pubkey::new_unique(),
            Pubkey::new_unique()
        );
        let config = InvestmentDaoConfig::from_json_str(&json).unwrap();
        assert_eq!(config.cluster(), Cluster::Devnet);
        assert_eq!(config.details.max_raise, 1_000_000);
        assert_eq!(config.governance.vote_threshold_percentage, 51);
        assert_eq!(config.governance.max_voting_time, 259_200);
        assert_eq!(config.governance.min_council_tokens_to_create_proposal, 1);
    }

    #[test]
    fn test_investment_dao_config_validation() {
        let json = format!(
            r#"{{
                "cluster": "localnet",
                "owner": "owner.json",
                "name": "Fund I",
                "governanceProgramId": "{}",
                "usdcMint": "{}",
                "governance": {{"voteThresholdPercentage": 120}}
            }}"#,
            Pubkey::new_unique(),
            Pubkey::new_unique()
        );
        assert!(matches!(
            InvestmentDaoConfig::from_json_str(&json),
            Err(TokrError::Config(_))
        ));
    }
}
