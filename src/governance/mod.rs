//! Governance adapter
//!
//! Builders for the realm / governance / proposal program, a fork of SPL governance v2 that adds
//! capital deposits for investment DAOs. Instructions use a one-byte tag instead of an Anchor
//! discriminator.
//!
//! Version 1 and 2 deployments differ in a few payload layouts. The adapter carries the version
//! it targets and picks the layout per instruction.

pub mod dao;
pub mod instructions;
pub mod pda;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::config::{Domain, ProgramRegistry};
use crate::error::{TokrError, TokrResult};
use crate::submit::AccountSource;

pub use dao::{DepositCapitalArgs, InvestmentDaoAddresses, InvestmentDaoArgs, InvestmentDaoMints};
pub use instructions::{
    CastVoteAccounts, CreateProposalAccounts, CreateProposalArgs, CreateRealmArgs,
};
pub use pda::GovernanceKind;
pub use types::{
    GovernanceAccount, GovernanceConfig, InstructionData, MintMaxVoteWeightSource, Realm,
    RealmConfigArgs, SetRealmAuthorityAction, Vote, VoteChoice, VoteThresholdPercentage,
    VoteTipping, VoteType,
};

/// Deployed governance program version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GovernanceProgramVersion {
    V1,
    #[default]
    V2,
}

impl From<GovernanceProgramVersion> for u8 {
    fn from(version: GovernanceProgramVersion) -> u8 {
        match version {
            GovernanceProgramVersion::V1 => 1,
            GovernanceProgramVersion::V2 => 2,
        }
    }
}

impl TryFrom<u8> for GovernanceProgramVersion {
    type Error = TokrError;

    fn try_from(version: u8) -> TokrResult<Self> {
        match version {
            1 => Ok(GovernanceProgramVersion::V1),
            2 => Ok(GovernanceProgramVersion::V2),
            other => Err(TokrError::Config(format!(
                "unsupported governance program version {}",
                other
            ))),
        }
    }
}

impl fmt::Display for GovernanceProgramVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

/// Instruction builders for one governance program deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Governance {
    program_id: Pubkey,
    version: GovernanceProgramVersion,
}

impl Governance {
    /// Adapter targeting a version 2 deployment
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            version: GovernanceProgramVersion::default(),
        }
    }

    pub fn with_version(mut self, version: GovernanceProgramVersion) -> Self {
        self.version = version;
        self
    }

    /// Fails with `MissingProgram` on clusters without a governance deployment
    pub fn from_registry(registry: &ProgramRegistry) -> TokrResult<Self> {
        let program_id = registry.program_id(Domain::Governance)?;
        Ok(Self::new(program_id).with_version(registry.governance_version))
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn version(&self) -> GovernanceProgramVersion {
        self.version
    }

    /// Fetch and decode a realm account
    pub fn fetch_realm<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        realm: &Pubkey,
    ) -> TokrResult<Realm> {
        let data = source
            .fetch(realm)?
            .ok_or(TokrError::AccountNotFound(*realm))?;
        Realm::decode(&data)
    }

    /// Fetch and decode a governance account
    pub fn fetch_governance<A: AccountSource + ?Sized>(
        &self,
        source: &A,
        governance: &Pubkey,
    ) -> TokrResult<GovernanceAccount> {
        let data = source
            .fetch(governance)?
            .ok_or(TokrError::AccountNotFound(*governance))?;
        GovernanceAccount::decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cluster;

    #[test]
    fn test_version_from_u8() {
        assert_eq!(
            GovernanceProgramVersion::try_from(1).unwrap(),
            GovernanceProgramVersion::V1
        );
        assert_eq!(
            GovernanceProgramVersion::try_from(2).unwrap(),
            GovernanceProgramVersion::V2
        );
        assert!(GovernanceProgramVersion::try_from(3).is_err());
        assert_eq!(GovernanceProgramVersion::default().to_string(), "v2");
    }

    #[test]
    fn test_version_serde() {
        let version: GovernanceProgramVersion = serde_json::from_str("1").unwrap();
        assert_eq!(version, GovernanceProgramVersion::V1);
        assert_eq!(serde_json::to_string(&GovernanceProgramVersion::V2).unwrap(), "2");
        assert!(serde_json::from_str::<GovernanceProgramVersion>("9").is_err());
    }

    #[test]
    fn test_from_registry() {
        let devnet = ProgramRegistry::for_cluster(Cluster::Devnet);
        let adapter = Governance::from_registry(&devnet).unwrap();
        assert_eq!(Some(adapter.program_id()), devnet.governance);
        assert_eq!(adapter.version(), GovernanceProgramVersion::V2);

        let mainnet = ProgramRegistry::for_cluster(Cluster::Mainnet);
        assert!(matches!(
            Governance::from_registry(&mainnet),
            Err(TokrError::MissingProgram("governance"))
        ));
    }
}
