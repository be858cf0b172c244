use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Amount in the chain's smallest currency unit (wei).
pub type Wei = u128;

/// Position of an item in the contract's append-only list.
pub type ItemIndex = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Address(pub String);

impl Address {
    /// `0x` followed by exactly 40 hex digits.
    pub fn is_well_formed(&self) -> bool {
        let Some(body) = self.0.strip_prefix("0x").or_else(|| self.0.strip_prefix("0X")) else {
            return false;
        };
        body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Lowercased copy, used when comparing addresses from different sources.
    pub fn normalized(&self) -> Address {
        Address(self.0.to_ascii_lowercase())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NetworkId(pub u64);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an item. The contract is the authority on transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Created,
    Paid,
    Delivered,
}

impl Step {
    pub fn from_code(code: u8) -> Option<Step> {
        match code {
            0 => Some(Step::Created),
            1 => Some(Step::Paid),
            2 => Some(Step::Delivered),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Step::Created => 0,
            Step::Paid => 1,
            Step::Delivered => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Created => "Created",
            Step::Paid => "Paid",
            Step::Delivered => "Delivered",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Step::Created => "step-created",
            Step::Paid => "step-paid",
            Step::Delivered => "step-delivered",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub index: ItemIndex,
    pub name: String,
    pub price: Wei,
    pub step: Step,
    /// Address that accepts payment for this item.
    pub owner_address: Address,
}

/// Plain value transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: Wei,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub address: Address,
    #[serde(default, rename = "transactionHash")]
    pub transaction_hash: Option<String>,
}

/// Build artifact of a deployed contract. Only the fields this client reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractArtifact {
    #[serde(default, rename = "contractName")]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub networks: HashMap<String, DeploymentRecord>,
}

impl ContractArtifact {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_networks_are_read_and_extra_fields_ignored() -> anyhow::Result<()> {
        let raw = r#"{
            "contractName": "ItemManager",
            "abi": [],
            "networks": {
                "5777": {
                    "events": {},
                    "links": {},
                    "address": "0x5b1869D9A4C187F2EAa108f3062412ecf0526b24",
                    "transactionHash": "0xabc"
                }
            }
        }"#;

        let artifact = ContractArtifact::from_json(raw)?;
        assert_eq!(artifact.contract_name.as_deref(), Some("ItemManager"));
        let record = &artifact.networks["5777"];
        assert!(record.address.is_well_formed());
        assert_eq!(record.transaction_hash.as_deref(), Some("0xabc"));
        Ok(())
    }

    #[test]
    fn step_codes_match_contract_enum() {
        for step in [Step::Created, Step::Paid, Step::Delivered] {
            assert_eq!(Step::from_code(step.code()), Some(step));
        }
        assert_eq!(Step::from_code(3), None);
    }

    #[test]
    fn malformed_addresses_are_detected() {
        assert!(!Address("0x123".to_owned()).is_well_formed());
        assert!(!Address("5b1869D9A4C187F2EAa108f3062412ecf0526b24".to_owned()).is_well_formed());
        assert!(!Address("0xzz1869D9A4C187F2EAa108f3062412ecf0526b24".to_owned()).is_well_formed());
    }
}
