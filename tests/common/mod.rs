//! Shared fixtures: an in-memory BNS registry and real secp256k1 identities

#![allow(dead_code)]

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use serde_json::json;
use stacks_did_resolver::address::{self, c32};
use stacks_did_resolver::claim::sign_claim_token;
use stacks_did_resolver::error::RegistryError;
use stacks_did_resolver::fqn::Fqn;
use stacks_did_resolver::identifier::{encode_did, MAINNET_REGISTRY_CONTRACT};
use stacks_did_resolver::registry::clarity::ClarityValue;
use stacks_did_resolver::registry::{
    AnchorTransaction, ContractCall, FunctionArg, NameInfo, RegistryClient, RegistryResult,
    TokenEnvelope, TxStatus,
};
use stacks_did_resolver::zonefile::{pack, UriRecord, Zonefile, CLAIM_URI_NAME};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const VERSION_MAINNET: u8 = 22;
pub const VERSION_MAINNET_OFF_CHAIN: u8 = 17;

/// A test identity backed by a deterministic key
pub struct Identity {
    pub key: SigningKey,
}

impl Identity {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_bytes(&[seed; 32].into()).unwrap(),
        }
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_sec1_bytes())
    }

    pub fn hash160(&self) -> [u8; 20] {
        address::hash160(&self.key.verifying_key().to_sec1_bytes())
    }

    pub fn c32(&self, version: u8) -> String {
        c32::c32_address(version, &self.hash160()).unwrap()
    }

    pub fn legacy(&self) -> String {
        address::public_key_to_address(&self.key.verifying_key().to_sec1_bytes()).unwrap()
    }

    /// Claim token self-signed by this identity
    pub fn claim(&self) -> String {
        sign_claim_token(&self.key, &self.public_hex(), json!({"@type": "Person"})).unwrap()
    }
}

pub fn did(address: &str, tx_id: &str) -> String {
    encode_did(address, tx_id)
}

/// Zonefile for `origin` publishing a claim at `url`
pub fn claim_zonefile(origin: &str, url: &str) -> Zonefile {
    let mut zonefile = Zonefile::new(origin);
    zonefile.ttl = Some(3600);
    zonefile.uri_records.push(UriRecord {
        name: CLAIM_URI_NAME.to_string(),
        ttl: None,
        priority: 10,
        weight: 1,
        target: url.to_string(),
    });
    zonefile
}

/// Add a subdomain record to a parent zonefile
pub fn add_subdomain(parent: &mut Zonefile, label: &str, owner: &str, seqn: u64, sub_zonefile: &Zonefile) {
    let text = sub_zonefile.to_string();
    parent
        .txt_groups
        .push(pack(label, owner, seqn, text.as_bytes(), None));
}

pub fn buffer_arg(name: &str, bytes: &[u8]) -> FunctionArg {
    FunctionArg::new(name, ClarityValue::Buffer(bytes.to_vec()).to_hex())
}

/// A successful BNS contract call on mainnet
pub fn registry_call(tx_id: &str, function: &str, name: &str, namespace: &str, zonefile_hash: &str) -> AnchorTransaction {
    AnchorTransaction {
        tx_id: format!("0x{}", tx_id),
        tx_status: TxStatus::Success,
        contract_call: Some(ContractCall {
            contract_id: MAINNET_REGISTRY_CONTRACT.to_string(),
            function_name: function.to_string(),
            function_args: vec![
                buffer_arg("namespace", namespace.as_bytes()),
                buffer_arg("name", name.as_bytes()),
                buffer_arg("zonefile-hash", &hex::decode(zonefile_hash).unwrap()),
            ],
        }),
    }
}

/// Name info for a live, never-expiring name
pub fn live_name(owner: &str, zonefile: &Zonefile, last_txid: &str) -> NameInfo {
    NameInfo {
        owner: owner.to_string(),
        expire_block: 0,
        last_txid: last_txid.to_string(),
        status: "name-register".to_string(),
        zonefile: zonefile.to_string(),
        zonefile_hash: String::new(),
    }
}

/// In-memory registry client
#[derive(Default)]
pub struct MockRegistry {
    pub transactions: HashMap<String, AnchorTransaction>,
    /// Keyed by (name.namespace, zonefile hash)
    pub zonefiles: HashMap<(String, Option<String>), String>,
    pub owned_names: HashMap<String, Vec<String>>,
    pub name_info: HashMap<String, NameInfo>,
    pub claims: HashMap<String, String>,
    pub tip_height: u64,
    pub tip_requests: AtomicUsize,
    /// Fail every lookup with a transport error
    pub offline: bool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&mut self, tx: AnchorTransaction) {
        let id = tx.tx_id.trim_start_matches("0x").to_string();
        self.transactions.insert(id, tx);
    }

    pub fn add_zonefile(&mut self, fqn: &str, hash: Option<&str>, zonefile: &Zonefile) {
        self.zonefiles
            .insert((fqn.to_string(), hash.map(str::to_string)), zonefile.to_string());
    }

    pub fn add_name_info(&mut self, fqn: &str, info: NameInfo) {
        self.name_info.insert(fqn.to_string(), info);
    }

    pub fn add_owned_names(&mut self, address: &str, names: &[&str]) {
        self.owned_names
            .insert(address.to_string(), names.iter().map(|n| n.to_string()).collect());
    }

    pub fn add_claim(&mut self, url: &str, token: String) {
        self.claims.insert(url.to_string(), token);
    }

    pub fn tip_requests(&self) -> usize {
        self.tip_requests.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> RegistryResult<()> {
        if self.offline {
            return Err(RegistryError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn fetch_transaction(&self, tx_id: &str) -> RegistryResult<AnchorTransaction> {
        self.check_online()?;
        self.transactions
            .get(tx_id.trim_start_matches("0x"))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("transaction {}", tx_id)))
    }

    async fn fetch_zonefile(&self, fqn: &Fqn, zonefile_hash: Option<&str>) -> RegistryResult<String> {
        self.check_online()?;
        self.zonefiles
            .get(&(fqn.to_string(), zonefile_hash.map(str::to_string)))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("zonefile of {}", fqn)))
    }

    async fn fetch_names_owned_by(&self, address: &str) -> RegistryResult<Vec<String>> {
        self.check_online()?;
        Ok(self.owned_names.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_name_info(&self, fqn: &Fqn) -> RegistryResult<NameInfo> {
        self.check_online()?;
        self.name_info
            .get(&fqn.to_string())
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("name {}", fqn)))
    }

    async fn fetch_current_block_height(&self) -> RegistryResult<u64> {
        self.check_online()?;
        self.tip_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.tip_height)
    }

    async fn fetch_signed_claim(&self, url: &str) -> RegistryResult<TokenEnvelope> {
        self.check_online()?;
        self.claims
            .get(url)
            .map(|token| TokenEnvelope {
                token: token.clone(),
            })
            .ok_or_else(|| RegistryError::NotFound(format!("claim at {}", url)))
    }
}
