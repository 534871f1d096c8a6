/// Anchor transaction validation
///
/// Checks that a transaction really performed an allowed BNS registry call
/// for the DID's kind and deployment, then decodes the name, namespace and
/// zonefile hash it registered.
use crate::error::{ResolutionError, ResolveResult};
use crate::fqn::Fqn;
use crate::identifier::{Deployment, DidKind};
use crate::registry::clarity;
use crate::registry::{AnchorTransaction, FunctionArg, TxStatus};

pub const NAME_REGISTER: &str = "name-register";
pub const NAME_IMPORT: &str = "name-import";
pub const NAME_UPDATE: &str = "name-update";

/// Functions that may anchor an on-chain DID
pub const ON_CHAIN_FUNCTIONS: &[&str] = &[NAME_REGISTER, NAME_IMPORT];

/// Functions that may anchor an off-chain DID
pub const OFF_CHAIN_FUNCTIONS: &[&str] = &[NAME_IMPORT, NAME_UPDATE];

/// Functions only valid for off-chain DIDs; anchoring one means a subdomain was created
pub const SUBDOMAIN_INCEPTION_FUNCTIONS: &[&str] = &[NAME_UPDATE];

const ARG_NAME: &str = "name";
const ARG_NAMESPACE: &str = "namespace";
const ARG_ZONEFILE_HASH: &str = "zonefile-hash";

/// Registry call decoded from an anchor transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOperation {
    pub name: String,
    pub namespace: String,
    /// Hex of the zonefile hash the call committed to
    pub content_hash: String,
    pub implies_subdomain_inception: bool,
}

impl RegistryOperation {
    pub fn fqn(&self) -> Fqn {
        Fqn::new(self.name.clone(), self.namespace.clone())
    }
}

/// Registry functions allowed to anchor a DID of `kind`
pub fn allowed_functions(kind: DidKind) -> &'static [&'static str] {
    match kind {
        DidKind::OnChain => ON_CHAIN_FUNCTIONS,
        DidKind::OffChain => OFF_CHAIN_FUNCTIONS,
    }
}

/// Validate an anchor transaction and decode its registry call
pub fn validate_transaction(
    tx: &AnchorTransaction,
    expected_kind: DidKind,
    expected_deployment: Deployment,
) -> ResolveResult<RegistryOperation> {
    if tx.tx_status != TxStatus::Success {
        return Err(ResolutionError::TransactionNotSuccessful {
            tx_id: tx.tx_id.clone(),
            status: tx.tx_status.to_string(),
        });
    }

    let call = tx
        .contract_call
        .as_ref()
        .ok_or_else(|| ResolutionError::NotAContractCall(tx.tx_id.clone()))?;

    let expected_contract = expected_deployment.registry_contract();
    if call.contract_id != expected_contract {
        return Err(ResolutionError::WrongRegistryContract {
            expected: expected_contract.to_string(),
            actual: call.contract_id.clone(),
        });
    }

    let function = call.function_name.as_str();
    if !allowed_functions(expected_kind).contains(&function) {
        return Err(ResolutionError::DisallowedOperation {
            function: function.to_string(),
            kind: expected_kind,
        });
    }

    let args = &call.function_args;
    let missing: Vec<&str> = [ARG_NAME, ARG_NAMESPACE, ARG_ZONEFILE_HASH]
        .into_iter()
        .filter(|wanted| find_arg(args, wanted).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ResolutionError::MissingArguments(format!(
            "{} call in {} lacks {}",
            function,
            tx.tx_id,
            missing.join(", ")
        )));
    }

    let name = decode_ascii_arg(args, ARG_NAME)?;
    let namespace = decode_ascii_arg(args, ARG_NAMESPACE)?;
    let content_hash = decode_buffer_arg(args, ARG_ZONEFILE_HASH)?;

    Ok(RegistryOperation {
        name,
        namespace,
        content_hash: hex::encode(content_hash),
        implies_subdomain_inception: SUBDOMAIN_INCEPTION_FUNCTIONS.contains(&function),
    })
}

fn find_arg<'a>(args: &'a [FunctionArg], name: &str) -> Option<&'a FunctionArg> {
    args.iter().find(|arg| arg.name == name)
}

fn decode_arg(args: &[FunctionArg], name: &str) -> ResolveResult<clarity::ClarityValue> {
    let arg = find_arg(args, name)
        .ok_or_else(|| ResolutionError::MissingArguments(name.to_string()))?;
    clarity::decode_hex(&arg.hex).map_err(|e| {
        ResolutionError::MalformedArguments(format!("argument '{}': {}", name, e))
    })
}

fn decode_ascii_arg(args: &[FunctionArg], name: &str) -> ResolveResult<String> {
    let value = decode_arg(args, name)?;
    let text = value.to_ascii().map_err(|e| {
        ResolutionError::MalformedArguments(format!("argument '{}': {}", name, e))
    })?;
    if text.is_empty() {
        return Err(ResolutionError::MalformedArguments(format!(
            "argument '{}' is empty",
            name
        )));
    }
    Ok(text)
}

fn decode_buffer_arg(args: &[FunctionArg], name: &str) -> ResolveResult<Vec<u8>> {
    let value = decode_arg(args, name)?;
    value.as_buffer().map(<[u8]>::to_vec).ok_or_else(|| {
        ResolutionError::MalformedArguments(format!("argument '{}' is not a buffer", name))
    })
}
