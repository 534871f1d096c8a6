/// Resolution of names migrated from the legacy registry
///
/// Migrated names carry no anchor of their own; the DID names the registry
/// deploy transaction instead. The address must own exactly one name, and
/// that name must still be in the state the migration left it in.
use super::{log_step, ResolvedName};
use crate::address;
use crate::claim;
use crate::error::{ResolutionError, ResolutionStep, ResolveResult};
use crate::fqn::parse_fqn;
use crate::identifier::StacksDid;
use crate::registry::RegistryClient;
use crate::transaction::NAME_REGISTER;
use crate::zonefile::parse_zonefile;

/// `last_txid` of a name that was never touched after migration
const UNTOUCHED_LAST_TXID: &str = "0x";

pub(super) async fn resolve_migrated<C>(client: &C, did: &StacksDid) -> ResolveResult<ResolvedName>
where
    C: RegistryClient + ?Sized,
{
    let mut names = client
        .fetch_names_owned_by(&did.address)
        .await
        .map_err(ResolutionError::registry(ResolutionStep::OperationValidated))?;

    let name = match names.len() {
        0 => return Err(ResolutionError::NoOwnedName(did.address.clone())),
        1 => names.remove(0),
        _ => {
            return Err(ResolutionError::AmbiguousOwnership {
                address: did.address.clone(),
                names,
            })
        }
    };

    let fqn = parse_fqn(&name)?;
    if fqn.is_subdomain() {
        return Err(ResolutionError::MigratedIdentityInvalid(format!(
            "{} is a subdomain, not an on-chain name",
            fqn
        )));
    }

    let info = client
        .fetch_name_info(&fqn)
        .await
        .map_err(ResolutionError::registry(ResolutionStep::OperationValidated))?;

    if info.last_txid != UNTOUCHED_LAST_TXID {
        return Err(ResolutionError::MigratedIdentityInvalid(format!(
            "{} was updated after migration (last_txid {})",
            fqn, info.last_txid
        )));
    }
    if info.status != NAME_REGISTER {
        return Err(ResolutionError::MigratedIdentityInvalid(format!(
            "{} has status {}, expected {}",
            fqn, info.status, NAME_REGISTER
        )));
    }
    if !address::addresses_match(&info.owner, &did.address) {
        return Err(ResolutionError::MigratedIdentityInvalid(format!(
            "{} is owned by {}, not {}",
            fqn, info.owner, did.address
        )));
    }
    log_step(did, ResolutionStep::OperationValidated, &fqn);

    let zonefile = parse_zonefile(&info.zonefile)?;
    zonefile.matches_name(&fqn)?;
    let claim_url = zonefile.extract_claim_url()?;
    log_step(did, ResolutionStep::ZonefileResolved, &fqn);

    let public_key = claim::fetch_and_verify(client, &claim_url, &info.owner).await?;
    log_step(did, ResolutionStep::ClaimVerified, &fqn);

    Ok(ResolvedName {
        fqn,
        owner: info.owner,
        public_key,
    })
}
