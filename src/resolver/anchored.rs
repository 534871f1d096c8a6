/// On-chain and off-chain resolution from an anchor transaction
use super::{log_step, ResolvedName};
use crate::claim;
use crate::error::{ResolutionError, ResolutionStep, ResolveResult};
use crate::identifier::StacksDid;
use crate::registry::RegistryClient;
use crate::transaction::validate_transaction;
use crate::zonefile::{find_subdomain_by_owner, parse_zonefile};

pub(super) async fn resolve_anchored<C>(client: &C, did: &StacksDid) -> ResolveResult<ResolvedName>
where
    C: RegistryClient + ?Sized,
{
    let tx = client
        .fetch_transaction(&did.anchor_tx_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ResolutionError::TransactionNotFound(did.anchor_tx_id.clone())
            } else {
                ResolutionError::registry(ResolutionStep::OperationValidated)(e)
            }
        })?;

    let operation = validate_transaction(&tx, did.kind, did.deployment)?;
    let parent = operation.fqn();
    log_step(did, ResolutionStep::OperationValidated, &parent);

    let text = client
        .fetch_zonefile(&parent, Some(&operation.content_hash))
        .await
        .map_err(ResolutionError::registry(ResolutionStep::ZonefileResolved))?;
    let zonefile = parse_zonefile(&text)?;

    let (fqn, zonefile) = if operation.implies_subdomain_inception {
        zonefile.matches_name(&parent)?;

        let subdomain = find_subdomain_by_owner(&zonefile, &did.address)?;
        let fqn = subdomain.fqn(&parent);
        tracing::debug!(
            did = %did,
            subdomain = %fqn,
            seqn = subdomain.sequence_number,
            "subdomain record found"
        );
        (fqn, parse_zonefile(subdomain.zonefile_text()?)?)
    } else {
        (parent, zonefile)
    };
    zonefile.matches_name(&fqn)?;

    let claim_url = zonefile.extract_claim_url()?;
    log_step(did, ResolutionStep::ZonefileResolved, &fqn);

    let public_key = claim::fetch_and_verify(client, &claim_url, &did.address).await?;
    log_step(did, ResolutionStep::ClaimVerified, &fqn);

    Ok(ResolvedName {
        fqn,
        owner: did.address.clone(),
        public_key,
    })
}
