/// Post-resolution liveness check and key refresh
///
/// Runs after a path has verified the identity at inception. Re-reads the
/// name's current registry state, rejects revoked or expired names, and
/// verifies the claim published in the current zonefile so rotated keys are
/// picked up.
///
/// Subdomains are not subject to their parent's revocation or expiry. A
/// subdomain is deactivated only when its current record is owned by the
/// burn address.
use super::ResolvedName;
use crate::claim;
use crate::error::{ResolutionError, ResolutionStep, ResolveResult};
use crate::fqn::Fqn;
use crate::registry::{NameInfo, RegistryClient};
use crate::zonefile::{find_subdomain_by_label, parse_zonefile, Zonefile};

/// Registry status of a revoked name
pub const STATUS_REVOKED: &str = "name-revoke";

/// Whether a name with `expire_block` has lapsed at chain height `current_block`
///
/// `expire_block == 0` means the namespace never expires.
pub fn is_expired(expire_block: u64, current_block: u64) -> bool {
    expire_block > 0 && current_block > expire_block
}

/// Check the resolved name is still live and return its current public key
pub(super) async fn check_liveness<C>(client: &C, resolved: &ResolvedName) -> ResolveResult<String>
where
    C: RegistryClient + ?Sized,
{
    let fqn = &resolved.fqn;
    let parent = fqn.parent();
    let info = client
        .fetch_name_info(&parent)
        .await
        .map_err(ResolutionError::registry(ResolutionStep::LivenessChecked))?;

    // Revoked names have no zonefile; status and expiry are read before it
    let (zonefile, owner) = match &fqn.subdomain {
        None => {
            if info.status == STATUS_REVOKED {
                return Err(ResolutionError::DidDeactivated(format!("{} was revoked", fqn)));
            }

            if info.expire_block > 0 {
                let current_block = client
                    .fetch_current_block_height()
                    .await
                    .map_err(ResolutionError::registry(ResolutionStep::LivenessChecked))?;
                if is_expired(info.expire_block, current_block) {
                    return Err(ResolutionError::DidExpired {
                        expire_block: info.expire_block,
                        current_block,
                    });
                }
            }

            (current_zonefile(client, &parent, &info).await?, info.owner.clone())
        }
        Some(label) => {
            let parent_zonefile = current_zonefile(client, &parent, &info).await?;
            parent_zonefile.matches_name(&parent)?;

            let subdomain = find_subdomain_by_label(&parent_zonefile, label)?;
            if subdomain.is_revoked() {
                return Err(ResolutionError::DidDeactivated(format!(
                    "{} was transferred to the burn address",
                    fqn
                )));
            }
            (parse_zonefile(subdomain.zonefile_text()?)?, subdomain.owner)
        }
    };

    zonefile.matches_name(fqn)?;
    let claim_url = zonefile.extract_claim_url()?;
    claim::fetch_and_verify(client, &claim_url, &owner).await
}

async fn current_zonefile<C>(client: &C, fqn: &Fqn, info: &NameInfo) -> ResolveResult<Zonefile>
where
    C: RegistryClient + ?Sized,
{
    if !info.zonefile.trim().is_empty() {
        return parse_zonefile(&info.zonefile);
    }

    let hash = (!info.zonefile_hash.is_empty()).then_some(info.zonefile_hash.as_str());
    let text = client
        .fetch_zonefile(fqn, hash)
        .await
        .map_err(ResolutionError::registry(ResolutionStep::LivenessChecked))?;
    parse_zonefile(&text)
}
