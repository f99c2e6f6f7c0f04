//! Token chain verification
//!
//! Walks an envelope's proof chain root-first, checking signatures, expiry,
//! issuer/audience linkage, and command narrowing at every hop. Verification
//! is what a storage node runs before honoring a bearer token.

use crate::TokenEnvelope;
use umbra_core::{Did, UmbraError, UmbraResult};

/// Verify an envelope presented to `expected_audience` at time `now`
///
/// Checks, in order:
/// - every proof and the leaf carry a valid issuer signature;
/// - nothing in the chain is expired at `now`;
/// - each hop's issuer is the previous hop's audience;
/// - each hop's command narrows its parent's command;
/// - the leaf's audience is exactly `expected_audience`.
pub fn verify_envelope(
    envelope: &TokenEnvelope,
    expected_audience: &Did,
    now: u64,
) -> UmbraResult<()> {
    let mut parent: Option<&crate::SignedToken> = None;

    for proof in &envelope.proofs {
        proof.verify_signature()?;
        check_token(&proof.token, parent.map(|p| &p.token), now)?;
        parent = Some(proof);
    }

    let leaf = envelope.signed();
    leaf.verify_signature()?;
    check_token(&leaf.token, parent.map(|p| &p.token), now)?;

    if envelope.token.audience != *expected_audience {
        return Err(UmbraError::invalid(format!(
            "Token audience {} does not match verifier {}",
            envelope.token.audience, expected_audience
        )));
    }

    Ok(())
}

fn check_token(
    token: &crate::DelegationToken,
    parent: Option<&crate::DelegationToken>,
    now: u64,
) -> UmbraResult<()> {
    if token.is_expired(now) {
        return Err(UmbraError::invalid(format!(
            "Token expired at {} (now {})",
            token.expires_at, now
        )));
    }

    if let Some(parent) = parent {
        if token.issuer != parent.audience {
            return Err(UmbraError::invalid(
                "Chain broken: token issuer is not the parent's audience",
            ));
        }
        if !token.command.narrows(&parent.command) {
            return Err(UmbraError::invalid(format!(
                "Chain broken: command {} widens parent scope {}",
                token.command, parent.command
            )));
        }
    }

    Ok(())
}
