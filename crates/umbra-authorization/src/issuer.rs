//! Token minting
//!
//! One entry point, [`issue`]: with no parent it starts a fresh root token;
//! with a parent it extends the chain, inheriting and narrowing scope. Expiry
//! is always `now + ttl` at mint time from the local wall clock.

use crate::{Command, DelegationToken, TokenBody, TokenEnvelope};
use umbra_core::{unix_now, Did, Keypair, UmbraError, UmbraResult};

/// Mint a signed, scoped, time-boxed token
///
/// When `parent` is present the new token extends it: the signing key must
/// belong to the parent's audience (the current capability holder), the
/// command must be a prefix-scoped subset of the parent's, and the expiry is
/// clamped so the child never outlives the parent. A key/issuer mismatch is a
/// fatal configuration error, not a transient fault.
///
/// One token is minted per target audience; audiences never share tokens.
pub fn issue(
    parent: Option<&TokenEnvelope>,
    command: Command,
    audience: Did,
    ttl_seconds: u64,
    signing_key: &Keypair,
    is_invocation: bool,
    subject: Option<Did>,
) -> UmbraResult<TokenEnvelope> {
    if command.is_empty() {
        return Err(UmbraError::token_mint("Command must not be empty"));
    }

    let issuer = signing_key.did();
    let mut expires_at = unix_now() + ttl_seconds;
    let mut proofs = Vec::new();

    if let Some(parent) = parent {
        if parent.token.audience != issuer {
            return Err(UmbraError::token_mint(format!(
                "Signing key {} does not hold the parent capability (audience {})",
                issuer, parent.token.audience
            )));
        }
        if !command.narrows(&parent.token.command) {
            return Err(UmbraError::token_mint(format!(
                "Command {} widens parent scope {}",
                command, parent.token.command
            )));
        }
        // The child never outlives the parent
        expires_at = expires_at.min(parent.token.expires_at);

        proofs.extend(parent.proofs.iter().cloned());
        proofs.push(parent.signed());
    }

    let token = DelegationToken {
        issuer,
        audience,
        subject,
        command,
        expires_at,
        body: if is_invocation {
            TokenBody::Invocation
        } else {
            TokenBody::Delegation
        },
    };

    let signature = signing_key.sign(&token.signing_payload()?);

    tracing::debug!(
        issuer = %token.issuer,
        audience = %token.audience,
        command = %token.command,
        expires_at = token.expires_at,
        invocation = is_invocation,
        "Minted token"
    );

    Ok(TokenEnvelope {
        token,
        signature: hex::encode(signature.to_bytes()),
        proofs,
    })
}
