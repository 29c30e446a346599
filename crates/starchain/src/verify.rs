/// Checks that a verification message was signed by the wallet that claims it.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, address: &str, message: &str, signature: &str) -> bool;
}

/// Pass-through policy: every signature is accepted.
///
/// No signing scheme or key format is defined for wallet addresses yet, so
/// submissions are gated only by the verification-message window.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _address: &str, _message: &str, _signature: &str) -> bool {
        true
    }
}
