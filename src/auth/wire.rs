// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signature wire format.
//!
//! The client signs the SHA-256 digest of the raw request body with its SSH
//! key. The signature travels in the `X-PB-Signature` header as standard
//! base64 of the SSH wire encoding (`string algorithm, string blob`), and the
//! key is named by its OpenSSH `SHA256:` fingerprint in
//! `X-PB-Key-Fingerprint`.

use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};
use signature::Verifier;
use ssh_encoding::{Decode, Encode};
use ssh_key::{HashAlg, PublicKey, Signature};
use thiserror::Error;

/// Why a signature header could not be turned into a [`Signature`].
#[derive(Debug, Error)]
pub enum SignatureDecodeError {
    #[error("signature is not valid base64")]
    Encoding,
    #[error("signature is not a valid SSH signature: {0}")]
    Format(String),
}

/// SHA-256 digest of a request body. This is what gets signed.
pub fn payload_digest(payload: &[u8]) -> [u8; 32] {
    Sha256::digest(payload).into()
}

/// OpenSSH-style fingerprint, e.g. `SHA256:uNiVztksCsDhcc0u9e8BujQXVUpKZIDTMczCvj3tD2s`.
pub fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// Encode a signature for the `X-PB-Signature` header.
pub fn encode_signature(signature: &Signature) -> Result<String, ssh_encoding::Error> {
    let mut wire = Vec::new();
    signature.encode(&mut wire)?;
    Ok(Base64::encode_string(&wire))
}

/// Decode the `X-PB-Signature` header.
pub fn decode_signature(text: &str) -> Result<Signature, SignatureDecodeError> {
    let wire = Base64::decode_vec(text.trim()).map_err(|_| SignatureDecodeError::Encoding)?;
    let mut reader: &[u8] = &wire;
    Signature::decode(&mut reader).map_err(|e| SignatureDecodeError::Format(e.to_string()))
}

/// Verify `signature` over the digest of `payload`.
pub fn verify_payload(
    key: &PublicKey,
    payload: &[u8],
    signature: &Signature,
) -> Result<(), signature::Error> {
    <PublicKey as Verifier<Signature>>::verify(key, &payload_digest(payload), signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::generate_identity;

    #[test]
    fn digest_is_sha256() {
        // echo -n "abc" | sha256sum
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let hex: String = payload_digest(b"abc")
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        assert_eq!(hex, expected);
    }

    #[test]
    fn fingerprint_uses_openssh_format() {
        let identity = generate_identity();
        let fp = fingerprint(identity.public_key());
        assert!(fp.starts_with("SHA256:"));
        assert!(!fp.ends_with('='));
        assert_eq!(fp, identity.fingerprint());
    }

    #[test]
    fn signed_payload_verifies_and_tampering_fails() {
        let identity = generate_identity();
        let payload = b"clipboard contents \x00\xff".to_vec();

        let header = identity.signature_header(&payload).unwrap();
        let signature = decode_signature(&header).unwrap();
        verify_payload(identity.public_key(), &payload, &signature).unwrap();

        let mut tampered = payload.clone();
        tampered[0] ^= 0x01;
        assert!(verify_payload(identity.public_key(), &tampered, &signature).is_err());
    }

    #[test]
    fn signature_from_other_key_fails() {
        let signer = generate_identity();
        let other = generate_identity();
        let signature = signer.sign(b"payload").unwrap();
        assert!(verify_payload(other.public_key(), b"payload", &signature).is_err());
    }

    #[test]
    fn decode_rejects_bad_base64() {
        assert!(matches!(
            decode_signature("not base64!!"),
            Err(SignatureDecodeError::Encoding)
        ));
    }

    #[test]
    fn decode_rejects_non_ssh_bytes() {
        let garbage = Base64::encode_string(b"definitely not an ssh signature");
        assert!(matches!(
            decode_signature(&garbage),
            Err(SignatureDecodeError::Format(_))
        ));
    }
}
