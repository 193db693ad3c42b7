/// Integration tests of key extraction from DID Document verification methods.
///
mod common;

use {
    common::*,
    didcomm_envelope::{ecdh_es_decrypt, ecdh_es_encrypt, VerificationMethod},
    utilities::{get_keypair_set, KeyPairSet, BOB_KID},
};

#[test]
fn relative_id_is_joined_with_controller() -> Result<(), Error> {
    // Arrange
    let vm = VerificationMethod::from_json(
        r##"{
            "id": "#6LSqPZfn",
            "type": "X25519KeyAgreementKey2020",
            "publicKeyMultibase": "z6LSqPZfn9krvgXma2icTMKf2uVcYhKXsudCmPoUzqGYW24U",
            "controller": "did:example:123"
        }"##,
    )?;
    // Act
    let key = vm.resolve()?;
    // Assert
    assert_eq!(key.kid(), "did:example:123#6LSqPZfn");
    assert_eq!(key.alg(), KeyAlg::X25519);
    assert_eq!(
        key.multikey(),
        "z6LSqPZfn9krvgXma2icTMKf2uVcYhKXsudCmPoUzqGYW24U"
    );
    assert!(!key.has_secret());
    Ok(())
}

#[test]
fn multikey_output_is_reproduced_for_all_algorithms() -> Result<(), Error> {
    for (alg, type_) in [
        (KeyAlg::Ed25519, "Ed25519VerificationKey2020"),
        (KeyAlg::X25519, "X25519KeyAgreementKey2020"),
        (KeyAlg::K256, "EcdsaSecp256k1VerificationKey2019"),
    ] {
        let original = KeyIdentity::generate(alg, "did:example:123#key-1");
        for vm_type in [type_, "Multikey"] {
            let vm = VerificationMethod {
                id: Some("did:example:123#key-1".into()),
                type_: Some(vm_type.into()),
                controller: Some("did:example:123".into()),
                public_key_multibase: Some(original.multikey().into()),
                ..Default::default()
            };
            let resolved = vm.resolve()?;
            assert_eq!(resolved.multikey(), original.multikey());
            assert_eq!(resolved.kid(), original.kid());
        }
    }
    Ok(())
}

#[test]
fn resolved_key_can_be_encrypted_to() -> Result<(), Error> {
    let KeyPairSet { bobs_public, .. } = get_keypair_set();
    let vm = VerificationMethod {
        id: Some("#key-1".into()),
        type_: Some("X25519KeyAgreementKey2019".into()),
        controller: Some("did:example:bob".into()),
        public_key_base58: Some(bs58(&bobs_public)),
        ..Default::default()
    };
    let bob_public = vm.resolve()?;
    assert_eq!(bob_public.kid(), BOB_KID);

    let envelope = ecdh_es_encrypt(&[&bob_public], MESSAGE)?;
    assert_eq!(ecdh_es_decrypt(&envelope, &parties().bob)?, MESSAGE);
    Ok(())
}

#[test]
fn unknown_type_is_rejected() {
    let vm = VerificationMethod {
        id: Some("#key-1".into()),
        type_: Some("RsaVerificationKey2018".into()),
        controller: Some("did:example:123".into()),
        public_key_base58: Some("abc".into()),
        ..Default::default()
    };
    assert!(matches!(
        vm.resolve(),
        Err(Error::UnsupportedVerificationMethodType(_))
    ));
}

fn bs58(bytes: &[u8]) -> String {
    // multibase base58btc without its `z` prefix
    multibase::encode(multibase::Base::Base58Btc, bytes)[1..].to_string()
}
