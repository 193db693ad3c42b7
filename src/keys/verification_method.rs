use crate::{
    crypto::KeyAlg,
    keys::{multikey, KeyIdentity},
    Error,
    Result,
};

/// Verification method entry of a DID Document, reduced to what is needed to
/// get the key material out of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(
        alias = "publicKeyMultiBase",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
}

/// Known verification method types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationMethodType {
    Multikey,
    Ed25519VerificationKey2018,
    Ed25519VerificationKey2020,
    X25519KeyAgreementKey2019,
    X25519KeyAgreementKey2020,
    EcdsaSecp256k1VerificationKey2019,
    Unsupported(String),
}

impl VerificationMethodType {
    /// Algorithm implied by a legacy type, `None` for `Multikey` and unsupported types.
    pub fn expected_alg(&self) -> Option<KeyAlg> {
        match self {
            VerificationMethodType::Ed25519VerificationKey2018
            | VerificationMethodType::Ed25519VerificationKey2020 => Some(KeyAlg::Ed25519),
            VerificationMethodType::X25519KeyAgreementKey2019
            | VerificationMethodType::X25519KeyAgreementKey2020 => Some(KeyAlg::X25519),
            VerificationMethodType::EcdsaSecp256k1VerificationKey2019 => Some(KeyAlg::K256),
            VerificationMethodType::Multikey | VerificationMethodType::Unsupported(_) => None,
        }
    }
}

impl From<&str> for VerificationMethodType {
    fn from(type_: &str) -> Self {
        match type_ {
            "Multikey" => Self::Multikey,
            "Ed25519VerificationKey2018" => Self::Ed25519VerificationKey2018,
            "Ed25519VerificationKey2020" => Self::Ed25519VerificationKey2020,
            "X25519KeyAgreementKey2019" => Self::X25519KeyAgreementKey2019,
            "X25519KeyAgreementKey2020" => Self::X25519KeyAgreementKey2020,
            "EcdsaSecp256k1VerificationKey2019" => Self::EcdsaSecp256k1VerificationKey2019,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

impl VerificationMethod {
    pub fn from_json(incoming: &str) -> Result<Self> {
        Ok(serde_json::from_str(incoming)?)
    }

    /// Key identifier: relative `#fragment` ids are prefixed with the controller.
    pub fn kid(&self) -> Result<String> {
        let id = required(&self.id, "id")?;
        let controller = required(&self.controller, "controller")?;
        Ok(if id.starts_with('#') {
            format!("{}{}", controller, id)
        } else {
            id.to_string()
        })
    }

    pub fn method_type(&self) -> Result<VerificationMethodType> {
        required(&self.type_, "type").map(VerificationMethodType::from)
    }

    /// Public key described by this verification method.
    pub fn resolve(&self) -> Result<KeyIdentity> {
        let method_type = self.method_type()?;
        let kid = self.kid()?;
        trace!("resolving {:?} verification method {}", method_type, kid);

        let expected = match method_type {
            VerificationMethodType::Multikey => {
                let multikey = required(&self.public_key_multibase, "publicKeyMultibase")?;
                return KeyIdentity::from_multikey(multikey, kid);
            }
            VerificationMethodType::Unsupported(type_) => {
                return Err(Error::UnsupportedVerificationMethodType(type_));
            }
            ref legacy => legacy
                .expected_alg()
                .ok_or_else(|| Error::UnsupportedVerificationMethodType(format!("{:?}", legacy)))?,
        };

        let material = match (&self.public_key_multibase, &self.public_key_base58) {
            (Some(multibase), None) => multikey::decode_multibase(multibase)?,
            (None, Some(base58)) => multikey::decode_multibase(&format!("z{}", base58))?,
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "both publicKeyMultibase and publicKeyBase58 are set".into(),
                ))
            }
            (None, None) => return Err(Error::MissingRequiredField("publicKeyMultibase")),
        };

        if is_raw(expected, &material) {
            return KeyIdentity::from_public_bytes(expected, &material, kid);
        }
        let (found, key) = multikey::unwrap(&material)?;
        if found != expected {
            return Err(Error::AlgorithmMismatch { expected, found });
        }
        KeyIdentity::from_public_bytes(found, key, kid)
    }
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or(Error::MissingRequiredField(name))
}

// Multicodec tags never start with a SEC1 point tag, so both checks can not overlap.
fn is_raw(expected: KeyAlg, material: &[u8]) -> bool {
    match (expected, material.first().copied()) {
        (_, _) if material.len() == 32 => true,
        (KeyAlg::K256, Some(0x02 | 0x03)) => material.len() == 33,
        (KeyAlg::K256, Some(0x04)) => material.len() == 65,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(type_: &str, multibase: Option<&str>, base58: Option<&str>) -> VerificationMethod {
        VerificationMethod {
            id: Some("#key-1".into()),
            type_: Some(type_.into()),
            controller: Some("did:example:123".into()),
            public_key_multibase: multibase.map(String::from),
            public_key_base58: base58.map(String::from),
        }
    }

    #[test]
    fn relative_and_absolute_ids() -> Result<()> {
        let mut vm = method("Multikey", None, None);
        assert_eq!(vm.kid()?, "did:example:123#key-1");
        vm.id = Some("did:example:456#key-2".into());
        assert_eq!(vm.kid()?, "did:example:456#key-2");
        Ok(())
    }

    #[test]
    fn multikey_type_round_trips() -> Result<()> {
        for alg in [KeyAlg::Ed25519, KeyAlg::X25519, KeyAlg::K256] {
            let identity = KeyIdentity::generate(alg, "x");
            let resolved = method("Multikey", Some(identity.multikey()), None).resolve()?;
            assert_eq!(resolved.alg(), alg);
            assert_eq!(resolved.multikey(), identity.multikey());
        }
        Ok(())
    }

    #[test]
    fn raw_32_byte_multibase_uses_type_algorithm() -> Result<()> {
        let identity = KeyIdentity::generate(KeyAlg::Ed25519, "x");
        let raw = multibase::encode(multibase::Base::Base58Btc, identity.key().public_bytes());
        let resolved = method("Ed25519VerificationKey2020", Some(&raw), None).resolve()?;
        assert_eq!(resolved.multikey(), identity.multikey());
        Ok(())
    }

    #[test]
    fn base58_material_gets_implicit_prefix() -> Result<()> {
        let identity = KeyIdentity::generate(KeyAlg::X25519, "x");
        let raw = multibase::encode(multibase::Base::Base58Btc, identity.key().public_bytes());
        let resolved = method("X25519KeyAgreementKey2019", None, Some(&raw[1..])).resolve()?;
        assert_eq!(resolved.alg(), KeyAlg::X25519);
        assert_eq!(resolved.multikey(), identity.multikey());
        Ok(())
    }

    #[test]
    fn secp256k1_legacy_material() -> Result<()> {
        let identity = KeyIdentity::generate(KeyAlg::K256, "x");
        let raw = multibase::encode(multibase::Base::Base58Btc, identity.key().public_bytes());
        let from_raw =
            method("EcdsaSecp256k1VerificationKey2019", None, Some(&raw[1..])).resolve()?;
        let from_wrapped =
            method("EcdsaSecp256k1VerificationKey2019", Some(identity.multikey()), None)
                .resolve()?;
        assert_eq!(from_raw.multikey(), identity.multikey());
        assert_eq!(from_wrapped.multikey(), identity.multikey());
        Ok(())
    }

    #[test]
    fn wrapped_material_must_match_type() {
        let identity = KeyIdentity::generate(KeyAlg::Ed25519, "x");
        let result = method("X25519KeyAgreementKey2020", Some(identity.multikey()), None).resolve();
        assert!(matches!(
            result,
            Err(Error::AlgorithmMismatch {
                expected: KeyAlg::X25519,
                found: KeyAlg::Ed25519
            })
        ));
    }

    #[test]
    fn key_material_fields_are_exclusive() {
        let both = method("X25519KeyAgreementKey2020", Some("z1"), Some("1")).resolve();
        assert!(matches!(both, Err(Error::Configuration(_))));
        let neither = method("X25519KeyAgreementKey2020", None, None).resolve();
        assert!(matches!(neither, Err(Error::MissingRequiredField(_))));
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let result = method("JsonWebKey2020", Some("z1"), None).resolve();
        assert!(matches!(
            result,
            Err(Error::UnsupportedVerificationMethodType(t)) if t == "JsonWebKey2020"
        ));
    }

    #[test]
    fn missing_controller_is_reported() {
        let mut vm = method("Multikey", None, None);
        vm.controller = None;
        assert!(matches!(
            vm.resolve(),
            Err(Error::MissingRequiredField("controller"))
        ));
    }

    #[test]
    fn multibase_alias_is_accepted() -> Result<()> {
        let vm = VerificationMethod::from_json(
            r##"{
                "id": "#k",
                "type": "Multikey",
                "controller": "did:example:1",
                "publicKeyMultiBase": "z6LSqPZfn9krvgXma2icTMKf2uVcYhKXsudCmPoUzqGYW24U"
            }"##,
        )?;
        assert_eq!(vm.resolve()?.alg(), KeyAlg::X25519);
        Ok(())
    }
}
