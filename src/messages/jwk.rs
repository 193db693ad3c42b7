use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::util::base64helper::to_base64;

/// Public JSON Web Key as carried in `epk` headers.
/// Only the members needed for `OKP` and `EC` keys are typed, everything else
/// is kept in `other` so re-serialization does not lose data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl Jwk {
    /// Octet key pair (`OKP`) entry, used for Ed25519 and X25519.
    pub fn okp(crv: &str, x: &[u8]) -> Self {
        Jwk {
            kty: "OKP".into(),
            crv: crv.into(),
            x: to_base64(x),
            ..Default::default()
        }
    }

    /// Elliptic curve (`EC`) entry with both affine coordinates.
    pub fn ec(crv: &str, x: &[u8], y: &[u8]) -> Self {
        Jwk {
            kty: "EC".into(),
            crv: crv.into(),
            x: to_base64(x),
            y: Some(to_base64(y)),
            ..Default::default()
        }
    }

    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

impl From<Jwk> for Value {
    fn from(jwk: Jwk) -> Self {
        let mut map = Map::new();
        map.insert("kty".into(), Value::String(jwk.kty));
        map.insert("crv".into(), Value::String(jwk.crv));
        map.insert("x".into(), Value::String(jwk.x));
        if let Some(y) = jwk.y {
            map.insert("y".into(), Value::String(y));
        }
        if let Some(kid) = jwk.kid {
            map.insert("kid".into(), Value::String(kid));
        }
        let mut other: Vec<_> = jwk.other.into_iter().collect();
        other.sort_by(|a, b| a.0.cmp(&b.0));
        map.extend(other);
        Value::Object(map)
    }
}

#[test]
fn okp_jwk_to_value_keeps_member_order() {
    // Arrange
    let jwk = Jwk::okp("X25519", &[1u8; 32]);
    // Act
    let value = Value::from(jwk.clone());
    let back: Jwk = serde_json::from_value(value.clone()).unwrap();
    // Assert
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["kty", "crv", "x"]);
    assert_eq!(back, jwk);
}

#[test]
fn unknown_members_survive_parsing() {
    let jwk: Jwk = serde_json::from_str(
        r#"{"kty":"EC","crv":"secp256k1","x":"AA","y":"AQ","use":"enc"}"#,
    )
    .unwrap();
    assert_eq!(jwk.y.as_deref(), Some("AQ"));
    assert_eq!(jwk.other.get("use"), Some(&Value::from("enc")));
}
