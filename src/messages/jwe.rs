use std::{borrow::Cow, collections::HashSet, ops::Deref};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    messages::helpers::{
        create_header_getter,
        serialization_base64_buffer,
        serialization_base64_option,
    },
    util::base64helper::{from_base64, to_base64},
    Error,
    Jwk,
    Result,
};

/// JOSE header as an insertion ordered JSON object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct Header(Map<String, Value>);

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style setter, later calls with the same key replace the value in place.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    create_header_getter!(alg);

    create_header_getter!(enc);

    create_header_getter!(apu);

    create_header_getter!(apv);

    create_header_getter!(skid);

    create_header_getter!(kid);

    /// Ephemeral public key, `None` when the header carries no `epk`.
    pub fn epk(&self) -> Result<Option<Jwk>> {
        match self.0.get("epk") {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::JweParseError(format!("malformed epk: {}", e))),
            None => Ok(None),
        }
    }
}

/// Integrity protected header together with its exact wire encoding.
///
/// The encoded form is what authenticates the envelope, so a parsed header
/// keeps the received string instead of re-serializing.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtectedHeader {
    encoded: String,
    header: Header,
}

impl ProtectedHeader {
    /// Canonical encoding: base64url over compact, insertion ordered JSON.
    pub fn new(header: Header) -> Result<Self> {
        let encoded = to_base64(serde_json::to_vec(&header)?);
        Ok(ProtectedHeader { encoded, header })
    }

    pub fn from_encoded(encoded: impl Into<String>) -> Result<Self> {
        let encoded = encoded.into();
        let header = serde_json::from_slice(&from_base64(&encoded)?)
            .map_err(|e| Error::JweParseError(format!("protected header: {}", e)))?;
        Ok(ProtectedHeader { encoded, header })
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// AAD input of the content encryption.
    pub fn as_bytes(&self) -> &[u8] {
        self.encoded.as_bytes()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl Deref for ProtectedHeader {
    type Target = Header;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

impl Serialize for ProtectedHeader {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for ProtectedHeader {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(d)?;
        ProtectedHeader::from_encoded(encoded).map_err(serde::de::Error::custom)
    }
}

/// Per-recipient entry: unprotected header plus the wrapped content key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recipient {
    #[serde(default)]
    pub header: Header,
    #[serde(with = "serialization_base64_buffer")]
    pub encrypted_key: Vec<u8>,
}

impl Recipient {
    pub fn new(header: Header, encrypted_key: Vec<u8>) -> Self {
        Recipient {
            header,
            encrypted_key,
        }
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.get_kid()
    }
}

/// Wire layout of the JWE JSON serialization, general and flattened.
#[derive(Serialize, Deserialize)]
struct JweParts {
    protected: ProtectedHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected: Option<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipients: Option<Vec<Recipient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<Header>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serialization_base64_option"
    )]
    encrypted_key: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<String>,
    #[serde(with = "serialization_base64_buffer")]
    iv: Vec<u8>,
    #[serde(with = "serialization_base64_buffer")]
    ciphertext: Vec<u8>,
    #[serde(with = "serialization_base64_buffer")]
    tag: Vec<u8>,
}

/// Multi-recipient JWE envelope. Immutable once built or parsed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "JweParts", into = "JweParts")]
pub struct Jwe {
    pub(crate) protected: ProtectedHeader,
    pub(crate) unprotected: Option<Header>,
    pub(crate) recipients: Vec<Recipient>,
    pub(crate) aad: Option<String>,
    pub(crate) iv: Vec<u8>,
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) tag: Vec<u8>,
    pub(crate) flattened: bool,
}

impl TryFrom<JweParts> for Jwe {
    type Error = Error;

    fn try_from(parts: JweParts) -> Result<Self> {
        let (recipients, flattened) = match (parts.recipients, parts.encrypted_key) {
            (Some(recipients), _) => (recipients, false),
            (None, Some(encrypted_key)) => (
                vec![Recipient::new(parts.header.unwrap_or_default(), encrypted_key)],
                true,
            ),
            (None, None) => {
                return Err(Error::JweParseError("missing recipients".into()));
            }
        };
        let mut seen = HashSet::new();
        for kid in recipients.iter().filter_map(Recipient::kid) {
            if !seen.insert(kid) {
                return Err(Error::JweParseError(format!(
                    "duplicate recipient kid {}",
                    kid
                )));
            }
        }
        Ok(Jwe {
            protected: parts.protected,
            unprotected: parts.unprotected,
            recipients,
            aad: parts.aad,
            iv: parts.iv,
            ciphertext: parts.ciphertext,
            tag: parts.tag,
            flattened,
        })
    }
}

impl From<Jwe> for JweParts {
    fn from(jwe: Jwe) -> Self {
        let mut parts = JweParts {
            protected: jwe.protected,
            unprotected: jwe.unprotected,
            recipients: None,
            header: None,
            encrypted_key: None,
            aad: jwe.aad,
            iv: jwe.iv,
            ciphertext: jwe.ciphertext,
            tag: jwe.tag,
        };
        let mut recipients = jwe.recipients;
        if jwe.flattened && recipients.len() == 1 {
            if let Some(recipient) = recipients.pop() {
                parts.header = Some(recipient.header);
                parts.encrypted_key = Some(recipient.encrypted_key);
            }
        } else {
            parts.recipients = Some(recipients);
        }
        parts
    }
}

impl Jwe {
    pub fn from_slice(incoming: &[u8]) -> Result<Self> {
        serde_json::from_slice(incoming).map_err(|e| Error::JweParseError(e.to_string()))
    }

    pub fn from_json(incoming: &str) -> Result<Self> {
        Self::from_slice(incoming.as_bytes())
    }

    /// Compact JSON, the encrypted envelope wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn protected(&self) -> &ProtectedHeader {
        &self.protected
    }

    pub fn unprotected(&self) -> Option<&Header> {
        self.unprotected.as_ref()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Encoded top-level `aad` member, if any.
    pub fn aad(&self) -> Option<&str> {
        self.aad.as_deref()
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// AAD of the content encryption: `protected`, followed by `.aad` when present.
    pub fn combined_aad(&self) -> Vec<u8> {
        let mut combined = self.protected.as_bytes().to_vec();
        if let Some(aad) = &self.aad {
            combined.push(b'.');
            combined.extend_from_slice(aad.as_bytes());
        }
        combined
    }

    /// Recipient entry addressed to `kid`, if this envelope has one.
    pub fn get_recipient(&self, kid: &str) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.kid() == Some(kid))
    }

    pub fn recipient_kids(&self) -> impl Iterator<Item = &str> {
        self.recipients.iter().filter_map(Recipient::kid)
    }
}

/// Anything a decrypt call can read an envelope from.
#[derive(Clone, Copy, Debug)]
pub enum EnvelopeSource<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
    Parsed(&'a Jwe),
}

impl<'a> EnvelopeSource<'a> {
    /// Parses on demand, already parsed envelopes are borrowed.
    pub fn into_jwe(self) -> Result<Cow<'a, Jwe>> {
        match self {
            EnvelopeSource::Bytes(bytes) => Jwe::from_slice(bytes).map(Cow::Owned),
            EnvelopeSource::Text(text) => Jwe::from_json(text).map(Cow::Owned),
            EnvelopeSource::Parsed(jwe) => Ok(Cow::Borrowed(jwe)),
        }
    }
}

impl<'a> From<&'a [u8]> for EnvelopeSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        EnvelopeSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for EnvelopeSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        EnvelopeSource::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for EnvelopeSource<'a> {
    fn from(text: &'a str) -> Self {
        EnvelopeSource::Text(text)
    }
}

impl<'a> From<&'a String> for EnvelopeSource<'a> {
    fn from(text: &'a String) -> Self {
        EnvelopeSource::Text(text)
    }
}

impl<'a> From<&'a Jwe> for EnvelopeSource<'a> {
    fn from(jwe: &'a Jwe) -> Self {
        EnvelopeSource::Parsed(jwe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> String {
        to_base64(r#"{"alg":"ECDH-ES+A256KW","enc":"XC20P"}"#)
    }

    fn general(recipients: &str) -> String {
        format!(
            r#"{{"protected":"{}","recipients":{},"iv":"AAEC","ciphertext":"AwQF","tag":"BgcI"}}"#,
            protected(),
            recipients
        )
    }

    #[test]
    fn general_form_keeps_protected_encoding() -> Result<()> {
        // Arrange
        let incoming = general(
            r#"[{"header":{"kid":"did:example:bob#key-1"},"encrypted_key":"CQoL"}]"#,
        );
        // Act
        let jwe = Jwe::from_json(&incoming)?;
        // Assert
        assert_eq!(jwe.protected().encoded(), protected());
        assert_eq!(jwe.protected().get_alg(), Some("ECDH-ES+A256KW"));
        assert_eq!(jwe.iv(), &[0, 1, 2]);
        assert_eq!(jwe.to_json()?, incoming);
        Ok(())
    }

    #[test]
    fn flattened_form_is_accepted() -> Result<()> {
        let incoming = format!(
            r#"{{"protected":"{}","header":{{"kid":"did:example:bob#key-1"}},"encrypted_key":"CQoL","iv":"AAEC","ciphertext":"AwQF","tag":"BgcI"}}"#,
            protected()
        );
        let jwe = Jwe::from_json(&incoming)?;
        let recipient = jwe
            .get_recipient("did:example:bob#key-1")
            .ok_or_else(|| Error::RecipientNotFound("bob".into()))?;
        assert_eq!(recipient.encrypted_key, vec![9, 10, 11]);
        assert_eq!(jwe.to_json()?, incoming);
        Ok(())
    }

    #[test]
    fn duplicate_recipient_kids_are_rejected() {
        let incoming = general(
            r#"[{"header":{"kid":"k"},"encrypted_key":"AA"},{"header":{"kid":"k"},"encrypted_key":"AQ"}]"#,
        );
        assert!(matches!(
            Jwe::from_json(&incoming),
            Err(Error::JweParseError(_))
        ));
    }

    #[test]
    fn missing_recipients_are_rejected() {
        let incoming = format!(
            r#"{{"protected":"{}","iv":"AA","ciphertext":"AA","tag":"AA"}}"#,
            protected()
        );
        assert!(Jwe::from_json(&incoming).is_err());
    }

    #[test]
    fn combined_aad_appends_aad_member() -> Result<()> {
        let plain = Jwe::from_json(&general("[]"))?;
        assert_eq!(plain.combined_aad(), protected().into_bytes());

        let with_aad = format!(
            r#"{{"protected":"{}","recipients":[],"aad":"ZXh0cmE","iv":"AA","ciphertext":"AA","tag":"AA"}}"#,
            protected()
        );
        let jwe = Jwe::from_json(&with_aad)?;
        assert_eq!(
            jwe.combined_aad(),
            format!("{}.ZXh0cmE", protected()).into_bytes()
        );
        Ok(())
    }

    #[test]
    fn unknown_kid_is_absent_not_error() -> Result<()> {
        let jwe = Jwe::from_json(&general(
            r#"[{"header":{"kid":"a"},"encrypted_key":"AA"}]"#,
        ))?;
        assert!(jwe.get_recipient("b").is_none());
        assert_eq!(jwe.recipient_kids().collect::<Vec<_>>(), ["a"]);
        Ok(())
    }

    #[test]
    fn header_keeps_insertion_order() -> Result<()> {
        let header = Header::new()
            .with("enc", "XC20P")
            .with("alg", "ECDH-ES+A256KW");
        let protected = ProtectedHeader::new(header)?;
        assert_eq!(
            from_base64(protected.encoded())?,
            br#"{"enc":"XC20P","alg":"ECDH-ES+A256KW"}"#.to_vec()
        );
        Ok(())
    }

    #[test]
    fn envelope_source_borrows_parsed() -> Result<()> {
        let jwe = Jwe::from_json(&general("[]"))?;
        assert!(matches!(
            EnvelopeSource::from(&jwe).into_jwe()?,
            Cow::Borrowed(_)
        ));
        let text = jwe.to_json()?;
        assert_eq!(*EnvelopeSource::from(&text).into_jwe()?, jwe);
        Ok(())
    }
}
