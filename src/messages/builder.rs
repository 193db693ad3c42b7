use crate::{
    crypto::EncryptedPayload,
    messages::{Header, Jwe, ProtectedHeader, Recipient},
    util::base64helper::to_base64,
    Error,
    Result,
};

/// Accumulates the parts of a [`Jwe`] while it is being encrypted.
///
/// The protected header is fixed before the payload is encrypted, since its
/// encoding is the AAD of the content encryption.
#[derive(Debug, Default)]
pub struct JweBuilder {
    protected: Option<ProtectedHeader>,
    unprotected: Option<Header>,
    recipients: Vec<Recipient>,
    aad: Option<String>,
    payload: Option<EncryptedPayload>,
    flatten_recipients: bool,
}

impl JweBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the flattened JSON form when the envelope ends up with a single recipient.
    pub fn with_flatten_recipients(mut self, flatten: bool) -> Self {
        self.flatten_recipients = flatten;
        self
    }

    /// Sets and encodes the protected header. Can be done only once.
    pub fn set_protected(&mut self, header: Header) -> Result<&mut Self> {
        if self.protected.is_some() {
            return Err(Error::Configuration(
                "protected header is already set".into(),
            ));
        }
        self.protected = Some(ProtectedHeader::new(header)?);
        Ok(self)
    }

    pub fn set_unprotected(&mut self, header: Header) -> &mut Self {
        self.unprotected = Some(header);
        self
    }

    /// Extra authenticated data, sent as the top-level `aad` member.
    pub fn set_aad(&mut self, aad: &[u8]) -> Result<&mut Self> {
        if self.payload.is_some() {
            return Err(Error::Configuration(
                "aad must be set before the payload".into(),
            ));
        }
        self.aad = Some(to_base64(aad));
        Ok(self)
    }

    /// Appends a recipient entry; entries keep their insertion order.
    pub fn add_recipient(&mut self, recipient: Recipient) -> Result<&mut Self> {
        if let Some(kid) = recipient.kid() {
            if self.recipients.iter().any(|r| r.kid() == Some(kid)) {
                return Err(Error::Configuration(format!(
                    "duplicate recipient kid {}",
                    kid
                )));
            }
        }
        self.recipients.push(recipient);
        Ok(self)
    }

    /// Encoded protected header.
    pub fn protected_bytes(&self) -> Result<&[u8]> {
        self.protected
            .as_ref()
            .map(ProtectedHeader::as_bytes)
            .ok_or_else(|| Error::Configuration("protected header is not set".into()))
    }

    /// AAD the payload has to be encrypted with.
    pub fn combined_aad(&self) -> Result<Vec<u8>> {
        let mut combined = self.protected_bytes()?.to_vec();
        if let Some(aad) = &self.aad {
            combined.push(b'.');
            combined.extend_from_slice(aad.as_bytes());
        }
        Ok(combined)
    }

    /// Stores the encrypted content. Requires the protected header, can be done only once.
    pub fn set_payload(&mut self, payload: EncryptedPayload) -> Result<&mut Self> {
        if self.protected.is_none() {
            return Err(Error::Configuration(
                "protected header must be set before the payload".into(),
            ));
        }
        if self.payload.is_some() {
            return Err(Error::Configuration("payload is already set".into()));
        }
        self.payload = Some(payload);
        Ok(self)
    }

    pub fn build(self) -> Result<Jwe> {
        if self.recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        let (protected, payload) = match (self.protected, self.payload) {
            (Some(protected), Some(payload)) => (protected, payload),
            _ => {
                return Err(Error::Configuration(
                    "ciphertext, iv and tag were never set".into(),
                ))
            }
        };
        Ok(Jwe {
            protected,
            unprotected: self.unprotected,
            recipients: self.recipients,
            aad: self.aad,
            iv: payload.nonce,
            ciphertext: payload.ciphertext,
            tag: payload.tag,
            flattened: self.flatten_recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EncryptedPayload {
        EncryptedPayload {
            ciphertext: vec![1, 2, 3],
            nonce: vec![4, 5],
            tag: vec![6],
        }
    }

    fn recipient(kid: &str) -> Recipient {
        Recipient::new(Header::new().with("kid", kid), vec![7, 8])
    }

    #[test]
    fn builds_in_order() -> Result<()> {
        // Arrange
        let mut builder = JweBuilder::new();
        builder.set_protected(Header::new().with("alg", "ECDH-ES+A256KW"))?;
        builder.add_recipient(recipient("b"))?;
        builder.add_recipient(recipient("a"))?;
        let aad = builder.combined_aad()?;
        builder.set_payload(payload())?;
        // Act
        let jwe = builder.build()?;
        // Assert
        assert_eq!(jwe.combined_aad(), aad);
        assert_eq!(jwe.recipient_kids().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(jwe.tag(), &[6]);
        Ok(())
    }

    #[test]
    fn protected_header_is_set_once() -> Result<()> {
        let mut builder = JweBuilder::new();
        builder.set_protected(Header::new())?;
        assert!(matches!(
            builder.set_protected(Header::new()),
            Err(Error::Configuration(_))
        ));
        Ok(())
    }

    #[test]
    fn payload_needs_protected_header() {
        let mut builder = JweBuilder::new();
        assert!(builder.protected_bytes().is_err());
        assert!(matches!(
            builder.set_payload(payload()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn no_recipients_is_an_error() -> Result<()> {
        let mut builder = JweBuilder::new();
        builder.set_protected(Header::new())?;
        builder.set_payload(payload())?;
        assert!(matches!(builder.build(), Err(Error::NoRecipients)));
        Ok(())
    }

    #[test]
    fn missing_payload_is_an_error() -> Result<()> {
        let mut builder = JweBuilder::new();
        builder.set_protected(Header::new())?;
        builder.add_recipient(recipient("a"))?;
        assert!(matches!(builder.build(), Err(Error::Configuration(_))));
        Ok(())
    }

    #[test]
    fn duplicate_recipient_is_rejected() -> Result<()> {
        let mut builder = JweBuilder::new();
        builder.add_recipient(recipient("a"))?;
        assert!(builder.add_recipient(recipient("a")).is_err());
        Ok(())
    }

    #[test]
    fn single_recipient_can_be_flattened() -> Result<()> {
        let mut builder = JweBuilder::new().with_flatten_recipients(true);
        builder.set_protected(Header::new().with("alg", "ECDH-ES+A256KW"))?;
        builder.add_recipient(recipient("a"))?;
        builder.set_aad(b"extra")?;
        builder.set_payload(payload())?;
        let json = builder.build()?.to_json()?;
        assert!(json.contains(r#""header":{"kid":"a"}"#));
        assert!(!json.contains("recipients"));
        assert!(json.contains(r#""aad":"ZXh0cmE""#));
        Ok(())
    }
}
