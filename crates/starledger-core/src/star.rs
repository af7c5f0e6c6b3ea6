//! Star registrations: the payload schema of the star registry.
//!
//! The ledger treats block bodies as opaque. This module is the typed layer a
//! request handler runs before submitting: it checks the free-form fields and
//! turns a registration into a [`Payload`], and decodes stored blocks back.

use serde::{Deserialize, Serialize};

use crate::block::{Block, Payload};
use crate::error::CoreError;
use crate::types::{Address, BlockHash};

/// Largest story accepted, in bytes, before hex encoding.
pub const MAX_STORY_BYTES: usize = 500;

/// Star coordinates and the owner's story about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Right ascension.
    pub ra: String,
    /// Declination.
    pub dec: String,
    /// Magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<String>,
    /// Constellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cen: Option<String>,
    /// Free text. Hex-encoded once stored on the ledger.
    pub story: String,
}

impl Star {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
            mag: None,
            cen: None,
            story: story.into(),
        }
    }

    /// Check the field rules a registration must satisfy.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ra.is_empty() || self.dec.is_empty() || self.story.is_empty() {
            return Err(CoreError::InvalidPayload(
                "star must have non-empty 'ra', 'dec' and 'story'".into(),
            ));
        }
        if self.story.len() > MAX_STORY_BYTES {
            return Err(CoreError::InvalidPayload(format!(
                "story is {} bytes, maximum is {}",
                self.story.len(),
                MAX_STORY_BYTES
            )));
        }
        if !self.story.is_ascii() {
            return Err(CoreError::InvalidPayload(
                "story contains non-ASCII characters".into(),
            ));
        }
        Ok(())
    }
}

/// A request to register a star under an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRegistration {
    pub address: Address,
    pub star: Star,
}

impl StarRegistration {
    pub fn new(address: impl Into<Address>, star: Star) -> Self {
        Self {
            address: address.into(),
            star,
        }
    }

    /// Validate and convert into a ledger payload owned by the address.
    pub fn into_payload(self) -> Result<Payload, CoreError> {
        self.star.validate()?;

        let stored = Star {
            story: hex::encode(self.star.story.as_bytes()),
            ..self.star
        };
        let mut data = Vec::new();
        ciborium::into_writer(&stored, &mut data)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;

        Ok(Payload::owned(self.address.as_str(), data))
    }
}

/// A star read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarRecord {
    pub height: u64,
    pub hash: BlockHash,
    pub timestamp: i64,
    pub address: Address,
    /// The star as stored, with `story` still hex-encoded.
    pub star: Star,
    /// The story decoded back to text.
    pub story_decoded: String,
}

impl StarRecord {
    /// Decode the star carried by `block`.
    ///
    /// Returns `None` for blocks without an owner, such as genesis.
    pub fn from_block(block: &Block) -> Result<Option<Self>, CoreError> {
        let Some(owner) = block.owner() else {
            return Ok(None);
        };

        let star: Star = ciborium::from_reader(&block.body.data[..])
            .map_err(|e| CoreError::DecodingError(e.to_string()))?;
        let story = hex::decode(&star.story)
            .map_err(|e| CoreError::DecodingError(format!("story: {}", e)))?;
        let story_decoded = String::from_utf8(story)
            .map_err(|e| CoreError::DecodingError(format!("story: {}", e)))?;

        Ok(Some(Self {
            height: block.height,
            hash: block.hash,
            timestamp: block.timestamp,
            address: Address::new(owner),
            star,
            story_decoded,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> Star {
        Star::new("16h 29m 1.0s", "-26° 29' 24.9", "Found star using https://www.google.com/sky/")
    }

    #[test]
    fn test_valid_star_passes() {
        star().validate().unwrap();
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut s = star();
        s.ra.clear();
        assert!(matches!(s.validate(), Err(CoreError::InvalidPayload(_))));

        let mut s = star();
        s.story.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_story_length_limit() {
        let mut s = star();
        s.story = "a".repeat(MAX_STORY_BYTES);
        s.validate().unwrap();

        s.story.push('a');
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_non_ascii_story_rejected() {
        let mut s = star();
        s.story = "Sternschnuppe über dem See".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_payload_roundtrip_through_block() {
        let registration = StarRegistration::new("owner-address", star());
        let payload = registration.clone().into_payload().unwrap();
        assert_eq!(payload.owner.as_deref(), Some("owner-address"));

        let block = Block::seal(3, 1_700_000_000, None, payload);
        let record = StarRecord::from_block(&block).unwrap().unwrap();

        assert_eq!(record.height, 3);
        assert_eq!(record.address, registration.address);
        assert_eq!(record.star.story, hex::encode(registration.star.story.as_bytes()));
        assert_eq!(record.story_decoded, registration.star.story);
        assert_eq!(record.star.ra, registration.star.ra);
    }

    #[test]
    fn test_genesis_has_no_star() {
        let genesis = Block::seal(0, 0, None, Payload::unowned(b"Genesis block".to_vec()));
        assert!(StarRecord::from_block(&genesis).unwrap().is_none());
    }

    #[test]
    fn test_registration_from_request_json() {
        let json = r#"{
            "address": "abc",
            "star": {"ra": "16h 29m 1.0s", "dec": "-26 29 24.9", "story": "hi"}
        }"#;
        let registration: StarRegistration = serde_json::from_str(json).unwrap();
        assert_eq!(registration.address.as_str(), "abc");
        assert_eq!(registration.star.mag, None);
        registration.star.validate().unwrap();
    }
}
