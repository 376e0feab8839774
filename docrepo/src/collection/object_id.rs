use crate::errors::{ErrorKind, RepoError, RepoResult};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

const MAX_COUNTER: u32 = 0x00FF_FFFF;
const HEX_LENGTH: usize = 24;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| OsRng.gen());
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(OsRng.gen_range(0..=MAX_COUNTER)));

/// The store-native primary key of a document.
///
/// An `ObjectId` is 12 bytes: a 4-byte big-endian creation time in seconds,
/// a 5-byte value unique to the generating process and a 3-byte big-endian
/// counter. Identifiers from different seconds sort by creation time; within
/// one second the counter starts at a random value and may wrap, so creation
/// order is not guaranteed.
///
/// The external form is the 24 character lowercase hexadecimal rendering,
/// produced by `Display` and accepted by `FromStr`.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::collection::ObjectId;
///
/// let id = ObjectId::new();
/// let text = id.to_hex();
/// assert_eq!(ObjectId::parse_str(&text)?, id);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a new unique `ObjectId`.
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) & MAX_COUNTER;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId { bytes }
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Decodes an `ObjectId` from its hexadecimal form.
    ///
    /// Fails with [ErrorKind::MalformedIdentifier] when the text is not
    /// exactly 24 hexadecimal characters.
    pub fn parse_str(text: &str) -> RepoResult<ObjectId> {
        if text.len() != HEX_LENGTH {
            log::error!("Invalid identifier length {} for '{}'", text.len(), text);
            return Err(RepoError::new(
                &format!("'{}' is not a valid identifier: expected {} hexadecimal characters", text, HEX_LENGTH),
                ErrorKind::MalformedIdentifier,
            ));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(text, &mut bytes).map_err(|err| {
            log::error!("Invalid identifier '{}': {}", text, err);
            RepoError::new(
                &format!("'{}' is not a valid identifier: {}", text, err),
                ErrorKind::MalformedIdentifier,
            )
        })?;
        Ok(ObjectId { bytes })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Creation time embedded in this identifier.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.bytes[0..4]);
        let seconds = u32::from_be_bytes(seconds) as i64;
        Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl FromStr for ObjectId {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ObjectId::parse_str(&text).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use std::collections::HashSet;

    #[test]
    fn test_new_id() {
        let id = ObjectId::new();
        assert_eq!(id.to_hex().len(), 24);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = ObjectId::new();
        let parsed = ObjectId::parse_str(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_known_value() {
        let id = ObjectId::parse_str("611827f2878b88b49ebb69fc").unwrap();
        assert_eq!(id.to_string(), "611827f2878b88b49ebb69fc");
        assert_eq!(id.timestamp().timestamp(), 0x611827f2);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let result = ObjectId::parse_str("lala");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn test_parse_rejects_bad_alphabet() {
        let result = ObjectId::parse_str("611827f2878b88b49ebb69zz");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let id = ObjectId::parse_str("611827F2878B88B49EBB69FC").unwrap();
        assert_eq!(id.to_hex(), "611827f2878b88b49ebb69fc");
    }

    #[test]
    fn test_from_str() {
        let id: ObjectId = "611b140f4eb6ee47e966860f".parse().unwrap();
        assert_eq!(id.to_hex(), "611b140f4eb6ee47e966860f");
    }

    #[test]
    fn test_debug() {
        let id = ObjectId::parse_str("611827f2878b88b49ebb69fc").unwrap();
        assert_eq!(format!("{:?}", id), "ObjectId(\"611827f2878b88b49ebb69fc\")");
    }

    #[test]
    fn test_creation_time_outranks_counter() {
        let mut earlier = [0xFF; 12];
        earlier[..4].copy_from_slice(&1_700_000_000u32.to_be_bytes());
        let mut later = [0x00; 12];
        later[..4].copy_from_slice(&1_700_000_001u32.to_be_bytes());

        let earlier = ObjectId::from_bytes(earlier);
        let later = ObjectId::from_bytes(later);
        assert!(earlier.timestamp() < later.timestamp());
        assert!(earlier < later);
    }

    #[test]
    fn test_counter_wrap_within_one_second() {
        let mut before_wrap = [0u8; 12];
        before_wrap[..4].copy_from_slice(&1_700_000_000u32.to_be_bytes());
        before_wrap[9..].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        let mut after_wrap = before_wrap;
        after_wrap[9..].copy_from_slice(&[0x00, 0x00, 0x00]);

        let before_wrap = ObjectId::from_bytes(before_wrap);
        let after_wrap = ObjectId::from_bytes(after_wrap);
        assert_eq!(before_wrap.timestamp(), after_wrap.timestamp());
        assert!(after_wrap < before_wrap);
    }

    #[test]
    fn test_serde_uses_hex() {
        let id = ObjectId::parse_str("611827f2878b88b49ebb69fc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"611827f2878b88b49ebb69fc\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_multithreaded_id_generation() {
        use std::sync::Arc;
        use std::thread;

        let set = Arc::new(RwLock::new(HashSet::new()));
        let mut handles = vec![];

        for _ in 0..50 {
            let set = set.clone();
            handles.push(thread::spawn(move || {
                let id = ObjectId::new();
                let mut set = set.write();
                assert!(set.insert(id), "Duplicate id found");
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(set.read().len(), 50);
    }
}
