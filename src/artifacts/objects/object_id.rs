//! Git object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character hexadecimal strings representing SHA-1 hashes.
//! In raw diff output they identify the content on either side of a change.
//!
//! ## Special IDs
//!
//! - Null: 40 zeros, emitted by git when a side has no object (missing, or
//!   a working tree file whose content was not hashed)
//! - Empty tree: the id of a tree with no entries, which git knows about even
//!   in repositories that never stored it. Diffing from it shows the whole
//!   history as additions.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_type::ObjectType;
use sha1::{Digest, Sha1};

const NULL_OID_RAW: &str = "0000000000000000000000000000000000000000";
const EMPTY_TREE_OID_RAW: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Git object identifier (SHA-1 hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Accepts upper case hex but stores it lower case, the way git prints ids.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// The tree git records before the first commit
    pub fn empty_tree() -> Self {
        Self(EMPTY_TREE_OID_RAW.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == NULL_OID_RAW
    }

    /// Parse an id from raw diff output, mapping the null id to `None`
    pub fn try_parse_optional(id: &str) -> anyhow::Result<Option<Self>> {
        let oid = Self::try_parse(id.to_string())?;
        Ok((!oid.is_null()).then_some(oid))
    }

    /// Hash `content` the way `git hash-object -t <object_type>` does
    pub fn hash_object(object_type: ObjectType, content: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(object_type.header(content.len()).as_bytes());
        hasher.update(content);

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get abbreviated form of the object ID
    ///
    /// # Returns
    ///
    /// First 7 characters of the hash (standard Git abbreviation)
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
