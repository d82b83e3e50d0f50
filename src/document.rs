/// DID document data model
///
/// Mirrors the W3C JSON shape of a resolved did:sol document, with the
/// on-chain capability bitset carried on each verification method.
use crate::error::{MirrorError, MirrorResult};
use crate::identifier::parse_fragment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::BitOr;

/// Service type marking a profile-picture endpoint
pub const PFP_SERVICE_TYPE: &str = "PFP";

fn default_context() -> serde_json::Value {
    serde_json::Value::String("https://w3id.org/did/v1".to_string())
}

/// Capability bitset of a verification method, bit-compatible with the
/// on-chain program's flag layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationMethodFlags(u16);

impl VerificationMethodFlags {
    pub const NONE: Self = Self(0);
    pub const AUTHENTICATION: Self = Self(1 << 0);
    pub const ASSERTION: Self = Self(1 << 1);
    pub const KEY_AGREEMENT: Self = Self(1 << 2);
    pub const CAPABILITY_INVOCATION: Self = Self(1 << 3);
    pub const CAPABILITY_DELEGATION: Self = Self(1 << 4);
    pub const DID_DOC_HIDDEN: Self = Self(1 << 5);
    /// The key holder has cryptographically attested control of this key
    pub const OWNERSHIP_PROOF: Self = Self(1 << 6);
    pub const PROTECTED: Self = Self(1 << 7);

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn has(&self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for VerificationMethodFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Key type of a verification method, named as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethodType {
    Ed25519VerificationKey2018,
    EcdsaSecp256k1RecoveryMethod2020,
    EcdsaSecp256k1VerificationKey2019,
}

/// A key entry of a DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Fully qualified identifier, `<did>#<fragment>`
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: VerificationMethodType,
    /// DID controlling this entry
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,
    #[serde(default, skip_serializing_if = "VerificationMethodFlags::is_empty")]
    pub flags: VerificationMethodFlags,
}

impl VerificationMethod {
    pub fn fragment(&self) -> MirrorResult<&str> {
        parse_fragment(&self.id)
    }

    /// Serialized key material, shaped by the method type. `None` when the
    /// type carries no comparable key string.
    pub fn key_string(&self) -> Option<&str> {
        match self.method_type {
            VerificationMethodType::Ed25519VerificationKey2018 => {
                self.public_key_base58.as_deref()
            }
            VerificationMethodType::EcdsaSecp256k1RecoveryMethod2020 => {
                self.ethereum_address.as_deref()
            }
            VerificationMethodType::EcdsaSecp256k1VerificationKey2019 => None,
        }
    }
}

/// A named URI entry of a DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    /// Fully qualified identifier, `<did>#<fragment>`
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceEndpoint {
    pub fn fragment(&self) -> MirrorResult<&str> {
        parse_fragment(&self.id)
    }
}

/// A single editable node of a resolved document
///
/// Verification methods carry a `controller` attribute and service endpoints
/// do not; the untagged deserializer keys off that, so a generic
/// document-edit event can be mapped to the right removal operation without
/// probing raw JSON shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DocumentEntry {
    VerificationMethod(VerificationMethod),
    Service(ServiceEndpoint),
}

impl DocumentEntry {
    pub fn is_verification_method(&self) -> bool {
        matches!(self, DocumentEntry::VerificationMethod(_))
    }

    pub fn id(&self) -> &str {
        match self {
            DocumentEntry::VerificationMethod(vm) => &vm.id,
            DocumentEntry::Service(service) => &service.id,
        }
    }
}

/// A resolved DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default = "default_context")]
    pub context: serde_json::Value,
    pub id: String,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub service: Vec<ServiceEndpoint>,
}

impl Default for DidDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl DidDocument {
    /// The fixed default document, used whenever no DID is known or the DID
    /// is unresolved: empty verification-method and service sets.
    pub fn empty() -> Self {
        Self {
            context: default_context(),
            id: String::new(),
            verification_method: Vec::new(),
            service: Vec::new(),
        }
    }

    /// Enforce the no-duplicate-fragment invariant within each entry set.
    /// Entries without a `#` segment are compared by their whole identifier.
    pub fn validate(&self) -> MirrorResult<()> {
        let mut seen = HashSet::new();
        for vm in &self.verification_method {
            let fragment = parse_fragment(&vm.id).unwrap_or(&vm.id);
            if !seen.insert(fragment) {
                return Err(MirrorError::Resolution(format!(
                    "duplicate verification method fragment: {}",
                    fragment
                )));
            }
        }

        let mut seen = HashSet::new();
        for service in &self.service {
            let fragment = parse_fragment(&service.id).unwrap_or(&service.id);
            if !seen.insert(fragment) {
                return Err(MirrorError::Resolution(format!(
                    "duplicate service fragment: {}",
                    fragment
                )));
            }
        }

        Ok(())
    }

    /// Find a verification method by its fragment
    pub fn find_verification_method(&self, fragment: &str) -> Option<&VerificationMethod> {
        self.verification_method
            .iter()
            .find(|vm| parse_fragment(&vm.id).is_ok_and(|f| f == fragment))
    }

    /// Find the verification method whose key material serializes to `key_str`
    pub fn verification_method_for_key(&self, key_str: &str) -> Option<&VerificationMethod> {
        self.verification_method
            .iter()
            .find(|vm| vm.key_string() == Some(key_str))
    }

    /// Endpoint URI of the first profile-picture service, if any
    pub fn profile_picture(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.service_type == PFP_SERVICE_TYPE)
            .map(|s| s.service_endpoint.as_str())
    }
}
