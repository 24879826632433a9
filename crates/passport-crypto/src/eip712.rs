//! Minimal EIP-712 typed-data hashing for credential documents.
//!
//! Supports the member types credentials need: `string`, `string[]` and
//! nested structs.

use std::collections::BTreeMap;

use crate::hashing::{keccak256, Hash};

/// A member value of a typed struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    String(String),
    StringArray(Vec<String>),
    Struct(TypedStruct),
}

impl TypedValue {
    fn type_name(&self) -> &str {
        match self {
            Self::String(_) => "string",
            Self::StringArray(_) => "string[]",
            Self::Struct(s) => &s.name,
        }
    }
}

/// An EIP-712 struct: a type name plus ordered members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedStruct {
    pub name: String,
    pub members: Vec<(String, TypedValue)>,
}

impl TypedStruct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Append a `string` member.
    pub fn string(mut self, member: impl Into<String>, value: impl Into<String>) -> Self {
        self.members
            .push((member.into(), TypedValue::String(value.into())));
        self
    }

    /// Append a `string` member only when `value` is present. Absent
    /// members are left out of the type, so `None` and `Some("")` hash
    /// differently.
    pub fn optional_string(self, member: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.string(member, v),
            None => self,
        }
    }

    /// Append a `string[]` member.
    pub fn string_array<I, S>(mut self, member: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.members
            .push((member.into(), TypedValue::StringArray(values)));
        self
    }

    /// Append a nested struct member.
    pub fn nested(mut self, member: impl Into<String>, value: TypedStruct) -> Self {
        self.members.push((member.into(), TypedValue::Struct(value)));
        self
    }

    fn own_type(&self) -> String {
        let members: Vec<String> = self
            .members
            .iter()
            .map(|(name, value)| format!("{} {}", value.type_name(), name))
            .collect();
        format!("{}({})", self.name, members.join(","))
    }

    fn collect_dependencies(&self, out: &mut BTreeMap<String, String>) {
        for (_, value) in &self.members {
            if let TypedValue::Struct(inner) = value {
                out.entry(inner.name.clone())
                    .or_insert_with(|| inner.own_type());
                inner.collect_dependencies(out);
            }
        }
    }

    /// `encodeType`: the primary type followed by referenced types sorted
    /// by name.
    pub fn encode_type(&self) -> String {
        let mut deps = BTreeMap::new();
        self.collect_dependencies(&mut deps);
        deps.remove(&self.name);
        let mut out = self.own_type();
        for dep in deps.values() {
            out.push_str(dep);
        }
        out
    }

    pub fn type_hash(&self) -> Hash {
        keccak256(self.encode_type().as_bytes())
    }

    /// `hashStruct`: keccak256(typeHash || encodeData).
    pub fn hash_struct(&self) -> Hash {
        let mut data = Vec::with_capacity(32 * (self.members.len() + 1));
        data.extend_from_slice(&self.type_hash());
        for (_, value) in &self.members {
            let encoded = match value {
                TypedValue::String(s) => keccak256(s.as_bytes()),
                TypedValue::StringArray(items) => {
                    let mut concat = Vec::with_capacity(32 * items.len());
                    for item in items {
                        concat.extend_from_slice(&keccak256(item.as_bytes()));
                    }
                    keccak256(&concat)
                }
                TypedValue::Struct(inner) => inner.hash_struct(),
            };
            data.extend_from_slice(&encoded);
        }
        keccak256(&data)
    }
}

/// The EIP-712 signing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

impl Eip712Domain {
    const TYPE: &'static str = "EIP712Domain(string name,string version,uint256 chainId)";

    pub fn new(name: impl Into<String>, version: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
        }
    }

    pub fn separator(&self) -> Hash {
        let mut chain_id = [0u8; 32];
        chain_id[24..].copy_from_slice(&self.chain_id.to_be_bytes());

        let mut data = Vec::with_capacity(32 * 4);
        data.extend_from_slice(&keccak256(Self::TYPE.as_bytes()));
        data.extend_from_slice(&keccak256(self.name.as_bytes()));
        data.extend_from_slice(&keccak256(self.version.as_bytes()));
        data.extend_from_slice(&chain_id);
        keccak256(&data)
    }

    /// The digest a wallet signs: keccak256(0x19 0x01 || domainSeparator || hashStruct(message)).
    pub fn typed_data_hash(&self, message: &TypedStruct) -> Hash {
        let mut data = Vec::with_capacity(2 + 64);
        data.extend_from_slice(&[0x19, 0x01]);
        data.extend_from_slice(&self.separator());
        data.extend_from_slice(&message.hash_struct());
        keccak256(&data)
    }
}
