use std::fmt;

use itertools::Itertools;

use super::CodegenError;

/// Key/value pairs every attribute set starts with.
const DEFAULT_PAIRS: [(&str, &str); 6] = [
    ("stack-protector-buffer-size", "8"),
    ("frame-pointer", "all"),
    ("no-trapping-math", "true"),
    ("target-cpu", "x86-64"),
    ("target-features", "+cmov,+cx8,+fxsr,+mmx,+sse,+sse2,+x87"),
    ("tune-cpu", "generic"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeId(pub usize);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A function attribute set. It only gets its index once an [`AttributePool`] registers it.
#[derive(Clone, Debug)]
pub struct Attribute {
    index: Option<AttributeId>,
    flags: Vec<&'static str>,
    pairs: Vec<(String, String)>,
}

impl Attribute {
    /// An attribute set with only the default pairs.
    pub fn new() -> Self {
        Self::with(&[], &[])
    }

    /// `pairs` come first, followed by a fresh copy of the defaults.
    pub fn with(flags: &[&'static str], pairs: &[(&str, &str)]) -> Self {
        let mut pairs: Vec<_> = pairs.iter().map(owned_pair).collect();
        pairs.extend(DEFAULT_PAIRS.iter().map(owned_pair));
        Self {
            index: None,
            flags: flags.to_vec(),
            pairs,
        }
    }

    /// The `attributes #N = { ... }` line. Fails if the set was never registered.
    pub fn definition(&self) -> Result<AttributeDefinition<'_>, CodegenError> {
        self.index
            .map(|index| AttributeDefinition {
                index,
                attribute: self,
            })
            .ok_or(CodegenError::UnindexedAttribute)
    }

    fn same_contents(&self, other: &Self) -> bool {
        self.flags == other.flags && self.pairs == other.pairs
    }
}

fn owned_pair(&(key, value): &(&str, &str)) -> (String, String) {
    (key.to_string(), value.to_string())
}

impl Default for Attribute {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AttributeDefinition<'a> {
    index: AttributeId,
    attribute: &'a Attribute,
}

impl fmt::Display for AttributeDefinition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self
            .attribute
            .pairs
            .iter()
            .map(|(key, value)| format!("\"{key}\"=\"{value}\""));
        let contents = self
            .attribute
            .flags
            .iter()
            .map(|x| x.to_string())
            .chain(pairs)
            .join(" ");
        write!(f, "attributes {} = {{ {} }}", self.index, contents)
    }
}

/// Hands out indices in registration order.
#[derive(Debug, Default)]
pub struct AttributePool {
    attributes: Vec<Attribute>,
}

impl AttributePool {
    pub fn register(&mut self, mut attribute: Attribute) -> AttributeId {
        if let Some(existing) = self
            .attributes
            .iter()
            .find(|it| it.same_contents(&attribute))
        {
            if let Some(index) = existing.index {
                return index;
            }
        }
        let index = AttributeId(self.attributes.len());
        attribute.index = Some(index);
        self.attributes.push(attribute);
        index
    }
    pub fn len(&self) -> usize {
        self.attributes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }
}
