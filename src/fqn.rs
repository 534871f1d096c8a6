/// Fully-qualified BNS names: `name.namespace` or `subdomain.name.namespace`
use crate::error::{ResolutionError, ResolveResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fqn {
    pub name: String,
    pub namespace: String,
    pub subdomain: Option<String>,
}

impl Fqn {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            subdomain: None,
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// The on-chain name this identity lives under, without any subdomain
    pub fn parent(&self) -> Fqn {
        Fqn::new(self.name.clone(), self.namespace.clone())
    }

    /// `name.namespace`, the form used in registry API paths
    pub fn name_with_namespace(&self) -> String {
        format!("{}.{}", self.name, self.namespace)
    }

    pub fn is_subdomain(&self) -> bool {
        self.subdomain.is_some()
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subdomain {
            Some(sub) => write!(f, "{}.{}.{}", sub, self.name, self.namespace),
            None => write!(f, "{}.{}", self.name, self.namespace),
        }
    }
}

impl FromStr for Fqn {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fqn(s)
    }
}

/// Decode a fully-qualified name
///
/// A single trailing `.` (absolute DNS form) is accepted and dropped.
pub fn parse_fqn(input: &str) -> ResolveResult<Fqn> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);

    let labels: Vec<&str> = trimmed.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return Err(ResolutionError::InvalidName(format!(
            "'{}' has an empty label",
            input
        )));
    }

    match labels.as_slice() {
        [name, namespace] => Ok(Fqn::new(*name, *namespace)),
        [subdomain, name, namespace] => Ok(Fqn::new(*name, *namespace).with_subdomain(*subdomain)),
        _ => Err(ResolutionError::InvalidName(format!(
            "'{}' must have two or three labels",
            input
        ))),
    }
}
