use std::fmt;

/// Qualified identity of a rule in a loaded catalog.
///
/// Identity is by value: two ids with the same package and name refer to the
/// same rule no matter which session reported them. The engine catalog
/// supplies these; collectors never mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId {
    package: String,
    name: String,
}

impl RuleId {
    /// Create an identity from a package and a rule name.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        RuleId {
            package: package.into(),
            name: name.into(),
        }
    }

    /// The synthetic identity that stands in as "causing rule" before any
    /// real rule has fired in a session.
    #[must_use]
    pub fn root() -> Self {
        RuleId {
            package: String::new(),
            name: "root".to_owned(),
        }
    }

    /// Reserved identity used as a fixed branch label inside the activation
    /// tree. Never part of a catalog.
    pub(crate) fn branch(label: &str) -> Self {
        RuleId {
            package: String::new(),
            name: label.to_owned(),
        }
    }

    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `package.name`, the form used in not-executed listings.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// Opaque identifier the engine assigns to one pending activation.
///
/// Only ever used as a map key; the tracker attaches no meaning to the value
/// beyond uniqueness within a session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationId(pub u64);

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
