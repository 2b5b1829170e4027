use std::fmt;

use super::PkginfoRecord;

/// Conditions under which a pkginfo is installable on a client.
///
/// List-valued fields are sorted on construction so that equality does not
/// depend on the order an author happened to write them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constraints {
    pub minimum_os_version: Option<String>,
    pub maximum_os_version: Option<String>,
    pub supported_architectures: Vec<String>,
    pub installable_condition: Option<String>,
}

impl Constraints {
    pub fn new(
        minimum_os_version: Option<String>,
        maximum_os_version: Option<String>,
        mut supported_architectures: Vec<String>,
        installable_condition: Option<String>,
    ) -> Self {
        supported_architectures.sort();
        supported_architectures.dedup();
        Self {
            minimum_os_version,
            maximum_os_version,
            supported_architectures,
            installable_condition,
        }
    }
}

/// Identity of a variant line: pkginfos that share a signature are versions
/// of the same thing and are retention-managed together.
///
/// Receipts only take part when the item is removed with `removepackages`,
/// since they then determine what an uninstall touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantSignature {
    pub name: String,
    pub catalogs: Vec<String>,
    pub constraints: Constraints,
    pub receipts: Vec<String>,
}

impl VariantSignature {
    pub fn of(record: &PkginfoRecord) -> Self {
        let mut catalogs = record.catalogs.clone();
        catalogs.sort();
        catalogs.dedup();

        let mut receipts = if record.uses_removepackages() {
            record.receipts.clone()
        } else {
            Vec::new()
        };
        receipts.sort();
        receipts.dedup();

        Self {
            name: record.name.clone(),
            catalogs,
            constraints: record.constraints.clone(),
            receipts,
        }
    }
}

impl fmt::Display for VariantSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.catalogs.join(", "))?;
        let c = &self.constraints;
        if let Some(min) = &c.minimum_os_version {
            write!(f, " minimum_os_version={min}")?;
        }
        if let Some(max) = &c.maximum_os_version {
            write!(f, " maximum_os_version={max}")?;
        }
        if !c.supported_architectures.is_empty() {
            write!(
                f,
                " supported_architectures={}",
                c.supported_architectures.join(",")
            )?;
        }
        if let Some(condition) = &c.installable_condition {
            write!(f, " installable_condition=\"{condition}\"")?;
        }
        if !self.receipts.is_empty() {
            write!(f, " receipts={}", self.receipts.join(","))?;
        }
        Ok(())
    }
}
