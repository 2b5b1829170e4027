//! Builders for repository fixtures used by unit tests.

use plist::{Dictionary, Value};

use crate::repo::MemoryRepo;

fn strings(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect())
}

fn to_xml(dict: &Dictionary) -> Vec<u8> {
    let mut buffer = Vec::new();
    plist::to_writer_xml(&mut buffer, dict).expect("fixture should serialize");
    buffer
}

/// A pkginfo document under construction.
#[derive(Clone)]
pub(crate) struct PkginfoDoc {
    dict: Dictionary,
}

impl PkginfoDoc {
    /// A pkginfo in the `testing` catalog.
    pub(crate) fn new(name: &str, version: &str) -> Self {
        let mut dict = Dictionary::new();
        dict.insert("name".to_string(), Value::String(name.to_string()));
        dict.insert("version".to_string(), Value::String(version.to_string()));
        dict.insert("catalogs".to_string(), strings(&["testing"]));
        Self { dict }
    }

    pub(crate) fn catalogs(self, catalogs: &[&str]) -> Self {
        self.set("catalogs", strings(catalogs))
    }

    pub(crate) fn installer(self, location: &str, size_kib: u64) -> Self {
        self.set(
            "installer_item_location",
            Value::String(location.to_string()),
        )
        .set("installer_item_size", Value::Integer(size_kib.into()))
    }

    pub(crate) fn uninstaller(self, location: &str, size_kib: u64) -> Self {
        self.set(
            "uninstaller_item_location",
            Value::String(location.to_string()),
        )
        .set("uninstaller_item_size", Value::Integer(size_kib.into()))
    }

    pub(crate) fn requires(self, items: &[&str]) -> Self {
        self.set("requires", strings(items))
    }

    pub(crate) fn update_for(self, items: &[&str]) -> Self {
        self.set("update_for", strings(items))
    }

    pub(crate) fn architectures(self, archs: &[&str]) -> Self {
        self.set("supported_architectures", strings(archs))
    }

    pub(crate) fn set(mut self, key: &str, value: Value) -> Self {
        self.dict.insert(key.to_string(), value);
        self
    }

    pub(crate) fn without(mut self, key: &str) -> Self {
        self.dict.remove(key);
        self
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        to_xml(&self.dict)
    }
}

/// A manifest document under construction.
#[derive(Clone, Default)]
pub(crate) struct ManifestDoc {
    dict: Dictionary,
}

impl ManifestDoc {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn list(mut self, key: &str, items: &[&str]) -> Self {
        self.dict.insert(key.to_string(), strings(items));
        self
    }

    pub(crate) fn conditional(mut self, condition: &str, nested: ManifestDoc) -> Self {
        let mut item = nested.dict;
        item.insert("condition".to_string(), Value::String(condition.to_string()));
        if !self.dict.contains_key("conditional_items") {
            self.dict
                .insert("conditional_items".to_string(), Value::Array(Vec::new()));
        }
        if let Some(Value::Array(items)) = self.dict.get_mut("conditional_items") {
            items.push(Value::Dictionary(item));
        }
        self
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        to_xml(&self.dict)
    }
}

/// Store a pkginfo at `pkgsinfo/<relative>`.
pub(crate) fn add_pkginfo(repo: &MemoryRepo, relative: &str, doc: &PkginfoDoc) {
    repo.insert(format!("pkgsinfo/{relative}"), doc.to_bytes());
}

/// Store a manifest at `manifests/<name>`.
pub(crate) fn add_manifest(repo: &MemoryRepo, name: &str, doc: &ManifestDoc) {
    repo.insert(format!("manifests/{name}"), doc.to_bytes());
}

/// Store an installer blob at `pkgs/<relative>`.
pub(crate) fn add_pkg(repo: &MemoryRepo, relative: &str) {
    repo.insert(format!("pkgs/{relative}"), b"payload".to_vec());
}
