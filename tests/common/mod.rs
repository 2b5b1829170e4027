use std::path::Path;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use munki_repo::cli::{Cli, Commands};
use munki_repo::clean::Confirm;
use munki_repo::commands::execute_with;
use munki_repo::error::Result;
use munki_repo::repo::FileRepo;
use plist::{Dictionary, Value};

fn strings(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect())
}

fn to_xml(dict: &Dictionary) -> Vec<u8> {
    let mut buffer = Vec::new();
    plist::to_writer_xml(&mut buffer, dict).expect("fixture should serialize");
    buffer
}

/// A Munki repository laid out in a temporary directory.
pub struct RepoFixture {
    dir: TempDir,
}

impl RepoFixture {
    /// An empty repository with the standard top-level directories.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary repository");
        for kind in ["pkgsinfo", "manifests", "pkgs", "catalogs"] {
            dir.child(kind)
                .create_dir_all()
                .expect("failed to create repository directory");
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn child(&self, relative: impl AsRef<Path>) -> assert_fs::fixture::ChildPath {
        self.dir.child(relative)
    }

    /// Add a pkginfo whose installer item lives at `pkgs/<installer>`, and
    /// the installer item itself.
    pub fn add_item(&self, name: &str, version: &str, catalogs: &[&str], installer: &str) {
        self.add_pkginfo(
            &format!("{name}-{version}.plist"),
            pkginfo(name, version, catalogs)
                .set("installer_item_location", Value::String(installer.into()))
                .set("installer_item_size", Value::Integer(4u64.into())),
        );
        self.add_pkg(installer);
    }

    pub fn add_pkginfo(&self, relative: &str, doc: PkginfoDoc) {
        self.dir
            .child(format!("pkgsinfo/{relative}"))
            .write_binary(&to_xml(&doc.0))
            .expect("failed to write pkginfo");
    }

    pub fn add_pkg(&self, relative: &str) {
        self.dir
            .child(format!("pkgs/{relative}"))
            .write_binary(&[0u8; 4096])
            .expect("failed to write pkg");
    }

    /// Add a manifest listing `items` under `managed_installs`.
    pub fn add_manifest(&self, name: &str, items: &[&str]) {
        let mut dict = Dictionary::new();
        dict.insert("managed_installs".to_string(), strings(items));
        dict.insert("catalogs".to_string(), strings(&["production"]));
        self.dir
            .child(format!("manifests/{name}"))
            .write_binary(&to_xml(&dict))
            .expect("failed to write manifest");
    }

    /// Run a command against this repository.
    pub fn run(&self, command: Commands, confirm: &mut dyn Confirm) -> Result<()> {
        let cli = Cli::builder().quiet(true).jobs(2).command(command).build()?;
        let repo = FileRepo::open(self.path())?;
        execute_with(&cli, &repo, confirm)
    }

    /// Read back a catalog as a list of (name, version) pairs.
    pub fn catalog(&self, name: &str) -> Vec<(String, String)> {
        let path = self.path().join("catalogs").join(name);
        let entries: Vec<Dictionary> = plist::from_file(path).expect("catalog should parse");
        entries
            .iter()
            .map(|entry| {
                let field = |key: &str| {
                    entry
                        .get(key)
                        .and_then(Value::as_string)
                        .unwrap_or_default()
                        .to_string()
                };
                (field("name"), field("version"))
            })
            .collect()
    }
}

/// A pkginfo document under construction.
pub struct PkginfoDoc(Dictionary);

impl PkginfoDoc {
    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn strings(self, key: &str, values: &[&str]) -> Self {
        self.set(key, strings(values))
    }
}

pub fn pkginfo(name: &str, version: &str, catalogs: &[&str]) -> PkginfoDoc {
    let mut dict = Dictionary::new();
    dict.insert("name".to_string(), Value::String(name.to_string()));
    dict.insert("version".to_string(), Value::String(version.to_string()));
    dict.insert("catalogs".to_string(), strings(catalogs));
    PkginfoDoc(dict)
}

pub fn repoclean(keep: usize, auto: bool, dry_run: bool) -> Commands {
    Commands::Repoclean {
        keep,
        show_all: false,
        auto,
        dry_run,
        repo_path: None,
    }
}

pub fn makecatalogs(force: bool) -> Commands {
    Commands::Makecatalogs {
        force,
        skip_pkg_check: false,
        yaml: false,
        repo_path: None,
    }
}
