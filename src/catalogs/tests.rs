use plist::Value;

use super::*;
use crate::repo::{FileRepo, MemoryRepo};
use crate::testing::{PkginfoDoc, add_pkg, add_pkginfo};

fn quiet() -> Logger {
    Logger::new(0, true)
}

fn build(repo: &dyn Repo, options: CatalogOptions) -> CatalogReport {
    make_catalogs(repo, &options, &quiet()).unwrap()
}

fn catalog(repo: &dyn Repo, name: &str) -> Vec<Dictionary> {
    let data = repo.get(&Kind::Catalogs.identifier(name)).unwrap();
    plist::from_bytes(&data).unwrap()
}

fn names_in(entries: &[Dictionary]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}-{}",
                entry.get("name").and_then(Value::as_string).unwrap(),
                entry.get("version").and_then(Value::as_string).unwrap()
            )
        })
        .collect()
}

#[test]
fn test_builds_all_and_named_catalogs() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Foo-1.0.plist",
        &PkginfoDoc::new("Foo", "1.0")
            .catalogs(&["testing", "production"])
            .installer("Foo-1.0.dmg", 1),
    );
    add_pkginfo(
        &repo,
        "Bar-2.0.plist",
        &PkginfoDoc::new("Bar", "2.0").installer("Bar-2.0.dmg", 1),
    );
    add_pkg(&repo, "Foo-1.0.dmg");
    add_pkg(&repo, "Bar-2.0.dmg");

    let outcome = build(&repo, CatalogOptions::default());

    assert!(!outcome.has_errors());
    assert_eq!(outcome.catalogs.get("all"), Some(&2));
    assert_eq!(outcome.catalogs.get("testing"), Some(&2));
    assert_eq!(outcome.catalogs.get("production"), Some(&1));
    assert_eq!(names_in(&catalog(&repo, "all")), vec!["Bar-2.0", "Foo-1.0"]);
    assert_eq!(names_in(&catalog(&repo, "production")), vec!["Foo-1.0"]);
}

#[test]
fn test_missing_installer_is_an_error_unless_forced() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Foo-1.0.plist",
        &PkginfoDoc::new("Foo", "1.0").installer("Foo-1.0.dmg", 1),
    );
    add_pkginfo(
        &repo,
        "Gone-1.0.plist",
        &PkginfoDoc::new("Gone", "1.0").installer("Gone-1.0.dmg", 1),
    );
    add_pkg(&repo, "Foo-1.0.dmg");

    let outcome = build(&repo, CatalogOptions::default());
    assert_eq!(outcome.report.errors.len(), 1);
    match &outcome.report.errors[0] {
        MunkiError::PkginfoAccess { identifier, source } => {
            assert_eq!(identifier, "pkgsinfo/Gone-1.0.plist");
            assert!(matches!(
                source.as_ref(),
                MunkiError::MissingItem { role: "installer", .. }
            ));
        }
        other => panic!("expected pkginfo access error, got {other:?}"),
    }
    assert_eq!(names_in(&catalog(&repo, "testing")), vec!["Foo-1.0"]);

    let forced = build(&repo, CatalogOptions::builder().force(true).build());
    assert!(!forced.has_errors());
    assert!(
        forced
            .report
            .warnings
            .iter()
            .any(|w| w.contains("missing installer item: Gone-1.0.dmg"))
    );
    assert_eq!(
        names_in(&catalog(&repo, "testing")),
        vec!["Foo-1.0", "Gone-1.0"]
    );

    let skipped = build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());
    assert!(skipped.report.is_empty());
    assert_eq!(skipped.catalogs.get("testing"), Some(&2));
}

#[test]
fn test_items_without_payload_skip_verification() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Script-1.0.plist",
        &PkginfoDoc::new("Script", "1.0")
            .set("installer_type", Value::String("nopkg".to_string())),
    );
    add_pkginfo(
        &repo,
        "Remote-1.0.plist",
        &PkginfoDoc::new("Remote", "1.0").set(
            "PackageCompleteURL",
            Value::String("https://cdn.example.com/Remote.pkg".to_string()),
        ),
    );
    add_pkginfo(&repo, "Bare-1.0.plist", &PkginfoDoc::new("Bare", "1.0"));

    let outcome = build(&repo, CatalogOptions::default());

    assert_eq!(outcome.report.errors.len(), 1);
    assert!(
        outcome.report.errors[0]
            .chain_message()
            .contains("is missing installer_item_location")
    );
    assert_eq!(
        names_in(&catalog(&repo, "all")),
        vec!["Remote-1.0", "Script-1.0"]
    );
}

#[test]
fn test_uninstaller_checks() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Adobe-1.0.plist",
        &PkginfoDoc::new("Adobe", "1.0")
            .installer("Adobe.dmg", 1)
            .set(
                "uninstall_method",
                Value::String("AdobeCCPUninstaller".to_string()),
            ),
    );
    add_pkginfo(
        &repo,
        "Tool-1.0.plist",
        &PkginfoDoc::new("Tool", "1.0")
            .installer("Tool.dmg", 1)
            .uninstaller("tool-uninstall.PKG", 1),
    );
    add_pkg(&repo, "Adobe.dmg");
    add_pkg(&repo, "Tool.dmg");
    add_pkg(&repo, "Tool-Uninstall.pkg");

    let outcome = build(&repo, CatalogOptions::default());

    assert_eq!(outcome.report.errors.len(), 1);
    assert!(
        outcome.report.errors[0]
            .chain_message()
            .contains("is missing uninstaller_item_location")
    );
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.warnings[0].contains("different case: Tool-Uninstall.pkg"));
    assert_eq!(names_in(&catalog(&repo, "testing")), vec!["Tool-1.0"]);
}

#[test]
fn test_duplicates_are_errors_but_architecture_splits_are_not() {
    let repo = MemoryRepo::new();
    for (file, arch) in [("a", "x86_64"), ("b", "arm64"), ("c", "x86_64")] {
        add_pkginfo(
            &repo,
            &format!("{file}/Bar-2.0.plist"),
            &PkginfoDoc::new("Bar", "2.0").architectures(&[arch]),
        );
    }

    let outcome = build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());

    assert_eq!(outcome.report.errors.len(), 1);
    match &outcome.report.errors[0] {
        MunkiError::DuplicateItem {
            catalog,
            first,
            second,
            ..
        } => {
            assert_eq!(catalog, "testing");
            assert_eq!(first, "pkgsinfo/a/Bar-2.0.plist");
            assert_eq!(second, "pkgsinfo/c/Bar-2.0.plist");
        }
        other => panic!("expected duplicate error, got {other:?}"),
    }
    assert_eq!(outcome.catalogs.get("testing"), Some(&2));
    assert_eq!(outcome.catalogs.get("all"), Some(&3));
}

#[test]
fn test_entries_drop_notes_and_private_keys() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Foo-1.0.plist",
        &PkginfoDoc::new("Foo", "1.0")
            .set("notes", Value::String("internal only".to_string()))
            .set("_metadata", Value::Dictionary(Dictionary::new()))
            .set("description", Value::String("A tool".to_string())),
    );

    build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());

    let entries = catalog(&repo, "testing");
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].contains_key("notes"));
    assert!(!entries[0].contains_key("_metadata"));
    assert_eq!(
        entries[0].get("description").and_then(Value::as_string),
        Some("A tool")
    );
}

#[test]
fn test_catalog_warnings_and_stale_catalogs() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Foo-1.0.plist",
        &PkginfoDoc::new("Foo", "1.0").catalogs(&["Testing", "testing", ""]),
    );
    repo.insert("catalogs/retired", b"old".to_vec());

    let outcome = build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());

    assert!(!outcome.has_errors());
    assert_eq!(outcome.stale_removed, vec!["retired"]);
    assert!(!repo.contains("catalogs/retired"));
    assert!(
        outcome
            .report
            .warnings
            .iter()
            .any(|w| w.contains("empty catalog name"))
    );
    assert!(
        outcome
            .report
            .warnings
            .iter()
            .any(|w| w.contains("differ only by case") && w.contains("Testing, testing"))
    );
}

#[test]
fn test_unreadable_and_invalid_pkginfo_are_reported() {
    let repo = MemoryRepo::new();
    add_pkginfo(&repo, "Foo-1.0.plist", &PkginfoDoc::new("Foo", "1.0"));
    add_pkginfo(&repo, "Locked-1.0.plist", &PkginfoDoc::new("Locked", "1.0"));
    repo.fail_on("pkgsinfo/Locked-1.0.plist");
    add_pkginfo(
        &repo,
        "Nameless.plist",
        &PkginfoDoc::new("x", "1.0").without("name"),
    );

    let outcome = build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());

    assert_eq!(outcome.report.errors.len(), 2);
    assert!(matches!(
        outcome.report.errors[0],
        MunkiError::PkginfoAccess { .. }
    ));
    assert!(matches!(
        outcome.report.errors[1],
        MunkiError::MissingRequiredField { field: "name", .. }
    ));
    assert_eq!(outcome.catalogs.get("testing"), Some(&1));
}

#[test]
fn test_write_failure_is_reported_per_catalog() {
    let repo = MemoryRepo::new();
    add_pkginfo(
        &repo,
        "Foo-1.0.plist",
        &PkginfoDoc::new("Foo", "1.0").catalogs(&["testing", "production"]),
    );
    repo.fail_on("catalogs/production");

    let outcome = build(&repo, CatalogOptions::builder().skip_pkg_check(true).build());

    assert_eq!(outcome.report.errors.len(), 1);
    assert!(matches!(
        &outcome.report.errors[0],
        MunkiError::CatalogWrite { name, .. } if name == "production"
    ));
    assert!(repo.contains("catalogs/testing"));
    assert!(repo.contains("catalogs/all"));
}

#[test]
fn test_icons_are_hashed() {
    let repo = MemoryRepo::new();
    repo.insert("icons/Foo.png", b"abc".to_vec());
    repo.insert("icons/_icon_hashes.plist", b"stale".to_vec());

    let outcome = build(&repo, CatalogOptions::default());

    assert_eq!(outcome.icons_hashed, 1);
    let data = repo.get("icons/_icon_hashes.plist").unwrap();
    let hashes: BTreeMap<String, String> = plist::from_bytes(&data).unwrap();
    assert_eq!(
        hashes.get("Foo.png").map(String::as_str),
        Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
    assert_eq!(hashes.len(), 1);
}

#[test]
fn test_rebuild_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileRepo::open(dir.path()).unwrap();
    for (name, version) in [("Foo", "1.0"), ("Foo", "1.1"), ("Bar", "3.0")] {
        add_file_pkginfo(&repo, name, version);
    }

    build(&repo, CatalogOptions::default());
    let first = (repo.get("catalogs/all").unwrap(), repo.get("catalogs/testing").unwrap());
    build(&repo, CatalogOptions::default());
    let second = (repo.get("catalogs/all").unwrap(), repo.get("catalogs/testing").unwrap());

    assert_eq!(first, second);
}

#[test]
fn test_yaml_catalogs() {
    let repo = MemoryRepo::new();
    add_pkginfo(&repo, "Foo-1.0.plist", &PkginfoDoc::new("Foo", "1.0"));

    build(
        &repo,
        CatalogOptions::builder()
            .skip_pkg_check(true)
            .format(MetadataFormat::Yaml)
            .build(),
    );

    let data = repo.get("catalogs/testing").unwrap();
    let entries: Vec<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_slice(&data).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].get("name").and_then(serde_yaml::Value::as_str),
        Some("Foo")
    );
}

fn add_file_pkginfo(repo: &FileRepo, name: &str, version: &str) {
    let dmg = format!("{name}-{version}.dmg");
    let doc = PkginfoDoc::new(name, version).installer(&dmg, 4);
    repo.put(&format!("pkgsinfo/{name}-{version}.plist"), &doc.to_bytes())
        .unwrap();
    repo.put(&format!("pkgs/{dmg}"), b"payload").unwrap();
}
