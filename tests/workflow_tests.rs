// SPDX-License-Identifier: PMPL-1.0-or-later

//! Extract -> translate -> publish, the way a site is localized in practice

use site_localize::localize::{extract_tree, ExtractOptions, WriteMode};
use site_localize::report::ReportOutputFormat;
use site_localize::table::{IdentifierRow, IdentifierTable, TranslationTable};
use site_localize::{Destination, Job, LocalizeConfig, Localizer, RunReport, SegmentRule};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<title>Home</title><h1>Welcome</h1><p><a href=\"About.html\">About</a></p>",
    )
    .unwrap();
    fs::write(dir.path().join("About.html"), "<h1>About</h1>").unwrap();
    dir
}

#[test]
fn test_extracted_table_drives_a_translated_copy() {
    let site = site();
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = LocalizeConfig {
        unresolved_path: data.path().join("missing.csv"),
        ..LocalizeConfig::default()
    };

    let mut options = ExtractOptions::from_config(&config, data.path());
    options.languages = vec!["fr".to_string()];
    let summary = extract_tree(&config, site.path(), true, &options).expect("extract should succeed");
    assert_eq!(summary.pages, 2);
    assert_eq!(
        fs::read_to_string(&summary.short_path).unwrap(),
        "en,fr\nAbout,\nHome,\nWelcome,\nindex,\n"
    );

    // Nothing new on a second pass
    options.mode = WriteMode::Append;
    let again = extract_tree(&config, site.path(), true, &options).unwrap();
    assert_eq!(again.short_written, 0);
    assert_eq!(again.long_written, 0);

    // A translator fills in the French column
    fs::write(
        &summary.short_path,
        "en,fr\nAbout,À propos\nHome,Accueil\nWelcome,Bienvenue\nindex,\n",
    )
    .unwrap();
    let table = TranslationTable::load_for_language(data.path(), "en", "fr").unwrap();
    assert_eq!(table.len(), 3);

    let target = out.path().join("fr");
    let report = Localizer::new(config)
        .run(
            &Job::new(site.path())
                .translate_content(&table)
                .rename(SegmentRule::Translate(&table))
                .destination(Destination::Copy(target.clone())),
        )
        .expect("run should succeed");

    assert_eq!(
        fs::read_to_string(target.join("index.html")).unwrap(),
        "<title>Accueil</title><h1>Bienvenue</h1><p><a href=\"À propos.html\">À propos</a></p>"
    );
    assert_eq!(
        fs::read_to_string(target.join("À propos.html")).unwrap(),
        "<h1>À propos</h1>"
    );
    assert!(report.missing_segments.contains("index"));
    assert!(report.missing_text.is_empty());

    let json = ReportOutputFormat::Json.serialize(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["statistics"]["files_renamed"], 1);
    assert_eq!(value["rename_mode"], "translate");
    assert_eq!(value["moves"][0]["status"], "planned");
}

#[test]
fn test_missing_language_is_structural() {
    let data = TempDir::new().unwrap();
    fs::write(data.path().join("translations.csv"), "en,fr\nHome,Accueil\n").unwrap();
    assert!(TranslationTable::load_for_language(data.path(), "en", "de").is_err());
}

fn concepts() -> IdentifierTable {
    IdentifierTable::from_rows(
        "en",
        [
            IdentifierRow::new("Q90".parse().unwrap()).with_label("en", "Paris"),
            IdentifierRow::new("Q142".parse().unwrap()).with_label("en", "France"),
        ],
    )
}

fn to_identifiers(site: &Path, data: &TempDir, recursive: bool, destination: Destination) -> RunReport {
    let table = concepts();
    let config = LocalizeConfig {
        unresolved_path: data.path().join("missing.csv"),
        ..LocalizeConfig::default()
    };
    Localizer::new(config)
        .run(
            &Job::new(site)
                .recursive(recursive)
                .rename(SegmentRule::LabelToIdentifier(&table))
                .destination(destination),
        )
        .expect("run should succeed")
}

#[test]
fn test_in_place_collision_keeps_links_to_the_unmoved_page() {
    let site = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let index = "<p><a href=\"Paris.html\">Paris</a></p>";
    fs::write(site.path().join("index.html"), index).unwrap();
    fs::write(site.path().join("Paris.html"), "<p>label page</p>").unwrap();
    fs::write(site.path().join("Q90.html"), "<p>identifier page</p>").unwrap();

    let report = to_identifiers(site.path(), &data, false, Destination::InPlace);

    assert_eq!(report.statistics.collisions, 1);
    assert_eq!(report.statistics.pages_changed, 0);
    assert_eq!(fs::read_to_string(site.path().join("index.html")).unwrap(), index);
    assert_eq!(
        fs::read_to_string(site.path().join("Paris.html")).unwrap(),
        "<p>label page</p>"
    );
    assert_eq!(
        fs::read_to_string(site.path().join("Q90.html")).unwrap(),
        "<p>identifier page</p>"
    );
}

#[test]
fn test_copy_collision_keeps_both_pages() {
    let site = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let index = "<p><a href=\"Paris.html\">Paris</a> <a href=\"Q90.html\">Q90</a></p>";
    fs::write(site.path().join("index.html"), index).unwrap();
    fs::write(site.path().join("Paris.html"), "<p>label page</p>").unwrap();
    fs::write(site.path().join("Q90.html"), "<p>identifier page</p>").unwrap();
    let target = out.path().join("ids");

    let report = to_identifiers(site.path(), &data, false, Destination::Copy(target.clone()));

    assert_eq!(report.statistics.collisions, 1);
    assert_eq!(report.statistics.files_renamed, 0);
    assert_eq!(
        fs::read_to_string(target.join("Q90.html")).unwrap(),
        "<p>identifier page</p>"
    );
    assert_eq!(
        fs::read_to_string(target.join("Paris.html")).unwrap(),
        "<p>label page</p>"
    );
    assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), index);
    let collision = report.collisions().next().unwrap();
    assert_eq!(collision.to, target.join("Paris.html"));
}

#[test]
fn test_shallow_run_links_only_follow_renamed_entries() {
    let site = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fs::write(
        site.path().join("index.html"),
        "<p><a href=\"France/Paris.html\">Paris</a></p>",
    )
    .unwrap();
    fs::create_dir(site.path().join("France")).unwrap();
    fs::write(site.path().join("France/Paris.html"), "<p>Paris</p>").unwrap();

    let report = to_identifiers(site.path(), &data, false, Destination::InPlace);

    assert_eq!(report.statistics.directories_renamed, 1);
    assert_eq!(report.statistics.files_renamed, 0);
    assert_eq!(
        fs::read_to_string(site.path().join("index.html")).unwrap(),
        "<p><a href=\"Q142/Paris.html\">Paris</a></p>"
    );
    assert!(site.path().join("Q142/Paris.html").is_file());
}
