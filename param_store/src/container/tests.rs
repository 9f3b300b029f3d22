//! End-to-end container coverage: round trips, self-healing, shape
//! preservation through the typed boundary, and the sync state machine.

use std::collections::BTreeMap;

use anyhow::{Context, Result, ensure};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::logger::Verbosity;
use crate::store;
use crate::value::{DotMap, ParamValue};

use super::{ContainerOptions, ParamContainer};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct MinioParams {
    ip: String,
    access_key: String,
    secret_key: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct DemoParams {
    title: String,
    threshold: i64,
    labels: Vec<i64>,
    limits: BTreeMap<String, i64>,
    minio: MinioParams,
    prefs: DotMap,
}

impl Default for DemoParams {
    fn default() -> Self {
        let mut prefs = DotMap::new();
        prefs.insert("theme", ParamValue::from("dark"));
        let mut panel = DotMap::new();
        panel.insert("size", ParamValue::Int(10));
        prefs.insert("panel", ParamValue::Tree(panel));
        Self {
            title: "demo".to_owned(),
            threshold: 5,
            labels: vec![1, 2, 3],
            limits: BTreeMap::from([("max".to_owned(), 100)]),
            minio: MinioParams {
                ip: "192.168.3.42:9000".to_owned(),
                access_key: "admin".to_owned(),
                secret_key: "Proton".to_owned(),
            },
            prefs,
        }
    }
}

fn scratch_dir() -> Result<(TempDir, Utf8PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|p| anyhow::anyhow!("non-UTF-8 temp dir: {}", p.display()))?;
    Ok((dir, path))
}

fn options(module: &str) -> ContainerOptions {
    ContainerOptions::new(module).verbosity(Verbosity::Critical)
}

fn demo_container(module: &str) -> ParamContainer<DemoParams> {
    ParamContainer::with_defaults(options(module))
}

/// Rewrites one module entry on disk the way a user editing the file would.
fn edit_entry(
    path: &Utf8Path,
    module: &str,
    edit: impl FnOnce(&mut BTreeMap<String, ParamValue>),
) -> Result<()> {
    let mut document = store::load_document(path);
    let entry = document
        .remove(module)
        .with_context(|| format!("module '{module}' not in {path}"))?;
    let mut entries = entry.into_entries().context("entry is not a mapping")?;
    edit(&mut entries);
    store::save_module(path, module, ParamValue::Map(entries));
    Ok(())
}

#[rstest]
fn first_run_creates_the_file_from_defaults() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    let mut container = demo_container("demo");
    container.load_then_save(&path, None);

    ensure!(path.exists(), "first run must create the document");
    let mut fresh = demo_container("demo");
    fresh.load_only(&path, None);
    ensure!(fresh.params() == &DemoParams::default());
    ensure!(fresh.get_params() == container.get_params());
    Ok(())
}

#[rstest]
fn save_then_load_round_trips_the_attribute_set() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    let mut container = demo_container("demo");
    container.params_mut().threshold = 42;
    container.params_mut().title = "tuned".to_owned();
    container.save(&path);

    let mut fresh = demo_container("demo");
    fresh.load_only(&path, None);
    ensure!(fresh.params().threshold == 42);
    ensure!(fresh.params().title == "tuned");
    ensure!(fresh.get_params() == container.get_params());
    Ok(())
}

#[rstest]
fn user_edits_win_and_deleted_keys_heal() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    demo_container("demo").load_then_save(&path, Some("demo"));

    // The user changes the endpoint and deletes the secret.
    edit_entry(&path, "demo", |entries| {
        entries.insert("threshold".to_owned(), ParamValue::Int(99));
        if let Some(ParamValue::Map(minio)) = entries.get_mut("minio") {
            minio.insert("ip".to_owned(), ParamValue::from("10.0.0.1:9000"));
            minio.remove("secret_key");
        }
    })?;

    let mut reloaded = demo_container("demo");
    reloaded.load_then_save(&path, None);
    ensure!(reloaded.params().threshold == 99, "file leaf must win");
    ensure!(reloaded.params().minio.ip == "10.0.0.1:9000");
    ensure!(
        reloaded.params().minio.secret_key == "Proton",
        "deleted key must heal from the default"
    );

    // And the healed key is backfilled into the file itself.
    let document = store::load_document(&path);
    let minio = document
        .get("demo")
        .and_then(|entry| entry.get("minio"))
        .context("minio entry missing")?;
    ensure!(minio.get("secret_key").and_then(ParamValue::as_str) == Some("Proton"));
    Ok(())
}

#[rstest]
fn file_sequences_replace_default_sequences() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    demo_container("demo").load_then_save(&path, Some("demo"));
    edit_entry(&path, "demo", |entries| {
        entries.insert("labels".to_owned(), ParamValue::Seq(vec![ParamValue::Int(9)]));
    })?;

    let mut reloaded = demo_container("demo");
    reloaded.load_only(&path, None);
    ensure!(reloaded.params().labels == vec![9], "no element-wise merging");
    Ok(())
}

#[rstest]
fn tree_fields_stay_attribute_accessible_after_load() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    demo_container("demo").load_then_save(&path, Some("demo"));
    edit_entry(&path, "demo", |entries| {
        entries.insert(
            "prefs".to_owned(),
            ParamValue::Map(BTreeMap::from([(
                "panel".to_owned(),
                ParamValue::Map(BTreeMap::from([("size".to_owned(), ParamValue::Int(20))])),
            )])),
        );
    })?;

    let mut reloaded = demo_container("demo");
    reloaded.load_only(&path, None);
    let prefs = &reloaded.params().prefs;
    ensure!(prefs.dot("panel.size") == Some(&ParamValue::Int(20)), "file value wins");
    ensure!(
        prefs.dot("theme").and_then(ParamValue::as_str) == Some("dark"),
        "default fills the gap"
    );
    Ok(())
}

#[rstest]
fn loading_a_missing_file_keeps_every_default() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let mut container = demo_container("demo");

    container.load(&root.join("nowhere.yml"));

    ensure!(container.params() == &DemoParams::default());
    ensure!(container.is_synced(), "a load happened, however empty");
    Ok(())
}

#[rstest]
fn sync_state_follows_load_not_save() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    let mut container = demo_container("demo");
    ensure!(!container.is_synced(), "fresh containers are unsynced");
    container.save(&path);
    ensure!(!container.is_synced(), "saving alone never syncs");
    container.load(&path);
    ensure!(container.is_synced());
    Ok(())
}

#[rstest]
fn two_modules_share_one_document() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("shared.yml");

    let mut first = demo_container("Module 01");
    first.params_mut().threshold = 1;
    first.load_then_save(&path, None);

    let mut second = demo_container("Module 02");
    second.params_mut().threshold = 2;
    second.load_then_save(&path, None);

    let mut check = demo_container("Module 01");
    check.load_only(&path, None);
    ensure!(check.params().threshold == 1, "sibling module must be untouched");
    Ok(())
}

#[rstest]
fn bookkeeping_fields_are_excluded_from_the_persisted_view() -> Result<()> {
    #[derive(Serialize, Deserialize, Default)]
    struct Leaky {
        value: i64,
        #[serde(rename = "ModuleName")]
        shadow_module: String,
        #[serde(rename = "logdir")]
        shadow_logdir: String,
    }

    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");
    let mut container: ParamContainer<Leaky> = ParamContainer::with_defaults(options("leaky"));
    container.load_then_save(&path, None);

    let view = container.get_params();
    ensure!(view.contains_key("value"));
    ensure!(!view.contains_key("ModuleName"));
    ensure!(!view.contains_key("logdir"));

    let document = store::load_document(&path);
    let saved = document.get("leaky").context("module missing")?;
    ensure!(saved.get("ModuleName").is_none());
    Ok(())
}

#[rstest]
fn get_returns_the_fallback_for_unknown_keys() {
    let container = demo_container("demo");
    assert_eq!(container.get("threshold", ParamValue::Null), ParamValue::Int(5));
    assert_eq!(
        container.get("no_such_key", ParamValue::from("fallback")),
        ParamValue::from("fallback")
    );
}

#[rstest]
fn unknown_file_keys_are_dropped_at_the_typed_boundary() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    demo_container("demo").load_then_save(&path, Some("demo"));
    edit_entry(&path, "demo", |entries| {
        entries.insert("abandoned".to_owned(), ParamValue::Int(123));
    })?;

    let mut reloaded = demo_container("demo");
    reloaded.load_then_save(&path, None);
    ensure!(!reloaded.get_params().contains_key("abandoned"));

    // The re-save prunes the key from the document as well.
    let document = store::load_document(&path);
    let entry = document.get("demo").context("module missing")?;
    ensure!(entry.get("abandoned").is_none());
    Ok(())
}

#[rstest]
fn app_name_and_params_dir_redirect_the_file() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let redirected = root.join("per_app");
    let opts = options("demo")
        .app_name("MyApp")
        .params_dir(redirected.clone());
    let mut container: ParamContainer<DemoParams> = ParamContainer::with_defaults(opts);

    container.load_then_save(&root.join("elsewhere").join("app.yml"), None);

    ensure!(redirected.join("app.yml").exists(), "file must land in params_dir");
    ensure!(!root.join("elsewhere").join("app.yml").exists());
    ensure!(container.source_path() == Some(redirected.join("app.yml").as_path()));
    Ok(())
}

#[rstest]
fn renaming_the_module_moves_the_entry() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let path = root.join("app.yml");

    let mut container = demo_container("old");
    container.load_then_save(&path, Some("renamed"));

    ensure!(container.module_name() == "renamed");
    let document = store::load_document(&path);
    ensure!(document.contains_key("renamed"));
    ensure!(!document.contains_key("old"));
    Ok(())
}
