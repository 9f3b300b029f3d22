//! Model-path registry coverage, session (non-persistent) operations only.

use anyhow::{Result, ensure};
use camino::Utf8Path;
use rstest::rstest;
use test_helpers::env;

use super::{delete_path, get_path, list_all, set_path};

#[rstest]
fn session_set_and_get_round_trip() -> Result<()> {
    let _lock = env::lock();
    let _restore = env::set_var("HF_HOME", "placeholder");

    ensure!(set_path("huggingface", Utf8Path::new("./hf_models"), false));
    let value = get_path("huggingface");
    ensure!(Utf8Path::new(&value).is_absolute(), "paths are absolutised: {value}");
    ensure!(value.ends_with("hf_models"));
    ensure!(!value.contains('\\'), "forward slashes only: {value}");
    Ok(())
}

#[rstest]
fn unknown_providers_are_rejected() {
    let _lock = env::lock();
    assert!(!set_path("midjourney", Utf8Path::new("/tmp/x"), false));
    assert_eq!(get_path("midjourney"), "");
    assert!(!delete_path("midjourney"));
}

#[rstest]
fn listing_reports_every_provider() {
    let _lock = env::lock();
    let _hf = env::remove_var("HF_HOME");
    let _ollama = env::remove_var("OLLAMA_MODELS");
    let _lmstudio = env::remove_var("LMSTUDIO_PATH");

    let listing = list_all();

    assert_eq!(listing.len(), 3);
    assert_eq!(listing.get("huggingface").map(String::as_str), Some("Not set"));
    assert_eq!(listing.get("ollama").map(String::as_str), Some("Not set"));
    assert_eq!(listing.get("lmstudio").map(String::as_str), Some("Not set"));
}

#[rstest]
fn deletion_clears_the_session_variable() {
    let _lock = env::lock();
    let _restore = env::set_var("OLLAMA_MODELS", "placeholder");

    assert!(set_path("ollama", Utf8Path::new("/models/ollama"), false));
    assert!(delete_path("ollama"));
    assert_eq!(get_path("ollama"), "");
}
