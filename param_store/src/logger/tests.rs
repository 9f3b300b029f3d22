//! Logger coverage: threshold gating, the date-partitioned file, and the
//! `DEBUG_MODE` fallback.

use anyhow::{Result, ensure};
use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::TempDir;
use test_helpers::env;

use super::{DEBUG_MODE_VAR, ParamLogger, Verbosity};

fn scratch_dir() -> Result<(TempDir, Utf8PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|p| anyhow::anyhow!("non-UTF-8 temp dir: {}", p.display()))?;
    Ok((dir, path))
}

#[rstest]
fn gated_messages_leave_no_trace() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let logger = ParamLogger::new("gated", &root, Verbosity::Critical);

    logger.log(Verbosity::Debug, "should vanish");

    ensure!(!logger.log_file_path().exists(), "gated messages must not touch the file");
    Ok(())
}

#[rstest]
fn emitted_messages_are_appended_to_the_dated_file() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let logger = ParamLogger::new("Module 01", &root, Verbosity::Debug);

    logger.log(Verbosity::Info, "first");
    logger.log(Verbosity::Debug, "second");

    let contents = std::fs::read_to_string(logger.log_file_path())?;
    ensure!(contents.contains("[Module 01] [INFO] first"), "got: {contents}");
    ensure!(contents.contains("[Module 01] [DEBUG] second"));
    ensure!(contents.lines().count() == 2);
    Ok(())
}

#[rstest]
fn messages_at_the_threshold_pass() -> Result<()> {
    let (_dir, root) = scratch_dir()?;
    let logger = ParamLogger::new("edge", &root, Verbosity::Info);

    logger.log(Verbosity::Info, "at the line");
    logger.log(Verbosity::Trace, "beyond it");

    let contents = std::fs::read_to_string(logger.log_file_path())?;
    ensure!(contents.contains("at the line"));
    ensure!(!contents.contains("beyond it"));
    Ok(())
}

#[rstest]
#[case(-5, Verbosity::Critical)]
#[case(0, Verbosity::Critical)]
#[case(1, Verbosity::Info)]
#[case(2, Verbosity::Debug)]
#[case(3, Verbosity::Trace)]
#[case(99, Verbosity::Trace)]
fn numeric_levels_clamp(#[case] raw: i64, #[case] expected: Verbosity) {
    assert_eq!(Verbosity::from_level_value(raw), expected);
}

#[rstest]
#[case("critical", Some(Verbosity::Critical))]
#[case("ERROR", Some(Verbosity::Critical))]
#[case("warning", Some(Verbosity::Info))]
#[case("info", Some(Verbosity::Info))]
#[case("debug", Some(Verbosity::Debug))]
#[case("trace", Some(Verbosity::Trace))]
#[case("chatty", None)]
fn level_names_parse(#[case] name: &str, #[case] expected: Option<Verbosity>) {
    assert_eq!(Verbosity::from_name(name), expected);
}

#[rstest]
fn debug_mode_variable_is_the_fallback() {
    let _lock = env::lock();
    {
        let _set = env::set_var(DEBUG_MODE_VAR, "0");
        assert_eq!(Verbosity::from_env(), Verbosity::Critical);
    }
    {
        let _removed = env::remove_var(DEBUG_MODE_VAR);
        assert_eq!(Verbosity::from_env(), Verbosity::Debug);
    }
    {
        let _set = env::set_var(DEBUG_MODE_VAR, "not a number");
        assert_eq!(Verbosity::from_env(), Verbosity::Debug);
    }
}
