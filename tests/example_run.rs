//! Integration tests for the `example run` command.
use tempfile::tempdir;
use wardsim::cli::RunOpts;
use wardsim::cli::example::handle_example_run_command;
use wardsim::config::ParameterOverrides;
use wardsim::settings::Settings;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("WARDSIM_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
        overrides: ParameterOverrides {
            runs: Some(2),
            beds: Some(5),
            ..ParameterOverrides::default()
        },
    };
    handle_example_run_command("acute_ward", &opts, Some(Settings::default())).unwrap();
    assert!(tempdir.path().join("event_log.csv").is_file());

    assert!(handle_example_run_command("no_such_ward", &opts, Some(Settings::default())).is_err());
}
