//! Runs the bundled night-ward demo script through a full session.

use std::path::PathBuf;

use somnus_cli::{build_monitor, CliConfig, Session};
use somnus_device::DeviceScript;
use somnus_monitor::LinkState;

fn demo_script() -> DeviceScript {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/night-ward.json");
    DeviceScript::from_path(path).unwrap()
}

#[test]
fn night_ward_demo_flags_the_quiet_stretch() {
    let config = CliConfig::default();
    let monitor = build_monitor(config.monitor, demo_script()).unwrap();
    let mut session = Session::new(monitor, config.session, Vec::new());

    let summary = session.run().unwrap();
    assert_eq!(summary.ticks, 20);
    // One reconnect after the refused pressure connect, one after the outage.
    assert_eq!(summary.reconnect_attempts, 2);
    assert_eq!(summary.apnea_ticks, 6);
    assert_eq!(session.monitor().link_state(), LinkState::Connected);

    let output = String::from_utf8(session.into_output()).unwrap();
    let verdicts: Vec<bool> = output
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["apnea"].as_bool().unwrap()
        })
        .collect();
    assert_eq!(verdicts.len(), 20);
    assert!(verdicts[5..11].iter().all(|&apnea| apnea));
    assert!(!verdicts[11]);
}

#[test]
fn pressure_only_policy_agrees_during_silence() {
    let mut config = CliConfig::default();
    config.monitor.policy = somnus_monitor::EvaluationPolicy::PressureOnly;
    let monitor = build_monitor(config.monitor, demo_script()).unwrap();
    let mut session = Session::new(monitor, config.session, std::io::sink());

    let summary = session.run().unwrap();
    assert_eq!(summary.apnea_ticks, 6);
}
