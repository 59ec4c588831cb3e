//! Lifecycle protocol against a scripted device: initialize, probe,
//! reconnect, and the call discipline each of them must keep.

use somnus_device::{CallLog, DeviceCall, ScriptedDevice, SensorChannel};
use somnus_monitor::{ApneaMonitor, LinkState, MonitorConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monitor_with(device: ScriptedDevice) -> (ApneaMonitor, CallLog) {
    let calls = device.calls();
    let monitor = ApneaMonitor::with_device(MonitorConfig::default(), Box::new(device))
        .expect("default config is valid");
    (monitor, calls)
}

fn init_device(p_conn: bool, p_conf: bool, s_conn: bool, s_conf: bool) -> ScriptedDevice {
    ScriptedDevice::new("init")
        .with_connect(SensorChannel::Pressure, [p_conn])
        .with_configure(SensorChannel::Pressure, [p_conf])
        .with_connect(SensorChannel::Sound, [s_conn])
        .with_configure(SensorChannel::Sound, [s_conf])
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[test]
fn initialize_succeeds_only_when_all_four_steps_succeed() {
    for mask in 0u8..16 {
        let p_conn = mask & 0b0001 != 0;
        let p_conf = mask & 0b0010 != 0;
        let s_conn = mask & 0b0100 != 0;
        let s_conf = mask & 0b1000 != 0;

        let (mut monitor, calls) = monitor_with(init_device(p_conn, p_conf, s_conn, s_conf));
        let result = monitor.initialize().unwrap();

        assert_eq!(
            result,
            p_conn && p_conf && s_conn && s_conf,
            "outcomes p_conn={p_conn} p_conf={p_conf} s_conn={s_conn} s_conf={s_conf}"
        );

        // Every call at most once.
        for call in [
            DeviceCall::Connect(SensorChannel::Pressure),
            DeviceCall::Configure(SensorChannel::Pressure),
            DeviceCall::Connect(SensorChannel::Sound),
            DeviceCall::Configure(SensorChannel::Sound),
        ] {
            assert!(calls.count(call) <= 1, "{call} ran more than once");
        }

        if !p_conn {
            assert_eq!(calls.channel_calls(SensorChannel::Sound), 0);
            assert_eq!(calls.len(), 1);
        } else {
            assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Pressure)), 1);
            assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 1);
            assert_eq!(
                calls.count(DeviceCall::Configure(SensorChannel::Sound)),
                usize::from(s_conn)
            );
        }
    }
}

#[test]
fn initialize_with_everything_up_configures_each_channel_once() {
    let (mut monitor, calls) = monitor_with(ScriptedDevice::new("healthy"));
    assert!(monitor.initialize().unwrap());
    assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Pressure)), 1);
    assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Sound)), 1);
    assert_eq!(monitor.link_state(), LinkState::Ready);
}

#[test]
fn initialize_sound_failures_after_pressure_up() {
    let (mut monitor, calls) = monitor_with(init_device(true, true, false, false));
    assert!(!monitor.initialize().unwrap());
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Pressure)), 1);
    assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Pressure)), 1);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 1);
    assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Sound)), 0);
}

#[test]
fn initialize_does_not_touch_windows() {
    let (mut monitor, calls) = monitor_with(ScriptedDevice::new("healthy"));
    monitor.initialize().unwrap();
    assert_eq!(calls.count(DeviceCall::Read(SensorChannel::Pressure)), 0);
    assert!(monitor.evaluator().window(SensorChannel::Pressure).is_empty());
}

// ---------------------------------------------------------------------------
// is_connected
// ---------------------------------------------------------------------------

#[test]
fn is_connected_delegates_to_a_single_probe() {
    for answer in [true, false] {
        let (monitor, calls) = monitor_with(ScriptedDevice::new("probe").with_connectivity([answer]));
        assert_eq!(monitor.is_connected().unwrap(), answer);
        assert_eq!(calls.entries(), vec![DeviceCall::IsConnected]);
    }
}

// ---------------------------------------------------------------------------
// reconnect
// ---------------------------------------------------------------------------

#[test]
fn reconnect_when_connected_makes_no_connect_attempt() {
    let device = ScriptedDevice::new("up")
        .with_connect(SensorChannel::Pressure, [false])
        .with_connect(SensorChannel::Sound, [false])
        .with_connectivity([true]);
    let (mut monitor, calls) = monitor_with(device);

    assert!(!monitor.reconnect().unwrap());
    assert_eq!(calls.count(DeviceCall::IsConnected), 1);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Pressure)), 0);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 0);
}

#[test]
fn reconnect_when_disconnected_follows_connect_outcomes() {
    for (p_conn, s_conn) in [(true, true), (true, false), (false, true), (false, false)] {
        let device = ScriptedDevice::new("down")
            .with_connect(SensorChannel::Pressure, [p_conn])
            .with_connect(SensorChannel::Sound, [s_conn])
            .with_connectivity([false]);
        let (mut monitor, calls) = monitor_with(device);

        assert_eq!(monitor.reconnect().unwrap(), p_conn && s_conn);
        assert_eq!(calls.count(DeviceCall::IsConnected), 1);
        assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Pressure)), 1);
        assert_eq!(
            calls.count(DeviceCall::Connect(SensorChannel::Sound)),
            usize::from(p_conn)
        );
        assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Pressure)), 0);
        assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Sound)), 0);
    }
}

#[test]
fn caller_driven_retry_eventually_reconnects() {
    // Probe reports the link down throughout; pressure refuses twice.
    let device = ScriptedDevice::new("flaky")
        .with_connect(SensorChannel::Pressure, [true, false, false, true])
        .with_connectivity([false]);
    let (mut monitor, calls) = monitor_with(device);

    assert!(monitor.initialize().unwrap());

    let mut attempts = 0;
    while attempts < 5 {
        attempts += 1;
        if monitor.reconnect().unwrap() {
            break;
        }
    }

    assert_eq!(attempts, 3);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Pressure)), 4);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 2);
    assert_eq!(monitor.link_state(), LinkState::Ready);
}

#[test]
fn repeated_reconnect_on_live_link_is_always_refused() {
    let (mut monitor, calls) = monitor_with(ScriptedDevice::new("steady"));
    assert!(monitor.initialize().unwrap());

    for _ in 0..3 {
        assert!(!monitor.reconnect().unwrap());
        assert!(monitor.last_link_report().unwrap().was_refused());
    }
    assert_eq!(monitor.link_state(), LinkState::Ready);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Pressure)), 1);
    assert_eq!(calls.count(DeviceCall::IsConnected), 3);
}

#[test]
fn reconnect_after_link_drop() {
    let device = ScriptedDevice::new("drop")
        .with_connect(SensorChannel::Pressure, [true, false, true])
        .with_connectivity([true, false, false, false]);
    let (mut monitor, calls) = monitor_with(device);

    assert!(monitor.initialize().unwrap());
    assert!(monitor.is_connected().unwrap());

    // First retry: pressure fails, sound untouched.
    assert!(!monitor.reconnect().unwrap());
    assert_eq!(monitor.link_state(), LinkState::Disconnected);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 1);

    // Second retry: both connect; configuration from initialize still holds.
    assert!(monitor.reconnect().unwrap());
    assert_eq!(monitor.link_state(), LinkState::Ready);
    assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 2);
    assert_eq!(calls.count(DeviceCall::Configure(SensorChannel::Sound)), 1);
}
