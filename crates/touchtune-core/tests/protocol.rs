use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use touchtune_core::protocol::{Connection, ProtocolError, TimingConfig, Transport};
use touchtune_core::touch::ValidationError;

/// Mock serial link that records writes and replays canned responses
#[derive(Default)]
struct MockSerial {
    sent: Vec<String>,
    responses: VecDeque<Vec<String>>,
    fail_on_send: bool,
}

impl MockSerial {
    fn with_responses(responses: &[&[&str]]) -> Self {
        Self {
            sent: Vec::new(),
            responses: responses
                .iter()
                .map(|lines| lines.iter().map(|l| l.to_string()).collect())
                .collect(),
            fail_on_send: false,
        }
    }

    /// Commands written so far, without line terminators
    fn commands(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|s| s.trim_end_matches('\n').to_string())
            .collect()
    }
}

impl Transport for MockSerial {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        if self.fail_on_send {
            return Err(ProtocolError::SerialError("Serial write failed".to_string()));
        }
        self.sent.push(String::from_utf8_lossy(bytes).to_string());
        Ok(())
    }

    fn drain_lines(&mut self, _timeout: Duration) -> Result<Vec<String>, ProtocolError> {
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}

fn connect(mock: MockSerial) -> Connection<MockSerial> {
    Connection::with_transport(mock, TimingConfig::immediate())
}

#[test]
fn test_set_sensitivity_issues_exact_command() {
    for level in 1..=5u8 {
        let mock = MockSerial::with_responses(&[&["Touch sensitivity changed to level"]]);
        let mut conn = connect(mock);
        assert!(conn.set_sensitivity_level(level).unwrap());
        assert_eq!(conn.transport().commands(), vec![format!("S{}", level)]);
        assert_eq!(conn.transport().sent, vec![format!("S{}\n", level)]);
    }
}

#[test]
fn test_set_sensitivity_ack_is_case_insensitive() {
    let mock = MockSerial::with_responses(&[&["SENSITIVITY CHANGED"]]);
    let mut conn = connect(mock);
    assert!(conn.set_sensitivity_level(2).unwrap());

    let mock = MockSerial::with_responses(&[&["Sensitivity unchanged"]]);
    let mut conn = connect(mock);
    assert!(!conn.set_sensitivity_level(2).unwrap());
}

#[test]
fn test_set_sensitivity_out_of_range_sends_nothing() {
    for level in [-1i64, 0, 6, 100] {
        let mut conn = connect(MockSerial::default());
        let err = conn.set_sensitivity_level(level).unwrap_err();
        match err {
            ProtocolError::Validation(ValidationError::SensitivityLevel(v)) => assert_eq!(v, level),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(conn.transport().sent.is_empty());
    }
}

#[test]
fn test_set_threshold_issues_exact_command() {
    for electrode in 0..12u8 {
        for (touch, release) in [(2u8, 1u8), (12, 6), (255, 254)] {
            let mock = MockSerial::with_responses(&[&["Electrode threshold set"]]);
            let mut conn = connect(mock);
            assert!(conn
                .set_electrode_threshold(electrode, touch, release)
                .unwrap());
            assert_eq!(
                conn.transport().commands(),
                vec![format!("E{},{},{}", electrode, touch, release)]
            );
        }
    }
}

#[test]
fn test_release_not_below_touch_is_rejected_before_io() {
    let mut conn = connect(MockSerial::default());
    let err = conn.set_electrode_threshold(0, 10, 10).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Validation(ValidationError::ReleaseNotBelowTouch {
            touch: 10,
            release: 10
        })
    ));
    let err = conn.set_electrode_threshold(0, 10, 20).unwrap_err();
    assert!(matches!(err, ProtocolError::Validation(_)));
    assert!(conn.transport().sent.is_empty());
}

#[test]
fn test_threshold_range_checks() {
    let mut conn = connect(MockSerial::default());
    let cases = [
        (-1i64, 10i64, 5i64),
        (12, 10, 5),
        (0, 0, 0),
        (0, 256, 5),
        (0, 10, 0),
    ];
    for (electrode, touch, release) in cases {
        assert!(matches!(
            conn.set_electrode_threshold(electrode, touch, release),
            Err(ProtocolError::Validation(_))
        ));
    }
    assert!(conn.transport().sent.is_empty());
}

#[test]
fn test_calibration_and_reset_acks() {
    let mock = MockSerial::with_responses(&[
        &["Performing baseline calibration..."],
        &["Touch configuration reset to defaults"],
        &["Unknown command: R"],
    ]);
    let mut conn = connect(mock);
    assert!(conn.force_calibration().unwrap());
    assert!(conn.reset_to_defaults().unwrap());
    assert!(!conn.reset_to_defaults().unwrap());
    assert_eq!(conn.transport().commands(), vec!["C", "R", "R"]);
}

#[test]
fn test_silent_device_is_timeout() {
    let mut conn = connect(MockSerial::default());
    assert!(matches!(
        conn.set_sensitivity_level(3),
        Err(ProtocolError::Timeout)
    ));
    assert!(matches!(conn.query_status(), Err(ProtocolError::Timeout)));
    // The session stays usable
    assert_eq!(conn.transport().commands(), vec!["S3", "T"]);
}

#[test]
fn test_write_failure_propagates() {
    let mut mock = MockSerial::default();
    mock.fail_on_send = true;
    let mut conn = connect(mock);
    let err = conn.query_status().unwrap_err();
    assert!(matches!(err, ProtocolError::SerialError(_)));
    assert!(err.is_recoverable());
}

#[test]
fn test_raw_send_returns_lines_verbatim() {
    let mock = MockSerial::with_responses(&[&["a", "b"]]);
    let mut conn = connect(mock);
    assert_eq!(conn.send("X").unwrap(), vec!["a", "b"]);
    // Raw sends do not treat silence as an error
    assert!(conn.send("X").unwrap().is_empty());
}

#[test]
fn test_protocol_error_display() {
    assert!(!ProtocolError::Timeout.to_string().is_empty());
    let err = ProtocolError::ConnectionFailed("/dev/ttyUSB9: No such file".to_string());
    assert!(err.to_string().contains("/dev/ttyUSB9"));
    assert!(!err.is_recoverable());
}

fn slow_timing() -> TimingConfig {
    TimingConfig {
        response_settle_ms: 20,
        calibration_settle_ms: 200,
        reset_settle_ms: 100,
        ..TimingConfig::immediate()
    }
}

#[test]
fn test_acknowledged_calibration_and_reset_settle() {
    let mock = MockSerial::with_responses(&[
        &["Performing baseline calibration..."],
        &["Touch configuration reset to defaults"],
    ]);
    let mut conn = Connection::with_transport(mock, slow_timing());

    let start = Instant::now();
    assert!(conn.force_calibration().unwrap());
    let calibration = start.elapsed();
    assert!(calibration >= Duration::from_millis(220), "{:?}", calibration);

    let start = Instant::now();
    assert!(conn.reset_to_defaults().unwrap());
    let reset = start.elapsed();
    assert!(reset >= Duration::from_millis(120), "{:?}", reset);
}

#[test]
fn test_unacknowledged_command_skips_extra_settle() {
    let mock = MockSerial::with_responses(&[&["Unknown command: C"]]);
    let mut conn = Connection::with_transport(mock, slow_timing());

    let start = Instant::now();
    assert!(!conn.force_calibration().unwrap());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(20), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(200), "{:?}", elapsed);
}
