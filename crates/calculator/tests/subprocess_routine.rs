//! Tests for the subprocess calculator against small shell routines.

#![cfg(unix)]

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use calculator::{CalculationError, Calculator, SubprocessCalculator, SubprocessConfig};
use weather_common::ThermoInputs;

const INPUTS: ThermoInputs = ThermoInputs {
    temperature: 30.0,
    humidity: 70.0,
    pressure: 1008.0,
};

/// Run `script` with `sh -c`; the input flags arrive as `$1 $2 $3`.
fn shell(script: &str, timeout: Duration) -> SubprocessCalculator {
    SubprocessCalculator::new(SubprocessConfig {
        program: PathBuf::from("sh"),
        leading_args: vec!["-c".to_string(), script.to_string(), "routine".to_string()],
        timeout,
        method: "test-routine".to_string(),
    })
}

#[tokio::test]
async fn test_successful_routine() {
    let calc = shell(
        r#"echo '{"dew_point_temperature": 23.93, "wet_bulb_temperature": 25.56}'"#,
        Duration::from_secs(5),
    );

    let out = calc.calculate(INPUTS).await.unwrap();
    assert_eq!(out.dew_point, 23.93);
    assert_eq!(out.wet_bulb, 25.56);
    assert_eq!(calc.method(), "test-routine");
}

#[tokio::test]
async fn test_routine_receives_input_flags() {
    // Echo the temperature flag back as the dew point.
    let calc = shell(
        r#"t="${1#--temperature=}"; printf '{"dew_point_temperature": %s, "wet_bulb_temperature": 0}' "$t""#,
        Duration::from_secs(5),
    );

    let out = calc.calculate(INPUTS).await.unwrap();
    assert_eq!(out.dew_point, 30.0);
}

#[tokio::test]
async fn test_alternate_key_spelling() {
    let calc = shell(
        r#"echo '{"temperature_dew_point": 1.5, "temperature_wet_bulb": 2.5}'"#,
        Duration::from_secs(5),
    );

    let out = calc.calculate(INPUTS).await.unwrap();
    assert_eq!(out.dew_point, 1.5);
    assert_eq!(out.wet_bulb, 2.5);
}

#[tokio::test]
async fn test_non_zero_exit_carries_stderr() {
    let calc = shell("echo 'metpy not installed' >&2; exit 3", Duration::from_secs(5));

    match calc.calculate(INPUTS).await {
        Err(CalculationError::ExitStatus { stderr, .. }) => {
            assert_eq!(stderr, "metpy not installed");
        }
        other => panic!("expected exit status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_output() {
    let calc = shell("echo 'not json'", Duration::from_secs(5));

    let err = calc.calculate(INPUTS).await.unwrap_err();
    assert!(matches!(err, CalculationError::Parse(_)));
}

#[tokio::test]
async fn test_nan_output_is_rejected() {
    // serde_json has no NaN literal, so this surfaces as a parse failure.
    let calc = shell(
        r#"echo '{"dew_point_temperature": NaN, "wet_bulb_temperature": 1}'"#,
        Duration::from_secs(5),
    );

    assert!(calc.calculate(INPUTS).await.is_err());
}

#[tokio::test]
async fn test_slow_routine_times_out() {
    let calc = shell("sleep 10", Duration::from_millis(200));

    let start = Instant::now();
    let err = calc.calculate(INPUTS).await.unwrap_err();

    assert!(matches!(err, CalculationError::Timeout(_)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_program_is_a_spawn_error() {
    let calc = SubprocessCalculator::new(SubprocessConfig {
        program: PathBuf::from("/nonexistent/wet-bulb-routine"),
        leading_args: Vec::new(),
        timeout: Duration::from_secs(1),
        method: "missing".to_string(),
    });

    let err = calc.calculate(INPUTS).await.unwrap_err();
    assert!(matches!(err, CalculationError::Spawn(_)));
}

#[tokio::test]
async fn test_script_file_with_leading_args() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routine.sh");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"echo '{{"dew_point_temperature": 10.0, "wet_bulb_temperature": 12.0}}'"#
    )
    .unwrap();
    drop(file);

    let calc = SubprocessCalculator::new(SubprocessConfig {
        program: PathBuf::from("sh"),
        leading_args: vec![path.to_string_lossy().into_owned()],
        timeout: Duration::from_secs(5),
        method: "script-file".to_string(),
    });

    let out = calc.calculate(INPUTS).await.unwrap();
    assert_eq!(out.wet_bulb, 12.0);
}

#[tokio::test]
async fn test_invalid_inputs_never_reach_the_routine() {
    // Would succeed if spawned.
    let calc = shell(
        r#"echo '{"dew_point_temperature": 1, "wet_bulb_temperature": 1}'"#,
        Duration::from_secs(5),
    );

    let err = calc
        .calculate(ThermoInputs {
            temperature: 25.0,
            humidity: 150.0,
            pressure: 1013.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CalculationError::InvalidInput(_)));
}
