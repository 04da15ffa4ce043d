//! `EphemerisConfig` is the option table the design's external-interfaces
//! section names (use-vsop/use-spice/spice-csv/spice-truncation/output-dir).
//! The config loader itself is an external collaborator (section 1), but
//! this crate's config struct still needs to survive a round trip through
//! whatever file format a caller's loader uses; `toml` and `serde_yaml`
//! (both carried from the teacher's dependency table) are the two formats
//! the wider example pack reaches for, so both are exercised here.
use astrokernel::ephemeris::{EphemerisBackend, EphemerisConfig};

fn sample_config() -> EphemerisConfig {
    EphemerisConfig {
        backend: EphemerisBackend::SpiceCsv,
        spice_binary: None,
        spice_csv_dir: Some("./ephemeris-cache".to_string()),
        spice_truncation_s: 120.0,
        output_dir: "./mission-output".to_string(),
    }
}

#[test]
fn ephemeris_config_round_trips_through_toml() {
    let config = sample_config();
    let serialized = toml::to_string(&config).expect("toml serialization");
    let restored: EphemerisConfig = toml::from_str(&serialized).expect("toml deserialization");

    assert_eq!(restored.backend, config.backend);
    assert_eq!(restored.spice_csv_dir, config.spice_csv_dir);
    assert_eq!(restored.spice_truncation_s, config.spice_truncation_s);
    assert_eq!(restored.output_dir, config.output_dir);
}

#[test]
fn ephemeris_config_round_trips_through_yaml() {
    let config = sample_config();
    let serialized = serde_yaml::to_string(&config).expect("yaml serialization");
    let restored: EphemerisConfig = serde_yaml::from_str(&serialized).expect("yaml deserialization");

    assert_eq!(restored.backend, config.backend);
    assert_eq!(restored.spice_csv_dir, config.spice_csv_dir);
    assert_eq!(restored.spice_truncation_s, config.spice_truncation_s);
    assert_eq!(restored.output_dir, config.output_dir);
}
