//! CSV log-row formatting, state-dependent logging cadence, and log file
//! naming. The SD card's block layer and FAT driver are out of scope here
//! (a narrow storage trait is the boundary firmware wires to real
//! hardware) — everything about *what* gets written and *how often* is
//! fully specified and tested against that trait.

use core::fmt::Write as _;
use heapless::String;

use crate::fsm::FlightState;

/// Log file prefix/extension: `MFC_LOGGER_<n>.CSV`.
pub const LOG_PREFIX: &str = "MFC_LOGGER_";
pub const LOG_EXT: &str = "CSV";

/// Upper bound on one formatted CSV row, including the trailing `\n`.
pub const MAX_ROW_LEN: usize = 128;
/// Upper bound on a formatted file name.
pub const MAX_NAME_LEN: usize = 32;

/// Logging cadence for the current flight state, in Hz. Re-read every
/// logger cycle so a state change takes effect within one period.
pub fn logger_rate_hz(state: FlightState) -> u32 {
    match state {
        FlightState::Startup | FlightState::IdleSafe | FlightState::Landed | FlightState::RecoveredSafe => 1,
        FlightState::Armed | FlightState::PadPreop => 5,
        FlightState::Powered | FlightState::Coasting => 20,
        FlightState::DrogueDeploy
        | FlightState::DrogueDescend
        | FlightState::MainDeploy
        | FlightState::MainDescend => 10,
    }
}

/// `logger_rate_hz` expressed as a period, for driving a `Ticker`.
pub fn logger_interval_ms(state: FlightState) -> u32 {
    1000 / logger_rate_hz(state)
}

/// One CSV row's worth of shared state, sampled at the logger's cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LogRow {
    pub seq: u32,
    pub millis: u32,
    pub state: FlightState,
    pub acc_x_ms2: f32,
    pub acc_y_ms2: f32,
    pub acc_z_ms2: f32,
    pub fused_velocity_ms: f32,
    pub fused_altitude_m: f32,
    pub pressure_hpa: f32,
    pub servo_a_angle_deg: f32,
    pub cpu_temp_c: f32,
}

impl LogRow {
    /// Serializes this row as a single LF-terminated CSV line, with no
    /// header and no trailing CR.
    pub fn format(&self) -> String<MAX_ROW_LEN> {
        let mut out = String::new();
        let _ = write!(
            out,
            "MFC,{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.3},{:.2},{:.2}\n",
            self.seq,
            self.millis,
            self.state.name(),
            self.acc_x_ms2,
            self.acc_y_ms2,
            self.acc_z_ms2,
            self.fused_velocity_ms,
            self.fused_altitude_m,
            self.pressure_hpa,
            self.servo_a_angle_deg,
            self.cpu_temp_c,
        );
        out
    }
}

/// Narrow append-only storage boundary the logger writes through. The SD
/// card's block layer and FAT driver are concrete hardware and out of
/// scope; this trait is the contract firmware wires a real card to, and
/// what the cadence/naming/row-format logic above is tested against.
pub trait LogSink {
    type Error;

    /// True if a file matching `log_file_name(n)` already exists.
    fn exists(&mut self, n: u32) -> bool;
    /// Creates (or truncates) and opens `log_file_name(n)` for appending.
    fn create(&mut self, n: u32) -> Result<(), Self::Error>;
    /// Appends raw bytes (one formatted row) to the open file.
    fn append(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    /// Commits buffered writes to the backing store.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Picks the boot-time log file index against a live `LogSink` and opens
/// it. Pure orchestration over the trait above plus `lowest_unused_index`.
pub fn open_boot_log_file<S: LogSink>(sink: &mut S) -> Result<u32, S::Error> {
    let n = lowest_unused_index(|n| sink.exists(n));
    sink.create(n)?;
    Ok(n)
}

/// Finds the lowest positive integer `n` for which `exists(n)` is false —
/// the boot-time rule for picking a monotonically-named log file without
/// overwriting a previous flight's log.
pub fn lowest_unused_index(exists: impl Fn(u32) -> bool) -> u32 {
    let mut n = 1u32;
    while exists(n) {
        n += 1;
    }
    n
}

/// Builds `<LOG_PREFIX><n>.<LOG_EXT>` for a given index.
pub fn log_file_name(n: u32) -> String<MAX_NAME_LEN> {
    let mut out = String::new();
    let _ = write!(out, "{}{}.{}", LOG_PREFIX, n, LOG_EXT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_matches_table_for_every_state() {
        assert_eq!(logger_rate_hz(FlightState::Startup), 1);
        assert_eq!(logger_rate_hz(FlightState::IdleSafe), 1);
        assert_eq!(logger_rate_hz(FlightState::Landed), 1);
        assert_eq!(logger_rate_hz(FlightState::RecoveredSafe), 1);
        assert_eq!(logger_rate_hz(FlightState::Armed), 5);
        assert_eq!(logger_rate_hz(FlightState::PadPreop), 5);
        assert_eq!(logger_rate_hz(FlightState::Powered), 20);
        assert_eq!(logger_rate_hz(FlightState::Coasting), 20);
        assert_eq!(logger_rate_hz(FlightState::DrogueDeploy), 10);
        assert_eq!(logger_rate_hz(FlightState::DrogueDescend), 10);
        assert_eq!(logger_rate_hz(FlightState::MainDeploy), 10);
        assert_eq!(logger_rate_hz(FlightState::MainDescend), 10);
    }

    #[test]
    fn interval_is_inverse_of_rate() {
        assert_eq!(logger_interval_ms(FlightState::Powered), 50);
        assert_eq!(logger_interval_ms(FlightState::Startup), 1000);
        assert_eq!(logger_interval_ms(FlightState::DrogueDescend), 100);
    }

    #[test]
    fn row_formats_as_lf_terminated_csv_with_no_header() {
        let row = LogRow {
            seq: 42,
            millis: 1234,
            state: FlightState::Coasting,
            acc_x_ms2: 0.1,
            acc_y_ms2: -0.2,
            acc_z_ms2: 9.8,
            fused_velocity_ms: 12.5,
            fused_altitude_m: 305.25,
            pressure_hpa: 972.123,
            servo_a_angle_deg: 180.0,
            cpu_temp_c: 28.4,
        };
        let formatted = row.format();
        assert!(formatted.starts_with("MFC,42,1234,COASTING,"));
        assert!(formatted.ends_with('\n'));
        assert!(!formatted.contains('\r'));
    }

    #[test]
    fn lowest_unused_index_skips_existing_files() {
        let taken = [1u32, 2, 3];
        let idx = lowest_unused_index(|n| taken.contains(&n));
        assert_eq!(idx, 4);
    }

    #[test]
    fn lowest_unused_index_is_one_when_nothing_exists() {
        let idx = lowest_unused_index(|_| false);
        assert_eq!(idx, 1);
    }

    #[test]
    fn file_name_matches_prefix_index_extension_convention() {
        let name = log_file_name(7);
        assert_eq!(name.as_str(), "MFC_LOGGER_7.CSV");
    }

    struct MockSink {
        existing: std::vec::Vec<u32>,
        created: Option<u32>,
    }

    impl LogSink for MockSink {
        type Error = ();

        fn exists(&mut self, n: u32) -> bool {
            self.existing.contains(&n)
        }

        fn create(&mut self, n: u32) -> Result<(), ()> {
            self.created = Some(n);
            Ok(())
        }

        fn append(&mut self, _bytes: &[u8]) -> Result<(), ()> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn open_boot_log_file_picks_and_creates_lowest_unused_index() {
        let mut sink = MockSink { existing: std::vec![1, 2], created: None };
        let n = open_boot_log_file(&mut sink).unwrap();
        assert_eq!(n, 3);
        assert_eq!(sink.created, Some(3));
    }
}
