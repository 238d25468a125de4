/// Human-readable sizes and durations for console output.
pub mod formatters;
