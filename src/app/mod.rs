pub mod ports;
pub mod report_use_case;
