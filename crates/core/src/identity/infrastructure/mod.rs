pub mod json_lookup_loader;
pub mod json_report_writer;
