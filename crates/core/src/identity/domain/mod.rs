pub mod consolidator_session;
pub mod identity_key;
pub mod identity_record;
pub mod label_resolver;
pub mod match_result;
pub mod report_writer;
pub mod session_report;
pub mod session_reporter;
