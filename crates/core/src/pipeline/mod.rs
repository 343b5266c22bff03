pub mod frame_analyzer;
pub mod identify_faces_use_case;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
