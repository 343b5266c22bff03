pub mod embedding;
pub mod face_embedder;
pub mod gallery;
pub mod gallery_matcher;
pub mod similarity;
