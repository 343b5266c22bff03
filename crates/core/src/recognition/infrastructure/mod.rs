pub mod face_alignment;
pub mod image_gallery_loader;
pub mod onnx_arcface_embedder;
