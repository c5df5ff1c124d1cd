// Consultant documents: S3-backed uploads, text extraction, CV analysis.

pub mod handlers;
pub mod service;
pub mod storage;
