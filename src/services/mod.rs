pub mod dataset;
pub mod gemini;
