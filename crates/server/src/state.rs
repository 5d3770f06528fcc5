use pdfrag_rag::RagPipeline;

pub struct AppState {
    pub pipeline: RagPipeline,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline }
    }
}
