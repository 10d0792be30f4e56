use std::sync::Arc;

use crate::admission::AdmissionController;
use crate::providers::TextGenerator;

// app's shared state
pub struct AppState {
    pub admission: AdmissionController,
    pub generator: Arc<dyn TextGenerator>,
}
