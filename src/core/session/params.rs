use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::core::tts::SynthesisParams;

/// Synthesis parameters shared between control handling and the synthesis worker.
///
/// Each adjustment is a single locked read-modify-write; readers take a copy.
#[derive(Debug, Clone, Default)]
pub struct SharedParams {
    inner: Arc<Mutex<SynthesisParams>>,
}

impl SharedParams {
    pub fn new(params: SynthesisParams) -> Self {
        Self {
            inner: Arc::new(Mutex::new(params)),
        }
    }

    pub fn snapshot(&self) -> SynthesisParams {
        *self.inner.lock()
    }

    pub fn adjust_volume(&self, louder: bool) -> f64 {
        let volume = self.inner.lock().adjust_volume(louder);
        info!("Volume adjusted to {:.1}", volume);
        volume
    }

    pub fn adjust_speed(&self, faster: bool) -> f64 {
        let speed = self.inner.lock().adjust_speed(faster);
        info!("Speed adjusted to {:.1}", speed);
        speed
    }
}
