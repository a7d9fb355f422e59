//! A splice observer that records what it sees

use cplice_image::{Descriptor, ImageConfig, ImageRole, LayerProbe, Manifest, PublishReceipt, SpliceObserver};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
    pub stored_configs: Mutex<Vec<Descriptor>>,
    pub probes: Mutex<Vec<LayerProbe>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl SpliceObserver for RecordingObserver {
    fn on_manifest(&self, role: ImageRole, _manifest: &Manifest) {
        self.record(format!("{}-manifest", role));
    }

    fn on_config(&self, role: ImageRole, _config: &ImageConfig) {
        self.record(format!("{}-config", role));
    }

    fn on_layer_probe(&self, probe: &LayerProbe) {
        self.probes.lock().unwrap().push(probe.clone());
    }

    fn on_config_stored(&self, descriptor: &Descriptor) {
        self.record("config-stored".to_string());
        self.stored_configs.lock().unwrap().push(descriptor.clone());
    }

    fn on_manifest_ready(&self, _manifest: &Manifest, _config: &ImageConfig) {
        self.record("manifest-ready".to_string());
    }

    fn on_published(&self, tag: &str, _receipt: &PublishReceipt) {
        self.record(format!("published:{}", tag));
    }
}
