//! Prints each splice stage to the terminal

use crate::output;
use cplice_image::{
    Descriptor, ImageConfig, ImageRole, LayerProbe, Manifest, PublishReceipt, SpliceObserver,
};
use indicatif::ProgressBar;

/// Shows every manifest and config as JSON while the splice runs
///
/// Output is routed through the spinner so its ticks do not garble it. In
/// quiet mode only missing layers are reported.
pub struct ConsoleObserver {
    spinner: ProgressBar,
    quiet: bool,
}

impl ConsoleObserver {
    pub fn new(spinner: ProgressBar, quiet: bool) -> Self {
        Self { spinner, quiet }
    }

    fn show(&self, f: impl FnOnce()) {
        if !self.quiet {
            self.spinner.suspend(f);
        }
    }
}

impl SpliceObserver for ConsoleObserver {
    fn on_manifest(&self, role: ImageRole, manifest: &Manifest) {
        self.spinner.set_message(format!("Reading {} config", role));
        self.show(|| {
            output::header(&format!("{} manifest", role));
            output::json(manifest);
        });
    }

    fn on_config(&self, role: ImageRole, config: &ImageConfig) {
        self.show(|| {
            output::header(&format!("{} config", role));
            output::json(config);
        });
    }

    fn on_layer_probe(&self, probe: &LayerProbe) {
        if probe.exists() {
            self.show(|| output::kv(&probe.digest, probe.status.as_str()));
        } else {
            self.spinner.suspend(|| {
                output::warning(&format!("{} missing from destination ({})", probe.digest, probe.status))
            });
        }
    }

    fn on_config_stored(&self, descriptor: &Descriptor) {
        self.spinner.set_message("Publishing manifest");
        self.show(|| {
            output::header(&format!("{} config", ImageRole::New));
            output::kv("digest", &descriptor.digest);
            if let Some(size) = descriptor.size {
                output::kv("size", &size.to_string());
            }
        });
    }

    fn on_manifest_ready(&self, manifest: &Manifest, config: &ImageConfig) {
        self.show(|| {
            output::header(&format!("{} manifest", ImageRole::New));
            output::json(manifest);
            output::header(&format!("{} image config", ImageRole::New));
            output::json(config);
        });
    }

    fn on_published(&self, tag: &str, receipt: &PublishReceipt) {
        self.show(|| {
            output::header("Registry response");
            output::kv("status", &receipt.status.to_string());
            output::kv("tag", tag);
            if let Some(location) = &receipt.location {
                output::kv("location", location);
            }
            if let Some(digest) = &receipt.digest {
                output::kv("digest", digest);
            }
            if !receipt.body.is_empty() {
                println!("{}", receipt.body);
            }
        });
    }
}
