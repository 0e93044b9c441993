//! Classify a local image with Visual Recognition, optionally exporting the
//! Core ML model of a custom classifier.
//!
//! ```text
//! cargo run --example classify_image -- --config watson.toml fruitbowl.jpg [classifier-id]
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;
use watson_sdk::services::VisualRecognitionV3;
use watson_sdk::services::visual_recognition::ClassifyOptions;
use watson_sdk::{FilePart, RetryPolicy, SdkConfig, with_retry};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("watson_sdk=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from("watson.toml");
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = args
                    .next()
                    .map(PathBuf::from)
                    .context("--config requires a path argument")?;
            }
            _ => positional.push(arg),
        }
    }
    let Some(image) = positional.first() else {
        bail!("usage: classify_image [--config <path>] <image> [classifier-id]");
    };
    let classifier_id = positional.get(1);

    let config = SdkConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let vr = VisualRecognitionV3::from_settings(config.service("visual_recognition")?)?;

    let file = FilePart::from_path("images_file", image).await?;
    let mut options = ClassifyOptions::file(file).with_threshold(0.5);
    if let Some(id) = classifier_id {
        options = options.with_classifier_ids([id.as_str()]);
    }

    let policy = RetryPolicy::new();
    let classified = with_retry(&policy, || vr.classify(options.clone())).await?;
    for image in &classified.result.images {
        for classifier in &image.classifiers {
            for class in &classifier.classes {
                println!("{}\t{}\t{:.3}", classifier.name, class.class_name, class.score);
            }
        }
    }

    if let Some(id) = classifier_id {
        let model = vr.get_core_ml_model(id).await?;
        let out = PathBuf::from(format!("{id}.mlmodel"));
        tokio::fs::write(&out, &model.result).await?;
        tracing::info!(path = %out.display(), bytes = model.result.len(), "Core ML model saved");
    }
    Ok(())
}
