//! Direct upload CLI
//!
//! Uploads one local file through the signing backend straight to the bucket.

use bytesize::ByteSize;
use clap::{Arg, ArgAction, Command};
use cos_direct_upload::{
    init_logging, select_media, ClientConfig, FailureKind, FsMediaInfo, LogLevel, PathPicker,
    TaskState, UploadMode, UploadOptions, UploadProgress, UploadReceipt, UploadSink, Uploader,
};
use std::io::Write;
use std::sync::Arc;

struct ConsoleSink;

impl UploadSink for ConsoleSink {
    fn on_progress(&self, progress: UploadProgress) {
        eprint!("\r  {}", progress);
        let _ = std::io::stderr().flush();
    }

    fn on_task_state(&self, state: &TaskState) {
        log::debug!(
            "task state: {} [{}] {}",
            state.path,
            state.response_code,
            state.message
        );
    }

    fn on_success(&self, receipt: &UploadReceipt) {
        eprintln!();
        println!(
            "Uploaded {} to {} in {} ms",
            ByteSize::b(receipt.size),
            receipt.url,
            receipt.duration_ms
        );
    }

    fn on_failure(&self, kind: FailureKind, detail: &str) {
        eprintln!();
        eprintln!("Upload failed ({}): {}", kind, detail);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("cos_upload")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload a file straight to object storage using signed credentials")
        .arg(
            Arg::new("file")
                .help("Path of the file to upload")
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("Transfer mode")
                .value_parser(["buffered", "supervised", "auto"])
                .default_value("auto"),
        )
        .arg(
            Arg::new("sign-url")
                .long("sign-url")
                .help("Base URL of the signing backend (overrides COS_SIGN_URL)"),
        )
        .arg(
            Arg::new("scheme")
                .long("scheme")
                .help("Scheme for storage PUTs")
                .value_parser(["https", "http"]),
        )
        .arg(
            Arg::new("staging-dir")
                .long("staging-dir")
                .help("Directory for staged copies (overrides COS_STAGING_DIR)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = matches.get_one::<String>("sign-url") {
        config = config.signing_base_url(url);
    }
    if let Some(scheme) = matches.get_one::<String>("scheme") {
        config = config.storage_scheme(scheme);
    }
    if let Some(dir) = matches.get_one::<String>("staging-dir") {
        config = config.staging_dir(dir);
    }
    if matches.get_flag("verbose") {
        config = config.log_level(LogLevel::Debug);
    }
    init_logging(config.log_level);

    let mode: UploadMode = matches
        .get_one::<String>("mode")
        .map(|mode| mode.parse())
        .transpose()?
        .unwrap_or_default();
    let path = matches
        .get_one::<String>("file")
        .ok_or("No file provided. Use --help for usage information.")?;

    let media = match select_media(&PathPicker::new(path), &FsMediaInfo).await? {
        Some(media) => media,
        None => {
            eprintln!("Not a readable file: {}", path);
            std::process::exit(1);
        }
    };

    println!(
        "Uploading {} ({}, {} mode)",
        media.display_name(),
        ByteSize::b(media.size_bytes()),
        mode
    );

    let uploader = Uploader::new(config)?;
    let outcome = uploader
        .upload(
            &media,
            UploadOptions::new().mode(mode).sink(Arc::new(ConsoleSink)),
        )
        .await;

    if !outcome.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
