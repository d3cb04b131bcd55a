//! lexicamd - periodic object detection daemon
//!
//! This daemon:
//! 1. Loads configuration (LEXICAM_CONFIG + LEXICAM_* overrides)
//! 2. Opens the frame source and the detector backend
//! 3. Runs a detection cycle every interval, dropping ticks while busy
//! 4. Optionally saves detected categories to the vocabulary

use anyhow::{anyhow, Result};
use std::sync::mpsc;
use std::sync::Arc;

use lexicam::config::LexicamConfig;
use lexicam::detect::registry_from_settings;
use lexicam::{
    open_source, AliasTable, CycleContext, CycleOutcome, DetectionScheduler, DetectionSession,
    SqliteKeyValueStore, Vocabulary,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LexicamConfig::load()?;
    log::info!(
        "lexicamd {} starting (source {}, backend {}, interval {:?})",
        env!("CARGO_PKG_VERSION"),
        config.source.url,
        config.detection.backend,
        config.detection.interval
    );

    let aliases = match &config.aliases_path {
        Some(path) => AliasTable::load(path)?,
        None => AliasTable::default_expansions(),
    };

    let registry =
        registry_from_settings(&config.detection, config.source.width, config.source.height)?;
    let backend = registry.default_backend()?;

    let mut source = open_source(&config.source.url, config.source.width, config.source.height)?;
    source.connect()?;

    let mut vocabulary = if config.autosave {
        let store = SqliteKeyValueStore::open(&config.db_path)?;
        let vocabulary = Vocabulary::load(store)?;
        log::info!(
            "autosave enabled: {} words in {}",
            vocabulary.len(),
            config.db_path
        );
        Some(vocabulary)
    } else {
        None
    };

    let session = DetectionSession::new(Some(backend), config.postprocess, aliases).into_shared();

    let cycle_session = Arc::clone(&session);
    let detect_fn = move |ctx: &CycleContext| -> Result<()> {
        let mut session = cycle_session
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?;
        match session.run_cycle(source.as_mut(), &|| ctx.is_running())? {
            CycleOutcome::Committed(count) => {
                log::info!("{}", session.status());
                for det in session.detections() {
                    log::debug!(
                        "  {} {:.0}% at ({:.0}, {:.0}) {:.0}x{:.0}",
                        det.display_label(),
                        det.score() * 100.0,
                        det.bbox().x,
                        det.bbox().y,
                        det.bbox().width,
                        det.bbox().height
                    );
                }
                if let Some(vocabulary) = vocabulary.as_mut() {
                    for det in session.detections() {
                        vocabulary.add(det.category())?;
                    }
                }
                log::trace!("cycle committed {} detections", count);
            }
            CycleOutcome::FrameNotReady => log::debug!("frame not ready, cycle skipped"),
            CycleOutcome::Discarded => {}
        }
        Ok(())
    };
    let report_fn = |err: anyhow::Error| log::warn!("detection cycle failed: {:#}", err);

    let mut scheduler = DetectionScheduler::new();
    scheduler.start(config.detection.interval, detect_fn, report_fn)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    log::info!("lexicamd waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping detection...");

    scheduler.stop();
    if let Ok(mut session) = session.lock() {
        session.clear();
    }
    let stats = scheduler.stats();
    log::info!(
        "lexicamd stopped: ticks={} dispatched={} skipped_busy={} failures={}",
        stats.ticks,
        stats.dispatched,
        stats.skipped_busy,
        stats.failures
    );
    Ok(())
}
