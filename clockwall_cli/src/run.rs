//! Assembly of sources, calibrator and runner, plus the one-shot commands.

use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel as xch;
use eyre::WrapErr;
use serde_json::json;

use clockwall_config::{Config, Settings, SettingsFile, SettingsStore};
use clockwall_core::calibration::BoxedSource;
use clockwall_core::{
    CalibrationEngine, CalibrationOutcome, CalibrationPolicy, CalibrationState, Calibrator,
    ClockError, ClockRunner, ControlEvent, Display, RenderGrid, TimeFormat,
};
use clockwall_net::SimulatedSource;
use clockwall_traits::{Clock, SystemClock};

use crate::cli::DisplayArgs;
use crate::commands::parse_command;
use crate::display::{JsonLinesDisplay, TerminalDisplay, frame_json, grid_lines, time_text};

/// Options of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub display: DisplayArgs,
    pub offline: bool,
    pub max_ticks: Option<u64>,
    pub no_persist: bool,
    pub no_input: bool,
}

/// Time sources in configured order: origin, world time API, simulated.
///
/// `offline` keeps only the simulated ones, adding a zero-skew source when
/// none is configured.
pub fn build_sources(cfg: &Config, offline: bool) -> eyre::Result<Vec<BoxedSource>> {
    let mut sources: Vec<BoxedSource> = Vec::new();

    if !offline {
        #[cfg(feature = "http")]
        {
            use clockwall_net::{HeadDateSource, WorldTimeSource};
            if let Some(url) = cfg.sources.origin() {
                let src = HeadDateSource::new(url)
                    .map_err(|e| ClockError::Config(format!("sources.origin_url: {e}")))?;
                sources.push(Box::new(src));
            }
            if let Some(url) = cfg.sources.world_time() {
                let src = WorldTimeSource::new(url)
                    .map_err(|e| ClockError::Config(format!("sources.world_time_url: {e}")))?;
                sources.push(Box::new(src));
            }
        }
        #[cfg(not(feature = "http"))]
        {
            if cfg.sources.origin().is_some() || cfg.sources.world_time().is_some() {
                tracing::warn!("built without the `http` feature; network sources skipped");
            }
        }
    }

    for (i, skew) in cfg.sources.simulated_skew_ms.iter().enumerate() {
        sources.push(Box::new(SimulatedSource::new(
            format!("simulated:{i}"),
            SystemClock::new(),
            *skew,
        )));
    }
    if offline && sources.is_empty() {
        sources.push(Box::new(SimulatedSource::new("simulated:local", SystemClock::new(), 0.0)));
    }
    if sources.is_empty() {
        return Err(eyre::Report::new(ClockError::Config(
            "no time sources enabled (set [sources] or use --offline)".to_string(),
        )));
    }
    Ok(sources)
}

pub fn settings_store(cfg: &Config, override_path: Option<&PathBuf>) -> SettingsFile {
    match override_path {
        Some(p) => SettingsFile::new(p.clone()),
        None => SettingsFile::new(&cfg.settings.path),
    }
}

/// Config defaults < persisted settings < share query < explicit flags.
pub fn effective_settings(cfg: &Config, store: &SettingsFile, args: &DisplayArgs) -> eyre::Result<Settings> {
    let persisted = store.load_or(cfg.display.to_settings());
    args.apply(persisted)
}

/// Save what a share link changes so the next start keeps it.
///
/// Explicit flags are not folded in; they stay per-invocation.
pub fn persist_share(cfg: &Config, store: &mut SettingsFile, query: &str) -> eyre::Result<bool> {
    let persisted = store.load_or(cfg.display.to_settings());
    let mut shared = persisted.clone();
    if !clockwall_config::share::apply_query(&mut shared, query) {
        return Ok(false);
    }
    let shared = shared.sanitized();
    if shared == persisted {
        return Ok(false);
    }
    store.save(&shared).wrap_err("persist share link settings")?;
    tracing::info!(share = %query, "share link settings saved");
    Ok(true)
}

fn display_for(json: bool) -> Box<dyn Display> {
    let stdout = std::io::stdout();
    if json {
        Box::new(JsonLinesDisplay::new(stdout))
    } else {
        let ansi = stdout.is_terminal();
        Box::new(TerminalDisplay::new(stdout, ansi))
    }
}

/// Forward stdin commands as control events until EOF.
fn spawn_stdin_reader(tx: xch::Sender<ControlEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                None => tracing::warn!(input = %line.trim(), "unknown command"),
            }
        }
        tracing::debug!("stdin closed");
    });
}

pub fn run_clock(
    cfg: &Config,
    settings_path: Option<&PathBuf>,
    json: bool,
    opts: &RunOptions,
) -> eyre::Result<()> {
    let mut store = settings_store(cfg, settings_path);
    let settings = effective_settings(cfg, &store, &opts.display)?;
    if !opts.no_persist
        && let Some(q) = &opts.display.share
    {
        persist_share(cfg, &mut store, q)?;
    }
    let policy = CalibrationPolicy::from(&cfg.calibration);

    let clock = SystemClock::new();
    let state = CalibrationState::shared(0.0);
    let engine = CalibrationEngine::new(build_sources(cfg, opts.offline)?, Arc::clone(&state), clock)
        .with_timeout(policy.request_timeout);
    tracing::info!(sources = ?engine.source_ids(), "time sources");

    let (tx, rx) = xch::unbounded::<ControlEvent>();
    let calibrator = Calibrator::spawn(engine, policy.interval, tx.clone());

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(ControlEvent::Shutdown);
    })
    .wrap_err("install Ctrl-C handler")?;

    if !opts.no_input {
        spawn_stdin_reader(tx.clone());
    }
    drop(tx);

    let mut builder = ClockRunner::builder()
        .with_clock(Arc::new(clock))
        .with_state(state)
        .with_settings(settings)
        .with_policy(policy)
        .with_trigger(calibrator);
    if !opts.no_persist {
        builder = builder.with_store(store);
    }
    if let Some(n) = opts.max_ticks {
        builder = builder.with_max_ticks(n);
    }
    let runner = builder.with_display(display_for(json)).build()?;

    let stats = runner.run(&rx)?;
    tracing::info!(
        ticks = stats.ticks,
        missed = stats.missed_ticks,
        calibrations = stats.calibrations,
        degraded = stats.degraded_calibrations,
        offset_ms = stats.last_offset_ms,
        "run finished"
    );
    Ok(())
}

/// One calibration pass; prints every sample. Fails when no source answered.
pub fn run_calibrate(cfg: &Config, offline: bool, json: bool) -> eyre::Result<()> {
    let policy = CalibrationPolicy::from(&cfg.calibration);
    let state = CalibrationState::shared(0.0);
    let mut engine = CalibrationEngine::new(build_sources(cfg, offline)?, state, SystemClock::new())
        .with_timeout(policy.request_timeout);
    let outcome = engine.calibrate_detailed();
    print_outcome(&outcome, json);
    if !outcome.applied {
        return Err(eyre::Report::new(ClockError::CalibrationDegraded));
    }
    Ok(())
}

fn print_outcome(outcome: &CalibrationOutcome, json: bool) {
    if json {
        let samples: Vec<_> = outcome
            .samples
            .iter()
            .map(|s| {
                json!({
                    "source": s.source_id,
                    "ok": s.succeeded,
                    "offset_ms": s.succeeded.then_some(s.raw_offset_ms),
                    "rtt_ms": s.round_trip_ms,
                    "failure": s.failure.map(|k| k.as_str()),
                })
            })
            .collect();
        println!(
            "{}",
            json!({
                "offset_ms": outcome.offset_ms,
                "applied": outcome.applied,
                "samples": samples,
            })
        );
        return;
    }
    for s in &outcome.samples {
        match s.failure {
            None => println!(
                "{:<48} ok      offset {:>+10.1} ms  rtt {:>7.1} ms",
                s.source_id, s.raw_offset_ms, s.round_trip_ms
            ),
            Some(kind) => println!("{:<48} failed  {kind}", s.source_id),
        }
    }
    if outcome.applied {
        println!("offset: {:+.1} ms", outcome.offset_ms);
    } else {
        println!("offset: unchanged (no source answered)");
    }
}

/// Parse `--at`: RFC 3339 or integer epoch milliseconds.
pub fn parse_instant(raw: &str) -> eyre::Result<f64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms as f64);
    }
    let dt = chrono::DateTime::parse_from_rfc3339(raw).map_err(|e| {
        ClockError::Config(format!("--at expects RFC 3339 or epoch ms, got {raw:?}: {e}"))
    })?;
    Ok(dt.timestamp_millis() as f64)
}

pub fn run_digits(
    cfg: &Config,
    settings_path: Option<&PathBuf>,
    json: bool,
    at: Option<&str>,
    grid: bool,
    display: &DisplayArgs,
) -> eyre::Result<()> {
    let store = settings_store(cfg, settings_path);
    let settings = effective_settings(cfg, &store, display)?;
    let ms = match at {
        Some(raw) => parse_instant(raw)?,
        None => SystemClock::new().wall_ms(),
    };
    let frame = RenderGrid::new().render(ms, &TimeFormat::from(&settings));

    if json {
        let mut v = frame_json(&frame, &settings);
        if !grid && let Some(obj) = v.as_object_mut() {
            obj.remove("faces");
        }
        println!("{v}");
        return Ok(());
    }
    println!("{}", time_text(&frame));
    if grid {
        for line in grid_lines(&frame) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_share(
    cfg: &Config,
    settings_path: Option<&PathBuf>,
    json: bool,
    base: Option<&str>,
    display: &DisplayArgs,
) -> eyre::Result<()> {
    let store = settings_store(cfg, settings_path);
    let settings = effective_settings(cfg, &store, display)?;
    let query = clockwall_config::share::to_query(&settings);
    let url = match base {
        Some(b) => Some(
            clockwall_config::share::share_url(b, &settings)
                .map_err(|e| ClockError::Config(format!("--base: {e}")))?,
        ),
        None => None,
    };
    if json {
        println!("{}", json!({ "query": query, "url": url }));
    } else {
        println!("{}", url.unwrap_or(query));
    }
    Ok(())
}
