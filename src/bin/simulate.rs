use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use shadow_maze::collision::overlaps_wall;
use shadow_maze::config::{load_options, GameOptions};
use shadow_maze::constants::{ghost_queue_key, ACTOR_PX, FIELD_PX, READY_SENTINEL};
use shadow_maze::devices::{Peripherals, Renderer, ShadowLink, TiltSensor};
use shadow_maze::engine::Game;
use shadow_maze::shadow_store::ShadowStore;
use shadow_maze::sound::{PatternPlayer, ToneOutput};
use shadow_maze::transport::{response_body, ShadowEndpoint, ShadowRequest};
use shadow_maze::types::{Axis, Color, Direction, GameEvent, GamePhase};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Polls the loopback link needs before a response is delivered.
    #[arg(long)]
    latency: Option<u32>,
    /// Ghost that takes remote queues.
    #[arg(long)]
    ghost: Option<usize>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

const DEFAULT_TICKS: u64 = 3_000;
const DEFAULT_LATENCY: u32 = 3;
const TILT_HOLD_TICKS: u64 = 24;
const LATE_FRAME_CHANCE: f64 = 0.05;

#[derive(Clone, Debug, Default, Serialize)]
struct RunCounters {
    rounds: u32,
    caught: u32,
    cleared: u32,
    #[serde(rename = "pointsEaten")]
    points_eaten: u32,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "exchangesStarted")]
    exchanges_started: u32,
    #[serde(rename = "exchangesResolved")]
    exchanges_resolved: u32,
    #[serde(rename = "exchangesTimedOut")]
    exchanges_timed_out: u32,
    #[serde(rename = "sendsRejected")]
    sends_rejected: u32,
    #[serde(rename = "queuesIssued")]
    queues_issued: u32,
    #[serde(rename = "queuesAccepted")]
    queues_accepted: u32,
    #[serde(rename = "droppedFrames")]
    dropped_frames: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    seed: u32,
    ticks: u64,
    #[serde(rename = "latencyPolls")]
    latency_polls: u32,
    #[serde(rename = "selectedGhost")]
    selected_ghost: usize,
    #[serde(rename = "finalPhase")]
    final_phase: GamePhase,
    #[serde(rename = "finalScore")]
    final_score: u32,
    counters: RunCounters,
    #[serde(rename = "drawCalls")]
    draw_calls: BTreeMap<String, u64>,
    #[serde(rename = "notesPlayed")]
    notes_played: u64,
    #[serde(rename = "storeVersion")]
    store_version: u64,
    #[serde(rename = "supersededResponses")]
    superseded_responses: u32,
    #[serde(rename = "bytesSent")]
    bytes_sent: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

#[derive(Default)]
struct CountingRenderer {
    calls: BTreeMap<String, u64>,
}

impl CountingRenderer {
    fn count(&mut self, kind: &str) {
        *self.calls.entry(kind.to_string()).or_insert(0) += 1;
    }
}

impl Renderer for CountingRenderer {
    fn clear(&mut self, _color: Color) {
        self.count("clear");
    }

    fn draw_tile(&mut self, _cell_x: usize, _cell_y: usize, _color: Color) {
        self.count("tile");
    }

    fn draw_actor(&mut self, _x: i32, _y: i32, _size: i32, _color: Color) {
        self.count("actor");
    }

    fn draw_text(&mut self, _x: i32, _y: i32, _text: &str, _color: Color) {
        self.count("text");
    }
}

/// Holds a random tilt for a fixed number of ticks before picking another.
struct ScriptedTilt {
    rng: StdRng,
    reading: (u8, u8),
    held: u64,
}

impl ScriptedTilt {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            reading: (0, 0),
            held: 0,
        }
    }

    fn advance(&mut self) {
        if self.held > 0 {
            self.held -= 1;
            return;
        }
        self.held = TILT_HOLD_TICKS;
        self.reading = match self.rng.random_range(0..5) {
            0 => (0, 55),
            1 => (55, 0),
            2 => (200, 0),
            3 => (0, 200),
            _ => (0, 0),
        };
    }
}

impl TiltSensor for ScriptedTilt {
    fn read_axis(&mut self, axis: Axis) -> u8 {
        match axis {
            Axis::X => self.reading.0,
            Axis::Y => self.reading.1,
        }
    }
}

#[derive(Default)]
struct NoteCounter {
    notes: u64,
}

impl ToneOutput for NoteCounter {
    fn set_frequency(&mut self, _hz: u32) {
        self.notes += 1;
    }

    fn stop(&mut self) {}
}

/// In-process stand-in for the shadow service. Requests are applied to the
/// store at once; the HTTP response is handed back only after `latency`
/// polls. A new request drops a response the device gave up on.
struct LoopbackLink {
    endpoint: ShadowEndpoint,
    store: ShadowStore,
    latency: u32,
    in_flight: Option<(u32, Vec<u8>)>,
    rejected_updates: u32,
    superseded: u32,
    bytes_sent: u64,
}

impl LoopbackLink {
    fn new(endpoint: ShadowEndpoint, latency: u32) -> Self {
        Self {
            endpoint,
            store: ShadowStore::new(),
            latency,
            in_flight: None,
            rejected_updates: 0,
            superseded: 0,
            bytes_sent: 0,
        }
    }

    fn http_response(status: &str, body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }
}

impl ShadowLink for LoopbackLink {
    fn transmit(&mut self, request: &ShadowRequest) -> Option<()> {
        if self.in_flight.take().is_some() {
            self.superseded += 1;
        }
        let wire = request.to_http(&self.endpoint);
        self.bytes_sent += wire.len() as u64;
        let body = response_body(wire.as_bytes());
        let response = match request {
            ShadowRequest::Publish(_) => match self.store.apply_update(&body) {
                Ok(_) => Self::http_response("200 OK", &self.store.render()),
                Err(error) => {
                    self.rejected_updates += 1;
                    let body = json!({ "message": error.to_string() }).to_string();
                    Self::http_response("400 Bad Request", &body)
                }
            },
            ShadowRequest::Poll => Self::http_response("200 OK", &self.store.render()),
        };
        self.in_flight = Some((self.latency, response));
        Some(())
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        let (remaining, _) = self.in_flight.as_mut()?;
        if *remaining > 0 {
            *remaining -= 1;
            return None;
        }
        self.in_flight.take().map(|(_, response)| response)
    }
}

/// Remote operator: answers a ghost's ready sentinel with a fresh random
/// queue in the reported section.
struct RemoteController {
    rng: StdRng,
    ghost: usize,
}

impl RemoteController {
    fn new(seed: u64, ghost: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ghost,
        }
    }

    fn step(&mut self, store: &mut ShadowStore) -> Option<String> {
        let key = ghost_queue_key(self.ghost);
        if store.desired(&key) != Some(READY_SENTINEL) || store.reported(&key).is_some() {
            return None;
        }
        let length = self.rng.random_range(3..=8);
        let queue: String = (0..length)
            .map(|_| Direction::ALL[self.rng.random_range(0..4usize)].code())
            .collect();
        store.set_reported(&key, &queue);
        Some(queue)
    }
}

fn main() {
    let cli = Cli::parse();
    let mut options = match cli.config.as_ref() {
        Some(path) => match load_options(path) {
            Ok(options) => options,
            Err(error) => {
                eprintln!("[simulate] {error}");
                std::process::exit(2);
            }
        },
        None => GameOptions::default(),
    };
    if let Some(seed) = cli.seed {
        options.seed = seed;
    }
    if let Some(ghost) = cli.ghost {
        options.sync.selected_ghost = ghost;
    }
    let ticks = cli.ticks.unwrap_or(DEFAULT_TICKS);
    let latency = cli.latency.unwrap_or(DEFAULT_LATENCY);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(options.seed, now_ms()));

    let summary = match run_simulation(&options, ticks, latency, &run_id) {
        Ok(summary) => summary,
        Err(message) => {
            emit_log("error", "run_failed", &run_id, None, json!({ "message": message }));
            std::process::exit(2);
        }
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "message": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        Some(summary.ticks),
        json!({
            "anomalyCount": summary.anomalies.len(),
            "summaryOut": summary_out_written,
        }),
    );
    println!(
        "{}",
        serde_json::to_string(&summary).expect("run summary should serialize")
    );
    if !summary.anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn run_simulation(
    options: &GameOptions,
    ticks: u64,
    latency: u32,
    run_id: &str,
) -> Result<RunSummary, String> {
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut game = Game::new(options.clone()).map_err(|error| error.to_string())?;
    let seed = u64::from(options.seed);
    let mut frame_rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    let mut renderer = CountingRenderer::default();
    let mut tilt = ScriptedTilt::new(seed);
    let mut audio = PatternPlayer::new(options.note_ticks);
    let mut tone = NoteCounter::default();
    let mut link = LoopbackLink::new(options.sync.endpoint.clone(), latency);
    let mut remote = RemoteController::new(seed.wrapping_add(1), options.sync.selected_ghost);
    let mut counters = RunCounters::default();
    let mut anomalies = Vec::new();

    emit_log(
        "info",
        "run_started",
        run_id,
        None,
        json!({
            "seed": options.seed,
            "ticks": ticks,
            "latencyPolls": latency,
            "selectedGhost": options.sync.selected_ghost,
        }),
    );

    while game.tick_count() < ticks {
        let elapsed_ms = if frame_rng.random_bool(LATE_FRAME_CHANCE) {
            options.tick_ms * 5 / 2
        } else {
            options.tick_ms
        };
        let plan = {
            let mut io = Peripherals {
                renderer: &mut renderer,
                tilt: &mut tilt,
                audio: &mut audio,
                link: &mut link,
            };
            game.run_frame(elapsed_ms, &mut io)
        };
        counters.dropped_frames += u64::from(plan.dropped);
        for _ in 0..plan.ticks {
            tilt.advance();
            audio.tick(&mut tone);
        }

        if let Some(queue) = remote.step(&mut link.store) {
            counters.queues_issued += 1;
            emit_log(
                "info",
                "queue_issued",
                run_id,
                Some(game.tick_count()),
                json!({ "ghost": remote.ghost, "queue": queue }),
            );
        }

        for event in game.drain_events() {
            record_event(&event, &mut counters, run_id, game.tick_count());
        }
        counters.best_score = counters.best_score.max(game.score());

        for message in collect_anomalies(&game) {
            if !anomalies.contains(&message) {
                emit_log(
                    "warn",
                    "anomaly_detected",
                    run_id,
                    Some(game.tick_count()),
                    json!({ "message": message }),
                );
                anomalies.push(message);
            }
        }
    }

    if link.rejected_updates > 0 {
        anomalies.push(format!(
            "shadow store rejected {} device updates",
            link.rejected_updates
        ));
    }

    Ok(RunSummary {
        run_id: run_id.to_string(),
        started_at,
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        seed: options.seed,
        ticks: game.tick_count(),
        latency_polls: latency,
        selected_ghost: options.sync.selected_ghost,
        final_phase: game.phase(),
        final_score: game.score(),
        counters,
        draw_calls: renderer.calls,
        notes_played: tone.notes,
        store_version: link.store.version(),
        superseded_responses: link.superseded,
        bytes_sent: link.bytes_sent,
        anomalies,
    })
}

fn record_event(event: &GameEvent, counters: &mut RunCounters, run_id: &str, tick: u64) {
    match event {
        GameEvent::PhaseChanged { to, .. } => {
            if *to == GamePhase::Playing {
                counters.rounds += 1;
            }
        }
        GameEvent::PointEaten { .. } => counters.points_eaten += 1,
        GameEvent::PlayerCaught { .. } => counters.caught += 1,
        GameEvent::LevelCleared { .. } => counters.cleared += 1,
        GameEvent::QueueAccepted { .. } => counters.queues_accepted += 1,
        GameEvent::ExchangeStarted { .. } => counters.exchanges_started += 1,
        GameEvent::ExchangeResolved { .. } => counters.exchanges_resolved += 1,
        GameEvent::ExchangeTimedOut { .. } => counters.exchanges_timed_out += 1,
        GameEvent::SendRejected { .. } => counters.sends_rejected += 1,
    }
    if !matches!(
        event,
        GameEvent::PointEaten { .. }
            | GameEvent::ExchangeStarted { .. }
            | GameEvent::ExchangeResolved { .. }
    ) {
        emit_log(
            "info",
            "game_event",
            run_id,
            Some(tick),
            serde_json::to_value(event).unwrap_or(Value::Null),
        );
    }
}

fn collect_anomalies(game: &Game) -> Vec<String> {
    let mut anomalies = Vec::new();
    let player = game.player_pos();
    if overlaps_wall(game.grid(), player) {
        anomalies.push(format!("player overlaps a wall at {},{}", player.x, player.y));
    }
    let limit = FIELD_PX - ACTOR_PX;
    if player.x < 0 || player.y < 0 || player.x > limit || player.y > limit {
        anomalies.push(format!("player left the field at {},{}", player.x, player.y));
    }
    for ghost in game.ghosts() {
        if overlaps_wall(game.grid(), ghost.pos) {
            anomalies.push(format!("ghost {} overlaps a wall", ghost.id));
        }
        if ghost.pos.x % ACTOR_PX != 0 && ghost.pos.y % ACTOR_PX != 0 {
            anomalies.push(format!("ghost {} left its rail", ghost.id));
        }
    }
    anomalies
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn emit_log(level: &str, event: &str, run_id: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_maze::shadow::encode;

    fn quiet_options(seed: u32) -> GameOptions {
        GameOptions {
            seed,
            title_ticks: 2,
            game_over_ticks: 4,
            ..GameOptions::default()
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(7, 1234), "sim-7-1234");
    }

    #[test]
    fn loopback_delivers_after_latency() {
        let mut link = LoopbackLink::new(ShadowEndpoint::default(), 2);
        assert!(link.transmit(&ShadowRequest::Poll).is_some());
        assert!(link.poll_receive().is_none());
        assert!(link.transmit(&ShadowRequest::Poll).is_some());
        assert_eq!(link.superseded, 1);
        assert!(link.poll_receive().is_none());
        assert!(link.poll_receive().is_none());
        let response = link.poll_receive().expect("response should arrive");
        assert!(String::from_utf8_lossy(&response).starts_with("HTTP/1.1 200 OK"));
        assert!(link.poll_receive().is_none());
        assert!(link.transmit(&ShadowRequest::Poll).is_some());
    }

    #[test]
    fn loopback_applies_publish_to_store() {
        let mut link = LoopbackLink::new(ShadowEndpoint::default(), 0);
        let doc = encode([("pac_loc", "4 4"), ("b1_q", "ready")]);
        link.transmit(&ShadowRequest::Publish(doc));
        assert_eq!(link.store.desired("pac_loc"), Some("4 4"));
        assert!(link.poll_receive().is_some());
        assert_eq!(link.rejected_updates, 0);
    }

    #[test]
    fn controller_answers_ready_once() {
        let mut store = ShadowStore::new();
        let mut remote = RemoteController::new(9, 0);
        assert_eq!(remote.step(&mut store), None);

        store
            .apply_update(&encode([("b1_q", "ready")]))
            .expect("update should apply");
        let queue = remote.step(&mut store).expect("ready ghost should get a queue");
        assert!((3..=8).contains(&queue.len()));
        assert!(queue.chars().all(|code| ('0'..='3').contains(&code)));
        assert_eq!(store.reported("b1_q"), Some(queue.as_str()));
        assert_eq!(remote.step(&mut store), None);
    }

    #[test]
    fn simulation_exchanges_queues_without_anomalies() {
        let summary = run_simulation(&quiet_options(11), 2_000, 2, "test-run")
            .expect("simulation should run");
        assert!(summary.ticks >= 2_000);
        assert!(summary.anomalies.is_empty(), "{:?}", summary.anomalies);
        assert!(summary.counters.rounds >= 1);
        assert!(summary.counters.exchanges_started > 10);
        assert!(summary.counters.exchanges_resolved > 10);
        assert!(summary.counters.queues_issued >= 1);
        assert!(summary.counters.queues_accepted >= 1);
        assert!(summary.draw_calls.get("tile").copied().unwrap_or(0) >= 1024);
    }

    #[test]
    fn same_seed_gives_same_run() {
        let first = run_simulation(&quiet_options(5), 600, 1, "a").expect("run should succeed");
        let second = run_simulation(&quiet_options(5), 600, 1, "b").expect("run should succeed");
        assert_eq!(first.final_score, second.final_score);
        assert_eq!(first.counters.points_eaten, second.counters.points_eaten);
        assert_eq!(first.store_version, second.store_version);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let summary = run_simulation(&quiet_options(1), 10, 0, "w").expect("run should succeed");
        let target = std::env::temp_dir()
            .join("shadow-maze-missing-dir")
            .join("nested")
            .join("summary.json");
        assert!(write_summary(&target, &summary).is_err());
    }
}
