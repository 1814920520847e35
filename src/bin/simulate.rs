use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use wormy_sim::constants::{BLINKING_CAP, MIN_WORM_LEN, TICK_RATE};
use wormy_sim::engine::{init_session, WorldState};
use wormy_sim::rng::Rng;
use wormy_sim::score::final_score;
use wormy_sim::types::{Cell, Direction, GameOverReason, RuntimeEvent, Snapshot, WormId};
use wormy_sim::world::Grid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Wormy sessions driven by a scripted pilot")]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    sessions: u32,
    #[arg(long, default_value_t = 180)]
    max_seconds: u32,
    #[arg(long, value_enum, default_value_t = Policy::Greedy)]
    policy: Policy,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Policy {
    /// Never steer; the worm runs into the first wall ahead.
    Idle,
    /// Head for the apple along safe cells.
    Greedy,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventCounters {
    #[serde(rename = "applesEaten")]
    apples_eaten: u32,
    #[serde(rename = "poisonEaten")]
    poison_eaten: u32,
    #[serde(rename = "blinkingSpawned")]
    blinking_spawned: u32,
    #[serde(rename = "blinkingExpired")]
    blinking_expired: u32,
    #[serde(rename = "secondWormSpawned")]
    second_worm_spawned: bool,
    #[serde(rename = "secondWormDied")]
    second_worm_died: bool,
}

#[derive(Clone, Debug, Serialize)]
struct SessionResultLine {
    session: u32,
    seed: u32,
    policy: Policy,
    reason: Option<GameOverReason>,
    #[serde(rename = "durationSeconds")]
    duration_seconds: f64,
    ticks: u64,
    #[serde(rename = "baseScore")]
    base_score: i32,
    #[serde(rename = "blinkingItemsEaten")]
    blinking_items_eaten: u32,
    #[serde(rename = "finalScore")]
    final_score: i32,
    #[serde(flatten)]
    counters: EventCounters,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct SessionRunResult {
    #[serde(flatten)]
    result: SessionResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "sessionCount")]
    session_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationSeconds")]
    average_duration_seconds: f64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    sessions: Vec<SessionResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Scripted stand-in for the keyboard.
struct Autopilot {
    policy: Policy,
    rng: Rng,
}

impl Autopilot {
    fn new(policy: Policy, seed: u32) -> Self {
        Self {
            policy,
            rng: Rng::new(seed),
        }
    }

    fn choose(&mut self, world: &WorldState) -> Option<Direction> {
        match self.policy {
            Policy::Idle => None,
            Policy::Greedy => self.choose_greedy(world),
        }
    }

    fn choose_greedy(&mut self, world: &WorldState) -> Option<Direction> {
        let worm = world.primary();
        let head = worm.head();
        let target = world.apple();
        let grid = world.grid();
        let poison = world.poison_cells();

        let safe: Vec<(Direction, i32)> = Direction::ALL
            .into_iter()
            .filter(|dir| *dir != worm.dir().opposite())
            .filter_map(|dir| {
                let next = head.offset(dir);
                let blocked =
                    !grid.contains(next) || worm.contains(next) || poison.contains(&next);
                (!blocked).then(|| (dir, manhattan(next, target)))
            })
            .collect();
        let best = safe.iter().map(|(_, dist)| *dist).min()?;
        let candidates: Vec<Direction> = safe
            .into_iter()
            .filter(|(_, dist)| *dist == best)
            .map(|(dir, _)| dir)
            .collect();
        self.rng.pick(&candidates)
    }
}

fn main() {
    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let run_started_at = timestamp_now();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, Utc::now().timestamp_millis()));
    let mut has_anomaly = false;
    let mut session_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_seconds = 0.0f64;
    let mut total_anomalies = 0usize;

    for index in 0..cli.sessions {
        let seed = base_seed.wrapping_add(index);
        emit_log(
            "info",
            "session_started",
            &run_id,
            Some(index),
            Some(seed),
            None,
            json!({
                "policy": cli.policy,
                "maxSeconds": cli.max_seconds,
            }),
        );
        let session_run = run_session(index, seed, cli.policy, cli.max_seconds);

        for anomaly in &session_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(index),
                Some(seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !session_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += session_run.anomaly_records.len();
        total_duration_seconds += session_run.result.duration_seconds;
        *reason_counts
            .entry(reason_key(session_run.result.reason).to_string())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "session_finished",
            &run_id,
            Some(index),
            Some(seed),
            Some(session_run.result.ticks),
            json!({
                "reason": session_run.result.reason,
                "durationSeconds": session_run.result.duration_seconds,
                "finalScore": session_run.result.final_score,
                "anomalyCount": session_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&session_run.result).expect("session result should serialize")
        );
        session_results.push(session_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at,
        timestamp_now(),
        session_results,
        reason_counts,
        total_anomalies,
        total_duration_seconds,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
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
        None,
        None,
        None,
        json!({
            "sessionCount": summary.session_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationSeconds": summary.average_duration_seconds,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_session(index: u32, seed: u32, policy: Policy, max_seconds: u32) -> SessionRunResult {
    let mut world = init_session(seed);
    let mut pilot = Autopilot::new(policy, seed.rotate_left(16) ^ 0x5bd1_e995);
    let grid = world.grid();
    let max_ticks = max_seconds as u64 * TICK_RATE as u64;

    let mut counters = EventCounters::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut outcome = None;
    let mut tick = 0u64;

    while tick < max_ticks {
        tick += 1;
        let command = pilot.choose(&world);
        let elapsed = tick as f64 / TICK_RATE as f64;
        outcome = world.step(elapsed, command);

        let snapshot = world.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, grid) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        tally_events(&mut counters, &snapshot.events);

        if outcome.is_some() {
            break;
        }
    }

    let (base_score, blinking_items_eaten) = match outcome {
        Some(record) => (record.base_score, record.blinking_items_eaten),
        None => (world.base_score(), world.blinking_items_eaten()),
    };

    SessionRunResult {
        result: SessionResultLine {
            session: index,
            seed,
            policy,
            reason: outcome.map(|record| record.reason),
            duration_seconds: world.game_time(),
            ticks: world.tick(),
            base_score,
            blinking_items_eaten,
            final_score: final_score(base_score, blinking_items_eaten),
            counters,
            anomalies,
        },
        anomaly_records,
    }
}

fn tally_events(counters: &mut EventCounters, events: &[RuntimeEvent]) {
    for event in events {
        match event {
            RuntimeEvent::AppleEaten {
                by: WormId::Primary,
            } => counters.apples_eaten += 1,
            RuntimeEvent::PoisonEaten { .. } => counters.poison_eaten += 1,
            RuntimeEvent::BlinkingSpawned { .. } => counters.blinking_spawned += 1,
            RuntimeEvent::BlinkingExpired { .. } => counters.blinking_expired += 1,
            RuntimeEvent::SecondWormSpawned { .. } => counters.second_worm_spawned = true,
            RuntimeEvent::SecondWormDied => counters.second_worm_died = true,
            _ => {}
        }
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, grid: Grid) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.blinking.len() > BLINKING_CAP {
        anomalies.push(format!(
            "blinking cap exceeded: {} active",
            snapshot.blinking.len()
        ));
    }

    let expected = final_score(snapshot.base_score, snapshot.blinking_items_eaten);
    if snapshot.score != expected {
        anomalies.push(format!(
            "score mismatch: shown {} expected {expected}",
            snapshot.score
        ));
    }

    if snapshot.primary.body.len() < MIN_WORM_LEN {
        anomalies.push(format!(
            "primary worm below minimum length: {}",
            snapshot.primary.body.len()
        ));
    }
    if let Some(secondary) = &snapshot.secondary {
        if secondary.body.len() < MIN_WORM_LEN {
            anomalies.push(format!(
                "second worm below minimum length: {}",
                secondary.body.len()
            ));
        }
        if secondary.body.iter().any(|cell| !grid.contains(*cell)) {
            anomalies.push("second worm outside grid".to_string());
        }
    }

    // A fatal wall hit legitimately leaves the head outside.
    if snapshot.game_over.is_none() && snapshot.primary.body.iter().any(|cell| !grid.contains(*cell))
    {
        anomalies.push("primary worm outside grid".to_string());
    }
    anomalies
}

fn manhattan(a: Cell, b: Cell) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("wormy-{seed}-{timestamp_ms}")
}

fn reason_key(reason: Option<GameOverReason>) -> &'static str {
    match reason {
        Some(GameOverReason::Collision) => "collision",
        Some(GameOverReason::PoisonExhaustion) => "poison_exhaustion",
        None => "time_limit",
    }
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    sessions: Vec<SessionResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_seconds: f64,
) -> RunSummary {
    let session_count = sessions.len();
    let average_duration_seconds = if session_count == 0 {
        0.0
    } else {
        total_duration_seconds / session_count as f64
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        session_count,
        anomaly_count,
        average_duration_seconds,
        reason_counts,
        sessions,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    session: Option<u32>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: timestamp_now(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        session,
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wormy_sim::types::WormView;

    fn make_session_result(reason: Option<GameOverReason>, duration: f64) -> SessionResultLine {
        SessionResultLine {
            session: 0,
            seed: 42,
            policy: Policy::Greedy,
            reason,
            duration_seconds: duration,
            ticks: (duration * TICK_RATE as f64) as u64,
            base_score: 0,
            blinking_items_eaten: 0,
            final_score: 0,
            counters: EventCounters::default(),
            anomalies: Vec::new(),
        }
    }

    fn make_snapshot() -> Snapshot {
        Snapshot {
            tick: 1,
            game_time: 0.1,
            blink_visible: true,
            primary: WormView {
                body: vec![Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)],
                dir: Direction::Right,
            },
            secondary: None,
            apple: Cell::new(9, 9),
            poison: Vec::new(),
            blinking: Vec::new(),
            base_score: 0,
            blinking_items_eaten: 0,
            score: 0,
            game_over: None,
            events: Vec::new(),
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "wormy-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "wormy-42-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![
                make_session_result(Some(GameOverReason::Collision), 20.0),
                make_session_result(None, 40.0),
            ],
            BTreeMap::from([
                ("collision".to_string(), 1usize),
                ("time_limit".to_string(), 1usize),
            ]),
            0,
            60.0,
        );
        assert_eq!(summary.average_duration_seconds, 30.0);
        assert_eq!(summary.session_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("wormy-missing-{}", Utc::now().timestamp_millis()))
            .join("summary.json");
        let summary = build_run_summary(
            "wormy-1-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![make_session_result(None, 10.0)],
            BTreeMap::from([("time_limit".to_string(), 1usize)]),
            0,
            10.0,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn clean_snapshot_has_no_anomalies() {
        assert!(collect_snapshot_anomalies(&make_snapshot(), Grid::default()).is_empty());
    }

    #[test]
    fn score_mismatch_and_short_worm_are_reported() {
        let mut snapshot = make_snapshot();
        snapshot.score = 5;
        snapshot.primary.body.truncate(2);
        let anomalies = collect_snapshot_anomalies(&snapshot, Grid::default());
        assert_eq!(anomalies.len(), 2);
    }

    #[test]
    fn reason_keys_cover_every_outcome() {
        assert_eq!(reason_key(Some(GameOverReason::Collision)), "collision");
        assert_eq!(
            reason_key(Some(GameOverReason::PoisonExhaustion)),
            "poison_exhaustion"
        );
        assert_eq!(reason_key(None), "time_limit");
    }

    #[test]
    fn idle_session_ends_at_the_right_wall() {
        let run = run_session(0, 77, Policy::Idle, 60);
        assert_eq!(run.result.reason, Some(GameOverReason::Collision));
        assert!(run.result.anomalies.is_empty());
    }

    #[test]
    fn greedy_pilot_never_steers_into_a_wall() {
        for seed in 0..50u32 {
            let world = init_session(seed);
            let mut pilot = Autopilot::new(Policy::Greedy, seed);
            if let Some(dir) = pilot.choose(&world) {
                let next = world.primary().head().offset(dir);
                assert!(world.grid().contains(next));
                assert!(!world.primary().contains(next));
            }
        }
    }
}
