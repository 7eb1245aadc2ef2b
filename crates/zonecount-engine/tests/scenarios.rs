//! End-to-end analysis scenarios.

use std::io::Write;

use tokio_util::sync::CancellationToken;
use zonecount_engine::{
    consolidate_visits, run_analysis, EngineConfig, JsonlDetectionSource, MembershipMode,
    NoopProgress, SourceInfo, VecDetectionSource,
};
use zonecount_models::{
    AnalysisRequest, CrossingDirection, Detection, Line, Point, TimelineBucket, TrackingReport,
    Zone, ZoneKind,
};

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 400.0;

/// Left half of the frame.
fn left_half(name: &str, kind: ZoneKind) -> Zone {
    Zone::new(
        name,
        kind,
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.5, 0.0),
            Point::new(0.5, 1.0),
            Point::new(0.0, 1.0),
        ],
    )
}

/// Horizontal line across the middle of the frame (y = 200 px).
fn middle_line(name: &str) -> Line {
    Line::new(name, Point::new(0.0, 0.5), Point::new(1.0, 0.5))
}

fn person(track: u64, x: f64, y: f64) -> Detection {
    Detection::centered(track, Point::new(x, y), 30.0, 80.0)
}

/// Build frames 1..=total where `f(frame)` yields that frame's detections.
fn frames(total: u64, f: impl Fn(u64) -> Vec<Detection>) -> Vec<Vec<Detection>> {
    (1..=total).map(f).collect()
}

fn run(request: &AnalysisRequest, frames: Vec<Vec<Detection>>) -> TrackingReport {
    run_with(request, frames, EngineConfig::default())
}

fn run_with(
    request: &AnalysisRequest,
    frames: Vec<Vec<Detection>>,
    config: EngineConfig,
) -> TrackingReport {
    let info = SourceInfo::new(WIDTH, HEIGHT, 30.0, frames.len() as u64);
    let mut source = VecDetectionSource::new(info, frames);
    run_analysis(
        request,
        &mut source,
        &config,
        &NoopProgress,
        &CancellationToken::new(),
    )
    .unwrap()
}

#[test]
fn test_visit_from_frame_30_to_90() {
    let request = AnalysisRequest::new(vec![left_half("counter", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(120, |f| match f {
            30..=89 => vec![person(1, 100.0, 100.0)],
            90..=120 => vec![person(1, 300.0, 100.0)],
            _ => vec![],
        }),
    );

    let visit = &report.persons[0].zone_visits[0];
    assert_eq!(visit.entry_frame, 30);
    assert_eq!(visit.exit_frame, Some(90));
    assert_eq!(visit.entry_time, "00:01");
    assert_eq!(visit.exit_time.as_deref(), Some("00:03"));
    assert_eq!(visit.duration.as_deref(), Some("00:02"));
}

#[test]
fn test_detector_loses_person_inside_zone() {
    let request = AnalysisRequest::new(vec![left_half("queue", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(60, |f| match f {
            10..=12 => vec![person(5, 100.0, 100.0)],
            _ => vec![],
        }),
    );

    let summary = &report.persons[0];
    assert_eq!(summary.last_seen, "00:00");
    let visit = &summary.zone_visits[0];
    assert_eq!(visit.entry_frame, 10);
    assert_eq!(visit.exit_frame, Some(12));
    assert_eq!(visit.duration.as_deref(), Some("00:00"));
}

#[test]
fn test_person_dropping_out_exits_while_others_are_seen() {
    let request = AnalysisRequest::new(vec![left_half("queue", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(120, |f| match f {
            1..=10 => vec![person(1, 100.0, 100.0), person(2, 300.0, 100.0)],
            11..=100 => vec![person(2, 300.0, 100.0)],
            _ => vec![person(1, 300.0, 100.0), person(2, 300.0, 100.0)],
        }),
    );

    assert_eq!(report.persons.len(), 1);
    let visit = &report.persons[0].zone_visits[0];
    assert_eq!(visit.entry_frame, 1);
    assert_eq!(visit.exit_frame, Some(11));
    assert_eq!(visit.duration.as_deref(), Some("00:00"));

    // Nobody is inside during seconds 1..3
    for bucket in &report.zones["queue"].timeline[1..3] {
        match bucket {
            TimelineBucket::Customer { count, .. } => assert_eq!(*count, 0.0),
            other => panic!("unexpected bucket {:?}", other),
        }
    }
}

#[test]
fn test_line_crossing_counted_once() {
    let request = AnalysisRequest::new(vec![], vec![middle_line("door")]);
    let report = run(
        &request,
        frames(4, |f| match f {
            // 20 px below the line, then 10 px above, then back, then above again
            1 => vec![person(1, 300.0, 220.0)],
            2 => vec![person(1, 300.0, 190.0)],
            3 => vec![person(1, 300.0, 220.0)],
            _ => vec![person(1, 300.0, 190.0)],
        }),
    );

    let door = &report.summary.line_stats["door"];
    assert_eq!(door.in_count, 1);
    assert_eq!(door.out_count, 0);
    assert_eq!(door.timeline.len(), 1);
    assert_eq!(door.timeline[0].in_count, 1);

    // Crossing only, no zone visits: counted as seen but not listed
    assert_eq!(report.summary.total_persons_seen, 1);
    assert!(report.persons.is_empty());
}

#[test]
fn test_crossing_recorded_on_person_with_visit() {
    let request = AnalysisRequest::new(
        vec![left_half("lobby", ZoneKind::Customer)],
        vec![middle_line("door")],
    );
    let report = run(
        &request,
        frames(3, |f| match f {
            1 => vec![person(9, 100.0, 180.0)],
            _ => vec![person(9, 100.0, 210.0)],
        }),
    );

    let crossings = &report.persons[0].line_crossings;
    assert_eq!(crossings.len(), 1);
    assert_eq!(crossings[0].direction, CrossingDirection::Out);
    assert_eq!(crossings[0].frame, 2);
    assert_eq!(report.summary.line_stats["door"].out_count, 1);
}

#[test]
fn test_staff_timeline_buckets() {
    let request = AnalysisRequest::new(vec![left_half("till", ZoneKind::Staff)], vec![]);
    // 10 s at 30 fps; occupied only during 5..10 s
    let report = run(
        &request,
        frames(300, |f| match f {
            150..=200 => vec![person(1, 100.0, 100.0)],
            _ => vec![],
        }),
    );

    let timeline = &report.zones["till"].timeline;
    let flags: Vec<(u64, u8)> = timeline
        .iter()
        .map(|b| match b {
            TimelineBucket::Staff {
                time_seconds,
                active,
                ..
            } => (*time_seconds, *active),
            other => panic!("unexpected bucket {:?}", other),
        })
        .collect();
    assert_eq!(flags, vec![(0, 0), (5, 1), (10, 0)]);
}

#[test]
fn test_customer_timeline_is_gapless_from_zero() {
    let request = AnalysisRequest::new(vec![left_half("queue", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(150, |f| {
            if (60..90).contains(&f) {
                vec![person(1, 50.0, 50.0), person(2, 150.0, 50.0)]
            } else {
                vec![]
            }
        }),
    );

    let timeline = &report.zones["queue"].timeline;
    let starts: Vec<u64> = timeline.iter().map(TimelineBucket::start_seconds).collect();
    assert_eq!(starts, vec![0, 1, 2, 3, 4, 5]);
    match &timeline[2] {
        TimelineBucket::Customer { count, .. } => assert_eq!(*count, 2.0),
        other => panic!("unexpected bucket {:?}", other),
    }
}

#[test]
fn test_repeat_visits_consolidate() {
    let request = AnalysisRequest::new(vec![left_half("counter", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(200, |f| match f {
            1..=30 | 100..=150 => vec![person(1, 100.0, 100.0)],
            _ => vec![person(1, 300.0, 100.0)],
        }),
    );

    let visits = &report.persons[0].zone_visits;
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].entry_frame, 1);
    assert_eq!(visits[0].exit_frame, Some(151));
    assert_eq!(report.persons[0].total_zone_visits, 1);

    // Consolidating the report output again changes nothing
    assert_eq!(&consolidate_visits(visits, 30.0), visits);
}

#[test]
fn test_finalized_visits_are_well_formed() {
    let request = AnalysisRequest::new(
        vec![
            left_half("west", ZoneKind::Customer),
            Zone::new(
                "east",
                ZoneKind::Staff,
                vec![
                    Point::new(0.5, 0.0),
                    Point::new(1.0, 0.0),
                    Point::new(1.0, 1.0),
                    Point::new(0.5, 1.0),
                ],
            ),
        ],
        vec![],
    );
    // Two people walking across the frame at different speeds
    let report = run(
        &request,
        frames(240, |f| {
            vec![
                person(1, (f as f64 * 1.5) % WIDTH, 100.0),
                person(2, WIDTH - (f as f64 * 2.5) % WIDTH, 300.0),
            ]
        }),
    );

    assert_eq!(report.summary.total_persons_seen, 2);
    for summary in &report.persons {
        let mut zones: Vec<&str> = summary.zone_visits.iter().map(|v| v.zone.as_str()).collect();
        zones.dedup();
        assert_eq!(zones.len(), summary.zone_visits.len());
        for visit in &summary.zone_visits {
            let exit = visit.exit_frame.unwrap();
            assert!(visit.entry_frame <= exit);
            let expected = zonecount_models::format_duration((exit - visit.entry_frame) as f64 / 30.0);
            assert_eq!(visit.duration.as_deref(), Some(expected.as_str()));
        }
    }
}

#[test]
fn test_box_overlap_membership() {
    let request = AnalysisRequest::new(vec![left_half("counter", ZoneKind::Customer)], vec![]);
    // Centroid 5 px right of the zone edge; a third of the 30 px box overlaps
    let frames = frames(10, |_| vec![person(1, 205.0, 100.0)]);

    let centroid = run(&request, frames.clone());
    assert!(centroid.persons.is_empty());

    let config = EngineConfig {
        membership: MembershipMode::BoxOverlap { min_fraction: 0.2 },
        ..Default::default()
    };
    let overlap = run_with(&request, frames, config);
    assert_eq!(overlap.persons.len(), 1);
    assert_eq!(overlap.summary.zone_stats["counter"], 1);
}

#[test]
fn test_zone_stats_reflect_last_frame() {
    let request = AnalysisRequest::new(vec![left_half("queue", ZoneKind::Customer)], vec![]);
    let report = run(
        &request,
        frames(20, |f| {
            if f < 20 {
                vec![person(1, 50.0, 50.0), person(2, 60.0, 300.0)]
            } else {
                vec![person(1, 50.0, 50.0)]
            }
        }),
    );
    assert_eq!(report.summary.zone_stats["queue"], 1);
    assert_eq!(report.summary.total_persons_detected, 2);
}

#[test]
fn test_jsonl_log_end_to_end() {
    let mut log = tempfile::NamedTempFile::new().unwrap();
    writeln!(log, r#"{{"width": 400, "height": 400, "fps": 0, "total_frames": 3}}"#).unwrap();
    for frame in 1..=3 {
        writeln!(
            log,
            r#"{{"frame": {}, "detections": [{{"track_id": 77, "bbox": {{"x1": 80, "y1": 80, "x2": 120, "y2": 120}}}}]}}"#,
            frame
        )
        .unwrap();
    }
    log.flush().unwrap();

    let request = AnalysisRequest::new(vec![left_half("queue", ZoneKind::Customer)], vec![]);
    let mut source = JsonlDetectionSource::open(log.path()).unwrap();
    let report = run_analysis(
        &request,
        &mut source,
        &EngineConfig::default(),
        &NoopProgress,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.video_info.fps, 30.0);
    assert_eq!(report.video_info.total_frames, 3);
    assert_eq!(report.persons[0].id, 1);
    assert_eq!(report.persons[0].zone_visits[0].exit_frame, Some(3));
}
