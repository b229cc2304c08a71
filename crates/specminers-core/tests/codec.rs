//! End-to-end tests of the declarations, trace and invariant codecs.
//!
//! The declarations fixture describes the ten ArduPilot mission commands
//! exercised by the mining workflow, each with an ENTER and an EXIT0 point.
//! Trace files are synthesised into temporary directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use proptest::prelude::*;

use specminers_core::trace::{MODIFIED, UNMODIFIED};
use specminers_core::{
    CodecError, Declarations, InvariantReader, PptKind, ProgramPoint, RepType, TraceReader,
    TraceRecord, TraceWriter, Value, VarDecl,
};

const TAKEOFF_ENTER: &str = "factory.MAV_CMD_NAV_TAKEOFF:::ENTER";
const LATITUDE: f64 = -35.3629389;
const RECORDS: usize = 16_384;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn ardu() -> Arc<Declarations> {
    Arc::new(Declarations::load(fixture("ardu.decls")).unwrap())
}

/// A plausible value for the `i`th visit, fitting the variable's type.
fn sample_value(decl: &VarDecl, i: usize) -> Value {
    match decl.rep() {
        RepType::Float if decl.name() == "latitude" => Value::Float(LATITUDE),
        RepType::Float => Value::Float(i as f64 * 0.25),
        RepType::Int => Value::Int(i as i64 % 360),
        RepType::Boolean => Value::Boolean(i % 2 == 0),
        RepType::String => Value::from("\"GUIDED\""),
    }
}

/// Writes `count` records cycling through every program point, starting at
/// the takeoff entry, each variable marked modified.
fn synthesise_trace(decls: &Arc<Declarations>, path: &Path, count: usize) {
    let mut order: Vec<Arc<ProgramPoint>> = decls.points().cloned().collect();
    let start = order
        .iter()
        .position(|ppt| ppt.name() == TAKEOFF_ENTER)
        .unwrap();
    order.rotate_left(start);

    let mut nonces: HashMap<String, u64> = HashMap::new();
    let mut writer = TraceWriter::create(Arc::clone(decls), path).unwrap();
    for i in 0..count {
        let ppt = &order[i % order.len()];
        let nonce = nonces.entry(ppt.name().to_string()).or_insert(0);
        *nonce += 1;
        let values: Vec<(String, Value)> = ppt
            .variables()
            .map(|decl| (decl.name().to_string(), sample_value(decl, i)))
            .collect();
        let record =
            TraceRecord::from_named(Arc::clone(ppt), Some(*nonce), values, MODIFIED).unwrap();
        writer.add(&record).unwrap();
    }
    writer.finish().unwrap();
}

// ---------------------------------------------------------------------------
// Declarations fixture
// ---------------------------------------------------------------------------

#[test]
fn fixture_declares_twenty_points() {
    let decls = ardu();
    assert_eq!(decls.len(), 20);

    let commands = [
        "NAV_WAYPOINT",
        "NAV_TAKEOFF",
        "NAV_LOITER_TURNS",
        "NAV_LOITER_TIME",
        "NAV_RETURN_TO_LAUNCH",
        "NAV_LAND",
        "NAV_SPLINE_WAYPOINT",
        "DO_CHANGE_SPEED",
        "DO_SET_HOME",
        "DO_PARACHUTE",
    ];
    for command in commands {
        let enter = decls
            .get(&format!("factory.MAV_CMD_{command}:::ENTER"))
            .unwrap();
        assert_eq!(enter.kind(), PptKind::Enter);
        let exit = decls
            .get(&format!("factory.MAV_CMD_{command}:::EXIT0"))
            .unwrap();
        assert_eq!(exit.kind(), PptKind::Subexit);
    }
}

#[test]
fn takeoff_entry_variables_in_order() {
    let decls = ardu();
    let names: Vec<&str> = decls
        .get(TAKEOFF_ENTER)
        .unwrap()
        .variables()
        .map(VarDecl::name)
        .collect();
    assert_eq!(
        names,
        [
            "p_alt",
            "home_latitude",
            "home_longitude",
            "altitude",
            "latitude",
            "longitude",
            "armable",
            "armed",
            "mode",
            "vx",
            "vy",
            "vz",
            "pitch",
            "yaw",
            "roll",
            "heading",
            "airspeed",
            "groundspeed",
            "ekf_ok",
        ]
    );
}

#[test]
fn fixture_survives_serialization() {
    let decls = ardu();
    let back = Declarations::parse(&decls.to_string()).unwrap();
    assert_eq!(&back, decls.as_ref());
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

#[test]
fn reads_every_synthesised_record() {
    let decls = ardu();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ardu.dtrace");
    synthesise_trace(&decls, &path, RECORDS);

    let reader = TraceReader::new(Arc::clone(&decls));
    let mut records = reader.read_file(&path).unwrap();

    let first = records.next().unwrap().unwrap();
    assert_eq!(first.ppt().name(), TAKEOFF_ENTER);
    assert_eq!(first.nonce(), Some(1));
    let latitude = first.get("latitude").unwrap();
    assert_eq!(latitude.value, &Value::Float(LATITUDE));
    assert_eq!(latitude.modified, MODIFIED);

    let mut count = 1;
    for record in records {
        let record = record.unwrap();
        assert_eq!(record.len(), record.ppt().len());
        count += 1;
    }
    assert_eq!(count, RECORDS);
}

#[test]
fn written_record_reads_back() {
    let decls = ardu();
    let ppt = Arc::clone(decls.get(TAKEOFF_ENTER).unwrap());
    let values: Vec<(String, Value)> = ppt
        .variables()
        .map(|decl| (decl.name().to_string(), sample_value(decl, 3)))
        .collect();

    let mut writer = TraceWriter::new(Arc::clone(&decls), Vec::new());
    assert_eq!(writer.write(&ppt, values.clone()).unwrap(), 1);
    let text = String::from_utf8(writer.finish().unwrap()).unwrap();

    let record = TraceReader::new(decls)
        .read_text(&text)
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(record.nonce(), Some(1));
    assert_eq!(record.get("latitude").unwrap().value, &Value::Float(LATITUDE));
    for (name, value) in &values {
        let var = record.get(name).unwrap();
        assert_eq!(var.value, value);
        assert_eq!(var.modified, UNMODIFIED);
    }
}

#[test]
fn writer_nonces_are_independent_per_point() {
    let decls = ardu();
    let land = Arc::clone(decls.get("factory.MAV_CMD_NAV_LAND:::ENTER").unwrap());
    let takeoff = Arc::clone(decls.get(TAKEOFF_ENTER).unwrap());
    let values = |ppt: &ProgramPoint| -> Vec<(String, Value)> {
        ppt.variables()
            .map(|decl| (decl.name().to_string(), sample_value(decl, 0)))
            .collect()
    };

    let mut writer = TraceWriter::new(decls, Vec::new());
    let mut seen = Vec::new();
    for ppt in [&takeoff, &land, &takeoff, &takeoff, &land] {
        seen.push(writer.write(ppt, values(ppt)).unwrap());
    }
    assert_eq!(seen, [1, 1, 2, 3, 2]);
}

#[test]
fn undeclared_point_in_trace_stops_reading() {
    let decls = ardu();
    let text = "\nfactory.MAV_CMD_DO_FLIP:::ENTER\nthis_invocation_nonce\n1\n";
    let results: Vec<_> = TraceReader::new(decls).read_text(text).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(CodecError::UnknownProgramPoint { ref name }) if name == "factory.MAV_CMD_DO_FLIP:::ENTER"
    ));
}

#[test]
fn swapped_variables_are_an_order_mismatch() {
    let decls = ardu();
    let text = "\nfactory.MAV_CMD_DO_PARACHUTE:::ENTER\nhome_latitude\n1.0\n0\np_action\n1\n0\n";
    let err = TraceReader::new(decls)
        .read_text(text)
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::VariableOrderMismatch { ref expected, ref actual, .. }
            if expected == "p_action" && actual == "home_latitude"
    ));
}

#[test]
fn second_variable_must_follow_declared_order() {
    let decls = ardu();
    let text = "\nfactory.MAV_CMD_DO_PARACHUTE:::ENTER\np_action\n2\n0\nhome_longitude\n149.16508\n0\n";
    let err = TraceReader::new(decls)
        .read_text(text)
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::VariableOrderMismatch { ref expected, ref actual, .. }
            if expected == "home_latitude" && actual == "home_longitude"
    ));
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn invariant_report_covers_fixture() {
    let decls = ardu();
    let delimiter = "=".repeat(75);
    let text = format!(
        "{delimiter}\n{TAKEOFF_ENTER}\np_alt > 0.0\narmed == false\n{delimiter}\nfactory.MAV_CMD_NAV_LAND:::EXIT0\naltitude one of {{ 0.0 }}\n"
    );
    let report = InvariantReader::new(Arc::clone(&decls))
        .read_text(&text)
        .unwrap();
    assert_eq!(report.len(), decls.len());
    assert_eq!(report.num_invariants(), 3);
    assert_eq!(report.get(TAKEOFF_ENTER).unwrap().len(), 2);
    assert!(report
        .get("factory.MAV_CMD_DO_SET_HOME:::ENTER")
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const KINDS: [PptKind; 6] = [
    PptKind::Enter,
    PptKind::Exit,
    PptKind::Class,
    PptKind::Subexit,
    PptKind::Object,
    PptKind::Point,
];
const REPS: [&str; 7] = [
    "int",
    "float",
    "boolean",
    "string",
    "hashcode",
    "double",
    "java.lang.String",
];

type VarShape = (usize, Option<i64>, Option<String>);

fn var_shape() -> impl Strategy<Value = VarShape> {
    (
        0..REPS.len(),
        proptest::option::of(-1i64..100),
        proptest::option::of("[a-zA-Z0-9 \"\\\\\n\r]{0,12}"),
    )
}

fn build_decls(shapes: &[(usize, Vec<VarShape>)]) -> Declarations {
    let points = shapes.iter().enumerate().map(|(p, (kind, vars))| {
        let vars = vars.iter().enumerate().map(|(v, (rep, comparability, constant))| {
            let rep_type = REPS[*rep];
            let mut decl = VarDecl::new(format!("v{v}"), "object", rep_type).unwrap();
            if let Some(c) = comparability {
                decl = decl.with_comparability(*c);
            }
            if let (RepType::String, Some(text)) = (decl.rep(), constant) {
                decl = decl.with_constant_value(&Value::from(text.as_str()));
            }
            decl
        });
        ProgramPoint::new(format!("module.fn{p}:::{}", KINDS[*kind]), KINDS[*kind], vars).unwrap()
    });
    Declarations::new(points.collect::<Vec<_>>()).unwrap()
}

proptest! {
    #[test]
    fn declarations_round_trip(
        shapes in proptest::collection::vec(
            (0..KINDS.len(), proptest::collection::vec(var_shape(), 0..6)),
            0..6,
        )
    ) {
        let decls = build_decls(&shapes);
        let back = Declarations::parse(&decls.to_string()).unwrap();
        prop_assert_eq!(&back, &decls);
        for ppt in decls.points() {
            for var in ppt.variables() {
                let parsed = back.get(ppt.name()).unwrap().get(var.name()).unwrap();
                prop_assert_eq!(parsed.constant_value().unwrap(), var.constant_value().unwrap());
            }
        }
    }

    #[test]
    fn float_values_round_trip(x in -1.0e9f64..1.0e9, flag in 0u8..3) {
        let ppt = ProgramPoint::new(
            "p:::ENTER",
            PptKind::Enter,
            [VarDecl::new("x", "float", "float").unwrap()],
        )
        .unwrap();
        let decls = Arc::new(Declarations::new([ppt]).unwrap());
        let ppt = Arc::clone(decls.get("p:::ENTER").unwrap());
        let record = TraceRecord::from_named(ppt, Some(9), [("x", Value::Float(x))], flag).unwrap();

        let mut writer = TraceWriter::new(Arc::clone(&decls), Vec::new());
        writer.add(&record).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let back = TraceReader::new(decls).read_text(&text).next().unwrap().unwrap();
        prop_assert_eq!(back, record);
    }
}
