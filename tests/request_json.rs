use serde_json::json;

use userstate::engine::Diagnostic;
use userstate::model::Span;
use userstate::request::{EvaluationReport, EvaluationRequest};

fn request(value: serde_json::Value) -> EvaluationRequest {
    serde_json::from_value(value).expect("valid request")
}

#[test]
fn feasible_request_round_trip() {
    let req = request(json!({
        "horizon": { "start": 0, "end": 5 },
        "queryId": 1,
        "queries": [
            { "id": 1, "transforms": { "needs": [
                { "collectionName": "test", "find": { "response": 42 }, "wait": true }
            ] } },
            { "id": 66, "name": "provider", "transforms": { "inserts": [
                { "collectionName": "test", "doc": { "response": 42 } }
            ] } }
        ],
        "potentials": [{
            "queryId": 66,
            "potentialId": 1,
            "duration": { "min": 1, "target": 1 },
            "pressure": 1.0,
            "isSplittable": false,
            "places": [{ "start": 2, "end": 3 }]
        }]
    }));
    let report = req.run();
    assert!(report.is_feasible());

    let out = serde_json::to_value(&report).unwrap();
    assert_eq!(out, json!({ "status": "feasible", "ranges": [{ "start": 3, "end": 5 }] }));
}

#[test]
fn seeded_request_uses_existing_documents() {
    let req = request(json!({
        "seed": [{ "collectionName": "test", "data": [{ "response": 42 }] }],
        "horizon": { "start": 0, "end": 5 },
        "queryId": 1,
        "queries": [{ "id": 1, "transforms": { "needs": [
            { "collectionName": "test", "find": { "response": 42 }, "wait": true }
        ] } }]
    }));
    assert_eq!(
        req.run(),
        EvaluationReport::Feasible {
            ranges: vec![Span::new(0, 5)]
        }
    );
}

#[test]
fn infeasible_request_lists_diagnostics() {
    let req = request(json!({
        "horizon": { "start": 0, "end": 5 },
        "queryId": 1,
        "queries": [{ "id": 1, "transforms": {
            "needs": [{ "collectionName": "test", "wait": true }],
            "inserts": [{ "collectionName": "out", "doc": {}, "wait": true }]
        } }]
    }));
    let report = req.run();
    let EvaluationReport::Infeasible { diagnostics } = &report else {
        panic!("expected infeasible, got {report:?}");
    };
    assert_eq!(diagnostics.len(), 2);
    assert!(matches!(diagnostics[0], Diagnostic::NeedUnmet { .. }));
    assert!(matches!(diagnostics[1], Diagnostic::OutputUnconsumed { .. }));

    let out = serde_json::to_value(&report).unwrap();
    assert_eq!(out["status"], "infeasible");
    assert_eq!(out["diagnostics"][0]["kind"], "needUnmet");
    assert_eq!(out["diagnostics"][0]["span"], json!({ "start": 0, "end": 5 }));
    assert_eq!(out["diagnostics"][1]["kind"], "outputUnconsumed");
    assert_eq!(out["diagnostics"][1]["ranges"], json!([{ "start": 0, "end": 0 }]));
    assert_eq!(out["diagnostics"][1]["transform"]["kind"], "insert");

    let back: EvaluationReport = serde_json::from_value(out).unwrap();
    assert_eq!(back, report);
}

#[test]
fn empty_horizon_is_rejected() {
    let req = request(json!({
        "horizon": { "start": 4, "end": 4 },
        "queryId": 1,
        "queries": [{ "id": 1 }]
    }));
    let report = req.run();
    assert_eq!(
        report,
        EvaluationReport::Rejected {
            message: "invalid span [4, 4)".into()
        }
    );
}

#[test]
fn consumed_output_names_consumer() {
    let req = request(json!({
        "horizon": { "start": 0, "end": 10 },
        "queryId": 2,
        "queries": [
            { "id": 1, "transforms": { "needs": [{ "collectionName": "test", "find": { "response": "42" } }] } },
            { "id": 2, "transforms": { "inserts": [
                { "collectionName": "test", "doc": { "response": "42" }, "quantity": 2, "wait": true }
            ] } }
        ],
        "potentials": [{
            "queryId": 1,
            "potentialId": 1,
            "duration": { "min": 1, "target": 1 },
            "places": [{ "start": 1, "end": 2 }, { "start": 7, "end": 8 }]
        }]
    }));
    let out = serde_json::to_value(req.run()).unwrap();
    assert_eq!(out["status"], "infeasible");
    let first = &out["diagnostics"][0];
    assert_eq!(first["kind"], "outputDeadlineUnreachable");
    assert_eq!(
        first["ranges"],
        json!([{ "start": 0, "end": 1 }, { "start": 1, "end": 7 }])
    );
    assert_eq!(
        first["consumer"],
        json!({ "query": 1, "source": { "type": "potential", "potentialId": 1 }, "place": 0 })
    );
}
