use anyhow::{ensure, Result};
use batchport_backend_echo::EchoModel;
use batchport_core::{
    BackendModel, ModelSignature, PredictRequest, SchemaPolicy, Shape, Tensor, TensorMap,
    TensorValues,
};
use batchport_runtime::{merge, split, BatchError, BatchLedger, MergedBatch};
use bytes::Bytes;

fn tensor(dims: &[usize], values: TensorValues) -> Tensor {
    Tensor::new(Shape::from_slice(dims), values).expect("consistent test tensor")
}

fn single(name: &str, t: Tensor) -> TensorMap {
    let mut map = TensorMap::new();
    map.insert(name, t);
    map
}

#[test]
fn ledger_longer_than_response_is_rejected() {
    let merged = single("y", tensor(&[4, 2], TensorValues::Int32((0..8).collect())));
    let ledger = BatchLedger::from(vec![2, 3]);

    let err = split(&merged, &ledger).unwrap_err();
    match err {
        BatchError::LedgerInconsistency {
            tensor,
            expected,
            actual,
        } => {
            assert_eq!(tensor, "y");
            assert_eq!(expected, 10);
            assert_eq!(actual, 8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn leftover_elements_are_rejected_too() {
    let merged = single("y", tensor(&[3], TensorValues::Bool(vec![true, false, true])));
    let err = split(&merged, &BatchLedger::from(vec![1, 1])).unwrap_err();
    assert!(matches!(
        err,
        BatchError::LedgerInconsistency {
            expected: 2,
            actual: 3,
            ..
        }
    ));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn slices_are_contiguous_per_tensor() -> Result<()> {
    let mut merged = TensorMap::new();
    merged.insert("a", tensor(&[6, 2], TensorValues::Int64((0..12).collect())));
    merged.insert(
        "b",
        tensor(&[6], TensorValues::Float32((0..6).map(|v| v as f32).collect())),
    );
    let ledger = BatchLedger::from(vec![1, 3, 2]);

    let responses = split(&merged, &ledger)?;
    assert_eq!(responses.len(), 3);

    assert_eq!(responses[0].get("a").unwrap().values, TensorValues::Int64(vec![0, 1]));
    assert_eq!(
        responses[1].get("a").unwrap().values,
        TensorValues::Int64(vec![2, 3, 4, 5, 6, 7])
    );
    assert_eq!(
        responses[2].get("a").unwrap().values,
        TensorValues::Int64(vec![8, 9, 10, 11])
    );
    assert_eq!(responses[1].get("a").unwrap().shape, Shape::from_slice(&[3, 2]));
    assert_eq!(
        responses[2].get("b").unwrap().values,
        TensorValues::Float32(vec![4.0, 5.0])
    );

    for name in ["a", "b"] {
        let mut joined = TensorValues::empty(merged.get(name).unwrap().dtype());
        for response in &responses {
            joined.extend_from(&response.get(name).unwrap().values)?;
        }
        ensure!(joined == merged.get(name).unwrap().values, "{name} not reconstructed");
    }
    Ok(())
}

#[test]
fn strings_keep_order_and_bytes() -> Result<()> {
    let first = single(
        "q",
        tensor(&[1], TensorValues::String(vec![Bytes::from_static(b"caf\xc3\xa9")])),
    );
    let second = single(
        "q",
        tensor(&[1], TensorValues::String(vec![Bytes::from_static(b"\x00\xffbin")])),
    );
    let requests = vec![first, second];

    let MergedBatch { merged, ledger } = merge(&requests, &SchemaPolicy::FirstRequest)?;
    assert_eq!(
        merged.get("q").unwrap().values,
        TensorValues::String(vec![
            Bytes::from_static(b"caf\xc3\xa9"),
            Bytes::from_static(b"\x00\xffbin"),
        ])
    );

    let responses = split(&merged, &ledger)?;
    assert_eq!(responses, requests);
    Ok(())
}

#[test]
fn overflowing_ledger_is_inconsistent() {
    let merged = single("y", tensor(&[2, 2], TensorValues::Int32(vec![1, 2, 3, 4])));

    let huge_rows = BatchLedger::from(vec![usize::MAX, 2]);
    assert!(matches!(
        split(&merged, &huge_rows).unwrap_err(),
        BatchError::LedgerInconsistency { actual: 4, .. }
    ));

    let huge_product = BatchLedger::from(vec![usize::MAX / 2 + 1]);
    assert!(matches!(
        split(&merged, &huge_product).unwrap_err(),
        BatchError::LedgerInconsistency { actual: 4, .. }
    ));
}

#[test]
fn scalar_output_cannot_be_split() {
    let merged = single("loss", tensor(&[], TensorValues::Float32(vec![0.1])));
    let err = split(&merged, &BatchLedger::from(vec![1])).unwrap_err();
    assert!(matches!(err, BatchError::UnbatchedOutput { tensor } if tensor == "loss"));
}

#[test]
fn empty_ledger_and_map_split_to_nothing() -> Result<()> {
    let responses = split(&TensorMap::new(), &BatchLedger::default())?;
    assert!(responses.is_empty());
    Ok(())
}

#[test]
fn zero_width_rows_split_cleanly() -> Result<()> {
    let merged = single("e", tensor(&[3, 0], TensorValues::Float64(Vec::new())));
    let responses = split(&merged, &BatchLedger::from(vec![2, 1]))?;
    assert_eq!(responses[0].get("e").unwrap().shape, Shape::from_slice(&[2, 0]));
    assert_eq!(responses[1].get("e").unwrap().shape, Shape::from_slice(&[1, 0]));
    Ok(())
}

#[test]
fn identity_round_trip_reproduces_requests() -> Result<()> {
    let make = |rows: usize, seed: i64| {
        let mut map = TensorMap::new();
        map.insert(
            "dense",
            tensor(
                &[rows, 2, 2],
                TensorValues::Float64((0..rows * 4).map(|v| v as f64 + seed as f64).collect()),
            ),
        );
        map.insert(
            "ids",
            tensor(&[rows], TensorValues::Int64((0..rows as i64).map(|v| v * seed).collect())),
        );
        map.insert(
            "tokens",
            tensor(
                &[rows, 1],
                TensorValues::String(
                    (0..rows)
                        .map(|v| Bytes::from(format!("{seed}:{v}")))
                        .collect(),
                ),
            ),
        );
        map
    };
    let requests = vec![make(3, 1), make(1, 2), make(4, 3), make(2, 4)];

    let MergedBatch { merged, ledger } = merge(&requests, &SchemaPolicy::FirstRequest)?;
    let mut model = EchoModel::new(ModelSignature::default());
    let outputs = model.predict(&PredictRequest::new(merged))?;
    let responses = split(&outputs, &ledger)?;

    ensure!(responses == requests, "round trip changed the requests");
    Ok(())
}
