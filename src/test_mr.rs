use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::mr::{self, EngineConfig, Emitter, MRApp, MapReduce, Master, MrError, Record};
use crate::mrapps::{get_app, ii::InvertedIndex, wc::WC};
use crate::mrrt::{input, output, sequential};

const FILES: &[(&str, &str)] = &[
    ("cats.txt", "Jaguar Kitty Cheetah\nLion Jaguar\n"),
    ("dogs.txt", "Terrier Poodle Lion Beagle\n"),
    ("car.txt", "Jaguar Beetle Mustang\n"),
    ("nowisthetime.txt", "now is the time for all good men\n"),
];

fn testdata() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in FILES {
        std::fs::write(dir.path().join(name), text).unwrap();
    }
    dir
}

fn file_set(dir: &Path, values: &[String]) -> HashSet<String> {
    values
        .iter()
        .map(|v| Path::new(v).strip_prefix(dir).unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ii() {
    let dir = testdata();
    let inputs = input::dir_records(dir.path()).await.unwrap();
    let app: Arc<dyn MRApp> = Arc::new(InvertedIndex::new());

    let out = Master::new(EngineConfig::default()).run_app(app, inputs).await.unwrap();

    assert_eq!(
        file_set(dir.path(), &out["Jaguar"]),
        HashSet::from(["cats.txt".to_string(), "car.txt".to_string()])
    );
    // repeated within cats.txt, listed once
    assert_eq!(out["Jaguar"].len(), 2);
    assert_eq!(
        file_set(dir.path(), &out["Lion"]),
        HashSet::from(["cats.txt".to_string(), "dogs.txt".to_string()])
    );
    assert_eq!(file_set(dir.path(), &out["time"]), HashSet::from(["nowisthetime.txt".to_string()]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wc() {
    let dir = testdata();
    let inputs = input::dir_records(dir.path()).await.unwrap();

    let out = Master::new(EngineConfig::default()).run_app(Arc::new(WC), inputs).await.unwrap();

    assert_eq!(out["Jaguar"], vec!["3"]);
    assert_eq!(out["Lion"], vec!["2"]);
    assert_eq!(out["Poodle"], vec!["1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_matches_sequential() {
    let dir = testdata();
    for name in ["ii", "wc"] {
        let app = get_app(name).unwrap();
        let inputs = input::dir_records(dir.path()).await.unwrap();

        let expected = sequential::run(app.as_ref(), inputs.clone()).await.unwrap();
        let actual = Master::new(EngineConfig::default()).run_app(app, inputs).await.unwrap();
        assert_eq!(output::sorted(&actual), output::sorted(&expected), "app {name}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_input_fails_the_map_phase() {
    let dir = testdata();
    let mut inputs = input::dir_records(dir.path()).await.unwrap();
    let missing = dir.path().join("gone.txt").to_string_lossy().into_owned();
    inputs.push(Record::single("4", missing));

    let err = Master::new(EngineConfig::default())
        .run_app(Arc::new(InvertedIndex::new()), inputs)
        .await
        .unwrap_err();
    match err {
        MrError::WorkerFailed { faults, .. } => {
            assert_eq!(faults.len(), 1);
            assert_eq!(faults[0].key, "4");
            assert!(faults[0].to_string().contains("couldn't open file"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn facade_runs_named_app() {
    let dir = testdata();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let inputs = rt.block_on(input::dir_records(dir.path())).unwrap();
    drop(rt);

    let out = MapReduce::new(EngineConfig::default())
        .run_app(get_app("wc").unwrap(), inputs)
        .unwrap();
    assert_eq!(out["Jaguar"], vec!["3"]);
}

#[test]
fn unknown_app_is_rejected() {
    assert!(get_app("grep").is_err());
}

#[test]
fn repeated_large_runs_are_cohort_complete() {
    const N: usize = 300;
    const PER_INPUT: usize = 4;

    let map = |input: Record, emit: Emitter| async move {
        for i in 0..PER_INPUT {
            if i % 2 == 0 {
                tokio::task::yield_now().await;
            }
            emit.emit_kv(format!("bucket{}", i), input.key.clone());
        }
        Ok::<_, anyhow::Error>(())
    };
    let reduce = |input: Record, emit: Emitter| async move {
        let distinct: HashSet<_> = input.values.iter().collect();
        emit.emit_kv(input.key.clone(), input.values.len().to_string());
        emit.emit_kv(input.key, format!("distinct={}", distinct.len()));
        Ok::<_, anyhow::Error>(())
    };

    for _ in 0..20 {
        let inputs = (0..N).map(|i| Record::new(i.to_string(), vec![])).collect();
        let out = mr::run(inputs, map, reduce).unwrap();

        assert_eq!(out.len(), PER_INPUT);
        for values in out.values() {
            let mut values = values.clone();
            values.sort();
            assert_eq!(values, vec![N.to_string(), format!("distinct={N}")]);
        }
    }
}
