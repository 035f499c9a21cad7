//! Unit tests for index build orchestration.

use super::*;
use crate::http::TransportError;
use crate::source::MockReleaseSource;
use crate::test_utils::{FetchFailure, StubFetcher, StubReleaseSource, asset, release, sha256_hex};
use camino::Utf8PathBuf;
use rstest::rstest;

fn output_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    (temp, path)
}

fn options(root: &Utf8Path, jobs: usize, failure_policy: FailurePolicy) -> BuildOptions<'_> {
    BuildOptions {
        output_root: root,
        jobs,
        retry: RetryPolicy::none(),
        failure_policy,
    }
}

fn read(path: Utf8PathBuf) -> String {
    std::fs::read_to_string(path.as_std_path()).expect("read file")
}

fn demo_fixture() -> (StubReleaseSource, StubFetcher) {
    let source = StubReleaseSource::new(vec![release(
        "v1.0",
        vec![
            asset("demo-1.0-py3-none-any.whl", 500),
            asset("demo-1.0.tar.gz", 400),
        ],
    )]);
    let fetcher = StubFetcher::new()
        .with_body("stub://demo-1.0-py3-none-any.whl", vec![1u8; 500])
        .with_body("stub://demo-1.0.tar.gz", vec![2u8; 400]);
    (source, fetcher)
}

#[test]
fn demo_release_produces_complete_tree() {
    let (_temp, root) = output_root();
    let (source, fetcher) = demo_fixture();

    let report = build_index(
        &source,
        &fetcher,
        &YankTable::new(),
        &options(&root, DEFAULT_JOBS, FailurePolicy::Abort),
    )
    .expect("build succeeds");

    assert_eq!(report.packages, [PackageKey::new("demo")]);
    assert_eq!(report.artifacts, 2);
    assert_eq!(report.yanked, 0);

    let root_index = read(root.join("index.html"));
    assert!(root_index.contains("<a href=\"demo/\">demo</a>"));

    let demo_index = read(root.join("demo").join("index.html"));
    let anchors: Vec<&str> = demo_index.lines().filter(|l| l.contains("<a ")).collect();
    assert_eq!(anchors.len(), 2);
    assert!(!demo_index.contains("data-yanked"));

    for (filename, size) in [("demo-1.0-py3-none-any.whl", 500), ("demo-1.0.tar.gz", 400)] {
        let path = root.join("demo").join(filename);
        let metadata = std::fs::metadata(path.as_std_path()).expect("artifact stored");
        assert_eq!(metadata.len(), size);
        let digest = sha256_hex(&std::fs::read(path.as_std_path()).expect("read artifact"));
        assert!(demo_index.contains(&format!("{filename}#sha256={digest}\"")));
    }
}

#[test]
fn assets_without_a_package_directory_stay_out_of_the_tree() {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().join("dist")).expect("UTF-8 path");
    let source = StubReleaseSource::new(vec![release(
        "v1.0",
        vec![
            asset("-1.0.tar.gz", 3),
            asset("../escape-1.0.tar.gz", 3),
            asset("demo-1.0.tar.gz", 3),
        ],
    )]);
    let fetcher = StubFetcher::new()
        .with_body("stub://-1.0.tar.gz", b"bad".to_vec())
        .with_body("stub://../escape-1.0.tar.gz", b"bad".to_vec())
        .with_body("stub://demo-1.0.tar.gz", b"ok!".to_vec());

    let report = build_index(
        &source,
        &fetcher,
        &YankTable::new(),
        &options(&root, 2, FailurePolicy::Abort),
    )
    .expect("build succeeds");

    assert_eq!(report.packages, [PackageKey::new("demo")]);
    assert_eq!(fetcher.opened(), ["stub://demo-1.0.tar.gz"]);
    let root_index = read(root.join("index.html"));
    assert!(!root_index.contains("href=\"/\""), "{root_index}");
    assert!(root_index.contains("<a href=\"demo/\">demo</a>"));
    assert!(!root.join("-1.0.tar.gz").exists());
    assert!(!temp.path().join("escape-1.0.tar.gz").exists());
}

#[rstest]
#[case(1)]
#[case(8)]
fn rerun_is_byte_identical_regardless_of_jobs(#[case] jobs: usize) {
    let (_temp, root) = output_root();
    let source = StubReleaseSource::new(vec![
        release("v2", vec![asset("beta-2.0.tar.gz", 3), asset("alpha-2.0.tar.gz", 3)]),
        release("v1", vec![asset("gamma-1.0.tar.gz", 3), asset("alpha-1.0.tar.gz", 3)]),
    ]);
    let fetcher = StubFetcher::new()
        .with_body("stub://alpha-1.0.tar.gz", b"a10".to_vec())
        .with_body("stub://alpha-2.0.tar.gz", b"a20".to_vec())
        .with_body("stub://beta-2.0.tar.gz", b"b20".to_vec())
        .with_body("stub://gamma-1.0.tar.gz", b"g10".to_vec());
    let yanks: YankTable = [("alpha", "1.0")].into_iter().collect();
    let opts = options(&root, jobs, FailurePolicy::Abort);

    build_index(&source, &fetcher, &yanks, &opts).expect("first build");
    let first: Vec<String> = ["index.html", "alpha/index.html", "beta/index.html", "gamma/index.html"]
        .iter()
        .map(|p| read(root.join(p)))
        .collect();

    let report = build_index(&source, &fetcher, &yanks, &opts).expect("second build");
    let second: Vec<String> = ["index.html", "alpha/index.html", "beta/index.html", "gamma/index.html"]
        .iter()
        .map(|p| read(root.join(p)))
        .collect();

    assert_eq!(first, second);
    assert_eq!(report.yanked, 1);
    let keys: Vec<&str> = report.packages.iter().map(PackageKey::as_str).collect();
    assert_eq!(keys, ["alpha", "beta", "gamma"]);
}

#[test]
fn duplicate_filename_renders_single_entry_from_first_release() {
    let (_temp, root) = output_root();
    let mut newer = asset("pkg-1.0.tar.gz", 5);
    newer.download_locator = "stub://newer".to_owned();
    let mut older = asset("pkg-1.0.tar.gz", 5);
    older.download_locator = "stub://older".to_owned();
    let source = StubReleaseSource::new(vec![
        release("v1.0-rebuild", vec![newer]),
        release("v1.0", vec![older]),
    ]);
    let fetcher = StubFetcher::new()
        .with_body("stub://newer", b"newer".to_vec())
        .with_body("stub://older", b"older".to_vec());

    build_index(
        &source,
        &fetcher,
        &YankTable::new(),
        &options(&root, 2, FailurePolicy::Abort),
    )
    .expect("build succeeds");

    let index = read(root.join("pkg").join("index.html"));
    assert_eq!(index.matches(">pkg-1.0.tar.gz<").count(), 1);
    assert!(index.contains(&sha256_hex(b"newer")));
    assert_eq!(fetcher.opened(), ["stub://newer"]);
}

#[test]
fn yanked_version_is_marked_in_package_index() {
    let (_temp, root) = output_root();
    let source = StubReleaseSource::new(vec![release(
        "v2.11.0",
        vec![
            asset("confluent_kafka-2.11.0+gr-py3-none-any.whl", 2),
            asset("confluent_kafka-2.11.0-py3-none-any.whl", 2),
        ],
    )]);
    let fetcher = StubFetcher::new()
        .with_body("stub://confluent_kafka-2.11.0+gr-py3-none-any.whl", b"gr".to_vec())
        .with_body("stub://confluent_kafka-2.11.0-py3-none-any.whl", b"ok".to_vec());
    let yanks: YankTable = [("confluent-kafka", "2.11.0+gr")].into_iter().collect();

    let report = build_index(
        &source,
        &fetcher,
        &yanks,
        &options(&root, 1, FailurePolicy::Abort),
    )
    .expect("build succeeds");

    assert_eq!(report.yanked, 1);
    let index = read(root.join("confluent-kafka").join("index.html"));
    let yanked_line = index
        .lines()
        .find(|l| l.contains(">confluent_kafka-2.11.0+gr-py3-none-any.whl<"))
        .expect("yanked link");
    assert!(yanked_line.contains("data-yanked=\"true\""));
    let kept_line = index
        .lines()
        .find(|l| l.contains(">confluent_kafka-2.11.0-py3-none-any.whl<"))
        .expect("kept link");
    assert!(!kept_line.contains("data-yanked"));
}

#[test]
fn download_failure_aborts_without_publishing() {
    let (_temp, root) = output_root();
    let (source, _) = demo_fixture();
    let fetcher = StubFetcher::new()
        .with_body("stub://demo-1.0-py3-none-any.whl", vec![1u8; 500])
        .with_failure(
            "stub://demo-1.0.tar.gz",
            FetchFailure::Transport(TransportError::Unauthorized {
                url: "stub://demo-1.0.tar.gz".to_owned(),
                status: 403,
            }),
        );

    let err = build_index(
        &source,
        &fetcher,
        &YankTable::new(),
        &options(&root, DEFAULT_JOBS, FailurePolicy::Abort),
    )
    .expect_err("download failure aborts");

    assert!(matches!(err, IndexError::Download { ref filename, .. } if filename == "demo-1.0.tar.gz"));
    assert!(!root.join("index.html").exists());
    assert!(!root.join("demo").join("index.html").exists());
}

#[test]
fn skip_policy_drops_only_the_failing_package() {
    let (_temp, root) = output_root();
    let source = StubReleaseSource::new(vec![release(
        "v1",
        vec![asset("good-1.0.tar.gz", 4), asset("bad-1.0.tar.gz", 4)],
    )]);
    let fetcher = StubFetcher::new().with_body("stub://good-1.0.tar.gz", b"good".to_vec());
    std::fs::create_dir_all(root.join("bad").as_std_path()).expect("create stale dir");
    std::fs::write(root.join("bad").join("index.html").as_std_path(), "stale").expect("stale");

    let report = build_index(
        &source,
        &fetcher,
        &YankTable::new(),
        &options(&root, 2, FailurePolicy::SkipPackage),
    )
    .expect("build continues");

    assert_eq!(report.packages, [PackageKey::new("good")]);
    assert_eq!(report.skipped.len(), 1);
    let skipped = report.skipped.first().expect("one skipped");
    assert_eq!(skipped.key.as_str(), "bad");
    assert!(matches!(skipped.error, IndexError::Download { .. }));

    let root_index = read(root.join("index.html"));
    assert!(root_index.contains("good/"));
    assert!(!root_index.contains("bad/"));
    assert!(!root.join("bad").join("index.html").exists());
}

#[test]
fn source_failure_aborts_before_touching_output() {
    let (_temp, root) = output_root();
    let output = root.join("dist");
    let mut source = MockReleaseSource::new();
    source.expect_list_releases().returning(|| {
        Err(crate::source::SourceError::Transport(
            TransportError::Timeout {
                url: "https://api.example.test/releases".to_owned(),
            },
        ))
    });

    let err = build_index(
        &source,
        &StubFetcher::new(),
        &YankTable::new(),
        &options(&output, 1, FailurePolicy::SkipPackage),
    )
    .expect_err("listing failure aborts");

    assert!(matches!(err, IndexError::Source(_)));
    assert!(!output.exists());
}

#[test]
fn empty_source_writes_empty_root_index() {
    let (_temp, root) = output_root();
    let source = StubReleaseSource::new(vec![release("v1", vec![asset("notes.txt", 1)])]);

    let report = build_index(
        &source,
        &StubFetcher::new(),
        &YankTable::new(),
        &options(&root, 1, FailurePolicy::Abort),
    )
    .expect("build succeeds");

    assert!(report.packages.is_empty());
    let root_index = read(root.join("index.html"));
    assert!(!root_index.contains("<a "));
}

#[test]
fn plan_lists_distinct_artifacts_without_downloading() {
    let source = StubReleaseSource::new(vec![
        release("v2", vec![asset("demo-2.0.tar.gz", 1), asset("demo-1.0.tar.gz", 1)]),
        release("v1", vec![asset("demo-1.0.tar.gz", 1)]),
    ]);
    let yanks: YankTable = [("demo", "2.0")].into_iter().collect();

    let planned = plan(&source, &yanks).expect("plan succeeds");

    assert_eq!(
        planned,
        [PlannedPackage {
            key: PackageKey::new("demo"),
            artifacts: vec![
                ("demo-1.0.tar.gz".to_owned(), "1.0".to_owned(), false),
                ("demo-2.0.tar.gz".to_owned(), "2.0".to_owned(), true),
            ],
        }]
    );
    assert_eq!(source.calls(), 1);
}
