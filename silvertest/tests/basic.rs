// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests against a scripted stand-in for the silver compiler.
//!
//! The fake compiler reads `# fake:` directives from the test source to
//! decide whether to fail compilation, which diagnostic to print, what exit
//! code the produced program returns, and whether to produce a program at
//! all. It also drops a lock file next to the artifact for the duration of a
//! compile, so two concurrent compiles of the same test would be detected.

#![cfg(unix)]

use camino_tempfile::Utf8TempDir;
use pretty_assertions::assert_eq;
use silvertest::{
    config::HarnessConfig,
    executor::OutcomeStatus,
    runner::{RunResults, RunStats, TestRunnerOpts},
    test_list::TestList,
};
use std::os::unix::fs::PermissionsExt;

static FAKE_COMPILER: &str = r#"#!/bin/sh
src="$1"
out="${src%.sl}"

if grep -q '^# fake: hang' "$src"; then
    sleep 3
fi

if [ -e "$out.lock" ]; then
    echo "concurrent compile detected for $out"
    exit 3
fi
touch "$out.lock"
trap 'rm -f "$out.lock"' EXIT
sleep 0.05

if grep -q '^# fake: fail-compile' "$src"; then
    sed -n 's/^# fake: diagnostic //p' "$src"
    exit 1
fi

if grep -q '^# fake: no-artifact' "$src"; then
    exit 0
fi

code=$(sed -n 's/^# fake: exit-code //p' "$src" | head -n 1)
: "${code:=50}"
if [ "$2" = "-optimize" ]; then
    ocode=$(sed -n 's/^# fake: exit-code-optimized //p' "$src" | head -n 1)
    [ -n "$ocode" ] && code="$ocode"
fi

printf '#!/bin/sh\nexit %s\n' "$code" > "$out"
chmod +x "$out"
exit 0
"#;

struct Fixture {
    // Held for its Drop impl, which removes the temp dir.
    _dir: Utf8TempDir,
    config: HarnessConfig,
}

fn fixture(programs: &[(&str, &str)]) -> Fixture {
    let dir = Utf8TempDir::new().expect("created temp dir");

    let compiler = dir.path().join("fakesilver");
    fs_err::write(&compiler, FAKE_COMPILER).expect("wrote fake compiler");
    let mut perms = fs_err::metadata(&compiler)
        .expect("read metadata")
        .permissions();
    perms.set_mode(0o755);
    fs_err::set_permissions(&compiler, perms).expect("set permissions");

    let programs_dir = dir.path().join("programs");
    fs_err::create_dir(&programs_dir).expect("created programs dir");
    for (name, contents) in programs {
        fs_err::write(programs_dir.join(name), contents).expect("wrote test program");
    }

    let config = HarnessConfig {
        compiler,
        programs_dir,
        timeout_secs: 30,
        ..HarnessConfig::default()
    };
    Fixture { _dir: dir, config }
}

fn run(fixture: &Fixture, jobs: Option<usize>) -> RunResults {
    let test_list = TestList::discover(&fixture.config).expect("discovery succeeded");
    TestRunnerOpts::with_jobs(jobs)
        .build(&fixture.config, &test_list)
        .execute()
}

/// (file name, passed, failure reasons) for each result, in report order.
fn summarize(results: &RunResults) -> Vec<(String, bool, Vec<String>)> {
    results
        .results()
        .iter()
        .map(|result| {
            let reasons = result
                .failures()
                .map(|outcome| match &outcome.status {
                    OutcomeStatus::Fail { reason, .. } => reason.clone(),
                    OutcomeStatus::Pass => unreachable!("failures() only yields failures"),
                })
                .collect();
            (
                result.test.path.file_name().expect("has file name").to_owned(),
                result.passed(),
                reasons,
            )
        })
        .collect()
}

const SCENARIOS: &[(&str, &str)] = &[
    ("add.sl", "fn main() { return 50; }\n"),
    ("wrong_code.sl", "# fake: exit-code 7\n"),
    ("opt_only.sl", "# fake: exit-code-optimized 7\n"),
    ("no_artifact.sl", "# fake: no-artifact\n"),
    (
        "bad_type_error.sl",
        "# expect-error: type mismatch\n# fake: fail-compile\n# fake: diagnostic type mismatch: int vs string\n",
    ),
    (
        "wrong_diag_error.sl",
        "# expect-error: type mismatch\n# fake: fail-compile\n# fake: diagnostic undeclared identifier\n",
    ),
    (
        "plain_error.sl",
        "# fake: fail-compile\n# fake: diagnostic something went wrong\n",
    ),
    ("compiles_error.sl", "fn main() { return 50; }\n"),
];

fn expected_summary() -> Vec<(String, bool, Vec<String>)> {
    let owned = |reasons: &[&str]| -> Vec<String> {
        reasons.iter().map(|r| (*r).to_owned()).collect()
    };
    vec![
        ("add.sl".to_owned(), true, vec![]),
        (
            "bad_type_error.sl".to_owned(),
            true,
            vec![],
        ),
        (
            "compiles_error.sl".to_owned(),
            false,
            owned(&[
                "compilation should have failed but succeeded (unoptimized)",
                "compilation should have failed but succeeded (optimized)",
            ]),
        ),
        (
            "no_artifact.sl".to_owned(),
            false,
            owned(&[
                "compiled executable no_artifact not found (unoptimized)",
                "compiled executable no_artifact not found (optimized)",
            ]),
        ),
        (
            "opt_only.sl".to_owned(),
            false,
            owned(&["expected code 50 but got 7 (optimized)"]),
        ),
        ("plain_error.sl".to_owned(), true, vec![]),
        (
            "wrong_code.sl".to_owned(),
            false,
            owned(&[
                "expected code 50 but got 7 (unoptimized)",
                "expected code 50 but got 7 (optimized)",
            ]),
        ),
        (
            "wrong_diag_error.sl".to_owned(),
            false,
            owned(&[
                "expected error 'type mismatch' not found in output (unoptimized)",
                "expected error 'type mismatch' not found in output (optimized)",
            ]),
        ),
    ]
}

fn strip_dir_prefix(summary: Vec<(String, bool, Vec<String>)>) -> Vec<(String, bool, Vec<String>)> {
    // The "compiled executable ... not found" reason embeds the temp dir;
    // reduce it to the file name so runs are comparable.
    summary
        .into_iter()
        .map(|(name, passed, reasons)| {
            let reasons = reasons
                .into_iter()
                .map(|reason| match reason.split_once("/programs/") {
                    Some((prefix, rest)) if prefix.starts_with("compiled executable") => {
                        format!("compiled executable {rest}")
                    }
                    _ => reason,
                })
                .collect();
            (name, passed, reasons)
        })
        .collect()
}

#[test]
fn sequential_run_validates_all_contracts() {
    let fixture = fixture(SCENARIOS);
    let results = run(&fixture, None);

    assert_eq!(strip_dir_prefix(summarize(&results)), expected_summary());
    assert_eq!(
        results.stats(),
        RunStats {
            total: 8,
            passed: 4,
            failed: 4,
        },
    );

    // Every artifact is gone, including the one the compiles_error test
    // unexpectedly produced.
    for result in results.results() {
        let exe = result.test.path.with_extension("");
        assert!(!exe.exists(), "artifact {exe} should have been removed");
    }
}

#[test]
fn parallel_run_matches_sequential() {
    let fixture = fixture(SCENARIOS);
    let sequential = run(&fixture, None);
    let parallel = run(&fixture, Some(4));

    assert_eq!(sequential.results(), parallel.results());
    assert_eq!(sequential.stats(), parallel.stats());
}

#[test]
fn build_modes_of_one_test_never_race() {
    // The fake compiler fails with "concurrent compile detected" if another
    // compile holds the same artifact path, so any overlap between the two
    // build modes of one test would show up as a failure.
    let programs: Vec<(String, &str)> = (0..8)
        .map(|idx| (format!("race_{idx}.sl"), "fn main() { return 50; }\n"))
        .collect();
    let programs: Vec<(&str, &str)> = programs
        .iter()
        .map(|(name, contents)| (name.as_str(), *contents))
        .collect();

    let fixture = fixture(&programs);
    let results = run(&fixture, Some(4));

    assert_eq!(
        results.stats(),
        RunStats {
            total: 8,
            passed: 8,
            failed: 0,
        },
    );
}

#[test]
fn hung_compiler_is_killed_and_reported() {
    let mut fixture = fixture(&[("hang.sl", "# fake: hang\n")]);
    fixture.config.timeout_secs = 1;

    let results = run(&fixture, None);
    let summary = summarize(&results);
    assert_eq!(
        summary,
        vec![(
            "hang.sl".to_owned(),
            false,
            vec![
                "compiler timed out after 1s (unoptimized)".to_owned(),
                "compiler timed out after 1s (optimized)".to_owned(),
            ],
        )],
    );
}

#[test]
fn empty_programs_dir_is_a_successful_run() {
    let fixture = fixture(&[]);
    let results = run(&fixture, None);
    assert!(results.results().is_empty());
    assert!(results.stats().is_success());
}

#[test]
fn report_is_deterministic_across_modes() {
    use silvertest::reporter::TestReporter;

    let fixture = fixture(SCENARIOS);
    let reporter = TestReporter::new(false);

    let render = |results: &RunResults| {
        let mut buf = Vec::new();
        reporter
            .report_results(results, &mut buf)
            .expect("report written");
        String::from_utf8(buf).expect("report is valid UTF-8")
    };

    let sequential = render(&run(&fixture, None));
    let parallel = render(&run(&fixture, Some(4)));
    assert_eq!(sequential, parallel);
    assert!(sequential.ends_with("Results: 4 passed, 4 failed\n"));
}
