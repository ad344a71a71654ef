use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use treecmp::compare::{CompareMode, LevelScanner, ScanConfig, SizeMismatch};
use treecmp::filter::PatternFilter;
use treecmp::progress::ProgressCallback;
use treecmp::report::{OutputConfig, Reporter};
use treecmp::scanner::{DirectoryLister, FsLister, Hasher, ListedEntry, ScanError};

use super::common::{make_roots, scan, scan_with, show_all, write_file};

#[test]
fn test_scan_empty_roots() {
    let (_dir, roots) = make_roots(2);
    let (summary, out) = scan(&roots, show_all());

    assert_eq!(summary.total_files(), 0);
    assert_eq!(summary.depths_visited, 1);
    assert!(summary.trees_match());
    assert!(out.is_empty());
}

#[test]
fn test_hello_hellp_removed() {
    let (_dir, roots) = make_roots(2);
    let a = roots[0].join("f.txt");
    let b = roots[1].join("f.txt");
    write_file(&roots[0], "f.txt", b"hello");
    write_file(&roots[1], "f.txt", b"hello");

    let (summary, out) = scan(&roots, OutputConfig::default());
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.total_files(), 1);
    assert_eq!(out, format!("=={}\n{}\n__\n", a.display(), b.display()));

    fs::write(&b, b"hellp").unwrap();
    let (summary, out) = scan(&roots, OutputConfig::default());
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.duplicates, 0);
    // Differences are counted but hidden by default
    assert!(out.is_empty());

    fs::remove_file(&b).unwrap();
    let config = OutputConfig {
        show_miss: true,
        ..OutputConfig::default()
    };
    let (summary, out) = scan(&roots, config);
    assert_eq!(summary.missing, 1);
    assert_eq!(out, format!("-- {}\n__\n", a.display()));
}

#[test]
fn test_depth_ordering() {
    let (_dir, roots) = make_roots(2);
    for root in &roots {
        write_file(root, "b/y.txt", b"yy");
        write_file(root, "a/x.txt", b"xx");
    }

    let (summary, out) = scan(&roots, show_all());
    assert_eq!(summary.depths_visited, 2);
    assert_eq!(summary.duplicates, 2);

    let expected = format!(
        "{}\n{}\n{}\n{}\n",
        roots[0].join("a/x.txt").display(),
        roots[1].join("a/x.txt").display(),
        roots[0].join("b/y.txt").display(),
        roots[1].join("b/y.txt").display(),
    );
    assert_eq!(out, expected);
}

#[test]
fn test_shallow_files_reported_before_deep_ones() {
    let (_dir, roots) = make_roots(2);
    for root in &roots {
        write_file(root, "a/deep.txt", b"1");
        write_file(root, "z.txt", b"2");
    }

    let (_, out) = scan(&roots, show_all());
    let z = out.find("z.txt").unwrap();
    let deep = out.find("deep.txt").unwrap();
    assert!(z < deep);
}

#[test]
fn test_scan_is_idempotent() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "same.txt", b"same");
    write_file(&roots[1], "same.txt", b"same");
    write_file(&roots[0], "d/diff.txt", b"aaaa");
    write_file(&roots[1], "d/diff.txt", b"bbbb");
    write_file(&roots[0], "d/e/only.txt", b"x");

    let first = scan(&roots, show_all());
    let second = scan(&roots, show_all());

    assert_eq!(first.1, second.1);
    assert_eq!(first.0.duplicates, second.0.duplicates);
    assert_eq!(first.0.differences, second.0.differences);
    assert_eq!(first.0.missing, second.0.missing);
    assert_eq!(first.0.depths_visited, 3);
}

#[test]
fn test_every_candidate_classified_once() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "dup.txt", b"x");
    write_file(&roots[1], "dup.txt", b"x");
    write_file(&roots[0], "diff.txt", b"x");
    write_file(&roots[1], "diff.txt", b"y");
    write_file(&roots[0], "only_first.txt", b"x");
    write_file(&roots[1], "only_second.txt", b"x");
    write_file(&roots[0], "size.txt", b"x");
    write_file(&roots[1], "size.txt", b"xx");

    let (summary, _) = scan(&roots, show_all());
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.missing, 3);
    assert_eq!(summary.total_files(), 5);
    assert!(!summary.trees_match());
}

#[test]
fn test_missing_shows_existing_side() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[1], "only_second.txt", b"x");

    let config = OutputConfig {
        show_miss: true,
        ..OutputConfig::default().simple()
    };
    let (_, out) = scan(&roots, config.clone());
    assert_eq!(out, format!("-- {}\n", roots[1].join("only_second.txt").display()));

    let inverted = OutputConfig {
        invert: true,
        ..config
    };
    let (_, out) = scan(&roots, inverted);
    assert_eq!(out, format!("-- {}\n", roots[0].join("only_second.txt").display()));
}

#[test]
fn test_name_mode_ignores_content() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "f.txt", b"hello");
    write_file(&roots[1], "f.txt", b"hellp");
    write_file(&roots[0], "g.txt", b"short");
    write_file(&roots[1], "g.txt", b"longer");

    let (summary, _) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_mode(CompareMode::Name),
        show_all(),
    );
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.missing, 0);
}

#[test]
fn test_size_mismatch_option() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "g.txt", b"short");
    write_file(&roots[1], "g.txt", b"longer");

    let (summary, _) = scan(&roots, show_all());
    assert_eq!(summary.missing, 1);
    assert_eq!(summary.differences, 0);

    let (summary, out) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_size_mismatch(SizeMismatch::Different),
        show_all(),
    );
    assert_eq!(summary.missing, 0);
    assert_eq!(summary.differences, 1);
    assert!(out.contains(&roots[1].join("g.txt").display().to_string()));
}

#[test]
fn test_file_under_one_root_directory_under_other() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "x", b"plain file");
    write_file(&roots[1], "x/inner.txt", b"nested");

    let (summary, _) = scan(&roots, show_all());
    // `x` is missing as a file under r1, `x/inner.txt` missing under r0
    assert_eq!(summary.missing, 2);
    assert_eq!(summary.depths_visited, 2);
}

#[test]
fn test_directory_only_under_one_root() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "a/b/c/deep.txt", b"deep");

    let (summary, out) = scan(&roots, show_all());
    assert_eq!(summary.missing, 1);
    assert_eq!(summary.depths_visited, 4);
    assert_eq!(summary.unreadable_dirs, 0);
    assert!(out.contains("deep.txt"));
}

#[test]
fn test_parallel_and_sequential_output_match() {
    let (_dir, roots) = make_roots(2);
    for i in 0..60 {
        let rel = format!("d{}/s{}/f{i}.bin", i % 4, i % 3);
        write_file(&roots[0], &rel, format!("content {i}").as_bytes());
        match i % 4 {
            0 => {}
            1 => write_file(&roots[1], &rel, format!("CONTENT {i}").as_bytes()),
            _ => write_file(&roots[1], &rel, format!("content {i}").as_bytes()),
        }
    }

    let run = |threads| {
        scan_with(
            &roots,
            PatternFilter::accept_all(),
            ScanConfig::default().with_io_threads(threads),
            show_all(),
        )
    };
    let (seq_summary, seq_out) = run(1);
    let (par_summary, par_out) = run(8);

    assert_eq!(seq_out, par_out);
    assert_eq!(seq_summary.duplicates, par_summary.duplicates);
    assert_eq!(seq_summary.missing, 15);
    assert_eq!(seq_summary.differences, 15);
    assert_eq!(seq_summary.duplicates, 30);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_does_not_abort() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "ok.txt", b"ok");
    write_file(&roots[1], "ok.txt", b"ok");
    write_file(&roots[0], "locked/secret.txt", b"s");
    write_file(&roots[1], "locked/secret.txt", b"s");

    let locked = roots[1].join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Running with privileges that bypass permission bits
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let (summary, _) = scan(&roots, show_all());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(summary.unreadable_dirs, 1);
    assert_eq!(summary.duplicates, 1);
    // Listed under r0 only; r1's copy cannot be stat'd
    assert_eq!(summary.missing, 1);
}

/// Lister that refuses to read one directory, like a mode-000 directory
/// seen by an unprivileged user.
struct DenyingLister {
    denied: PathBuf,
}

impl DirectoryLister for DenyingLister {
    fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, ScanError> {
        if dir == self.denied {
            return Err(ScanError::PermissionDenied(dir.to_path_buf()));
        }
        FsLister::new().list(dir)
    }

    fn file_len(&self, path: &Path) -> Option<u64> {
        if path.starts_with(&self.denied) {
            return None;
        }
        FsLister::new().file_len(path)
    }
}

#[test]
fn test_permission_denied_directory_is_counted_and_scan_continues() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "ok.txt", b"ok");
    write_file(&roots[1], "ok.txt", b"ok");
    write_file(&roots[0], "locked/secret.txt", b"s");
    write_file(&roots[1], "locked/secret.txt", b"s");
    write_file(&roots[0], "open/after.txt", b"after");
    write_file(&roots[1], "open/after.txt", b"after");

    let scanner = LevelScanner::with_components(
        DenyingLister {
            denied: roots[1].join("locked"),
        },
        Hasher::new(),
        PatternFilter::accept_all(),
        ScanConfig::default().with_io_threads(1),
    )
    .unwrap();
    let mut reporter = Reporter::new(Vec::new(), show_all());
    let summary = scanner.run_scan(&roots, &mut reporter).unwrap();
    let out = String::from_utf8(reporter.into_inner()).unwrap();

    assert_eq!(summary.unreadable_dirs, 1);
    assert_eq!(summary.depths_visited, 2);
    // ok.txt and open/after.txt are still compared
    assert_eq!(summary.duplicates, 2);
    // Only the readable side lists secret.txt
    assert_eq!(summary.missing, 1);
    assert!(out.contains(&format!("-- {}\n", roots[0].join("locked/secret.txt").display())));
    assert!(!summary.trees_match());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_skipped_not_missing() {
    use std::os::unix::fs::symlink;

    let (_dir, roots) = make_roots(2);
    for root in &roots {
        write_file(root, "real/f.txt", b"content");
        symlink(root.join("real"), root.join("link")).unwrap();
    }

    let (summary, out) = scan(&roots, show_all());
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.missing, 0);
    // One per root that listed the link
    assert_eq!(summary.skipped, 2);
    for root in &roots {
        assert!(!out.contains(&root.join("link").display().to_string()));
    }
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_compared_through_target() {
    use std::os::unix::fs::symlink;

    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "data.txt", b"payload");
    write_file(&roots[1], "stored/data.txt", b"payload");
    symlink(roots[1].join("stored/data.txt"), roots[1].join("data.txt")).unwrap();

    let (summary, _) = scan(&roots, show_all());
    // data.txt matches through the link; stored/data.txt exists under r1 only
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.missing, 1);
}

#[test]
fn test_shutdown_before_scan() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "f.txt", b"x");
    write_file(&roots[1], "f.txt", b"x");

    let flag = Arc::new(AtomicBool::new(true));
    let (summary, out) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_shutdown_flag(flag),
        show_all(),
    );
    assert!(summary.interrupted);
    assert_eq!(summary.total_files(), 0);
    assert!(out.is_empty());
}

/// Requests shutdown when a given depth finishes.
struct StopAfterLevel {
    depth: usize,
    flag: Arc<AtomicBool>,
}

impl ProgressCallback for StopAfterLevel {
    fn on_level_start(&self, _depth: usize, _total: usize) {}
    fn on_progress(&self, _current: usize, _path: &str) {}
    fn on_level_end(&self, depth: usize) {
        if depth == self.depth {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

#[test]
fn test_shutdown_mid_scan_keeps_earlier_levels() {
    let (_dir, roots) = make_roots(2);
    for root in &roots {
        write_file(root, "top.txt", b"t");
        write_file(root, "sub/deeper.txt", b"d");
    }

    let flag = Arc::new(AtomicBool::new(false));
    let callback = Arc::new(StopAfterLevel {
        depth: 0,
        flag: Arc::clone(&flag),
    });
    let (summary, out) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default()
            .with_shutdown_flag(flag)
            .with_progress_callback(callback),
        show_all(),
    );

    assert!(summary.interrupted);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.depths_visited, 1);
    assert!(out.contains("top.txt"));
    assert!(!out.contains("deeper.txt"));
}

/// Records every callback.
#[derive(Default)]
struct RecordingProgress {
    levels: Mutex<Vec<(usize, usize)>>,
    ended: AtomicUsize,
    items: AtomicUsize,
}

impl ProgressCallback for RecordingProgress {
    fn on_level_start(&self, depth: usize, total: usize) {
        self.levels.lock().unwrap().push((depth, total));
    }
    fn on_progress(&self, _current: usize, _path: &str) {
        self.items.fetch_add(1, Ordering::SeqCst);
    }
    fn on_level_end(&self, _depth: usize) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_callbacks_per_level() {
    let (_dir, roots) = make_roots(2);
    write_file(&roots[0], "a.txt", b"1");
    write_file(&roots[1], "b.txt", b"2");
    write_file(&roots[0], "d/c.txt", b"3");

    let progress = Arc::new(RecordingProgress::default());
    let (summary, _) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_progress_callback(progress.clone()),
        show_all(),
    );

    assert_eq!(summary.depths_visited, 2);
    assert_eq!(*progress.levels.lock().unwrap(), vec![(0, 2), (1, 1)]);
    assert_eq!(progress.ended.load(Ordering::SeqCst), 2);
    assert_eq!(progress.items.load(Ordering::SeqCst), 3);
}

#[test]
fn test_invalid_roots_rejected() {
    use treecmp::compare::{CompareError, LevelScanner};
    use treecmp::report::Reporter;

    let (_dir, roots) = make_roots(1);
    let scanner = LevelScanner::new(PatternFilter::accept_all(), ScanConfig::default()).unwrap();
    let mut reporter = Reporter::new(Vec::new(), OutputConfig::default());

    let err = scanner.run_scan(&roots, &mut reporter).unwrap_err();
    assert!(matches!(err, CompareError::TooFewRoots(1)));

    let missing = vec![roots[0].clone(), roots[0].join("absent")];
    let err = scanner.run_scan(&missing, &mut reporter).unwrap_err();
    assert!(matches!(err, CompareError::PathNotFound(_)));
    assert_eq!(reporter.counters().files(), 0);
}
