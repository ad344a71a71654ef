use std::path::PathBuf;

use treecmp::compare::{ScanConfig, SizeMismatch};
use treecmp::filter::PatternFilter;
use treecmp::report::OutputConfig;

use super::common::{make_roots, scan, scan_with, show_all, write_file};

fn pair(out: &str) -> Vec<String> {
    out.lines().map(str::to_string).collect()
}

fn display(path: PathBuf) -> String {
    path.display().to_string()
}

#[test]
fn test_three_identical_roots() {
    let (_dir, roots) = make_roots(3);
    for root in &roots {
        write_file(root, "f.txt", b"same");
        write_file(root, "d/g.txt", b"also same");
    }

    let (summary, out) = scan(&roots, show_all());
    assert_eq!(summary.duplicates, 2);
    assert!(summary.trees_match());
    // Pairs name the first and second roots
    assert_eq!(
        pair(&out)[..2],
        [display(roots[0].join("f.txt")), display(roots[1].join("f.txt"))]
    );
}

#[test]
fn test_third_root_differs() {
    let (_dir, roots) = make_roots(3);
    write_file(&roots[0], "f.txt", b"aaaa");
    write_file(&roots[1], "f.txt", b"aaaa");
    write_file(&roots[2], "f.txt", b"bbbb");

    let config = OutputConfig {
        show_same: false,
        show_diff: true,
        ..OutputConfig::default().simple()
    };
    let (summary, out) = scan(&roots, config);
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.duplicates, 0);
    assert_eq!(
        pair(&out),
        vec![display(roots[0].join("f.txt")), display(roots[2].join("f.txt"))]
    );
}

#[test]
fn test_first_disagreeing_root_decides() {
    let (_dir, roots) = make_roots(4);
    write_file(&roots[0], "f.txt", b"aaaa");
    write_file(&roots[1], "f.txt", b"aaaa");
    write_file(&roots[2], "f.txt", b"cc");
    // r3 lacks the file entirely, but r2 disagrees first

    let (summary, out) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_size_mismatch(SizeMismatch::Different),
        show_all(),
    );
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.missing, 0);
    assert!(out.contains(&display(roots[2].join("f.txt"))));
    assert!(!out.contains(&display(roots[3].join("f.txt"))));
}

#[test]
fn test_missing_under_middle_root() {
    let (_dir, roots) = make_roots(3);
    write_file(&roots[0], "f.txt", b"x");
    write_file(&roots[2], "f.txt", b"x");

    let config = OutputConfig {
        show_miss: true,
        invert: true,
        ..OutputConfig::default().simple()
    };
    let (summary, out) = scan(&roots, config);
    assert_eq!(summary.missing, 1);
    // Inverted: the absent side is printed
    assert_eq!(out, format!("-- {}\n", display(roots[1].join("f.txt"))));
}

#[test]
fn test_absent_from_reference_root() {
    let (_dir, roots) = make_roots(3);
    write_file(&roots[1], "f.txt", b"x");
    write_file(&roots[2], "f.txt", b"x");

    let config = OutputConfig {
        show_miss: true,
        ..OutputConfig::default().simple()
    };
    let (summary, out) = scan(&roots, config);
    assert_eq!(summary.missing, 1);
    assert_eq!(out, format!("-- {}\n", display(roots[1].join("f.txt"))));
}

#[test]
fn test_size_split_with_many_roots() {
    let (_dir, roots) = make_roots(3);
    write_file(&roots[0], "f.txt", b"short");
    write_file(&roots[1], "f.txt", b"short");
    write_file(&roots[2], "f.txt", b"much longer");

    let (summary, _) = scan_with(
        &roots,
        PatternFilter::accept_all(),
        ScanConfig::default().with_size_mismatch(SizeMismatch::Different),
        show_all(),
    );
    assert_eq!(summary.differences, 1);
    assert_eq!(summary.missing, 0);
}

#[test]
fn test_union_of_subdirectories_across_roots() {
    let (_dir, roots) = make_roots(3);
    write_file(&roots[0], "a/one.txt", b"1");
    write_file(&roots[1], "b/two.txt", b"2");
    write_file(&roots[2], "c/three.txt", b"3");

    let (summary, _) = scan(&roots, show_all());
    assert_eq!(summary.depths_visited, 2);
    assert_eq!(summary.missing, 3);
}
