// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn regulator() -> Command {
    let mut cmd = Command::cargo_bin("regulator").unwrap();
    cmd.arg("--schema").arg(fixture("ipu.yaml"));
    cmd
}

#[test]
fn test_check_prints_counts() {
    regulator()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("clusters:  1"))
        .stdout(predicate::str::contains("types:     2"))
        .stdout(predicate::str::contains("registers: 2"))
        .stdout(predicate::str::contains("instances: 2"));
}

#[test]
fn test_decode_file() {
    regulator()
        .arg("decode")
        .arg(fixture("memedit.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "02600000: 00000761 -------- -------- -------- # IPU1_Base IPUx_CONF",
        ))
        .stdout(predicate::str::contains("# CSI0_EN: 1"))
        .stdout(predicate::str::contains(
            "# CSI0_DATA_SOURCE: 0 = Parallel interface is connected to CSI0",
        ))
        .stdout(predicate::str::contains("# DI0_DUAL_FLOW: 1 = dual"))
        .stdout(predicate::str::contains("# MCU_T: 0xab"));
}

#[test]
fn test_decode_dirty_stdin() {
    let capture = "ted garbage from the previous line
00000000: 00000761 00000000 00000000 00000000 ................
00000010: 000000";
    regulator()
        .arg("decode")
        .arg("--dirty")
        .write_stdin(capture)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let capture = "prompt
mapping offset 0x02A00000 (size 0x200000)
00000000: 00000761 00000000 00000000 00000000 ................
cut-off";
    regulator()
        .arg("decode")
        .arg("--dirty")
        .write_stdin(capture)
        .assert()
        .success()
        .stdout(predicate::str::contains("# IPU2_Base IPUx_CONF"));
}

#[test]
fn test_decode_reports_unmatched_fragment() {
    regulator()
        .arg("decode")
        .write_stdin("00001000: 00000761 ................\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no instance found"));
}

#[test]
fn test_lookup() {
    regulator()
        .arg("lookup")
        .arg("0x260000e")
        .assert()
        .success()
        .stdout(predicate::str::contains("IPU1_Base (IPU_Base + 0xe)"))
        .stdout(predicate::str::contains("register IPUx_DISP_GEN at 0x260000c, type r32 IPUx_DISP_GEN"))
        .stdout(predicate::str::contains("r8 16…23: MCU_T"));

    regulator()
        .arg("lookup")
        .arg("0x10")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no instance found"));
}

#[test]
fn test_bad_schema_is_config_error() {
    let dir = tempdir().unwrap();
    let schema = dir.path().join("bad.yaml");
    fs::write(
        &schema,
        "clusters:\n  IPU_Base:\n    size: 0xe8\n    types:\n      r32 T:\n        fields:\n          g1 0: X\n",
    )
    .unwrap();

    Command::cargo_bin("regulator")
        .unwrap()
        .arg("--schema")
        .arg(&schema)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("in field 'g1 0'"));

    Command::cargo_bin("regulator")
        .unwrap()
        .arg("--schema")
        .arg(dir.path().join("missing.yaml"))
        .arg("check")
        .assert()
        .code(2);
}

#[test]
fn test_missing_dump_is_runtime_error() {
    regulator()
        .arg("decode")
        .arg("/nonexistent/dump.txt")
        .assert()
        .code(3);
}

#[test]
fn test_stream_blocks() {
    let input = "~ # memtool md 0x2600000
02600000: 00000761 00000000 00000000 00000000                ................
~ #

~ # memtool md 0x2a00000
02a00000: 00000001 00000000 00000000 00000000                ................
~ #
";
    regulator()
        .arg("stream")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("# IPU1_Base IPUx_CONF"))
        .stdout(predicate::str::contains("# IPU2_Base IPUx_CONF"));
}

#[test]
fn test_stream_keeps_whole_block() {
    let input = "mapping offset 0x02600000 (size 0x200000)
00000000: 00000761 00000000 00000000 00000000 ................
0000000c: 00ab0001 ................
";
    regulator()
        .arg("stream")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("# IPU1_Base IPUx_CONF"))
        .stdout(predicate::str::contains("# IPU1_Base IPUx_DISP_GEN"))
        .stdout(predicate::str::contains("MCU_T: 0xab"));
}

#[test]
fn test_stream_dirty_drops_edge_lines() {
    let input = "~ # memtool md 0x2600000
02600000: 00000761                ................
0260000c: 00ab0001                ................
";
    regulator()
        .args(["stream", "--dirty"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("# IPU1_Base IPUx_CONF"))
        .stdout(predicate::str::contains("IPUx_DISP_GEN").not());
}
