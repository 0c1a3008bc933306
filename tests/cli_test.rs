use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

#[test]
fn encode_hanchen1() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("encode")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-m").arg("1 1 1 0 1 0 0")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 2 1 2 0 1 3"));
    Ok(())
}

#[test]
fn encode_hanchen2() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("encode")
        .arg("-c").arg("3,3")
        .arg("-g").arg("1,0,2")
        .arg("-g").arg("0,1,6")
        .arg("-m").arg("3 2 0 0")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 2 0 4"));
    Ok(())
}

#[test]
fn simulate_fano_clean_channel() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("simulate")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-l").arg("16")
        .arg("--noise").arg("0")
        .arg("--seed").arg("7")
        .arg("-a").arg("fano")
        .assert()
        .success()
        .stdout(predicate::str::contains("recovered: true"))
        .stdout(predicate::str::contains("_RES 1,"));
    Ok(())
}

#[test]
fn simulate_stack_clean_channel() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("simulate")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-l").arg("16")
        .arg("--noise").arg("0")
        .arg("--seed").arg("7")
        .arg("-a").arg("stack")
        .assert()
        .success()
        .stdout(predicate::str::contains("recovered: true"));
    Ok(())
}

#[test]
fn simulate_noisy_channel_with_fixed_message() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("simulate")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-m").arg("1 1 1 0 1 0 0")
        .arg("--noise").arg("0.3")
        .arg("--seed").arg("11")
        .assert()
        .success()
        .stdout(predicate::str::contains("codeword: 3 2 1 2 0 1 3"))
        .stdout(predicate::str::contains("recovered: true"));
    Ok(())
}

#[test]
fn simulate_writes_a_dot_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let dot_path = temp_dir.path().join("tree.dot");
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("simulate")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-l").arg("8")
        .arg("--noise").arg("0")
        .arg("--seed").arg("3")
        .arg("--dot").arg(&dot_path)
        .assert()
        .success();
    let dot = std::fs::read_to_string(&dot_path)?;
    assert!(dot.starts_with("digraph G {"));
    assert!(dot.contains("rankdir=LR"));
    Ok(())
}

#[test]
fn node_limit_fails_with_nonzero_exit() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("simulate")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-m").arg("1 1 1 0 1 0 0")
        .arg("--noise").arg("0.3")
        .arg("--node-limit").arg("2")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("decoding failed"));
    Ok(())
}

#[test]
fn rejects_oversized_generator() -> STDRESULT {
    // configuration errors exit with a different code than decode failures
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("encode")
        .arg("-c").arg("3")
        .arg("-g").arg("9,5")
        .arg("-m").arg("1 0 1")
        .assert()
        .failure()
        .code(2);
    Ok(())
}

#[test]
fn rejects_unparseable_message() -> STDRESULT {
    let mut cmd = Command::cargo_bin("convsoft")?;
    cmd.arg("encode")
        .arg("-c").arg("3")
        .arg("-g").arg("7,5")
        .arg("-m").arg("1 x 1")
        .assert()
        .failure()
        .code(2);
    Ok(())
}
