use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn centavo_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("centavo"))
}

fn cmd_with_home(home: &tempfile::TempDir) -> Command {
    let mut cmd = centavo_cmd();
    cmd.env("CENTAVO_HOME", home.path());
    cmd
}

fn run_ok(home: &tempfile::TempDir, args: &[&str]) {
    let mut cmd = cmd_with_home(home);
    cmd.args(args);
    cmd.assert().success();
}

fn run_ok_out(home: &tempfile::TempDir, args: &[&str]) -> String {
    let mut cmd = cmd_with_home(home);
    cmd.args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).expect("utf8 stdout")
}

#[test]
fn categories_and_transactions_round_trip_through_the_store() {
    let home = tempfile::tempdir().expect("tempdir");

    run_ok(&home, &["category", "add", "Food", "--kind", "expense"]);
    run_ok(
        &home,
        &["category", "add", "Groceries", "--kind", "expense", "--parent", "Food"],
    );

    let out = run_ok_out(&home, &["category", "list"]);
    assert!(out.contains("Food"));
    assert!(out.contains("Groceries"));
    assert!(out.contains("expense"));

    run_ok(
        &home,
        &[
            "tx", "add", "12.50", "USD", "--category", "Groceries", "--kind", "expense",
            "--date", "2024-03-15", "-m", "weekly shop",
        ],
    );

    let out = run_ok_out(&home, &["tx", "list", "--month", "2024-03"]);
    assert!(out.contains("2024-03-15\texpense\tcleared\t12.50\tUSD\tGroceries"));

    // An empty listing prints only the marker, no header.
    let out = run_ok_out(&home, &["tx", "list", "--month", "2024-04"]);
    assert!(out.contains("(no transactions)"));
    assert!(!out.contains("date\tkind"));
}

#[test]
fn base_currency_defaults_to_usd_and_persists() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(&home, &["base-currency"]);
    assert_eq!(out.trim(), "USD");

    run_ok(&home, &["base-currency", "eur"]);
    let out = run_ok_out(&home, &["base-currency"]);
    assert_eq!(out.trim(), "EUR");
}

#[test]
fn rates_are_stored_and_listed() {
    let home = tempfile::tempdir().expect("tempdir");

    run_ok(
        &home,
        &["rate", "set", "usd", "ves", "36.5", "--date", "2024-03-01"],
    );
    let out = run_ok_out(&home, &["rate", "list", "USD"]);
    assert!(out.contains("USD"));
    assert!(out.contains("VES"));
    assert!(out.contains("36.5"));

    let out = run_ok_out(&home, &["rate", "list", "EUR"]);
    assert!(out.contains("(no rates)"));
}

#[test]
fn invalid_input_is_rejected_with_a_clear_message() {
    let home = tempfile::tempdir().expect("tempdir");

    let mut cmd = cmd_with_home(&home);
    cmd.args(["budget", "report", "--month", "2024-13"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));

    let mut cmd = cmd_with_home(&home);
    cmd.args(["rate", "set", "USD", "USD", "1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));

    let mut cmd = cmd_with_home(&home);
    cmd.args(["base-currency", "DOLLARS"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid currency code"));

    run_ok(&home, &["category", "add", "Food", "--kind", "expense"]);
    let mut cmd = cmd_with_home(&home);
    cmd.args(["budget", "create", "Food", "100", "USD"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--month"));

    let mut cmd = cmd_with_home(&home);
    cmd.args([
        "budget", "create", "Food", "100", "USD", "--start", "2024-06", "--end", "2024-01",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("on or after"));
}

#[test]
fn budget_create_requires_an_existing_category() {
    let home = tempfile::tempdir().expect("tempdir");

    let mut cmd = cmd_with_home(&home);
    cmd.args(["budget", "create", "Nope", "100", "USD", "--month", "2024-03"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No such category"));
}
