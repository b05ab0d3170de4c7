use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn blogkit() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("blogkit"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, rel: &str, value: Value) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

fn seed(dir: &Path) {
    write(
        dir,
        "src/shop.json",
        json!({
            "orders": {
                "2020-01-01": [["steve", [["Bordeaux", 6], ["Viognier", 6]]]],
                "2020-01-02": [["alex", [["Bordeaux", 1]]]]
            }
        }),
    );
    write(
        dir,
        "defaults/products.json",
        json!({"Bordeaux": ["wine", "21.12"], "Viognier": ["wine", "23.99"]}),
    );
    write(dir, "defaults/tax_percent.json", json!({"wine": 10}));
    write(dir, "defaults/users.json", json!(["steve", "alex"]));
}

fn data_of(output: &[u8]) -> Value {
    let root: Value = serde_json::from_slice(output).expect("json stdout");
    root["data"].clone()
}

#[test]
fn build_then_query_generated_store() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    let out = blogkit()
        .args(["--json", "fixtures", "build", "shop", "--data"])
        .arg(tmp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let built = data_of(&out);
    assert_eq!(built[0]["unit"], "shop");
    assert_eq!(built[0]["dates"], 2);
    assert_eq!(built[0]["bills"], 2);

    let store = tmp.path().join("fixtures").join("shop");
    assert!(store.exists());
    blogkit()
        .arg("--bills")
        .arg(&store)
        .args(["bill", "tax", "--date", "2020-01-01"])
        .assert()
        .success()
        .stdout("27.06\n");
}

#[test]
fn build_with_shelf_backend() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    blogkit()
        .args(["--backend", "shelf", "fixtures", "build", "shop", "--data"])
        .arg(tmp.path())
        .assert()
        .success();
    blogkit()
        .arg("--bills")
        .arg(tmp.path().join("fixtures").join("shop"))
        .args(["--backend", "shelf", "bill", "show", "--start", "2020-01-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[alex]"));
}

#[test]
fn missing_unit_fails() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());
    blogkit()
        .args(["fixtures", "build", "nope", "--data"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}
