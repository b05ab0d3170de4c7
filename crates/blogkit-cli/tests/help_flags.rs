#[test]
fn help_lists_global_flags_and_nouns() {
    let output = std::process::Command::new(assert_cmd::cargo::cargo_bin!("blogkit"))
        .arg("--help")
        .output()
        .expect("run help");
    assert!(output.status.success(), "--help should succeed");
    let text = String::from_utf8_lossy(&output.stdout);

    for needle in ["--pretty", "--backend", "bill", "doc", "snippets", "serve"] {
        assert!(
            text.contains(needle),
            "help output should contain '{needle}'"
        );
    }
}

#[test]
fn bill_help_lists_report_commands() {
    let output = std::process::Command::new(assert_cmd::cargo::cargo_bin!("blogkit"))
        .args(["bill", "--help"])
        .output()
        .expect("run bill help");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for needle in ["init", "save", "show", "tax", "report"] {
        assert!(text.contains(needle), "bill help should contain '{needle}'");
    }
}
