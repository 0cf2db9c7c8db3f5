//! Property tests: formatted assignments must parse back to the same
//! value, and a planned update must be invisible to a second plan.

use envpatch::parser::classify::parse_assignment;
use envpatch::planner::{format_var, plan_str, PlannerConfig, UpdateRequest};
use proptest::prelude::*;

fn request(key: &str, value: &str) -> UpdateRequest {
    UpdateRequest::new(key, value)
}

proptest! {
    // Whitespace forces quoting, which is the interesting escape path.
    #[test]
    fn quoted_values_round_trip(
        key in "[A-Z_][A-Z0-9_]{0,10}",
        left in "[ -~]{0,20}",
        right in "[ -~]{0,20}",
    ) {
        let value = format!("{left} {right}");
        let line = format_var(&request(&key, &value), None, false, '"');
        let parsed = parse_assignment(&line).unwrap();
        prop_assert_eq!(parsed.key, key);
        prop_assert_eq!(parsed.value, value);
        prop_assert!(parsed.terminated);
    }

    #[test]
    fn unquoted_values_round_trip(
        key in "[A-Z_][A-Z0-9_]{0,10}",
        value in "[a-zA-Z0-9_./:-]{1,30}",
    ) {
        let line = format_var(&request(&key, &value), None, false, '"');
        let parsed = parse_assignment(&line).unwrap();
        prop_assert_eq!(parsed.value, value);
        prop_assert_eq!(parsed.quote, None);
    }

    #[test]
    fn applied_update_replans_to_nothing(
        old in "[a-zA-Z0-9_.]{1,15}",
        new in "[a-zA-Z0-9_.]{1,15}",
        extra in "[a-zA-Z0-9_.]{1,15}",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.env");
        std::fs::write(&path, format!("TARGET={old}\nOTHER={extra}\n")).unwrap();

        let update = || vec![request("TARGET", &new)];
        envpatch::update_file(&path, update(), &Default::default()).unwrap();

        let rendered = std::fs::read_to_string(&path).unwrap();
        let replan = plan_str(&rendered, update(), PlannerConfig::default()).unwrap();
        prop_assert!(replan.is_empty());
    }
}
