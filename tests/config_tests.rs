// tests/config_tests.rs

use quizcore::config::FilterPolicy;

#[test]
fn filter_policy_parses_both_variants() {
    assert_eq!("strict".parse::<FilterPolicy>(), Ok(FilterPolicy::Strict));
    assert_eq!("fallback".parse::<FilterPolicy>(), Ok(FilterPolicy::Fallback));
    assert_eq!(" Strict ".parse::<FilterPolicy>(), Ok(FilterPolicy::Strict));
}

#[test]
fn filter_policy_rejects_unknown_values() {
    let err = "lenient".parse::<FilterPolicy>().unwrap_err();
    assert!(err.contains("lenient"));
}

#[test]
fn filter_policy_displays_its_config_spelling() {
    assert_eq!(FilterPolicy::Strict.to_string(), "strict");
    assert_eq!(FilterPolicy::Fallback.to_string(), "fallback");
}
