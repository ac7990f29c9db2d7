//! Unit tests for the architecture lint.

use rstest::rstest;

use super::*;

fn lint_one(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource {
        file: Utf8PathBuf::from(file),
        contents: contents.to_owned(),
    }])
}

#[rstest]
#[case(
    "domain/club.rs",
    "use crate::domain::ports::ClubRepository; fn f<R: ClubRepository>(_: R) {}"
)]
#[case(
    "domain/checkout/sequencer.rs",
    "use super::super::ports::PaymentProvider; use tracing::info; fn f() { info!(\"ok\"); }"
)]
#[case(
    "outbound/rest/clubs.rs",
    "use crate::domain::Club; use reqwest::Method; fn f(_: Club, _: Method) {}"
)]
#[case(
    "outbound/journal/file.rs",
    "use cap_std::fs::Dir; use camino::Utf8PathBuf; fn f(_: Dir, _: Utf8PathBuf) {}"
)]
fn accepts_inward_dependencies(#[case] file: &str, #[case] contents: &str) {
    let result = lint_one(file, contents);
    assert!(result.is_ok(), "result: {result:?}");
}

#[rstest]
#[case(
    "domain/club.rs",
    "use crate::outbound::rest::RestBackend; fn f(_: RestBackend) {}",
    Dependency::Module("outbound".to_owned())
)]
#[case(
    "domain/membership.rs",
    "use outbound::memory::InMemoryBackend; fn f(_: InMemoryBackend) {}",
    Dependency::Module("outbound".to_owned())
)]
#[case(
    "domain/checkout/mod.rs",
    "fn f() -> clubhub::app::ClubHubSettings { todo!() }",
    Dependency::Module("app".to_owned())
)]
#[case(
    "domain/session.rs",
    "use reqwest::Client; fn f(_: Client) {}",
    Dependency::Crate("reqwest".to_owned())
)]
#[case(
    "domain/checkout/record.rs",
    "fn f(_: &cap_std::fs::Dir) {}",
    Dependency::Crate("cap_std".to_owned())
)]
#[case(
    "outbound/rest/mod.rs",
    "use crate::{app::ClubHubSettings, domain::Club}; fn f(_: ClubHubSettings, _: Club) {}",
    Dependency::Module("app".to_owned())
)]
#[case(
    "outbound/payment/http.rs",
    "use ortho_config::OrthoConfig; fn f() {}",
    Dependency::Crate("ortho_config".to_owned())
)]
fn reports_boundary_violations(
    #[case] file: &str,
    #[case] contents: &str,
    #[case] dependency: Dependency,
) {
    let Err(ArchitectureLintError::Violations(violations)) = lint_one(file, contents) else {
        panic!("expected a violation for {file}");
    };
    let [violation] = violations.as_slice() else {
        panic!("expected exactly one violation, got {violations:?}");
    };
    assert_eq!(violation.file.as_str(), file);
    assert!(file.starts_with(violation.layer));
    assert_eq!(violation.dependency, dependency);
}

#[rstest]
fn violations_render_layer_and_dependency() {
    let violation = Violation {
        file: Utf8PathBuf::from("domain/club.rs"),
        layer: "domain",
        dependency: Dependency::Crate("reqwest".to_owned()),
    };

    assert_eq!(
        violation.to_string(),
        "domain/club.rs: domain must not depend on external crate `reqwest`"
    );
}

#[rstest]
fn repeated_paths_report_once() {
    let contents = "use reqwest::Client; fn f(_: reqwest::Client, _: reqwest::Url) {}";

    let Err(ArchitectureLintError::Violations(violations)) =
        lint_one("domain/session.rs", contents)
    else {
        panic!("expected a violation");
    };

    assert_eq!(violations.len(), 1);
}

#[rstest]
#[case("app/mod.rs")]
#[case("bin/checkout_reconcile.rs")]
fn files_outside_linted_layers_are_rejected(#[case] file: &str) {
    let result = lint_one(file, "fn f() {}");
    assert!(matches!(result, Err(ArchitectureLintError::UnknownLayer { .. })));
}

#[rstest]
fn unparsable_sources_name_the_file() {
    let Err(ArchitectureLintError::Parse { file, .. }) = lint_one("domain/club.rs", "fn (") else {
        panic!("expected a parse error");
    };
    assert_eq!(file.as_str(), "domain/club.rs");
}
