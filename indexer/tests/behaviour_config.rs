//! BDD tests for run configuration loading.

use clap::Parser;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use wheelhouse_indexer::cli::Cli;
use wheelhouse_indexer::config::IndexConfig;
use wheelhouse_indexer::error::IndexError;

const MANAGED_VARS: [&str; 4] = [
    "GITHUB_TOKEN",
    "GITHUB_REPOSITORY",
    "OUTPUT_DIR",
    "GITHUB_API_URL",
];

#[derive(Default)]
struct ConfigWorld {
    temp_dir: Option<tempfile::TempDir>,
    env: Vec<(&'static str, String)>,
    args: Vec<String>,
    result: Option<Result<IndexConfig, IndexError>>,
}

impl ConfigWorld {
    fn write_yank_file(&mut self, contents: &str) {
        let dir = self
            .temp_dir
            .get_or_insert_with(|| tempfile::tempdir().expect("temp dir"));
        let path = dir.path().join("yanked.toml");
        std::fs::write(&path, contents).expect("write yank file");
        self.args.push("--yank-file".to_owned());
        self.args
            .push(path.to_str().expect("UTF-8 path").to_owned());
    }

    fn config(&self) -> &IndexConfig {
        match self.result.as_ref().expect("result set") {
            Ok(config) => config,
            Err(err) => panic!("expected accepted configuration, got: {err}"),
        }
    }

    fn error(&self) -> &IndexError {
        match self.result.as_ref().expect("result set") {
            Err(err) => err,
            Ok(config) => panic!("expected rejected configuration, got {config:?}"),
        }
    }
}

#[fixture]
fn world() -> ConfigWorld {
    ConfigWorld::default()
}

#[given("the environment sets GITHUB_TOKEN to \"{value}\"")]
fn given_token(world: &mut ConfigWorld, value: String) {
    world.env.push(("GITHUB_TOKEN", value));
}

#[given("the environment sets GITHUB_REPOSITORY to \"{value}\"")]
fn given_repository(world: &mut ConfigWorld, value: String) {
    world.env.push(("GITHUB_REPOSITORY", value));
}

#[given("a yank file yanking \"{version}\" of \"{package}\"")]
fn given_yank_entry(world: &mut ConfigWorld, version: String, package: String) {
    world.write_yank_file(&format!("[yanked]\n{package} = [\"{version}\"]\n"));
}

#[given("a yank file containing \"{contents}\"")]
fn given_yank_contents(world: &mut ConfigWorld, contents: String) {
    world.write_yank_file(&contents);
}

#[when("the configuration is loaded")]
fn when_loaded(world: &mut ConfigWorld) {
    let vars: Vec<(&str, Option<&str>)> = MANAGED_VARS
        .iter()
        .map(|name| {
            let value = world
                .env
                .iter()
                .find(|(var, _)| var == name)
                .map(|(_, value)| value.as_str());
            (*name, value)
        })
        .collect();
    let mut argv = vec!["wheelhouse-indexer".to_owned()];
    argv.extend(world.args.iter().cloned());

    let cli = temp_env::with_vars(vars, || {
        Cli::try_parse_from(&argv).expect("valid arguments")
    });
    world.result = Some(IndexConfig::from_cli(&cli));
}

#[then("the configuration is accepted")]
fn then_accepted(world: &mut ConfigWorld) {
    let _ = world.config();
}

#[then("the output directory is \"{dir}\"")]
fn then_output_dir(world: &mut ConfigWorld, dir: String) {
    assert_eq!(world.config().output_dir.as_str(), dir);
}

#[then("the configuration is rejected mentioning \"{fragment}\"")]
fn then_rejected(world: &mut ConfigWorld, fragment: String) {
    let err = world.error();
    assert!(matches!(err, IndexError::Configuration { .. }), "{err:?}");
    let message = err.to_string();
    assert!(
        message.contains(&fragment),
        "expected '{fragment}' in: {message}"
    );
}

#[then("the exit code is {code}")]
fn then_exit_code(world: &mut ConfigWorld, code: i32) {
    assert_eq!(world.error().exit_code(), code);
}

#[then("version \"{version}\" of \"{package}\" is yanked")]
fn then_version_yanked(world: &mut ConfigWorld, version: String, package: String) {
    assert!(world.config().yanks.is_yanked(&package, &version));
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "A complete configuration is accepted"
)]
fn scenario_complete_configuration(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "A missing token is rejected"
)]
fn scenario_missing_token(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "A malformed repository is rejected"
)]
fn scenario_malformed_repository(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Yanked versions are read from the yank file"
)]
fn scenario_yank_file(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "A malformed yank file is rejected"
)]
fn scenario_malformed_yank_file(world: ConfigWorld) {
    let _ = world;
}
