use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "default_trials")]
    pub trials: TrialConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            trials: default_trials(),
        }
    }
}

/// How the benchmark executable is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Prefix placed before the program, ie. `sudo`. Empty runs the program directly
    #[serde(default = "default_wrapper")]
    pub wrapper: Vec<String>,
    #[serde(default = "default_program")]
    pub program: String,
    /// Benchmark kind, passed as the first program argument and used in test names
    #[serde(default = "default_kind")]
    pub kind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wrapper: default_wrapper(),
            program: default_program(),
            kind: default_kind(),
        }
    }
}

fn default_wrapper() -> Vec<String> {
    vec!["sudo".to_owned()]
}

fn default_program() -> String {
    "./run.sh".to_owned()
}

fn default_kind() -> String {
    "iobench".to_owned()
}

/// Candidate values for every axis of one workload mode
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeCandidates {
    pub sizes: Vec<String>,
    pub io_sizes: Vec<String>,
    #[serde(default)]
    pub threads: Vec<usize>,
}

/// Per-mode trial template. Never mutated after construction, use
/// [`TrialConfig::for_run`] to derive the configuration of one invocation.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialConfig {
    modes: IndexMap<String, ModeCandidates>,
}

impl TrialConfig {
    pub fn new(modes: IndexMap<String, ModeCandidates>) -> Self {
        Self { modes }
    }

    /// Thread candidates collapse to `[1]` unless concurrent runs were requested
    pub fn for_run(&self, concurrent: bool) -> Self {
        let modes = self
            .modes
            .iter()
            .map(|(mode, candidates)| {
                let threads = if concurrent {
                    candidates.threads.clone()
                } else {
                    vec![1]
                };
                (
                    mode.clone(),
                    ModeCandidates {
                        sizes: candidates.sizes.clone(),
                        io_sizes: candidates.io_sizes.clone(),
                        threads,
                    },
                )
            })
            .collect();
        Self { modes }
    }

    pub fn modes(&self) -> impl Iterator<Item = (&str, &ModeCandidates)> {
        self.modes.iter().map(|(mode, c)| (mode.as_str(), c))
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

fn default_trials() -> TrialConfig {
    let candidates = |sizes: &[&str]| ModeCandidates {
        sizes: sizes.iter().map(|x| x.to_string()).collect(),
        io_sizes: vec!["16K".to_owned()],
        threads: vec![4],
    };
    TrialConfig::new(IndexMap::from([
        ("sw".to_owned(), candidates(&["2G", "4G"])),
        ("sr".to_owned(), candidates(&["1G"])),
    ]))
}
