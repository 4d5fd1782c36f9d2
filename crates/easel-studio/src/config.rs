use std::path::PathBuf;

use anyhow::{Context, Result};

use easel_engine::frame::{RectanglesConfig, Scenario, ScenarioKind};

/// Headless canvas size when `EASEL_SIZE` is not set.
pub const DEFAULT_SNAPSHOT_SIZE: (u32, u32) = (640, 480);

/// Studio settings: defaults, overridden by `EASEL_*` variables and the
/// first positional argument (scenario name).
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub scenario: ScenarioKind,
    pub rectangles: RectanglesConfig,
    /// Read `<dir>/<id>.wgsl` instead of the bundled shaders.
    pub shader_dir: Option<PathBuf>,
    /// Render headless and write a PNG here instead of opening a window.
    pub snapshot: Option<PathBuf>,
    pub size: (u32, u32),
    pub seed: Option<u64>,
    /// Accept a software adapter (`EASEL_FALLBACK_ADAPTER` set to anything).
    pub fallback_adapter: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioKind::Triangle,
            rectangles: RectanglesConfig::default(),
            shader_dir: None,
            snapshot: None,
            size: DEFAULT_SNAPSHOT_SIZE,
            seed: None,
            fallback_adapter: false,
        }
    }
}

impl StudioConfig {
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_sources(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }

    /// Builds the config from an environment lookup and the arguments after
    /// the program name.
    pub fn from_sources<E, A>(env: E, mut args: A) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        A: Iterator<Item = String>,
    {
        let mut config = Self::default();

        if let Some(name) = env("EASEL_SCENARIO") {
            config.scenario = name.parse::<ScenarioKind>().context("invalid EASEL_SCENARIO")?;
        }
        if let Some(name) = args.next() {
            config.scenario = name.parse::<ScenarioKind>().context("invalid scenario argument")?;
        }
        if let Some(extra) = args.next() {
            anyhow::bail!("unexpected argument `{extra}`");
        }

        config.shader_dir = env("EASEL_SHADER_DIR").filter(|s| !s.is_empty()).map(PathBuf::from);
        config.snapshot = env("EASEL_SNAPSHOT").filter(|s| !s.is_empty()).map(PathBuf::from);

        if let Some(size) = env("EASEL_SIZE") {
            config.size = parse_size(&size).context("invalid EASEL_SIZE")?;
        }
        if let Some(seed) = env("EASEL_SEED") {
            config.seed = Some(seed.trim().parse::<u64>().context("invalid EASEL_SEED")?);
        }

        config.fallback_adapter = env("EASEL_FALLBACK_ADAPTER").is_some();

        Ok(config)
    }

    pub fn scenario(&self) -> Scenario {
        match self.scenario {
            ScenarioKind::Triangle => Scenario::Triangle,
            ScenarioKind::Rectangles => Scenario::Rectangles(self.rectangles),
        }
    }
}

/// Parses `WIDTHxHEIGHT`, both non-zero.
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w: u32 = w.trim().parse().with_context(|| format!("bad width in `{s}`"))?;
    let h: u32 = h.trim().parse().with_context(|| format!("bad height in `{s}`"))?;
    anyhow::ensure!(w > 0 && h > 0, "size `{s}` has a zero dimension");
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn build(env: &[(&str, &str)], args: &[&str]) -> Result<StudioConfig> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StudioConfig::from_sources(
            |k| env.get(k).cloned(),
            args.iter().map(|a| (*a).to_owned()),
        )
    }

    #[test]
    fn defaults_open_the_triangle_in_a_window() {
        let c = build(&[], &[]).unwrap();
        assert_eq!(c, StudioConfig::default());
        assert_eq!(c.scenario(), Scenario::Triangle);
        assert!(c.snapshot.is_none());
    }

    #[test]
    fn argument_overrides_environment_scenario() {
        let c = build(&[("EASEL_SCENARIO", "triangle")], &["rectangles"]).unwrap();
        assert_eq!(c.scenario, ScenarioKind::Rectangles);
        assert_eq!(c.scenario(), Scenario::Rectangles(RectanglesConfig::default()));
    }

    #[test]
    fn reads_snapshot_size_seed_and_shader_dir() {
        let c = build(
            &[
                ("EASEL_SNAPSHOT", "out.png"),
                ("EASEL_SIZE", "800x600"),
                ("EASEL_SEED", "42"),
                ("EASEL_SHADER_DIR", "shaders"),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(c.snapshot, Some(PathBuf::from("out.png")));
        assert_eq!(c.size, (800, 600));
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.shader_dir, Some(PathBuf::from("shaders")));
        assert!(!c.fallback_adapter);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(build(&[("EASEL_SCENARIO", "hexagon")], &[]).is_err());
        assert!(build(&[("EASEL_SEED", "soon")], &[]).is_err());
        assert!(build(&[], &["triangle", "extra"]).is_err());
    }

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert_eq!(parse_size(" 32 X 16 ").unwrap(), (32, 16));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }
}
