use core::fmt;
use core::str::FromStr;

use rand::Rng;

use crate::coords::{ColorRgba, Rect};

/// Clip-space positions of the triangle scenario, as `x, y` pairs.
pub const TRIANGLE_POSITIONS: [f32; 6] = [
    0.0, 0.0, //
    0.0, 0.5, //
    0.7, 0.0,
];

/// Which shader pair and draw sequence to run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScenarioKind {
    Triangle,
    Rectangles,
}

impl ScenarioKind {
    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::Triangle => "triangle",
            ScenarioKind::Rectangles => "rectangles",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScenarioError(String);

impl fmt::Display for ParseScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scenario `{}` (expected `triangle` or `rectangles`)", self.0)
    }
}

impl std::error::Error for ParseScenarioError {}

impl FromStr for ScenarioKind {
    type Err = ParseScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" => Ok(ScenarioKind::Triangle),
            "rectangles" | "rects" => Ok(ScenarioKind::Rectangles),
            _ => Err(ParseScenarioError(s.to_owned())),
        }
    }
}

/// Parameters of the random rectangles scenario.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RectanglesConfig {
    /// Number of rectangles, one draw call each.
    pub count: u32,
    /// Exclusive upper bound for `x`, `y`, `w` and `h`, in pixels.
    pub extent: u32,
}

impl Default for RectanglesConfig {
    fn default() -> Self {
        Self {
            count: 50,
            extent: 300,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Scenario {
    Triangle,
    Rectangles(RectanglesConfig),
}

impl Scenario {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            Scenario::Triangle => ScenarioKind::Triangle,
            Scenario::Rectangles(_) => ScenarioKind::Rectangles,
        }
    }
}

impl From<ScenarioKind> for Scenario {
    fn from(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Triangle => Scenario::Triangle,
            ScenarioKind::Rectangles => Scenario::Rectangles(RectanglesConfig::default()),
        }
    }
}

/// Uniform integer in `[0, range)`; `0` when the range is empty.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, range: u32) -> u32 {
    if range == 0 {
        return 0;
    }
    rng.random_range(0..range)
}

/// Rectangle with `x`, `y`, `w` and `h` drawn independently from `[0, extent)`.
pub fn random_rect<R: Rng + ?Sized>(rng: &mut R, extent: u32) -> Rect {
    let x = random_int(rng, extent);
    let y = random_int(rng, extent);
    let w = random_int(rng, extent);
    let h = random_int(rng, extent);
    Rect::new(x as f32, y as f32, w as f32, h as f32)
}

/// Opaque color with channels in `[0, 1)`.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> ColorRgba {
    ColorRgba::opaque(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>())
}
