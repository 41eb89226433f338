use std::fmt;

/// Where the story currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePosition {
    Intro,
    Scene(usize),
}

impl ScenePosition {
    /// Signed index: `-1` for the intro, `k` for scene `k`.
    pub fn index(self) -> isize {
        match self {
            ScenePosition::Intro => -1,
            ScenePosition::Scene(k) => k as isize,
        }
    }

    pub fn scene(self) -> Option<usize> {
        match self {
            ScenePosition::Intro => None,
            ScenePosition::Scene(k) => Some(k),
        }
    }
}

impl fmt::Display for ScenePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenePosition::Intro => write!(f, "intro"),
            ScenePosition::Scene(k) => write!(f, "scene {}", k + 1),
        }
    }
}

/// A completed move between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ScenePosition,
    pub to: ScenePosition,
}

/// The scene state machine.
///
/// Positions range over `Intro` (when the story has one) and
/// `Scene(0)..=Scene(last)`. Every action is clamped: an action that
/// would leave the bounds does nothing and returns `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneController {
    position: ScenePosition,
    scene_count: usize,
    has_intro: bool,
}

impl SceneController {
    pub fn new(scene_count: usize, has_intro: bool) -> Self {
        let position = if has_intro {
            ScenePosition::Intro
        } else {
            ScenePosition::Scene(0)
        };
        Self {
            position,
            scene_count: scene_count.max(1),
            has_intro,
        }
    }

    pub fn position(&self) -> ScenePosition {
        self.position
    }

    pub fn scene_count(&self) -> usize {
        self.scene_count
    }

    pub fn min_index(&self) -> isize {
        if self.has_intro { -1 } else { 0 }
    }

    pub fn max_index(&self) -> isize {
        self.scene_count as isize - 1
    }

    pub fn can_start(&self) -> bool {
        self.position == ScenePosition::Intro
    }

    pub fn can_prev(&self) -> bool {
        self.position.index() > self.min_index()
    }

    pub fn can_next(&self) -> bool {
        matches!(self.position, ScenePosition::Scene(k) if k + 1 < self.scene_count)
    }

    /// Intro → first scene.
    pub fn start(&mut self) -> Option<Transition> {
        if !self.can_start() {
            return None;
        }
        self.move_to(ScenePosition::Scene(0))
    }

    pub fn next(&mut self) -> Option<Transition> {
        match self.position {
            ScenePosition::Scene(k) if self.can_next() => self.move_to(ScenePosition::Scene(k + 1)),
            _ => None,
        }
    }

    pub fn prev(&mut self) -> Option<Transition> {
        match self.position {
            ScenePosition::Scene(0) if self.has_intro => self.move_to(ScenePosition::Intro),
            ScenePosition::Scene(k) if k > 0 => self.move_to(ScenePosition::Scene(k - 1)),
            _ => None,
        }
    }

    /// Go straight to scene `k`, clamped to the last scene.
    pub fn jump(&mut self, k: usize) -> Option<Transition> {
        let target = ScenePosition::Scene(k.min(self.scene_count - 1));
        if target == self.position {
            return None;
        }
        self.move_to(target)
    }

    fn move_to(&mut self, to: ScenePosition) -> Option<Transition> {
        let from = self.position;
        self.position = to;
        log::info!("story: {from} → {to}");
        Some(Transition { from, to })
    }
}
