//! Test scenarios for world model evaluation.
//!
//! Each scenario is a fixed action script driving both models of a
//! comparison through the same situation, so that evaluators judge the
//! models on identical inputs. The built-in catalog covers basic movement,
//! camera control, interaction, and stress cases across biomes; a seeded
//! generator produces randomized stress sequences on top of it.
//!
//! # Examples
//!
//! ```
//! use cotejar::scenario::{builtin_scenarios, scenarios_by_biome};
//!
//! let catalog = builtin_scenarios();
//! assert!(catalog.iter().any(|s| s.id == "basic_forward"));
//!
//! let plains = scenarios_by_biome("plains");
//! assert!(!plains.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Keyboard component of a single action frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardAction {
    None,
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Attack,
}

/// Mouse/camera component of a single action frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    None,
    CameraLeft,
    CameraRight,
    CameraUp,
    CameraDown,
}

/// One frame of input fed to a world model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFrame {
    pub keyboard: KeyboardAction,
    pub mouse: MouseAction,
}

impl ActionFrame {
    /// Create a frame from its two components.
    #[must_use]
    pub fn new(keyboard: KeyboardAction, mouse: MouseAction) -> Self {
        Self { keyboard, mouse }
    }

    /// Frame with no input at all.
    #[must_use]
    pub fn idle() -> Self {
        Self::new(KeyboardAction::None, MouseAction::None)
    }
}

/// A fixed test scenario: identity, biome, and the full action script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestScenario {
    /// Stable identifier used as `scenario_id` on comparisons
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the scenario exercises
    pub description: String,
    /// Terrain/biome the reference image comes from
    pub biome: String,
    /// Number of frames to generate
    pub duration_frames: usize,
    /// Per-frame action script; length equals `duration_frames`
    pub actions: Vec<ActionFrame>,
    /// Evaluation criteria this scenario is designed to stress
    pub evaluation_focus: Vec<String>,
}

/// Repeat one action frame `n` times.
fn repeat(keyboard: KeyboardAction, mouse: MouseAction, n: usize) -> Vec<ActionFrame> {
    vec![ActionFrame::new(keyboard, mouse); n]
}

/// The built-in scenario catalog.
///
/// Scripts are deterministic so every comparison of a scenario replays the
/// exact same inputs regardless of when or where it is generated.
#[must_use]
pub fn builtin_scenarios() -> Vec<TestScenario> {
    use crate::scenario::{KeyboardAction as K, MouseAction as M};

    let mut scenarios = Vec::new();

    scenarios.push(TestScenario {
        id: "basic_forward".to_string(),
        name: "Basic Forward Movement".to_string(),
        description: "Tests simple forward movement in open terrain".to_string(),
        biome: "plains".to_string(),
        duration_frames: 65,
        actions: repeat(K::Forward, M::None, 65),
        evaluation_focus: vec![
            "movement_accuracy".to_string(),
            "motion_smoothness".to_string(),
        ],
    });

    let mut turn = Vec::with_capacity(65);
    turn.extend(repeat(K::Forward, M::None, 20));
    turn.extend(repeat(K::Forward, M::CameraRight, 10));
    turn.extend(repeat(K::Forward, M::None, 20));
    turn.extend(repeat(K::Forward, M::CameraLeft, 15));
    scenarios.push(TestScenario {
        id: "turn_sequence".to_string(),
        name: "Turn Sequence".to_string(),
        description: "Tests turning while moving forward".to_string(),
        biome: "plains".to_string(),
        duration_frames: 65,
        actions: turn,
        evaluation_focus: vec![
            "camera_control".to_string(),
            "motion_smoothness".to_string(),
        ],
    });

    let mut obstacle = Vec::with_capacity(65);
    obstacle.extend(repeat(K::Forward, M::None, 10));
    obstacle.extend(repeat(K::Forward, M::CameraUp, 5));
    obstacle.extend(repeat(K::Jump, M::None, 3));
    obstacle.extend(repeat(K::Forward, M::None, 10));
    obstacle.extend(repeat(K::Left, M::CameraLeft, 8));
    obstacle.extend(repeat(K::Forward, M::None, 10));
    obstacle.extend(repeat(K::Right, M::CameraRight, 8));
    obstacle.extend(repeat(K::Forward, M::None, 11));
    scenarios.push(TestScenario {
        id: "obstacle_navigation".to_string(),
        name: "Obstacle Navigation".to_string(),
        description: "Tests movement around obstacles with jumping".to_string(),
        biome: "forest".to_string(),
        duration_frames: 65,
        actions: obstacle,
        evaluation_focus: vec![
            "movement_accuracy".to_string(),
            "action_responsiveness".to_string(),
            "physics_consistency".to_string(),
        ],
    });

    let mut mining = Vec::with_capacity(65);
    mining.extend(repeat(K::Forward, M::None, 10));
    mining.extend(repeat(K::None, M::CameraDown, 5));
    mining.extend(repeat(K::Attack, M::None, 20));
    mining.extend(repeat(K::Forward, M::None, 5));
    mining.extend(repeat(K::Attack, M::None, 15));
    mining.extend(repeat(K::None, M::CameraUp, 10));
    scenarios.push(TestScenario {
        id: "mining_sequence".to_string(),
        name: "Mining Sequence".to_string(),
        description: "Tests block breaking and mining actions".to_string(),
        biome: "desert".to_string(),
        duration_frames: 65,
        actions: mining,
        evaluation_focus: vec![
            "action_responsiveness".to_string(),
            "object_persistence".to_string(),
        ],
    });

    let mut panoramic = Vec::with_capacity(65);
    panoramic.extend(repeat(K::None, M::CameraRight, 32));
    panoramic.extend(repeat(K::None, M::None, 3));
    panoramic.extend(repeat(K::None, M::CameraLeft, 30));
    scenarios.push(TestScenario {
        id: "panoramic_view".to_string(),
        name: "360 Panoramic View".to_string(),
        description: "Tests full camera rotation while stationary".to_string(),
        biome: "beach".to_string(),
        duration_frames: 65,
        actions: panoramic,
        evaluation_focus: vec![
            "camera_control".to_string(),
            "temporal_consistency".to_string(),
            "object_persistence".to_string(),
        ],
    });

    let walk_look: Vec<ActionFrame> = (0..65)
        .map(|i| {
            let mouse = if i % 20 < 10 {
                M::CameraLeft
            } else {
                M::CameraRight
            };
            ActionFrame::new(K::Forward, mouse)
        })
        .collect();
    scenarios.push(TestScenario {
        id: "look_around_walk".to_string(),
        name: "Walk and Look".to_string(),
        description: "Tests simultaneous movement and camera control".to_string(),
        biome: "forest".to_string(),
        duration_frames: 65,
        actions: walk_look,
        evaluation_focus: vec![
            "camera_control".to_string(),
            "movement_accuracy".to_string(),
            "motion_smoothness".to_string(),
        ],
    });

    let mut ice = Vec::with_capacity(65);
    ice.extend(repeat(K::Forward, M::None, 15));
    ice.extend(repeat(K::None, M::None, 10));
    ice.extend(repeat(K::Left, M::CameraLeft, 10));
    ice.extend(repeat(K::None, M::None, 10));
    ice.extend(repeat(K::Right, M::CameraRight, 10));
    ice.extend(repeat(K::Backward, M::None, 10));
    scenarios.push(TestScenario {
        id: "ice_movement".to_string(),
        name: "Ice Surface Movement".to_string(),
        description: "Tests movement on slippery ice surfaces".to_string(),
        biome: "icy".to_string(),
        duration_frames: 65,
        actions: ice,
        evaluation_focus: vec![
            "physics_consistency".to_string(),
            "motion_smoothness".to_string(),
        ],
    });

    let rapid: Vec<ActionFrame> = (0..65)
        .map(|i| {
            let keyboard = [K::Forward, K::Left, K::Right, K::Backward][i % 4];
            let mouse = [M::None, M::CameraLeft, M::CameraRight][i % 3];
            ActionFrame::new(keyboard, mouse)
        })
        .collect();
    scenarios.push(TestScenario {
        id: "rapid_actions".to_string(),
        name: "Rapid Action Switching".to_string(),
        description: "Tests rapid switching between different actions".to_string(),
        biome: "plains".to_string(),
        duration_frames: 65,
        actions: rapid,
        evaluation_focus: vec![
            "action_responsiveness".to_string(),
            "temporal_consistency".to_string(),
        ],
    });

    scenarios
}

/// Look up a scenario by id in the built-in catalog.
#[must_use]
pub fn get_scenario(scenario_id: &str) -> Option<TestScenario> {
    builtin_scenarios().into_iter().find(|s| s.id == scenario_id)
}

/// All built-in scenarios set in the given biome.
#[must_use]
pub fn scenarios_by_biome(biome: &str) -> Vec<TestScenario> {
    builtin_scenarios()
        .into_iter()
        .filter(|s| s.biome == biome)
        .collect()
}

/// All built-in scenarios stressing a given evaluation criterion.
#[must_use]
pub fn scenarios_by_focus(focus: &str) -> Vec<TestScenario> {
    builtin_scenarios()
        .into_iter()
        .filter(|s| s.evaluation_focus.iter().any(|f| f == focus))
        .collect()
}

/// Balanced test set with at most `scenarios_per_biome` entries per biome.
///
/// Biomes are visited in catalog order, so the selection is deterministic.
#[must_use]
pub fn balanced_test_set(scenarios_per_biome: usize) -> Vec<TestScenario> {
    let catalog = builtin_scenarios();
    let mut biomes: Vec<String> = Vec::new();
    for s in &catalog {
        if !biomes.contains(&s.biome) {
            biomes.push(s.biome.clone());
        }
    }

    let mut test_set = Vec::new();
    for biome in &biomes {
        test_set.extend(
            catalog
                .iter()
                .filter(|s| &s.biome == biome)
                .take(scenarios_per_biome)
                .cloned(),
        );
    }
    test_set
}

/// Generator for randomized stress action sequences.
///
/// Draws each frame uniformly from the full keyboard x mouse action space.
/// Seed it for reproducible scripts:
///
/// ```
/// use cotejar::scenario::RandomActionGenerator;
///
/// let a = RandomActionGenerator::new().with_random_state(7).generate(65);
/// let b = RandomActionGenerator::new().with_random_state(7).generate(65);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RandomActionGenerator {
    random_state: Option<u64>,
}

impl RandomActionGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { random_state: None }
    }

    /// Set random state for reproducible sequences.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Generate a sequence of `n_frames` uniformly random action frames.
    #[must_use]
    pub fn generate(&self, n_frames: usize) -> Vec<ActionFrame> {
        use crate::scenario::{KeyboardAction as K, MouseAction as M};

        const KEYBOARD: [KeyboardAction; 7] = [
            K::None,
            K::Forward,
            K::Backward,
            K::Left,
            K::Right,
            K::Jump,
            K::Attack,
        ];
        const MOUSE: [MouseAction; 5] = [
            M::None,
            M::CameraLeft,
            M::CameraRight,
            M::CameraUp,
            M::CameraDown,
        ];

        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        (0..n_frames)
            .map(|_| {
                ActionFrame::new(
                    KEYBOARD[rng.gen_range(0..KEYBOARD.len())],
                    MOUSE[rng.gen_range(0..MOUSE.len())],
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_scripts_match_duration() {
        for scenario in builtin_scenarios() {
            assert_eq!(
                scenario.actions.len(),
                scenario.duration_frames,
                "scenario {} has a script/duration mismatch",
                scenario.id
            );
        }
    }

    #[test]
    fn test_catalog_ids_unique() {
        let catalog = builtin_scenarios();
        for (i, a) in catalog.iter().enumerate() {
            for b in &catalog[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_get_scenario() {
        let s = get_scenario("panoramic_view").expect("panoramic_view is in the catalog");
        assert_eq!(s.biome, "beach");
        assert!(get_scenario("no_such_scenario").is_none());
    }

    #[test]
    fn test_scenarios_by_biome() {
        let plains = scenarios_by_biome("plains");
        assert!(plains.len() >= 2);
        assert!(plains.iter().all(|s| s.biome == "plains"));
    }

    #[test]
    fn test_scenarios_by_focus() {
        let camera = scenarios_by_focus("camera_control");
        assert!(!camera.is_empty());
        for s in &camera {
            assert!(s.evaluation_focus.iter().any(|f| f == "camera_control"));
        }
    }

    #[test]
    fn test_balanced_test_set_caps_per_biome() {
        let set = balanced_test_set(1);
        let mut seen: Vec<&str> = Vec::new();
        for s in &set {
            assert!(!seen.contains(&s.biome.as_str()), "biome {} repeated", s.biome);
            seen.push(&s.biome);
        }
    }

    #[test]
    fn test_random_generator_reproducible() {
        let a = RandomActionGenerator::new().with_random_state(42).generate(100);
        let b = RandomActionGenerator::new().with_random_state(42).generate(100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_generator_length() {
        let frames = RandomActionGenerator::new().with_random_state(1).generate(65);
        assert_eq!(frames.len(), 65);
    }

    #[test]
    fn test_action_frame_serde_round_trip() {
        let frame = ActionFrame::new(KeyboardAction::Jump, MouseAction::CameraUp);
        let json = serde_json::to_string(&frame).expect("frame serializes");
        assert!(json.contains("jump"));
        assert!(json.contains("camera_up"));
        let back: ActionFrame = serde_json::from_str(&json).expect("frame deserializes");
        assert_eq!(back, frame);
    }
}
