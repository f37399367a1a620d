//! Configuration constants for the enemy behavior simulator.

// Interpreter
pub const MAX_INTERPRETER_STEPS: usize = 1000; // Hard cap on nodes executed in a single walk, entry slot excluded

// Simulated battle state
pub const FULL_HP: u32 = 100; // HP percentage at the start of a battle
pub const DEFAULT_ENEMY_COUNT: u32 = 999; // "Enemies remaining" before any enemy dies
pub const DEFAULT_LEVEL: u32 = 1; // Level always summarized, even without level branches

// Summarizer sweeps
pub const SWEEP_TURNS: usize = 10; // Turns simulated while searching for a repeating cycle
pub const ENEMY_COUNT_START: u32 = 6; // Highest enemy count tried by the enemy-count sweep
pub const MAX_HP_WALKS: usize = 32; // Repeated walks at one HP checkpoint before giving up on new behavior

// Batch reporting
pub const DIAGNOSTIC_EXAMPLES: usize = 5; // Example enemy ids kept per diagnostic kind
