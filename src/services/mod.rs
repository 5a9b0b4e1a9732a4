pub mod adaptive_difficulty;
