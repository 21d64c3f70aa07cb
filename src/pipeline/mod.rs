pub mod source;
pub mod extraction;
pub mod normalize;
pub mod matching;
pub mod assembly;
pub mod processor; // Generation orchestrator: load → normalize → match → assemble
