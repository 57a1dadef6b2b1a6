// Application layer - Use case interactors

pub mod batch_interactor;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchReport};
