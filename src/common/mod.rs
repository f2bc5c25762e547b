mod decay;
mod weak;

pub use decay::DecayStore;
pub use weak::WeakRegistry;
