pub mod cooccur;
pub mod explore;
pub mod load;
pub mod normalize;
pub mod run;
pub mod trends;

// Re-export command functions for convenience
pub use cooccur::cooccur;
pub use explore::explore;
pub use load::load;
pub use normalize::normalize;
pub use run::run;
pub use trends::trends;
