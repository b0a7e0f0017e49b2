mod collector;

pub use collector::DeclarationCollector;
