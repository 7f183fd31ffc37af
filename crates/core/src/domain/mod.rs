pub mod event;
pub mod lead;
pub mod measurement;
pub mod quote;
pub mod tenant;
