//! Internal implementation details.

pub(crate) mod frame;

pub(crate) use frame::ConstructionFrame;
