//! Serialized data contract exchanged with the hosting collaborator.

pub mod descriptor;
