//! Binary encoding/decoding for the world and mission formats.
//!
//! Both codecs walk a [`crate::model::Tree`] and a byte cursor together:
//! [`primitives`] supplies the cursor, [`sections`] the section layouts the
//! formats share, [`object`] the variant placed-object records, and
//! [`world`]/[`mission`] fix each format's magic and section order.

pub mod mission;
mod object;
pub mod primitives;
mod sections;
pub mod world;

pub use mission::{load_mission, save_mission};
pub use primitives::{Reader, Writer};
pub use world::{load_world, save_world};
